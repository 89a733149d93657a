use just_core::{
    AttributeConfig, Binding, BindingError, Transform, TransformError, Transformed, Value,
};
use just_testing::{run_test_document, CallLog, ComponentTestRule};

fn change_logger(log: &CallLog) -> impl Fn(&just_core::Host, &Value, &Value) + 'static {
    let log = log.clone();
    move |_host, new, old| log.push(format!("{new}:{old}"))
}

fn define_counter(rule: &ComponentTestRule, log: &CallLog) {
    let number = rule.runtime().transform("number").unwrap();
    let class = rule
        .core_element()
        .extend("Counter")
        .attribute(
            "count",
            AttributeConfig::new()
                .transform(number)
                .on_change(change_logger(log)),
        )
        .build();
    rule.define("x-counter", &class).unwrap();
}

#[test]
fn unchanged_attribute_string_does_not_notify() {
    run_test_document(|rule| {
        let log = CallLog::new();
        define_counter(rule, &log);
        let host = rule.mount("x-counter").unwrap();
        rule.pump_until_idle();

        host.element().set_attribute("count", "5");
        rule.pump_until_idle();
        assert_eq!(log.take(), vec!["5:null"]);

        host.element().set_attribute("count", "5");
        rule.pump_until_idle();
        assert!(log.is_empty());

        host.element().set_attribute("count", "6");
        rule.pump_until_idle();
        assert_eq!(log.take(), vec!["6:5"]);
        assert_eq!(host.get("count"), Value::from(6));
    });
}

#[test]
fn attribute_changes_wait_for_the_mutation_pass() {
    run_test_document(|rule| {
        let log = CallLog::new();
        define_counter(rule, &log);
        let host = rule.mount("x-counter").unwrap();

        host.element().set_attribute("count", "1");
        assert!(log.is_empty());
        assert_eq!(host.get("count"), Value::Null);

        rule.pump_until_idle();
        assert_eq!(log.take(), vec!["1:null"]);
    });
}

#[test]
fn coalesced_writes_are_applied_in_order() {
    run_test_document(|rule| {
        let log = CallLog::new();
        define_counter(rule, &log);
        let host = rule.mount("x-counter").unwrap();

        host.element().set_attribute("count", "5");
        host.element().set_attribute("count", "6");
        rule.pump_until_idle();
        assert_eq!(log.take(), vec!["5:null", "6:5"]);

        host.element().set_attribute("count", "7");
        host.element().set_attribute("count", "7");
        rule.pump_until_idle();
        assert_eq!(log.take(), vec!["7:6"]);
    });
}

#[test]
fn changes_to_several_attributes_follow_mutation_order() {
    run_test_document(|rule| {
        let log = CallLog::new();
        let class = {
            let (first, last) = (log.clone(), log.clone());
            rule.core_element()
                .extend("Person")
                .attribute(
                    "firstName",
                    AttributeConfig::new().on_change(move |_h, new, _old| first.push(format!("first={new}"))),
                )
                .attribute(
                    "lastName",
                    AttributeConfig::new().on_change(move |_h, new, _old| last.push(format!("last={new}"))),
                )
                .build()
        };
        rule.define("x-person", &class).unwrap();
        let host = rule.mount("x-person").unwrap();

        for _ in 0..2 {
            host.element().set_attribute("last-name", "Miyazaki");
            host.element().set_attribute("first-name", "Hayao");
            host.element().remove_attribute("last-name");
            rule.pump_until_idle();
            assert_eq!(
                log.take(),
                vec!["last=Miyazaki", "first=Hayao", "last=null"]
            );
            host.element().remove_attribute("first-name");
            rule.pump_until_idle();
            log.take();
        }
    });
}

#[test]
fn invalid_extraction_is_stored_not_raised() {
    run_test_document(|rule| {
        let log = CallLog::new();
        define_counter(rule, &log);
        let host = rule.mount("x-counter").unwrap();

        host.element().set_attribute("count", "many");
        rule.pump_until_idle();
        assert_eq!(host.get("count"), Value::Invalid);
        assert_eq!(log.take(), vec![":null"]);
    });
}

#[test]
fn setter_serializes_through_the_transform() {
    run_test_document(|rule| {
        let log = CallLog::new();
        define_counter(rule, &log);
        let host = rule.mount("x-counter").unwrap();

        host.set("count", 12).unwrap();
        assert_eq!(host.element().get_attribute("count").as_deref(), Some("12"));
        rule.pump_until_idle();
        assert_eq!(host.get("count"), Value::from(12));

        let err = host.set("count", f64::NAN).unwrap_err();
        assert!(matches!(err, BindingError::InvalidValue { ref property, .. } if property == "count"));
        assert_eq!(host.element().get_attribute("count").as_deref(), Some("12"));

        let err = host.set("missing", 1).unwrap_err();
        assert_eq!(
            err,
            BindingError::UnknownProperty {
                element: "<x-counter>".to_string(),
                property: "missing".to_string(),
            }
        );
    });
}

#[test]
fn camel_case_properties_map_to_dash_case_attributes() {
    run_test_document(|rule| {
        let class = rule
            .core_element()
            .extend("Pager")
            .attribute("currentPage", AttributeConfig::new())
            .build();
        rule.define("x-pager", &class).unwrap();
        let host = rule.mount("x-pager").unwrap();

        host.set("currentPage", "3").unwrap();
        assert_eq!(host.element().get_attribute("current-page").as_deref(), Some("3"));
        rule.pump_until_idle();
        assert_eq!(host.get("currentPage"), Value::from("3"));

        host.set("currentPage", Value::Null).unwrap();
        assert!(!host.element().has_attribute("current-page"));
        rule.pump_until_idle();
        assert_eq!(host.get("currentPage"), Value::Null);
    });
}

#[test]
fn defaults_apply_on_connect_only_when_absent() {
    run_test_document(|rule| {
        let boolean = rule.runtime().transform("boolean").unwrap();
        let class = rule
            .core_element()
            .extend("Toggle")
            .attribute(
                "open",
                AttributeConfig::new().transform(boolean).default_value(true),
            )
            .build();
        rule.define("x-toggle", &class).unwrap();

        let fresh = rule.mount("x-toggle").unwrap();
        assert_eq!(fresh.element().get_attribute("open").as_deref(), Some("true"));
        rule.pump_until_idle();
        assert_eq!(fresh.get("open"), Value::from(true));

        let nodes = rule.mount_markup(r#"<x-toggle open="false"></x-toggle>"#).unwrap();
        let preset = just_core::Host::from_node(&nodes[0]).unwrap();
        rule.pump_until_idle();
        assert_eq!(preset.element().get_attribute("open").as_deref(), Some("false"));
        assert_eq!(preset.get("open"), Value::from(false));
    });
}

#[test]
fn custom_binding_replaces_getter_and_setter() {
    run_test_document(|rule| {
        let binding = Binding::default()
            .getter(|host| {
                let tag = host.element().get_attribute("tag").unwrap_or_default();
                Value::from(format!("#{tag}"))
            })
            .setter(|host, value| {
                host.element().set_attribute("tag", value.to_string().to_lowercase());
                Ok(())
            });
        let class = rule
            .core_element()
            .extend("Tagged")
            .attribute("tag", AttributeConfig::new().bind(binding))
            .build();
        rule.define("x-tagged", &class).unwrap();
        let host = rule.mount("x-tagged").unwrap();

        host.set("tag", "GHIBLI").unwrap();
        assert_eq!(host.element().get_attribute("tag").as_deref(), Some("ghibli"));
        assert_eq!(host.get("tag"), Value::from("#ghibli"));
    });
}

struct YearTransform;

impl Transform for YearTransform {
    fn type_for(&self) -> &str {
        "number"
    }

    fn detect(&self, value: &Value) -> bool {
        matches!(value, Value::Number(_))
    }

    fn extract(&self, value: &Value) -> Transformed<Value> {
        match value.as_str().and_then(|text| text.strip_prefix("year-")) {
            Some(year) => year.parse::<f64>().ok().map(Value::from).into(),
            None => Transformed::Invalid,
        }
    }

    fn serialize(&self, value: &Value) -> Transformed<String> {
        value.as_f64().map(|year| format!("year-{year}")).into()
    }
}

#[test]
fn unknown_transform_fails_and_custom_overrides_built_in() {
    run_test_document(|rule| {
        let err = rule.runtime().transform("unregistered-type").err().unwrap();
        assert_eq!(
            err,
            TransformError::NotFound {
                type_for: "unregistered-type".to_string()
            }
        );

        rule.runtime().register_transform(YearTransform);
        let number = rule.runtime().transform("number").unwrap();
        assert_eq!(
            number.extract(&Value::from("year-1988")),
            Transformed::Valid(Value::from(1988))
        );
        assert_eq!(number.serialize(&Value::from(1988)).ok().as_deref(), Some("year-1988"));
    });
}

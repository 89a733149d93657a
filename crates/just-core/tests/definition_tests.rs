use std::any::Any;

use just_core::{ConfigError, Host, TransformError, Unit, UnitSignature};
use just_dom::DomError;
use just_testing::{run_test_document, CallLog};

#[test]
fn invalid_tag_names_are_rejected() {
    run_test_document(|rule| {
        let class = rule.core_element().extend("Invalid").build();
        for tag in ["card", "X-Card", "1-card", ""] {
            assert_eq!(
                rule.define(tag, &class).unwrap_err(),
                ConfigError::InvalidTagName { tag: tag.to_string() }
            );
        }
    });
}

#[test]
fn abstract_and_unmixed_classes_cannot_be_defined() {
    run_test_document(|rule| {
        let marker = rule.runtime().builtins().core.marker();
        assert_eq!(
            rule.define("x-marker", &marker).unwrap_err(),
            ConfigError::AbstractClass {
                class: marker.name().to_string()
            }
        );

        let bare = rule.runtime().html_element().extend("Bare").build();
        assert_eq!(
            rule.define("x-bare", &bare).unwrap_err(),
            ConfigError::MissingCoreIdentity {
                class: "Bare".to_string()
            }
        );
        assert!(!rule.document().create_element("x-bare").is_upgraded());
    });
}

#[test]
fn extended_tag_must_match_the_definition() {
    run_test_document(|rule| {
        let autonomous = rule.core_element().extend("Autonomous").build();
        assert_eq!(
            rule.define_builtin("x-autonomous", "nav", &autonomous).unwrap_err(),
            ConfigError::MissingExtends {
                class: "Autonomous".to_string(),
                expected: None,
                found: Some("nav".to_string()),
            }
        );

        let customized = rule.runtime().core_builtin("nav").extend("PageNav").build();
        assert_eq!(customized.extends_tag(), Some("nav"));
        assert_eq!(
            rule.define("page-nav", &customized).unwrap_err(),
            ConfigError::MissingExtends {
                class: "PageNav".to_string(),
                expected: Some("nav".to_string()),
                found: None,
            }
        );
        assert!(rule.define_builtin("page-nav", "NAV", &customized).is_ok());
    });
}

#[test]
fn customized_built_ins_upgrade_through_the_is_attribute() {
    run_test_document(|rule| {
        let log = CallLog::new();
        rule.mount_markup(r#"<template id="page-nav--template"><a data-target="page"></a></template>"#)
            .unwrap();
        let class = {
            let connect = log.clone();
            rule.runtime()
                .core_builtin("nav")
                .extend("PageNav")
                .on_connect(move |host| connect.push(host.element().describe()))
                .build()
        };
        rule.define_builtin("page-nav", "nav", &class).unwrap();

        let nav = rule.document().create_element_is("nav", "page-nav");
        rule.body().append_child(&nav).unwrap();
        let host = Host::from_node(&nav).unwrap();
        assert!(host.class().ptr_eq(&class));
        assert_eq!(log.take(), vec!["<nav>"]);

        host.target("page").unwrap().update(2);
        assert_eq!(host.shadow_root().unwrap().inner_html(), "<a data-target=\"page\">2</a>");

        let plain = rule.document().create_element("nav");
        assert!(Host::from_node(&plain).is_none());
    });
}

#[test]
fn redefinition_surfaces_the_host_error() {
    run_test_document(|rule| {
        let class = rule.core_element().extend("Twice").build();
        rule.define("x-twice", &class).unwrap();
        assert_eq!(
            rule.define("x-twice", &class).unwrap_err(),
            ConfigError::Dom(DomError::AlreadyDefined {
                name: "x-twice".to_string()
            })
        );
    });
}

struct Pricing;

impl Unit for Pricing {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[test]
fn construction_failures_report_the_element() {
    run_test_document(|rule| {
        let class = rule
            .core_element()
            .extend("Priced")
            .unit(UnitSignature::new(|_host| -> Result<Pricing, ConfigError> {
                Err(TransformError::NotFound {
                    type_for: "money".to_string(),
                }
                .into())
            }))
            .build();
        rule.define("x-priced", &class).unwrap();

        let err = rule.create("x-priced").err().unwrap();
        assert_eq!(
            err,
            DomError::Construct {
                element: "x-priced".to_string(),
                message: "no transform registered for type 'money'".to_string(),
            }
        );

        let element = rule.document().create_element("x-priced");
        assert!(!element.is_upgraded());
    });
}

#[test]
fn shadow_requires_the_core_identity() {
    run_test_document(|rule| {
        let runtime = rule.runtime();
        let err = runtime
            .compose(runtime.html_element(), &runtime.builtins().shadow)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequirement {
                mixin: "Shadow".to_string(),
                required: "Core".to_string(),
                class: "HTMLElement".to_string(),
            }
        );
    });
}

#[test]
fn core_element_is_composed_once() {
    run_test_document(|rule| {
        let runtime = rule.runtime();
        let core = runtime.core_element();
        assert!(core.ptr_eq(&runtime.core_element()));
        let builtins = runtime.builtins();
        for mixin in [
            &builtins.lifecycle,
            &builtins.actionable,
            &builtins.stateful,
            &builtins.core,
            &builtins.shadow,
        ] {
            assert!(mixin.detect(&core), "{} missing", mixin.name());
        }
        assert!(!builtins.core.detect(runtime.html_element()));
        assert!(runtime.core_builtin("nav").ptr_eq(&runtime.core_builtin("NAV")));
    });
}

#[test]
fn define_upgrades_elements_already_in_the_document() {
    run_test_document(|rule| {
        let log = CallLog::new();
        let nodes = rule.mount_markup("<x-late></x-late>").unwrap();
        assert!(Host::from_node(&nodes[0]).is_none());

        let class = {
            let (init, connect) = (log.clone(), log.clone());
            rule.core_element()
                .extend("Late")
                .on_init(move |_host| init.push("init"))
                .on_connect(move |_host| connect.push("connect"))
                .build()
        };
        rule.define("x-late", &class).unwrap();
        assert!(Host::from_node(&nodes[0]).is_some());
        assert_eq!(log.take(), vec!["init", "connect"]);
    });
}

use just_core::{action_payload, AttributeConfig, Host, PropertyConfig, Value};
use just_dom::{Event, EventInit, Node};
use just_template::{strategy, RenderError, Template};
use just_testing::{run_test_document, ComponentTestRule};

const NAV_MARKUP: &str = r#"<nav is="page-nav"><template><button data-strategy="page"></button></template></nav>"#;

fn item(text: &str) -> Value {
    Value::map([("text", Value::from(text))])
}

fn render_items(host: &Host) -> Result<(), RenderError> {
    let element = host.element();
    let Some(source) = element
        .child_elements()
        .into_iter()
        .find(|child| child.local_name() == Some("template"))
    else {
        return Ok(());
    };
    let template = Template::builder(&source)
        .strategy("page", |segment, context, _parent| {
            let text = context.get("text").map(Value::to_string).unwrap_or_default();
            segment.set_attribute("page", text.clone());
            segment.set_text_content(&text);
            strategy::bind_action(segment, "click:select", context)?;
            Ok(())
        })
        .build();

    for stale in element.elements_by_tag("ul") {
        stale.remove();
    }
    let document = element.owner_document().expect("nav belongs to a document");
    let list = document.create_element("ul");
    let items = host.get("items");
    for entry in items.as_list().unwrap_or_default() {
        let row = document.create_element("li");
        row.append_child(&template.render(entry)?)?;
        list.append_child(&row)?;
    }
    element.append_child(&list)?;
    Ok(())
}

fn mark_selected(host: &Host, page: &Value) {
    for row in host.element().elements_by_tag("li") {
        row.remove_attribute("selected");
    }
    let page = page.to_string();
    let selected = host
        .element()
        .query(|node| node.get_attribute("page").as_deref() == Some(page.as_str()));
    if let Some(row) = selected.and_then(|button| button.parent_element()) {
        row.set_attribute("selected", "");
    }
}

fn define_page_nav(rule: &ComponentTestRule) {
    let class = rule
        .runtime()
        .core_builtin("nav")
        .extend("PageNav")
        .property(
            "items",
            PropertyConfig::new()
                .default_value(vec![item("one"), item("two"), item("three")])
                .on_change(|host, _items, _old| {
                    if host.is_connected() {
                        render_items(host).unwrap();
                    }
                }),
        )
        .attribute(
            "currentPage",
            AttributeConfig::new().on_change(|host, page, _old| mark_selected(host, page)),
        )
        .action("select", |event, host| {
            let page = action_payload(event).get("text").cloned().unwrap_or_default();
            host.set("currentPage", page).unwrap();
        })
        .on_connect(|host| render_items(host).unwrap())
        .build();
    rule.define_builtin("page-nav", "nav", &class).unwrap();
}

fn buttons(host: &Host) -> Vec<Node> {
    host.element().elements_by_tag("button")
}

#[test]
fn renders_one_row_per_item_on_connect() {
    run_test_document(|rule| {
        define_page_nav(rule);
        let nodes = rule.mount_markup(NAV_MARKUP).unwrap();
        let host = Host::from_node(&nodes[0]).unwrap();

        let rows = host.element().elements_by_tag("li");
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1].inner_html(),
            r#"<button page="two">two</button>"#
        );
        assert!(host.shadow_root().is_none());
    });
}

#[test]
fn clicking_a_rendered_item_selects_its_page() {
    run_test_document(|rule| {
        define_page_nav(rule);
        let nodes = rule.mount_markup(NAV_MARKUP).unwrap();
        let host = Host::from_node(&nodes[0]).unwrap();

        buttons(&host)[2].dispatch_event(&Event::new("click", EventInit::default()));
        assert_eq!(host.element().get_attribute("current-page").as_deref(), Some("three"));
        rule.pump_until_idle();

        let selected: Vec<_> = host
            .element()
            .elements_with_attribute("selected")
            .iter()
            .map(Node::text_content)
            .collect();
        assert_eq!(selected, vec!["three"]);
    });
}

#[test]
fn replacing_items_re_renders_the_list() {
    run_test_document(|rule| {
        define_page_nav(rule);
        let nodes = rule.mount_markup(NAV_MARKUP).unwrap();
        let host = Host::from_node(&nodes[0]).unwrap();

        host.set("items", vec![item("castle"), item("sky")]).unwrap();
        assert_eq!(host.element().elements_by_tag("ul").len(), 1);
        assert_eq!(
            buttons(&host).iter().map(Node::text_content).collect::<Vec<_>>(),
            vec!["castle", "sky"]
        );
    });
}

#[test]
fn render_failures_surface_to_the_caller() {
    run_test_document(|rule| {
        let document = rule.document();
        let fragment = document
            .parse_fragment(r#"<template><p data-strategy="missing"></p></template>"#)
            .unwrap();
        let template = Template::from_element(&fragment.child_elements()[0]);
        let err = template.render(&Value::Null).unwrap_err();
        assert!(matches!(err, RenderError::UnknownStrategy { ref strategy, .. } if strategy == "missing"));
    });
}

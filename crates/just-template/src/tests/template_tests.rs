use super::*;
use just_core::{action_payload, Value};
use just_dom::{Document, Event, EventInit, ListenerOptions, Node};
use std::cell::RefCell;
use std::rc::Rc;

fn template(document: &Document, markup: &str) -> Node {
    let fragment = document.parse_fragment(markup).unwrap();
    let template = fragment.child_elements().remove(0);
    document.body().append_child(&template).unwrap();
    template
}

fn context(entries: &[(&str, Value)]) -> Value {
    Value::map(entries.iter().cloned())
}

#[test]
fn named_strategy_fills_segment_and_drops_the_hook() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><p data-strategy="text"></p></template>"#,
    );
    let template = Template::builder(&source)
        .strategy("text", |segment, context, _parent| {
            let value = context.get("value").cloned().unwrap_or_default();
            segment.set_text_content(&value.to_string());
            Ok(())
        })
        .build();

    let root = template.render(&context(&[("value", Value::from("Hi"))])).unwrap();
    let segment = root.child_elements().remove(0);
    assert_eq!(segment.text_content(), "Hi");
    assert!(!segment.has_attribute("data-strategy"));
}

#[test]
fn empty_hook_delegates_to_text_fill() {
    let document = Document::new();
    let source = template(&document, r#"<template><h1 data-strategy text="title"></h1></template>"#);

    let root = Template::from_element(&source)
        .render(&context(&[("title", Value::from("Totoro"))]))
        .unwrap();
    assert_eq!(root.inner_html(), "<h1>Totoro</h1>");
}

#[test]
fn delegated_attribute_fill_skips_missing_values() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><a data-strategy attr="href:url" text="label">old</a><img data-strategy attr="src:poster" alt="x"></template>"#,
    );

    let root = Template::from_element(&source)
        .render(&context(&[
            ("url", Value::from("#/films/1")),
            ("label", Value::Invalid),
            ("poster", Value::Null),
        ]))
        .unwrap();
    assert_eq!(root.inner_html(), r##"<a href="#/films/1"></a><img alt="x">"##);
}

#[test]
fn nested_context_keys_are_walked() {
    let document = Document::new();
    let source = template(&document, r#"<template><span data-strategy text="film.director"></span></template>"#);
    let film = context(&[("director", Value::from("Hayao Miyazaki"))]);

    let root = Template::from_element(&source)
        .render(&context(&[("film", film)]))
        .unwrap();
    assert_eq!(root.text_content(), "Hayao Miyazaki");
}

#[test]
fn unknown_named_strategy_is_an_error() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><ul><li data-strategy="bogus"></li></ul></template>"#,
    );

    let err = Template::from_element(&source)
        .render(&Value::Null)
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::UnknownStrategy {
            element: "li".to_string(),
            strategy: "bogus".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "unknown strategy for 'li' with 'bogus'"
    );
}

#[test]
fn rendering_never_touches_the_source() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><b data-strategy text="name"></b><i data-strategy="shout"></i></template>"#,
    );
    let template = Template::builder(&source)
        .strategy("shout", |segment, context, _parent| {
            let name = context.get("name").map(Value::to_string).unwrap_or_default();
            segment.set_text_content(&name.to_uppercase());
            Ok(())
        })
        .build();
    let before = source.template_content().unwrap().inner_html();

    let first = template.render(&context(&[("name", Value::from("Kiki"))])).unwrap();
    let second = template.render(&context(&[("name", Value::from("Kiki"))])).unwrap();
    assert_eq!(first.inner_html(), "<b>Kiki</b><i>KIKI</i>");
    assert_eq!(first.inner_html(), second.inner_html());
    assert!(!first.ptr_eq(&second));
    assert_eq!(source.template_content().unwrap().inner_html(), before);
}

#[test]
fn custom_delegated_strategy_overrides_the_built_in() {
    let document = Document::new();
    let source = template(&document, r#"<template><p data-strategy text="title"></p></template>"#);
    let template = Template::builder(&source)
        .delegated("text", |segment, key, context| {
            let text = context.get(key).map(Value::to_string).unwrap_or_default();
            segment.set_text_content(&format!("[{text}]"));
            Ok(true)
        })
        .build();

    let root = template.render(&context(&[("title", Value::from("Ponyo"))])).unwrap();
    assert_eq!(root.inner_html(), "<p>[Ponyo]</p>");
    assert_eq!(
        template.delegated_attributes().collect::<Vec<_>>(),
        vec!["attr", "text", "action"]
    );
}

#[test]
fn template_element_names_its_hook_and_passes_its_parent() {
    let document = Document::new();
    let host = document.create_element("nav");
    document.body().append_child(&host).unwrap();
    let fragment = document
        .parse_fragment(r#"<template hook="data-part"><li data-part="page"></li><i data-strategy="ignored"></i></template>"#)
        .unwrap();
    let source = fragment.child_elements().remove(0);
    host.append_child(&source).unwrap();

    let seen = Rc::new(RefCell::new(None));
    let template = {
        let seen = seen.clone();
        Template::builder(&source)
            .strategy("page", move |segment, context, parent| {
                *seen.borrow_mut() = parent.map(Node::describe);
                let text = context.get("text").map(Value::to_string).unwrap_or_default();
                segment.set_attribute("navigate-to", text.clone());
                segment.set_text_content(&text);
                Ok(())
            })
            .build()
    };
    assert_eq!(template.hook(), "data-part");
    assert!(template.has_strategy("page"));

    let root = template.render(&context(&[("text", Value::from("two"))])).unwrap();
    assert_eq!(
        root.inner_html(),
        r#"<li navigate-to="two">two</li><i data-strategy="ignored"></i>"#
    );
    assert_eq!(seen.borrow().as_deref(), Some("<nav>"));
}

#[test]
fn strategy_errors_stop_the_render() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><p data-strategy="fail"></p><p text="never"></p></template>"#,
    );
    let template = Template::builder(&source)
        .strategy("fail", |segment, _context, _parent| {
            Err(RenderError::Strategy {
                element: segment.describe(),
                strategy: "fail".to_string(),
                message: "no data".to_string(),
            })
        })
        .build();

    let err = template.render(&Value::Null).unwrap_err();
    assert!(matches!(err, RenderError::Strategy { ref message, .. } if message == "no data"));
}

#[test]
fn action_binding_dispatches_with_the_context() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><button data-strategy action="click:select" text="title"></button></template>"#,
    );
    let payloads = Rc::new(RefCell::new(Vec::new()));
    {
        let payloads = payloads.clone();
        document
            .body()
            .add_event_listener("select", ListenerOptions::default(), move |event| {
                payloads.borrow_mut().push(action_payload(event));
            });
    }

    let film = context(&[("title", Value::from("Mononoke"))]);
    let root = Template::from_element(&source).render(&film).unwrap();
    let button = root.child_elements().remove(0);
    assert!(!button.has_attribute("action"));
    document.body().append_child(&root).unwrap();

    button.dispatch_event(&Event::new("click", EventInit::default()));
    assert_eq!(*payloads.borrow(), vec![film]);
}

#[test]
fn plain_nodes_render_as_a_whole() {
    let document = Document::new();
    let fragment = document
        .parse_fragment(r#"<li><span data-strategy text="name"></span></li>"#)
        .unwrap();
    let template = Template::from_element(&fragment);
    assert_eq!(template.hook(), DEFAULT_HOOK);
    assert!(template.parent().is_none());

    let root = template.render(&context(&[("name", Value::from("Jiji"))])).unwrap();
    assert_eq!(root.inner_html(), "<li><span>Jiji</span></li>");
    assert_eq!(
        fragment.inner_html(),
        r#"<li><span data-strategy="" text="name"></span></li>"#
    );
}

#[test]
fn unhooked_elements_keep_their_attributes() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><form action="/search"><span data-strategy="" text="q"></span><p text="title"></p></form></template>"#,
    );

    let root = Template::from_element(&source)
        .render(&context(&[("q", Value::from("x")), ("title", Value::from("Ponyo"))]))
        .unwrap();
    let form = root.child_elements().remove(0);
    assert_eq!(form.get_attribute("action").as_deref(), Some("/search"));
    assert_eq!(form.inner_html(), r#"<span>x</span><p text="title"></p>"#);
}

#[test]
fn malformed_delegated_values_stay_in_place() {
    let document = Document::new();
    let source = template(
        &document,
        r#"<template><form data-strategy action="/search" attr="title" text="q"></form></template>"#,
    );

    let root = Template::from_element(&source)
        .render(&context(&[("q", Value::from("x"))]))
        .unwrap();
    assert_eq!(
        root.inner_html(),
        r#"<form action="/search" attr="title">x</form>"#
    );
}

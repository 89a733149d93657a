//! The demo's three components: a page navigation list, a film details
//! section and the app shell that connects them.

use just_core::{
    action_payload, AttributeConfig, ConfigError, ElementClass, Host, PropertyConfig, Runtime,
    Value,
};
use just_dom::{DefineOptions, Document, Node};
use just_template::{strategy, RenderError, Template};

pub const PAGE_NAV: &str = "page-nav";
pub const FILM_DETAILS: &str = "film-details";
pub const GHIBLI_APP: &str = "ghibli-app";

pub fn define_all(runtime: &Runtime, document: &Document) -> Result<(), ConfigError> {
    runtime.define(document, PAGE_NAV, &page_nav(runtime), DefineOptions::extends("nav"))?;
    runtime.define(
        document,
        FILM_DETAILS,
        &film_details(runtime)?,
        DefineOptions::extends("section"),
    )?;
    runtime.define(document, GHIBLI_APP, &ghibli_app(runtime), DefineOptions::default())?;
    Ok(())
}

/// Host of the first descendant customized as `is`.
pub fn find_customized(root: &Node, is: &str) -> Option<Host> {
    root.query(|node| node.get_attribute("is").as_deref() == Some(is))
        .as_ref()
        .and_then(Host::from_node)
}

fn item_template(host: &Host) -> Option<Node> {
    host.element()
        .child_elements()
        .into_iter()
        .find(|child| child.local_name() == Some("template"))
}

fn page_nav(runtime: &Runtime) -> ElementClass {
    runtime
        .core_builtin("nav")
        .extend("PageNav")
        .property(
            "items",
            PropertyConfig::new()
                .default_value(Vec::<Value>::new())
                .on_change(|host, _items, _old| {
                    if host.is_connected() {
                        log_render(host, render_nav_list(host));
                    }
                }),
        )
        .attribute(
            "currentPage",
            AttributeConfig::new().on_change(|host, page, _old| select_page(host, page)),
        )
        .action("select", |event, host| {
            let page = action_payload(event).get("id").cloned().unwrap_or_default();
            if let Err(err) = host.set("currentPage", page) {
                log::warn!("{err}");
            }
        })
        .on_connect(|host| log_render(host, render_nav_list(host)))
        .build()
}

fn render_nav_list(host: &Host) -> Result<(), RenderError> {
    let Some(source) = item_template(host) else {
        return Ok(());
    };
    let template = Template::builder(&source)
        .strategy("page", |segment, film, _parent| {
            let id = film.get("id").map(Value::to_string).unwrap_or_default();
            let title = film.get("title").map(Value::to_string).unwrap_or_default();
            segment.set_attribute("page", id);
            segment.set_text_content(&title);
            strategy::bind_action(segment, "click:select", film)?;
            Ok(())
        })
        .build();

    let element = host.element();
    for stale in element.elements_by_tag("ul") {
        stale.remove();
    }
    let Some(document) = element.owner_document() else {
        return Ok(());
    };
    let list = document.create_element("ul");
    list.set_attribute("class", "page-nav--list");
    let items = host.get("items");
    for film in items.as_list().unwrap_or_default() {
        let row = document.create_element("li");
        row.set_attribute("class", "page-nav--item");
        row.append_child(&template.render(film)?)?;
        list.append_child(&row)?;
    }
    element.append_child(&list)?;
    Ok(())
}

fn select_page(host: &Host, page: &Value) {
    for row in host.element().elements_with_attribute("selected") {
        row.remove_attribute("selected");
    }
    if page.is_missing() {
        return;
    }
    let page = page.to_string();
    let selected = host
        .element()
        .query(|node| node.get_attribute("page").as_deref() == Some(page.as_str()))
        .and_then(|segment| segment.parent_element());
    match selected {
        Some(row) => row.set_attribute("selected", ""),
        None => log::warn!("page-nav has no item for page '{page}'"),
    }
}

fn film_details(runtime: &Runtime) -> Result<ElementClass, ConfigError> {
    let film = runtime.transform("film")?;
    Ok(runtime
        .core_builtin("section")
        .extend("FilmDetails")
        .attribute(
            "film",
            AttributeConfig::new()
                .transform(film)
                .on_change(|host, film, _old| log_render(host, render_details(host, film))),
        )
        .build())
}

fn render_details(host: &Host, film: &Value) -> Result<(), RenderError> {
    let Some(source) = item_template(host) else {
        return Ok(());
    };
    for child in host.element().children() {
        if !child.ptr_eq(&source) {
            child.remove();
        }
    }
    if film.as_map().is_none() {
        return Ok(());
    }
    let details = Template::from_element(&source).render(film)?;
    host.element().append_child(&details)?;
    Ok(())
}

fn ghibli_app(runtime: &Runtime) -> ElementClass {
    runtime
        .core_element()
        .extend("GhibliApp")
        .action("select", |event, host| {
            let Some(details) = find_customized(host.element(), FILM_DETAILS) else {
                log::warn!("{} has no film details section", host.element().describe());
                return;
            };
            if let Err(err) = details.set("film", action_payload(event)) {
                log::error!("{err}");
            }
        })
        .build()
}

fn log_render(host: &Host, result: Result<(), RenderError>) {
    if let Err(err) = result {
        log::error!("rendering {} failed: {err}", host.element().describe());
    }
}

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;
use just_dom::Node;

use crate::case::{attr_to_prop, prop_to_attr};
use crate::class::TemplateSource;
use crate::error::ConfigError;
use crate::host::Host;
use crate::unit::{LifecycleHook, Unit, UnitSignature};
use crate::value::Value;

const TARGET: &str = "data-target";
const ACTION: &str = "data-action";

/// An element inside the shadow tree that an action's result is written to.
///
/// `<p data-target="save" data-target-attr="title">` writes the `title`
/// attribute; without `data-target-attr` the `data-target-prop` property
/// (`textContent` by default) is written.
#[derive(Clone)]
pub struct ActionTarget {
    pub target: Node,
    pub attr: Option<String>,
    pub prop: String,
}

impl ActionTarget {
    fn scrape(target: Node) -> Self {
        let attr = target.get_attribute(&format!("{TARGET}-attr"));
        let prop = target
            .get_attribute(&format!("{TARGET}-prop"))
            .filter(|prop| !prop.is_empty())
            .unwrap_or_else(|| "textContent".to_string());
        Self { target, attr, prop }
    }

    pub fn update(&self, value: impl Into<Value>) {
        let value = value.into();
        if let Some(attr) = &self.attr {
            self.target.set_attribute(attr, value.to_string());
            return;
        }
        if self.prop == "textContent" {
            self.target.set_text_content(&value.to_string());
            return;
        }
        match Host::from_node(&self.target) {
            Some(host) => {
                if let Err(err) = host.set(&self.prop, value) {
                    log::warn!("action target update failed: {err}");
                }
            }
            None => self
                .target
                .set_attribute(&prop_to_attr(&self.prop), value.to_string()),
        }
    }
}

impl fmt::Debug for ActionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTarget")
            .field("target", &self.target)
            .field("attr", &self.attr)
            .field("prop", &self.prop)
            .finish()
    }
}

/// Lookups scraped from a populated shadow root.
#[derive(Clone, Debug, Default)]
pub struct ShadowParts {
    pub root: Option<Node>,
    pub ids: IndexMap<String, Node>,
    pub slots: IndexMap<String, Node>,
    pub targets: IndexMap<String, ActionTarget>,
}

impl ShadowParts {
    fn scrape(root: &Node) -> Self {
        let mut parts = ShadowParts {
            root: Some(root.clone()),
            ..ShadowParts::default()
        };
        for node in root.descendants() {
            if let Some(id) = node.get_attribute("id") {
                parts.ids.insert(attr_to_prop(&id), node.clone());
            }
            if node.local_name() == Some("slot") {
                let name = node
                    .get_attribute("name")
                    .unwrap_or_else(|| "default".to_string());
                parts.slots.insert(attr_to_prop(&name), node.clone());
            }
            if let Some(action) = node.get_attribute(TARGET) {
                if parts.targets.contains_key(&action) {
                    log::warn!("duplicate action target '{action}', keeping the first");
                    continue;
                }
                parts.targets.insert(action, ActionTarget::scrape(node.clone()));
            }
        }
        parts
    }
}

enum ResolvedTemplate {
    Element(Node),
    Markup(String),
}

/// Attaches a shadow root populated from the component's template and
/// exposes its ids, slots and action targets on the host.
#[derive(Debug, Default)]
pub struct ShadowUnit {
    attached: bool,
}

impl ShadowUnit {
    /// Attaches while the element is constructed, so a template that cannot
    /// be applied fails the upgrade.
    pub fn signature() -> UnitSignature {
        UnitSignature::new(|host| {
            let attached = Self::attach(host)?;
            Ok(ShadowUnit { attached })
        })
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    fn resolve_template(host: &Host) -> Option<ResolvedTemplate> {
        let element = host.element();
        let document = element.owner_document()?;

        let inline = element.child_elements().into_iter().find(|child| {
            child.local_name() == Some("template") && child.has_attribute("is-shadow")
        });
        if let Some(template) = inline {
            return Some(ResolvedTemplate::Element(template));
        }

        let local_name = element.local_name().unwrap_or_default();
        let name = if local_name.contains('-') {
            Some(local_name.to_string())
        } else {
            element.get_attribute("is")
        };
        if let Some(template) = name.and_then(|name| document.get_element_by_id(&format!("{name}--template"))) {
            return Some(ResolvedTemplate::Element(template));
        }

        match host.class().resolved().template.clone()? {
            TemplateSource::Element(template) => Some(ResolvedTemplate::Element(template)),
            TemplateSource::Id(id) => match document.get_element_by_id(&id) {
                Some(template) => Some(ResolvedTemplate::Element(template)),
                None => {
                    log::warn!("template '#{id}' for {} not found", element.describe());
                    None
                }
            },
            TemplateSource::Markup(render) => Some(ResolvedTemplate::Markup(render(host, &document))),
        }
    }

    fn attach(host: &Host) -> Result<bool, ConfigError> {
        let Some(template) = Self::resolve_template(host) else {
            log::trace!("{} has no template, running unshadowed", host.element().describe());
            return Ok(false);
        };
        let mode = host.class().resolved().shadow_mode;
        let root = host.element().attach_shadow(mode)?;
        match template {
            ResolvedTemplate::Element(template) => {
                let source = template.template_content().unwrap_or(template);
                for child in source.children() {
                    root.append_child(&child.clone_node(true))?;
                }
            }
            ResolvedTemplate::Markup(markup) => root.set_inner_html(&markup)?,
        }
        bind_action_sources(host, &root);
        *host.instance().shadow.borrow_mut() = ShadowParts::scrape(&root);
        Ok(true)
    }
}

/// `<button data-action="save" data-action-on="click">` dispatches the
/// `save` action from the host when clicked.
fn bind_action_sources(host: &Host, root: &Node) {
    for source in root.elements_with_attribute(ACTION) {
        let Some(action) = source.get_attribute(ACTION) else {
            continue;
        };
        let event = source
            .get_attribute(&format!("{ACTION}-on"))
            .filter(|event| !event.is_empty())
            .unwrap_or_else(|| "click".to_string());
        let weak = host.downgrade();
        source.set_event_handler(&event, move |_event| {
            if let Some(host) = weak.upgrade() {
                host.dispatch_action(&action, Value::Null, None);
            }
        });
    }
}

impl Unit for ShadowUnit {
    fn on_init(&mut self, host: &Host) {
        if self.attached {
            host.invoke_lifecycle_hook(LifecycleHook::AttachShadow);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

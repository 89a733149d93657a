//! Custom element definitions, upgrades and reactions.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::DomError;
use crate::node::Node;

/// Callbacks the document delivers to an upgraded element.
pub trait ElementReactions: Any {
    fn connected(&self, _element: &Node) {}

    fn disconnected(&self, _element: &Node) {}

    fn adopted(&self, _element: &Node, _old_document: &Document, _new_document: &Document) {}

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Builds the per-element reactions object when an element is upgraded.
pub trait ElementConstructor {
    fn construct(&self, element: &Node) -> Result<Rc<dyn ElementReactions>, DomError>;
}

impl<F> ElementConstructor for F
where
    F: Fn(&Node) -> Result<Rc<dyn ElementReactions>, DomError>,
{
    fn construct(&self, element: &Node) -> Result<Rc<dyn ElementReactions>, DomError> {
        self(element)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DefineOptions {
    /// Built-in tag this definition customizes (`<nav is="page-nav">`).
    pub extends: Option<String>,
}

impl DefineOptions {
    pub fn extends(tag: impl Into<String>) -> Self {
        Self {
            extends: Some(tag.into()),
        }
    }
}

struct Definition {
    name: String,
    local_name: String,
    constructor: Rc<dyn ElementConstructor>,
}

#[derive(Default)]
pub(crate) struct ElementRegistry {
    definitions: RefCell<IndexMap<String, Rc<Definition>>>,
}

impl ElementRegistry {
    fn lookup(&self, element: &Node) -> Option<Rc<Definition>> {
        let local_name = element.local_name()?;
        let definitions = self.definitions.borrow();
        if let Some(definition) = definitions.get(local_name) {
            if definition.local_name == local_name {
                return Some(definition.clone());
            }
        }
        let is = element.get_attribute("is")?;
        definitions
            .get(&is)
            .filter(|definition| definition.local_name == local_name && definition.name != local_name)
            .cloned()
    }
}

const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Lowercase ASCII letter first, at least one `-`, and only lowercase
/// letters, digits, `-`, `.`, `_` or non-ASCII characters after that.
pub fn is_valid_custom_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_lowercase()
        && name.contains('-')
        && chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_') || !c.is_ascii()
        })
        && !RESERVED_NAMES.contains(&name)
}

impl Document {
    /// Registers `name` and upgrades the connected elements that match it.
    pub fn define(
        &self,
        name: &str,
        constructor: impl ElementConstructor + 'static,
        options: DefineOptions,
    ) -> Result<(), DomError> {
        if !is_valid_custom_element_name(name) {
            return Err(DomError::InvalidName {
                name: name.to_string(),
            });
        }
        let local_name = match options.extends {
            Some(extends) => {
                let extends = extends.to_ascii_lowercase();
                if extends.is_empty() || is_valid_custom_element_name(&extends) {
                    return Err(DomError::InvalidName { name: extends });
                }
                extends
            }
            None => name.to_string(),
        };
        {
            let mut definitions = self.inner().registry.definitions.borrow_mut();
            if definitions.contains_key(name) {
                return Err(DomError::AlreadyDefined {
                    name: name.to_string(),
                });
            }
            definitions.insert(
                name.to_string(),
                Rc::new(Definition {
                    name: name.to_string(),
                    local_name,
                    constructor: Rc::new(constructor),
                }),
            );
        }
        log::debug!("defined custom element '{name}'");

        let mut candidates = Vec::new();
        self.node().collect_shadow_including(&mut candidates);
        for node in candidates {
            match self.try_upgrade(&node) {
                Ok(true) if node.is_connected() => {
                    if let Some(reactions) = node.reactions() {
                        reactions.connected(&node);
                    }
                }
                Ok(_) => {}
                Err(err) => log::error!("{err}"),
            }
        }
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.inner().registry.definitions.borrow().contains_key(name)
    }

    /// Upgrades `node` when a definition matches it. Returns `Ok(false)` for
    /// nodes that are not elements, are already upgraded, previously failed,
    /// or have no definition.
    pub fn try_upgrade(&self, node: &Node) -> Result<bool, DomError> {
        if !node.is_element() || node.is_upgraded() || node.upgrade_failed() {
            return Ok(false);
        }
        let Some(definition) = self.inner().registry.lookup(node) else {
            return Ok(false);
        };
        match definition.constructor.construct(node) {
            Ok(reactions) => {
                node.set_reactions(reactions);
                log::trace!("upgraded {} as '{}'", node.describe(), definition.name);
                Ok(true)
            }
            Err(err) => {
                node.mark_upgrade_failed();
                Err(err)
            }
        }
    }
}

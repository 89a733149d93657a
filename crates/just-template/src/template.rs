use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use just_core::Value;
use just_dom::{Node, WeakNode};

use crate::error::RenderError;
use crate::strategy::{builtin_delegated, DelegatedStrategy, Strategy};

/// Hook attribute used when a template does not name its own.
pub const DEFAULT_HOOK: &str = "data-strategy";

/// Renders fragments from a source node and a data context.
///
/// The source is never mutated: every [`render`](Template::render) works on a
/// deep clone.
#[derive(Clone)]
pub struct Template {
    content: Node,
    source: Option<WeakNode>,
    hook: String,
    strategies: IndexMap<String, Strategy>,
    delegated: IndexMap<String, DelegatedStrategy>,
}

impl Template {
    /// Starts a template over `source`. A `<template>` element contributes
    /// its content, its `hook` attribute and, at render time, its parent.
    /// Any other node is rendered as a whole.
    pub fn builder(source: &Node) -> TemplateBuilder {
        let (content, owner) = match source.template_content() {
            Some(content) => (content, Some(source.downgrade())),
            None => (source.clone(), None),
        };
        let hook = owner
            .as_ref()
            .and(source.get_attribute("hook"))
            .filter(|hook| !hook.is_empty())
            .unwrap_or_else(|| DEFAULT_HOOK.to_string());
        TemplateBuilder {
            content,
            source: owner,
            hook,
            strategies: IndexMap::new(),
            delegated: builtin_delegated(),
        }
    }

    /// A template with only the built-in delegated strategies.
    pub fn from_element(source: &Node) -> Template {
        Self::builder(source).build()
    }

    pub fn hook(&self) -> &str {
        &self.hook
    }

    pub fn content(&self) -> &Node {
        &self.content
    }

    /// Parent of the `<template>` element this was built from.
    pub fn parent(&self) -> Option<Node> {
        self.source.as_ref()?.upgrade()?.parent_element()
    }

    pub fn has_strategy(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn delegated_attributes(&self) -> impl Iterator<Item = &str> {
        self.delegated.keys().map(String::as_str)
    }

    pub fn render(&self, context: &Value) -> Result<Node, RenderError> {
        let root = self.content.clone_node(true);
        let parent = self.parent();
        let segments = self.gather_segments(&root);
        log::trace!("rendering {} segment(s) with hook '{}'", segments.len(), self.hook);
        for segment in &segments {
            self.apply_segment(segment, context, parent.as_ref())?;
        }
        Ok(root)
    }

    fn gather_segments(&self, root: &Node) -> Vec<Node> {
        root.query_all(|node| node.is_element() && node.has_attribute(&self.hook))
    }

    fn apply_segment(
        &self,
        segment: &Node,
        context: &Value,
        parent: Option<&Node>,
    ) -> Result<(), RenderError> {
        let requested = segment
            .get_attribute(&self.hook)
            .filter(|name| !name.is_empty());
        match requested {
            Some(name) => {
                let Some(strategy) = self.strategies.get(&name) else {
                    return Err(RenderError::UnknownStrategy {
                        element: segment.local_name().unwrap_or_default().to_string(),
                        strategy: name,
                    });
                };
                strategy(segment, context, parent)?;
            }
            None => self.delegate(segment, context)?,
        }
        segment.remove_attribute(&self.hook);
        Ok(())
    }

    fn delegate(&self, segment: &Node, context: &Value) -> Result<(), RenderError> {
        for (name, strategy) in &self.delegated {
            let Some(value) = segment.get_attribute(name).filter(|value| !value.is_empty()) else {
                continue;
            };
            if strategy(segment, &value, context)? {
                segment.remove_attribute(name);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("hook", &self.hook)
            .field("strategies", &self.strategies.keys().collect::<Vec<_>>())
            .field("delegated", &self.delegated.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

pub struct TemplateBuilder {
    content: Node,
    source: Option<WeakNode>,
    hook: String,
    strategies: IndexMap<String, Strategy>,
    delegated: IndexMap<String, DelegatedStrategy>,
}

impl TemplateBuilder {
    pub fn hook(mut self, hook: impl Into<String>) -> Self {
        self.hook = hook.into();
        self
    }

    /// Registers the strategy a hook attribute value of `name` selects.
    pub fn strategy(
        mut self,
        name: impl Into<String>,
        strategy: impl Fn(&Node, &Value, Option<&Node>) -> Result<(), RenderError> + 'static,
    ) -> Self {
        self.strategies.insert(name.into(), Rc::new(strategy));
        self
    }

    /// Registers a delegated strategy keyed by `attribute`. Replaces the
    /// built-in strategy of the same name.
    pub fn delegated(
        mut self,
        attribute: impl Into<String>,
        strategy: impl Fn(&Node, &str, &Value) -> Result<bool, RenderError> + 'static,
    ) -> Self {
        self.delegated.insert(attribute.into(), Rc::new(strategy));
        self
    }

    pub fn build(self) -> Template {
        Template {
            content: self.content,
            source: self.source,
            hook: self.hook,
            strategies: self.strategies,
            delegated: self.delegated,
        }
    }
}

//! Element classes: the runtime "types" that mixins compose and documents
//! define.

use std::cell::{OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use just_dom::{Document, Event, ListenerOptions, Node, ShadowMode};

use crate::action::{ActionConfig, ActionHandler};
use crate::binding::{AttributeConfig, PropertyConfig};
use crate::collections::map::HashSet;
use crate::host::Host;
use crate::mixin::MixinId;
use crate::unit::{LifecycleHook, UnitSignature};
use crate::value::Value;

pub type ClassId = usize;

static NEXT_CLASS_ID: AtomicUsize = AtomicUsize::new(1);

pub type HostHook = Rc<dyn Fn(&Host)>;
pub type MarkupFn = Rc<dyn Fn(&Host, &Document) -> String>;

/// Where a class finds its shadow template when the document provides none.
#[derive(Clone)]
pub enum TemplateSource {
    /// A `<template>` (or any element whose children are copied).
    Element(Node),
    /// Id of an element looked up in the host's document.
    Id(String),
    /// Markup produced per instance.
    Markup(MarkupFn),
}

impl TemplateSource {
    pub fn markup(render: impl Fn(&Host, &Document) -> String + 'static) -> Self {
        TemplateSource::Markup(Rc::new(render))
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Element(node) => f.debug_tuple("Element").field(node).finish(),
            TemplateSource::Id(id) => f.debug_tuple("Id").field(id).finish(),
            TemplateSource::Markup(_) => f.write_str("Markup(..)"),
        }
    }
}

#[derive(Clone, Default)]
struct ClassDefinition {
    actions: IndexMap<String, ActionConfig>,
    attributes: IndexMap<String, AttributeConfig>,
    properties: IndexMap<String, PropertyConfig>,
    default_state: IndexMap<String, Value>,
    template: Option<TemplateSource>,
    shadow_mode: Option<ShadowMode>,
    units: Vec<UnitSignature>,
    hooks: IndexMap<LifecycleHook, HostHook>,
}

/// Configuration of a class after merging its ancestors, root first.
pub struct ResolvedClass {
    pub actions: IndexMap<String, ActionConfig>,
    pub attributes: IndexMap<String, AttributeConfig>,
    pub properties: IndexMap<String, PropertyConfig>,
    pub default_state: IndexMap<String, Value>,
    pub template: Option<TemplateSource>,
    pub shadow_mode: ShadowMode,
    pub units: Vec<UnitSignature>,
    pub hooks: IndexMap<LifecycleHook, HostHook>,
}

struct ClassInner {
    id: ClassId,
    name: String,
    parent: Option<ElementClass>,
    is_abstract: bool,
    extends_tag: Option<String>,
    identities: RefCell<HashSet<MixinId>>,
    definition: ClassDefinition,
    resolved: OnceCell<Rc<ResolvedClass>>,
}

/// Shared handle to an immutable class. Classes compare by identity.
#[derive(Clone)]
pub struct ElementClass {
    inner: Rc<ClassInner>,
}

impl ElementClass {
    /// A fresh root class with no declarations.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name.into(), None)
    }

    /// A root class standing for the host's generic element type.
    pub fn html_element() -> ElementClass {
        ElementClass::builder("HTMLElement").build()
    }

    /// A root class for a built-in tag, used as the base of customized
    /// built-ins (`<nav is="page-nav">`).
    pub fn builtin_element(tag: &str) -> ElementClass {
        ClassBuilder::new(format!("HTMLElement<{tag}>"), None)
            .extends_tag(tag)
            .build()
    }

    /// Starts a subclass. The subclass inherits identities and the extended
    /// tag.
    pub fn extend(&self, name: impl Into<String>) -> ClassBuilder {
        let mut builder = ClassBuilder::new(name.into(), Some(self.clone()));
        builder.extends_tag = self.inner.extends_tag.clone();
        builder
    }

    pub fn id(&self) -> ClassId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&ElementClass> {
        self.inner.parent.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.inner.is_abstract
    }

    pub fn extends_tag(&self) -> Option<&str> {
        self.inner.extends_tag.as_deref()
    }

    pub fn ptr_eq(&self, other: &ElementClass) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn has_identity(&self, identity: MixinId) -> bool {
        self.inner.identities.borrow().contains(&identity)
    }

    pub(crate) fn tag_identity(&self, identity: MixinId) {
        self.inner.identities.borrow_mut().insert(identity);
    }

    /// True when `self` is `ancestor` or derives from it.
    pub fn is_subclass_of(&self, ancestor: &ElementClass) -> bool {
        self.lineage().iter().any(|class| class.ptr_eq(ancestor))
    }

    /// This class followed by its ancestors.
    pub fn lineage(&self) -> Vec<ElementClass> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(ElementClass::parent).cloned() {
            chain.push(parent);
        }
        chain
    }

    /// Merged configuration. Maps are merged root to leaf with the most
    /// derived declaration winning, unit lists are concatenated root to leaf.
    pub fn resolved(&self) -> Rc<ResolvedClass> {
        self.inner
            .resolved
            .get_or_init(|| Rc::new(self.resolve()))
            .clone()
    }

    fn resolve(&self) -> ResolvedClass {
        let mut resolved = ResolvedClass {
            actions: IndexMap::new(),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            default_state: IndexMap::new(),
            template: None,
            shadow_mode: ShadowMode::Open,
            units: Vec::new(),
            hooks: IndexMap::new(),
        };
        let mut shadow_mode = None;
        for class in self.lineage().iter().rev() {
            let definition = &class.inner.definition;
            resolved.actions.extend(definition.actions.clone());
            resolved.attributes.extend(definition.attributes.clone());
            resolved.properties.extend(definition.properties.clone());
            resolved.default_state.extend(definition.default_state.clone());
            resolved.units.extend(definition.units.iter().cloned());
            resolved.hooks.extend(definition.hooks.clone());
            if definition.template.is_some() {
                resolved.template = definition.template.clone();
            }
            if definition.shadow_mode.is_some() {
                shadow_mode = definition.shadow_mode;
            }
        }
        resolved.shadow_mode = shadow_mode.unwrap_or_default();
        resolved
    }
}

impl PartialEq for ElementClass {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ElementClass {}

impl fmt::Debug for ElementClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementClass")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("parent", &self.parent().map(ElementClass::name))
            .field("abstract", &self.inner.is_abstract)
            .finish()
    }
}

/// Declarative configuration of a class.
pub struct ClassBuilder {
    name: String,
    parent: Option<ElementClass>,
    is_abstract: bool,
    extends_tag: Option<String>,
    definition: ClassDefinition,
}

impl ClassBuilder {
    fn new(name: String, parent: Option<ElementClass>) -> Self {
        Self {
            name,
            parent,
            is_abstract: false,
            extends_tag: None,
            definition: ClassDefinition::default(),
        }
    }

    pub fn action(self, event: &str, handler: impl Fn(&Event, &Host) + 'static) -> Self {
        self.action_with(event, handler, ListenerOptions::default())
    }

    pub fn action_with(
        mut self,
        event: &str,
        handler: impl Fn(&Event, &Host) + 'static,
        options: ListenerOptions,
    ) -> Self {
        let handler: ActionHandler = Rc::new(handler);
        self.definition
            .actions
            .insert(event.to_string(), ActionConfig { handler, options });
        self
    }

    pub fn attribute(mut self, property: &str, config: AttributeConfig) -> Self {
        self.definition
            .attributes
            .insert(property.to_string(), config);
        self
    }

    pub fn property(mut self, property: &str, config: PropertyConfig) -> Self {
        self.definition
            .properties
            .insert(property.to_string(), config);
        self
    }

    pub fn default_state(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.definition
            .default_state
            .insert(key.to_string(), value.into());
        self
    }

    pub fn template(mut self, source: TemplateSource) -> Self {
        self.definition.template = Some(source);
        self
    }

    pub fn shadow_mode(mut self, mode: ShadowMode) -> Self {
        self.definition.shadow_mode = Some(mode);
        self
    }

    pub fn unit(mut self, signature: UnitSignature) -> Self {
        self.definition.units.push(signature);
        self
    }

    pub fn hook(mut self, hook: LifecycleHook, callback: impl Fn(&Host) + 'static) -> Self {
        self.definition.hooks.insert(hook, Rc::new(callback));
        self
    }

    pub fn on_init(self, callback: impl Fn(&Host) + 'static) -> Self {
        self.hook(LifecycleHook::Init, callback)
    }

    pub fn on_connect(self, callback: impl Fn(&Host) + 'static) -> Self {
        self.hook(LifecycleHook::Connect, callback)
    }

    pub fn on_disconnect(self, callback: impl Fn(&Host) + 'static) -> Self {
        self.hook(LifecycleHook::Disconnect, callback)
    }

    pub fn on_adopted(self, callback: impl Fn(&Host) + 'static) -> Self {
        self.hook(LifecycleHook::Adopted, callback)
    }

    pub fn on_attach_shadow(self, callback: impl Fn(&Host) + 'static) -> Self {
        self.hook(LifecycleHook::AttachShadow, callback)
    }

    /// Marks the class as uninstantiable; only subclasses can be defined.
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub(crate) fn extends_tag(mut self, tag: &str) -> Self {
        self.extends_tag = Some(tag.to_ascii_lowercase());
        self
    }

    pub fn build(self) -> ElementClass {
        let identities = self
            .parent
            .as_ref()
            .map(|parent| parent.inner.identities.borrow().clone())
            .unwrap_or_default();
        ElementClass {
            inner: Rc::new(ClassInner {
                id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
                name: self.name,
                parent: self.parent,
                is_abstract: self.is_abstract,
                extends_tag: self.extends_tag,
                identities: RefCell::new(identities),
                definition: self.definition,
                resolved: OnceCell::new(),
            }),
        }
    }
}

//! Attribute and property binding: configuration plus the host-side
//! getter/setter pipeline.

use std::fmt;
use std::rc::Rc;

use crate::case::prop_to_attr;
use crate::error::BindingError;
use crate::host::Host;
use crate::transform::{Transform, Transformed};
use crate::value::Value;

pub type ChangeHandler = Rc<dyn Fn(&Host, &Value, &Value)>;
pub type BindGetter = Rc<dyn Fn(&Host) -> Value>;
pub type BindSetter = Rc<dyn Fn(&Host, Value) -> Result<(), BindingError>>;

/// Custom accessor pair replacing the default state read and attribute
/// write of a bound property.
#[derive(Clone, Default)]
pub struct Binding {
    pub get: Option<BindGetter>,
    pub set: Option<BindSetter>,
}

impl Binding {
    pub fn getter(mut self, get: impl Fn(&Host) -> Value + 'static) -> Self {
        self.get = Some(Rc::new(get));
        self
    }

    pub fn setter(mut self, set: impl Fn(&Host, Value) -> Result<(), BindingError> + 'static) -> Self {
        self.set = Some(Rc::new(set));
        self
    }
}

/// Configuration of one attribute-backed property.
#[derive(Clone, Default)]
pub struct AttributeConfig {
    pub default: Option<Value>,
    pub transform: Option<Rc<dyn Transform>>,
    pub bind: Option<Binding>,
    pub on_change: Option<ChangeHandler>,
}

impl AttributeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn transform(mut self, transform: Rc<dyn Transform>) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn bind(mut self, binding: Binding) -> Self {
        self.bind = Some(binding);
        self
    }

    pub fn on_change(mut self, handler: impl Fn(&Host, &Value, &Value) + 'static) -> Self {
        self.on_change = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for AttributeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeConfig")
            .field("default", &self.default)
            .field("transform", &self.transform.as_ref().map(|t| t.type_for().to_string()))
            .field("bind", &self.bind.is_some())
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Configuration of one state-only property.
#[derive(Clone, Default)]
pub struct PropertyConfig {
    pub default: Option<Value>,
    pub on_change: Option<ChangeHandler>,
}

impl PropertyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn on_change(mut self, handler: impl Fn(&Host, &Value, &Value) + 'static) -> Self {
        self.on_change = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for PropertyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyConfig")
            .field("default", &self.default)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl Host {
    /// Reads a bound property: the custom getter if any, else the cached
    /// state value, else `Null`.
    pub fn get(&self, property: &str) -> Value {
        let resolved = self.class().resolved();
        if let Some(get) = resolved
            .attributes
            .get(property)
            .and_then(|config| config.bind.as_ref())
            .and_then(|binding| binding.get.clone())
        {
            return get(self);
        }
        self.state().get(property).unwrap_or_default()
    }

    /// Writes a bound property.
    ///
    /// Attribute-backed properties serialize into their attribute (or go
    /// through the custom setter); the state write and `on_change` follow
    /// when the attribute observer delivers the mutation. State-only
    /// properties are stored immediately and fire `on_change` synchronously.
    pub fn set(&self, property: &str, value: impl Into<Value>) -> Result<(), BindingError> {
        let value = value.into();
        let resolved = self.class().resolved();
        if let Some(config) = resolved.attributes.get(property).cloned() {
            return self.write_attribute(property, &config, value);
        }
        if let Some(config) = resolved.properties.get(property).cloned() {
            self.set_property(property, &config, value);
            return Ok(());
        }
        Err(BindingError::UnknownProperty {
            element: self.element().describe(),
            property: property.to_string(),
        })
    }

    fn write_attribute(
        &self,
        property: &str,
        config: &AttributeConfig,
        value: Value,
    ) -> Result<(), BindingError> {
        if let Some(set) = config.bind.as_ref().and_then(|binding| binding.set.clone()) {
            return set(self, value);
        }
        let attribute = prop_to_attr(property);
        let serialized = match &config.transform {
            Some(transform) => match transform.serialize(&value) {
                Transformed::Valid(text) => Some(text),
                Transformed::Invalid => {
                    return Err(BindingError::InvalidValue {
                        property: property.to_string(),
                        value: format!("{value:?}"),
                    })
                }
            },
            None if value.is_missing() => None,
            None => Some(value.to_string()),
        };
        match serialized {
            Some(text) => self.element().set_attribute(&attribute, text),
            None => {
                self.element().remove_attribute(&attribute);
            }
        }
        Ok(())
    }

    pub(crate) fn set_property(&self, property: &str, config: &PropertyConfig, value: Value) {
        let old = self.state().set(property, value.clone()).unwrap_or_default();
        if let Some(on_change) = config.on_change.clone() {
            on_change(self, &value, &old);
        }
    }

    /// Stores the value a new attribute string maps to and notifies
    /// `on_change`. `raw` is `None` when the attribute was removed.
    pub(crate) fn apply_attribute_change(
        &self,
        property: &str,
        config: &AttributeConfig,
        raw: Option<&str>,
    ) {
        let raw = raw.map(Value::from).unwrap_or_default();
        let value = match &config.transform {
            Some(transform) => transform.extract(&raw).into_value(),
            None => raw,
        };
        log::trace!("{}.{property} = {value:?}", self.element().describe());
        let old = self.state().set(property, value.clone()).unwrap_or_default();
        if let Some(on_change) = config.on_change.clone() {
            on_change(self, &value, &old);
        }
    }
}

//! Composition and lifecycle runtime for custom elements: mixins, units,
//! attribute binding and transforms on top of `just-dom`.

pub mod action;
pub mod binding;
pub mod case;
pub mod class;
pub mod collections;
pub mod error;
pub mod host;
mod lifecycle;
pub mod mixin;
pub mod runtime;
pub mod state;
pub mod transform;
pub mod unit;
pub mod units;
pub mod value;

pub use action::{action_payload, dispatch_action, ActionConfig, ActionHandler, ActionOptions};
pub use binding::{AttributeConfig, Binding, ChangeHandler, PropertyConfig};
pub use case::{attr_to_prop, prop_to_attr};
pub use class::{ClassBuilder, ClassId, ElementClass, HostHook, ResolvedClass, TemplateSource};
pub use error::{BindingError, ConfigError, TransformError};
pub use host::{Host, WeakHost};
pub use mixin::{Mix, Mixin, MixinId, MixinRegistry};
pub use runtime::{BuiltinMixins, Runtime};
pub use state::StateStore;
pub use transform::{
    BooleanTransform, DateTransform, NumberTransform, StringTransform, Transform, TransformRegistry,
    Transformed,
};
pub use unit::{LifecycleHook, Unit, UnitContainer, UnitSignature};
pub use units::{ActionTarget, ActionUnit, AttributeUnit, ShadowUnit};
pub use value::Value;

pub use just_dom;

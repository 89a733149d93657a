use just_dom::DomError;
use thiserror::Error;

/// Problems in a component's declaration, raised when it is composed,
/// defined or constructed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("class '{class}' is abstract and cannot be defined or constructed")]
    AbstractClass { class: String },

    #[error("class '{class}' does not carry the core identity; compose it from `Runtime::core_element`")]
    MissingCoreIdentity { class: String },

    #[error("class '{class}' requires extends {expected:?} but was defined with extends {found:?}")]
    MissingExtends {
        class: String,
        expected: Option<String>,
        found: Option<String>,
    },

    #[error("'{tag}' is not a valid custom element tag")]
    InvalidTagName { tag: String },

    #[error("mixin '{mixin}' re-entered its own composition on class '{class}'")]
    CyclicMixin { mixin: String, class: String },

    #[error("mixin '{mixin}' requires '{required}' on class '{class}'")]
    MissingRequirement {
        mixin: String,
        required: String,
        class: String,
    },

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Dom(#[from] DomError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("no transform registered for type '{type_for}'")]
    NotFound { type_for: String },
}

/// Failures of bound property writes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("value {value} cannot be serialized for property '{property}'")]
    InvalidValue { property: String, value: String },

    #[error("<{element}> has no property '{property}'")]
    UnknownProperty { element: String, property: String },
}

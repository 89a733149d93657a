//! Built-in units contributed by the runtime's mixins.

pub mod actions;
pub mod attributes;
pub mod shadow;

pub use actions::ActionUnit;
pub use attributes::AttributeUnit;
pub use shadow::{ActionTarget, ShadowUnit};

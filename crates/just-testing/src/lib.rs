//! Testing utilities and harness for the just component runtime

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use just_core::{
        AttributeConfig, ElementClass, Host, LifecycleHook, PropertyConfig, Runtime, Value,
    };
    pub use just_dom::{DefineOptions, Document, Node};
}

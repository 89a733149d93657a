//! In-memory host element tree used by the Just component runtime.
//!
//! Provides the pieces a custom element runtime needs from its platform:
//! nodes with attributes, shadow roots and `<template>` contents, event
//! dispatch, deferred mutation observers, and a custom element registry that
//! upgrades elements and delivers connect/disconnect/adopt reactions.

mod document;
mod error;
mod event;
pub mod markup;
mod mutation;
mod node;
mod registry;

pub use document::Document;
pub use error::DomError;
pub use event::{Event, EventInit, EventPhase, ListenerId, ListenerOptions};
pub use mutation::{MutationKind, MutationObserver, MutationRecord, ObserveOptions};
pub use node::{Node, NodeId, NodeKind, ShadowMode, WeakNode};
pub use registry::{
    is_valid_custom_element_name, DefineOptions, ElementConstructor, ElementReactions,
};

#[cfg(test)]
#[path = "tests/dom_tests.rs"]
mod tests;

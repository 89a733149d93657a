//! Template rendering for just components.
//!
//! A [`Template`] clones its content, finds the segments marked with the
//! hook attribute (or with a delegated strategy's attribute), and hands each
//! one to the strategy it names.

mod error;
pub mod strategy;
mod template;

pub use error::RenderError;
pub use strategy::{DelegatedStrategy, Strategy};
pub use template::{Template, TemplateBuilder, DEFAULT_HOOK};

#[cfg(test)]
#[path = "tests/template_tests.rs"]
mod tests;

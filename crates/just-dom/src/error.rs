use thiserror::Error;

use crate::NodeId;

/// Errors raised by tree mutations and element registration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("'{name}' is not a valid custom element name")]
    InvalidName { name: String },

    #[error("custom element '{name}' has already been defined")]
    AlreadyDefined { name: String },

    #[error("cannot insert {child} into {parent}")]
    HierarchyRequest { parent: String, child: String },

    #[error("node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("<{element}> already hosts a shadow root")]
    ShadowRootExists { element: String },

    #[error("{node} cannot host a shadow root")]
    NotShadowHost { node: String },

    #[error("malformed markup at byte {offset}: {message}")]
    Markup { offset: usize, message: String },

    #[error("failed to construct <{element}>: {message}")]
    Construct { element: String, message: String },
}

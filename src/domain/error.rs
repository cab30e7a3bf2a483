//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Node errors represent structural violations of the tree model.
/// A missing index path is not an error; lookups that can legitimately fail
/// return `Option` instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("cycle detected in parent chain at: {0}")]
    CycleDetected(NodeId),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("leaf node cannot hold children: {0}")]
    LeafCannotHaveChildren(NodeId),

    #[error("node still holds children, cannot become a leaf: {0}")]
    LeafWithChildren(NodeId),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("attribute {key} expects a {expected} value")]
    AttributeType { key: String, expected: &'static str },

    #[error("drop target is one of or inside the dragged nodes: {0}")]
    InvalidDrop(NodeId),

    #[error("node listed more than once among children: {0}")]
    DuplicateChild(NodeId),
}

impl NodeError {
    /// Create an encoding error from anything printable.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::EncodingError(message.into())
    }
}

/// Result type for node operations.
pub type NodeResult<T> = Result<T, NodeError>;

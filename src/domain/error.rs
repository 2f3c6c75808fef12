//! Domain-level errors

use thiserror::Error;

use crate::domain::arena::NodeId;

/// Structural errors: an edit or access that would break the tree invariants.
///
/// Returned before any child list is touched, so the tree is left as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("node {0} does not exist in this tree")]
    UnknownNode(NodeId),

    #[error("child index {index} out of range for a node with {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("node {node} cannot become a child of {parent}: cycle in hierarchy")]
    CyclicParent { node: NodeId, parent: NodeId },

    #[error("node {0} is still attached to a parent")]
    StillAttached(NodeId),

    #[error("builder: {0}")]
    Builder(#[from] BuilderError),
}

/// Misuse of the fluent builder, kept apart from plain navigation misses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error("no tree to edit, start with a root")]
    NotStarted,

    #[error("cursor does not point at a node")]
    NoCurrentNode,

    #[error("the root node has no parent")]
    RootHasNoParent,

    #[error("destination path does not resolve: {0}")]
    UnresolvedPath(String),
}

/// Text that does not spell an absolute path such as `/0/2`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid absolute path {input:?}: {reason}")]
pub struct PathParseError {
    pub input: String,
    pub reason: String,
}

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

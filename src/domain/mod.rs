//! Domain layer: the tree core
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod builder;
pub mod cursor;
pub mod error;
pub mod immutable;
pub mod mapper;
pub mod modification;
pub mod mutable;
pub mod path;
pub mod semantics;
pub mod snapshot;
pub mod tree;

pub use arena::{NodeArena, NodeId, TreeNode};
pub use builder::TreeBuilder;
pub use cursor::TreeCursor;
pub use error::{BuilderError, PathParseError, TreeError, TreeResult};
pub use immutable::{ImmutableNodeFactory, ImmutableTree};
pub use mapper::{Mapper, NodeFactory};
pub use modification::{MoveNode, TreeModification, TreeTransformation};
pub use mutable::{MutableNodeFactory, MutableTree};
pub use path::{AbsolutePath, PathStep, TreePath};
pub use semantics::Semantics;
pub use snapshot::SnapshotHistory;
pub use tree::Tree;

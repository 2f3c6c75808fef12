//! Generic semantic trees.
//!
//! Nodes carry a caller-supplied [`Semantics`] payload. A tree is either an
//! [`ImmutableTree`], safe to share and caching derived properties, or a
//! [`MutableTree`] edited in place. Both implement [`Tree`], are addressed by
//! [`AbsolutePath`]s and convert into each other through a [`Mapper`]. The
//! [`TreeBuilder`] edits trees around a cursor, and every published tree
//! carries the [`SnapshotHistory`] of its earlier versions.

pub mod config;
pub mod domain;
pub mod tree_traits;
pub mod util;

pub use config::{Settings, SettingsError};
pub use domain::{
    AbsolutePath, BuilderError, ImmutableTree, Mapper, MoveNode, MutableTree, NodeFactory, NodeId,
    PathStep, Semantics, SnapshotHistory, Tree, TreeBuilder, TreeCursor, TreeError,
    TreeModification, TreePath, TreeResult, TreeTransformation,
};
pub use tree_traits::TreeNodeConvert;

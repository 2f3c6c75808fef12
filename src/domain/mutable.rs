//! Trees edited in place.

use std::fmt;
use std::mem;

use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::mapper::{Mapper, NodeFactory};
use crate::domain::semantics::Semantics;
use crate::domain::snapshot::SnapshotHistory;
use crate::domain::tree::Tree;

/// A tree supporting structural edits.
///
/// Detached nodes stay in the arena as independent roots until they are
/// attached again or pruned. Every edit validates its arguments before
/// touching any child list, so a rejected edit leaves the tree unchanged.
pub struct MutableTree<S> {
    arena: NodeArena<S>,
    root: NodeId,
    history: SnapshotHistory<S>,
}

impl<S: Semantics> MutableTree<S> {
    pub fn mapper() -> Mapper<MutableNodeFactory<S>> {
        Mapper::new()
    }

    pub fn node_factory() -> MutableNodeFactory<S> {
        MutableNodeFactory::default()
    }

    /// Single-node tree whose history holds its own first version.
    pub fn new(root_semantics: S) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.insert_node(root_semantics, None);
        arena.bind(root);
        Self::with_history(arena, root, SnapshotHistory::empty())
    }

    /// Tree that records no version of itself.
    pub(crate) fn working(arena: NodeArena<S>, root: NodeId) -> Self {
        Self {
            arena,
            root,
            history: SnapshotHistory::empty(),
        }
    }

    fn with_history(arena: NodeArena<S>, root: NodeId, history: SnapshotHistory<S>) -> Self {
        let mut tree = Self::working(arena, root);
        tree.history = history.capture(&tree);
        tree
    }

    /// Creates a detached node in this tree's arena.
    pub fn create_node(&mut self, semantics: S) -> NodeId {
        let id = self.arena.insert_node(semantics, None);
        self.arena.bind(id);
        id
    }

    /// Creates a node appended below `parent`.
    pub fn add_child(&mut self, parent: NodeId, semantics: S) -> TreeResult<NodeId> {
        let index = self.arena.get_node(parent).map_or(0, |n| n.children().len());
        self.add_child_at(parent, semantics, index)
    }

    /// Creates a node below `parent` at `index`.
    pub fn add_child_at(&mut self, parent: NodeId, semantics: S, index: usize) -> TreeResult<NodeId> {
        let len = self
            .arena
            .get_node(parent)
            .ok_or(TreeError::UnknownNode(parent))?
            .children()
            .len();
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        let child = self.create_node(semantics);
        self.set_parent(child, Some(parent), index)?;
        Ok(child)
    }

    /// Moves `child` with its subtree below `parent` at `index`.
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: usize) -> TreeResult<bool> {
        self.set_parent(child, Some(parent), index)
    }

    /// Moves `child` with its subtree to the last slot of `parent`.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<bool> {
        let parent_node = self
            .arena
            .get_node(parent)
            .ok_or(TreeError::UnknownNode(parent))?;
        let already_child = parent_node.children().contains(&child);
        let index = parent_node.children().len() - usize::from(already_child);
        self.set_parent(child, Some(parent), index)
    }

    /// Detaches the child of `parent` at `index`, if there is one.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> TreeResult<Option<NodeId>> {
        let child = self
            .arena
            .get_node(parent)
            .ok_or(TreeError::UnknownNode(parent))?
            .children()
            .get(index)
            .copied();
        match child {
            Some(child) => {
                self.detach(child)?;
                Ok(Some(child))
            }
            None => Ok(None),
        }
    }

    /// Makes `node` an independent root.
    pub fn detach(&mut self, node: NodeId) -> TreeResult<bool> {
        self.set_parent(node, None, 0)
    }

    /// Reparents the whole subtree of `node` below `parent` at `index`, or
    /// turns it into an independent root when `parent` is `None`.
    ///
    /// Returns `false` when the node already sits at that slot. When the tree
    /// root is attached below another node, the top of the new hierarchy
    /// becomes the root.
    #[instrument(level = "trace", skip(self))]
    pub fn set_parent(
        &mut self,
        node: NodeId,
        parent: Option<NodeId>,
        index: usize,
    ) -> TreeResult<bool> {
        let moved = self.arena.get_node(node).ok_or(TreeError::UnknownNode(node))?;
        let (current_parent, is_leaf) = (moved.parent(), moved.is_leaf());

        let Some(parent) = parent else {
            if current_parent.is_none() {
                return Ok(false);
            }
            self.arena.detach(node);
            self.arena.refresh_depths(node);
            debug!(%node, "detached subtree");
            return Ok(true);
        };

        let siblings = self
            .arena
            .get_node(parent)
            .ok_or(TreeError::UnknownNode(parent))?
            .children()
            .len();
        if current_parent == Some(parent) && self.arena.child_index(node) == Some(index) {
            return Ok(false);
        }
        // A leaf is nobody's ancestor
        if parent == node || (!is_leaf && self.arena.is_ancestor(node, parent)) {
            return Err(TreeError::CyclicParent { node, parent });
        }
        let len = siblings - usize::from(current_parent == Some(parent));
        if index > len {
            return Err(TreeError::IndexOutOfRange { index, len });
        }

        self.arena.detach(node);
        self.arena.attach(node, parent, index);
        self.arena.refresh_depths(node);
        if node == self.root {
            self.root = self.arena.root_of(parent).unwrap_or(parent);
        }
        debug!(%node, %parent, index, "moved subtree");
        Ok(true)
    }

    /// Frees a detached subtree, returning the number of removed nodes.
    ///
    /// The tree root counts as attached.
    pub fn prune(&mut self, node: NodeId) -> TreeResult<usize> {
        let attached = self
            .arena
            .get_node(node)
            .ok_or(TreeError::UnknownNode(node))?
            .parent()
            .is_some();
        if attached || node == self.root {
            return Err(TreeError::StillAttached(node));
        }

        let removed = self.arena.remove_subtree(node);
        debug!(%node, removed, "pruned subtree");
        Ok(removed)
    }

    /// Copies the subtree of `source` below `node` into this arena as a
    /// detached root.
    pub fn graft<T>(&mut self, source: &T, node: NodeId) -> TreeResult<NodeId>
    where
        T: Tree<S> + ?Sized,
    {
        let mut factory = MutableNodeFactory {
            arena: mem::take(&mut self.arena),
        };
        let grafted = Self::mapper().build_into(&mut factory, source, node);
        self.arena = factory.arena;
        grafted.ok_or(TreeError::UnknownNode(node))
    }

    /// Nodes of this arena that are not reachable from the root.
    pub fn detached_roots(&self) -> Vec<NodeId> {
        self.arena
            .ids()
            .filter(|&id| id != self.root)
            .filter(|&id| self.arena.get_node(id).is_some_and(|n| n.is_root()))
            .collect()
    }
}

impl<S: Semantics> Tree<S> for MutableTree<S> {
    fn arena(&self) -> &NodeArena<S> {
        &self.arena
    }

    fn root(&self) -> NodeId {
        self.root
    }

    fn history(&self) -> &SnapshotHistory<S> {
        &self.history
    }

    fn copy(&self) -> Self {
        Self::mapper().map(self)
    }
}

impl<S: Semantics> fmt::Debug for MutableTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableTree")
            .field("root", &self.root)
            .field("nodes", &self.as_map())
            .field("snapshots", &self.history.len())
            .finish()
    }
}

/// Builds the nodes of a [`MutableTree`].
#[derive(Debug)]
pub struct MutableNodeFactory<S> {
    arena: NodeArena<S>,
}

impl<S> Default for MutableNodeFactory<S> {
    fn default() -> Self {
        Self {
            arena: NodeArena::new(),
        }
    }
}

impl<S: Semantics> MutableNodeFactory<S> {
    /// Publishes the nodes as a working tree without history.
    pub(crate) fn into_working(self, root: NodeId) -> MutableTree<S> {
        MutableTree::working(self.arena, root)
    }
}

impl<S: Semantics> NodeFactory for MutableNodeFactory<S> {
    type Semantics = S;
    type Tree = MutableTree<S>;

    fn create_node(&mut self, parent: Option<NodeId>, children: Vec<NodeId>, semantics: S) -> NodeId {
        self.arena.create_node(parent, children, semantics)
    }

    fn bind(&mut self, node: NodeId) {
        self.arena.bind(node);
    }

    fn into_tree(self, root: NodeId, history: SnapshotHistory<S>) -> MutableTree<S> {
        MutableTree::with_history(self.arena, root, history)
    }
}

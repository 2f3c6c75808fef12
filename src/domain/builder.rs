//! Fluent, cursor-driven construction and editing of trees.
//!
//! ```text
//! R -|- A - C        builder.root("R")
//!    |- B              .add_child("A")?.add_child("B")?
//!                      .go_to_first_child().add_child("C")?
//! ```

use std::fmt;

use tracing::debug;

use crate::config::Settings;
use crate::domain::arena::NodeId;
use crate::domain::cursor::TreeCursor;
use crate::domain::error::{BuilderError, TreeError, TreeResult};
use crate::domain::immutable::ImmutableTree;
use crate::domain::mapper::{Mapper, NodeFactory};
use crate::domain::mutable::MutableTree;
use crate::domain::path::{AbsolutePath, TreePath};
use crate::domain::semantics::Semantics;
use crate::domain::snapshot::SnapshotHistory;
use crate::domain::tree::Tree;

/// Where a new node goes relative to the cursor.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Child(Option<usize>),
    LeftSibling,
    RightSibling,
}

/// Edits a mutable working tree around a [`TreeCursor`].
///
/// Edits leave the cursor on the node it was at, with two exceptions:
/// [`remove_subtree`](Self::remove_subtree) moves it to the former parent,
/// and a failed navigation leaves it invalid. Sibling insertions keep the
/// cursor on the original node as well.
///
/// The history carried into [`build`](Self::build) is the history of the tree
/// the builder started from, including that tree itself.
pub struct TreeBuilder<S> {
    tree: Option<MutableTree<S>>,
    cursor: TreeCursor,
    history: SnapshotHistory<S>,
}

impl<S: Semantics> fmt::Debug for TreeBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("tree", &self.tree)
            .field("cursor", &self.cursor)
            .field("snapshots", &self.history.len())
            .finish()
    }
}

impl<S: Semantics> Default for TreeBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Semantics> TreeBuilder<S> {
    /// Builder without a working tree; start with [`root`](Self::root).
    pub fn new() -> Self {
        Self {
            tree: None,
            cursor: TreeCursor::default(),
            history: SnapshotHistory::empty(),
        }
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            history: SnapshotHistory::with_limit(settings.history.max_snapshots),
            ..Self::new()
        }
    }

    /// Builder with a single root node in focus.
    pub fn tree(root_semantics: S) -> Self {
        let mut builder = Self::new();
        builder.root(root_semantics);
        builder
    }

    /// Builder editing a mutable copy of `tree`, focused on its root.
    pub fn from_tree<T>(tree: &T) -> Self
    where
        T: Tree<S> + ?Sized,
    {
        let (factory, root) = MutableTree::mapper().build_root(tree);
        debug!(nodes = tree.node_count(), "builder started from tree");
        Self {
            tree: Some(factory.into_working(root)),
            cursor: TreeCursor::at(root),
            history: tree.history().capture(tree),
        }
    }

    /// Discards the working tree and starts over with a fresh root.
    ///
    /// Versions carried over from a previous tree are dropped as well; the
    /// history limit stays.
    pub fn root(&mut self, semantics: S) -> &mut Self {
        self.history = SnapshotHistory::with_limit(self.history.limit());
        let mut factory = MutableTree::node_factory();
        let root = factory.create_detached(semantics);
        factory.bind(root);
        self.tree = Some(factory.into_working(root));
        self.cursor = TreeCursor::at(root);
        self
    }

    // ========================================================================
    // Edits
    // ========================================================================

    pub fn add_child(&mut self, semantics: S) -> TreeResult<&mut Self> {
        self.insert(Slot::Child(None), |tree| Ok(tree.create_node(semantics)))
    }

    pub fn add_child_at(&mut self, semantics: S, index: usize) -> TreeResult<&mut Self> {
        self.insert(Slot::Child(Some(index)), |tree| Ok(tree.create_node(semantics)))
    }

    /// Appends a copy of `subtree` below the current node.
    pub fn add_subtree<T>(&mut self, subtree: &T) -> TreeResult<&mut Self>
    where
        T: Tree<S> + ?Sized,
    {
        self.insert(Slot::Child(None), |tree| tree.graft(subtree, subtree.root()))
    }

    pub fn add_subtree_at<T>(&mut self, subtree: &T, index: usize) -> TreeResult<&mut Self>
    where
        T: Tree<S> + ?Sized,
    {
        self.insert(Slot::Child(Some(index)), |tree| {
            tree.graft(subtree, subtree.root())
        })
    }

    pub fn add_left_sibling(&mut self, semantics: S) -> TreeResult<&mut Self> {
        self.insert(Slot::LeftSibling, |tree| Ok(tree.create_node(semantics)))
    }

    pub fn add_right_sibling(&mut self, semantics: S) -> TreeResult<&mut Self> {
        self.insert(Slot::RightSibling, |tree| Ok(tree.create_node(semantics)))
    }

    pub fn add_left_sibling_subtree<T>(&mut self, subtree: &T) -> TreeResult<&mut Self>
    where
        T: Tree<S> + ?Sized,
    {
        self.insert(Slot::LeftSibling, |tree| tree.graft(subtree, subtree.root()))
    }

    pub fn add_right_sibling_subtree<T>(&mut self, subtree: &T) -> TreeResult<&mut Self>
    where
        T: Tree<S> + ?Sized,
    {
        self.insert(Slot::RightSibling, |tree| tree.graft(subtree, subtree.root()))
    }

    /// Removes the current node with its descendants; the cursor moves to
    /// the former parent.
    pub fn remove_subtree(&mut self) -> TreeResult<&mut Self> {
        let (tree, current) = self.session()?;
        let parent = tree.parent(current).ok_or(BuilderError::RootHasNoParent)?;
        tree.detach(current)?;
        let removed = tree.prune(current)?;
        debug!(%current, removed, "removed subtree");
        self.cursor.go_to_node(parent);
        Ok(self)
    }

    /// Puts a new node between the current node and its parent, in the slot
    /// the current node occupied. At the root, the new node becomes the root.
    pub fn insert_parent(&mut self, semantics: S) -> TreeResult<&mut Self> {
        let (tree, current) = self.session()?;
        let inserted = tree.create_node(semantics);
        if let Some(parent) = tree.parent(current) {
            let index = tree
                .child_index(current)
                .ok_or(TreeError::UnknownNode(current))?;
            tree.insert_child(parent, inserted, index)?;
        }
        tree.insert_child(inserted, current, 0)?;
        debug!(%current, %inserted, "inserted parent");
        Ok(self)
    }

    /// Moves the current node below the node at `path` relative to it.
    ///
    /// Without an index the node is appended, unless it already is a child of
    /// the destination, in which case nothing changes.
    pub fn move_by(&mut self, path: &TreePath) -> TreeResult<&mut Self> {
        self.move_by_at(path, None)
    }

    pub fn move_by_at(&mut self, path: &TreePath, index: Option<usize>) -> TreeResult<&mut Self> {
        self.move_current(
            |tree, current| path.follow_from(tree, current),
            path.to_string(),
            index,
        )
    }

    /// Moves the current node below the node at the absolute `path`.
    pub fn move_to(&mut self, path: &AbsolutePath) -> TreeResult<&mut Self> {
        self.move_to_at(path, None)
    }

    pub fn move_to_at(&mut self, path: &AbsolutePath, index: Option<usize>) -> TreeResult<&mut Self> {
        self.move_current(|tree, _| path.get(tree), path.to_string(), index)
    }

    fn insert<F>(&mut self, slot: Slot, create: F) -> TreeResult<&mut Self>
    where
        F: FnOnce(&mut MutableTree<S>) -> TreeResult<NodeId>,
    {
        let (tree, current) = self.session()?;
        let (parent, index) = match slot {
            Slot::Child(index) => {
                let len = tree
                    .get(current)
                    .ok_or(TreeError::UnknownNode(current))?
                    .children()
                    .len();
                let index = index.unwrap_or(len);
                if index > len {
                    return Err(TreeError::IndexOutOfRange { index, len });
                }
                (current, index)
            }
            Slot::LeftSibling | Slot::RightSibling => {
                let parent = tree.parent(current).ok_or(BuilderError::RootHasNoParent)?;
                let index = tree
                    .child_index(current)
                    .ok_or(TreeError::UnknownNode(current))?;
                let offset = usize::from(matches!(slot, Slot::RightSibling));
                (parent, index + offset)
            }
        };

        let node = create(&mut *tree)?;
        tree.insert_child(parent, node, index)?;
        debug!(%parent, %node, index, ?slot, "inserted node");
        Ok(self)
    }

    fn move_current<D>(
        &mut self,
        resolve: D,
        destination_text: String,
        index: Option<usize>,
    ) -> TreeResult<&mut Self>
    where
        D: FnOnce(&MutableTree<S>, NodeId) -> Option<NodeId>,
    {
        let (tree, current) = self.session()?;
        let destination = resolve(tree, current)
            .ok_or(BuilderError::UnresolvedPath(destination_text))?;
        let moved = match index {
            Some(index) => tree.insert_child(destination, current, index)?,
            None if tree.parent(current) == Some(destination) => false,
            None => tree.push_child(destination, current)?,
        };
        debug!(%current, %destination, moved, "moved current node");
        Ok(self)
    }

    fn session(&mut self) -> TreeResult<(&mut MutableTree<S>, NodeId)> {
        let tree = self.tree.as_mut().ok_or(BuilderError::NotStarted)?;
        let current = self.cursor.get().ok_or(BuilderError::NoCurrentNode)?;
        Ok((tree, current))
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn go_to_root(&mut self) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_to_root(tree);
        })
    }

    pub fn go_to(&mut self, path: &TreePath) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_to(tree, path);
        })
    }

    pub fn go_to_path(&mut self, path: &AbsolutePath) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_to_path(tree, path);
        })
    }

    pub fn go_to_parent(&mut self) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_to_parent(tree);
        })
    }

    pub fn go_to_child(&mut self, index: usize) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_to_child(tree, index);
        })
    }

    pub fn go_to_first_child(&mut self) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_to_first_child(tree);
        })
    }

    pub fn go_to_last_child(&mut self) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_to_last_child(tree);
        })
    }

    pub fn go_left(&mut self) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_left(tree);
        })
    }

    pub fn go_right(&mut self) -> &mut Self {
        self.navigate(|cursor, tree| {
            cursor.go_right(tree);
        })
    }

    /// Moves the cursor to whatever `next` picks from the current node.
    pub fn move_cursor<F>(&mut self, next: F) -> &mut Self
    where
        F: FnOnce(&MutableTree<S>, NodeId) -> Option<NodeId>,
    {
        self.navigate(|cursor, tree| {
            cursor.step(|current| next(tree, current));
        })
    }

    fn navigate<F>(&mut self, action: F) -> &mut Self
    where
        F: FnOnce(&mut TreeCursor, &MutableTree<S>),
    {
        match &self.tree {
            Some(tree) => action(&mut self.cursor, tree),
            None => self.cursor = TreeCursor::default(),
        }
        self
    }

    // ========================================================================
    // State and output
    // ========================================================================

    pub fn current(&self) -> Option<NodeId> {
        self.cursor.get()
    }

    pub fn current_path(&self) -> Option<AbsolutePath> {
        self.cursor.path(self.tree.as_ref()?)
    }

    pub fn cursor(&self) -> &TreeCursor {
        &self.cursor
    }

    pub fn working_tree(&self) -> Option<&MutableTree<S>> {
        self.tree.as_ref()
    }

    pub fn history(&self) -> &SnapshotHistory<S> {
        &self.history
    }

    pub fn build(&self) -> TreeResult<ImmutableTree<S>> {
        self.build_with(&ImmutableTree::mapper())
    }

    pub fn build_mutable(&self) -> TreeResult<MutableTree<S>> {
        self.build_with(&MutableTree::mapper())
    }

    /// Maps the working tree through `mapper`, attaching the carried history.
    pub fn build_with<F>(&self, mapper: &Mapper<F>) -> TreeResult<F::Tree>
    where
        F: NodeFactory<Semantics = S>,
    {
        let tree = self.tree.as_ref().ok_or(BuilderError::NotStarted)?;
        let (factory, root) = mapper.build_root(tree);
        debug!(nodes = tree.node_count(), "built tree");
        Ok(factory.into_tree(root, self.history.clone()))
    }
}

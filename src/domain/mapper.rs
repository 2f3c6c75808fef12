//! Structural conversion between tree representations.
//!
//! A [`Mapper`] walks a source tree of any representation and rebuilds it
//! through a [`NodeFactory`]. Each node is created with its parent already
//! wired, and its payload is bound to the final node identity only once all
//! of its descendants exist.

use std::fmt;
use std::marker::PhantomData;

use tracing::trace;

use crate::domain::arena::NodeId;
use crate::domain::semantics::Semantics;
use crate::domain::snapshot::SnapshotHistory;
use crate::domain::tree::Tree;

/// Creates the nodes of one target representation.
pub trait NodeFactory: Default {
    type Semantics: Semantics;
    type Tree: Tree<Self::Semantics>;

    /// Creates a node appended below `parent` that adopts `children`.
    ///
    /// Adopted children must be roots created by this factory.
    fn create_node(
        &mut self,
        parent: Option<NodeId>,
        children: Vec<NodeId>,
        semantics: Self::Semantics,
    ) -> NodeId;

    fn create_detached(&mut self, semantics: Self::Semantics) -> NodeId {
        self.create_node(None, Vec::new(), semantics)
    }

    /// Rebinds the payload of `node` to its final identity.
    fn bind(&mut self, node: NodeId);

    /// Publishes the created nodes as a tree rooted at `root`.
    fn into_tree(self, root: NodeId, history: SnapshotHistory<Self::Semantics>) -> Self::Tree;
}

pub struct Mapper<F> {
    factory: PhantomData<fn() -> F>,
}

impl<F> Mapper<F> {
    pub fn new() -> Self {
        Self {
            factory: PhantomData,
        }
    }
}

impl<F> Default for Mapper<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Clone for Mapper<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Mapper<F> {}

impl<F> fmt::Debug for Mapper<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mapper<{}>", std::any::type_name::<F>())
    }
}

impl<F: NodeFactory> Mapper<F> {
    /// Rebuilds the whole of `tree`, carrying its history over.
    pub fn map<T>(&self, tree: &T) -> F::Tree
    where
        T: Tree<F::Semantics> + ?Sized,
    {
        let (factory, root) = self.build_root(tree);
        factory.into_tree(root, tree.history().clone())
    }

    /// Rebuilds the subtree below `node` as a tree of its own with `history`.
    pub fn map_with_history<T>(
        &self,
        tree: &T,
        node: NodeId,
        history: SnapshotHistory<F::Semantics>,
    ) -> Option<F::Tree>
    where
        T: Tree<F::Semantics> + ?Sized,
    {
        let (factory, root) = self.build(tree, node)?;
        Some(factory.into_tree(root, history))
    }

    /// Rebuilds the subtree below `node` without ancestor context or history.
    pub fn map_subtree<T>(&self, tree: &T, node: NodeId) -> Option<F::Tree>
    where
        T: Tree<F::Semantics> + ?Sized,
    {
        self.map_with_history(tree, node, SnapshotHistory::empty())
    }

    pub(crate) fn build<T>(&self, tree: &T, node: NodeId) -> Option<(F, NodeId)>
    where
        T: Tree<F::Semantics> + ?Sized,
    {
        let mut factory = F::default();
        let root = self.build_into(&mut factory, tree, node)?;
        Some((factory, root))
    }

    /// Maps the subtree below `node` into an existing factory as a new root.
    pub(crate) fn build_into<T>(&self, factory: &mut F, tree: &T, node: NodeId) -> Option<NodeId>
    where
        T: Tree<F::Semantics> + ?Sized,
    {
        let root = Self::map_node(factory, tree, node, None)?;
        trace!(source = %node, mapped = %root, "mapped subtree");
        Some(root)
    }

    pub(crate) fn build_root<T>(&self, tree: &T) -> (F, NodeId)
    where
        T: Tree<F::Semantics> + ?Sized,
    {
        self.build(tree, tree.root())
            .expect("[consistency] the root of a tree is stored in its arena")
    }

    /// Creates the nodes in pre-order, so every parent exists before its
    /// children and siblings keep their order, then binds in reverse.
    fn map_node<T>(
        factory: &mut F,
        tree: &T,
        source: NodeId,
        parent: Option<NodeId>,
    ) -> Option<NodeId>
    where
        T: Tree<F::Semantics> + ?Sized,
    {
        let root = factory.create_node(parent, Vec::new(), tree.semantics(source)?);
        let mut created = vec![root];
        let mut pending: Vec<(NodeId, NodeId)> = tree
            .children(source)
            .into_iter()
            .rev()
            .map(|child| (child, root))
            .collect();

        while let Some((next, mapped_parent)) = pending.pop() {
            let Some(semantics) = tree.semantics(next) else {
                continue;
            };
            let mapped = factory.create_node(Some(mapped_parent), Vec::new(), semantics);
            created.push(mapped);
            pending.extend(
                tree.children(next)
                    .into_iter()
                    .rev()
                    .map(|child| (child, mapped)),
            );
        }

        // Reverse pre-order binds every child before its parent
        for &mapped in created.iter().rev() {
            factory.bind(mapped);
        }
        Some(root)
    }
}

//! The contract shared by every tree representation.
//!
//! Nodes are addressed by [`NodeId`] handles; all structural queries live on
//! the tree owning the arena. The provided methods compute their answers on
//! every call. [`ImmutableTree`] overrides the expensive ones with memo cells.

use std::collections::BTreeMap;
use std::iter;

use crate::domain::arena::{NodeArena, NodeId, TreeNode};
use crate::domain::builder::TreeBuilder;
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::immutable::ImmutableTree;
use crate::domain::mapper::{Mapper, NodeFactory};
use crate::domain::modification::TreeTransformation;
use crate::domain::mutable::MutableTree;
use crate::domain::path::{AbsolutePath, TreePath};
use crate::domain::semantics::Semantics;
use crate::domain::snapshot::SnapshotHistory;

pub trait Tree<S: Semantics> {
    /// Node storage backing this tree.
    fn arena(&self) -> &NodeArena<S>;

    fn root(&self) -> NodeId;

    /// Versions recorded before and at the creation of this tree.
    fn history(&self) -> &SnapshotHistory<S>;

    /// Alias for immutable trees, independent structural copy otherwise.
    fn copy(&self) -> Self
    where
        Self: Sized;

    /// True if `id` is reachable from the root of this tree.
    fn contains(&self, id: NodeId) -> bool {
        self.root_of(id) == Some(self.root())
    }

    fn get(&self, id: NodeId) -> Option<&TreeNode<S>> {
        self.arena().get_node(id)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent()
    }

    /// Children of `id` in sibling order, copied out of the node.
    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.get(id)
            .map(|node| node.children().to_vec())
            .unwrap_or_default()
    }

    fn child(&self, id: NodeId, index: usize) -> TreeResult<NodeId> {
        let node = self.get(id).ok_or(TreeError::UnknownNode(id))?;
        node.children()
            .get(index)
            .copied()
            .ok_or(TreeError::IndexOutOfRange {
                index,
                len: node.children().len(),
            })
    }

    fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children().first().copied()
    }

    fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children().last().copied()
    }

    fn child_index(&self, id: NodeId) -> Option<usize> {
        self.arena().child_index(id)
    }

    fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena().left_sibling(id)
    }

    fn right_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.arena().right_sibling(id)
    }

    fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.arena().root_of(id)
    }

    fn depth(&self, id: NodeId) -> Option<usize> {
        self.get(id).map(TreeNode::depth)
    }

    /// Payload of `id`, freshly bound to it.
    fn semantics(&self, id: NodeId) -> Option<S> {
        self.get(id).map(|node| node.semantics().bind(id))
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.arena().descendants(id)
    }

    fn descendant(&self, id: NodeId, path: &TreePath) -> Option<NodeId> {
        path.follow_from(self, id)
    }

    fn absolute_path(&self, id: NodeId) -> Option<AbsolutePath> {
        self.arena().absolute_path(id)
    }

    /// Node at `path`, counted from the root of this tree.
    fn node(&self, path: &AbsolutePath) -> Option<NodeId> {
        path.get(self)
    }

    /// The root followed by its descendants.
    fn nodes(&self) -> Vec<NodeId> {
        let root = self.root();
        iter::once(root).chain(self.descendants(root)).collect()
    }

    fn node_count(&self) -> usize {
        self.nodes().len()
    }

    fn leaves(&self) -> Vec<NodeId> {
        self.arena().leaf_nodes(self.root())
    }

    /// Number of levels, a single root counts as one.
    fn height(&self) -> usize {
        self.arena().height(self.root())
    }

    /// Absolute path to semantics, one entry per node.
    fn as_map(&self) -> BTreeMap<AbsolutePath, S> {
        self.nodes()
            .into_iter()
            .filter_map(|id| Some((self.absolute_path(id)?, self.semantics(id)?)))
            .collect()
    }

    /// `id` and its descendants as a standalone tree without history.
    fn subtree(&self, id: NodeId) -> Option<ImmutableTree<S>> {
        ImmutableTree::mapper().map_subtree(self, id)
    }

    /// History-less immutable capture of the current state.
    fn snapshot(&self) -> ImmutableTree<S> {
        let (factory, root) = ImmutableTree::mapper().build_root(self);
        factory.freeze(root)
    }

    fn immutable(&self) -> ImmutableTree<S> {
        ImmutableTree::mapper().map(self)
    }

    fn mutable(&self) -> MutableTree<S> {
        MutableTree::mapper().map(self)
    }

    fn map<F>(&self, mapper: &Mapper<F>) -> F::Tree
    where
        F: NodeFactory<Semantics = S>,
    {
        mapper.map(self)
    }

    /// Nodes whose paths appear in none of the `snapshots_ago` previous versions.
    fn recently_added(&self, snapshots_ago: usize) -> Vec<NodeId> {
        self.history().recently_added(self, snapshots_ago)
    }

    fn transform<X>(&self, transformation: &X) -> ImmutableTree<S>
    where
        X: TreeTransformation<S> + ?Sized,
    {
        transformation.transform(self.immutable())
    }

    fn to_builder(&self) -> TreeBuilder<S> {
        TreeBuilder::from_tree(self)
    }
}

//! Frozen trees that are cheap to share and memoize derived properties.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::mapper::{Mapper, NodeFactory};
use crate::domain::path::AbsolutePath;
use crate::domain::semantics::Semantics;
use crate::domain::snapshot::SnapshotHistory;
use crate::domain::tree::Tree;

/// Write-once cells for the derived properties of one node.
#[derive(Default)]
struct NodeCache {
    root: OnceLock<Option<NodeId>>,
    left: OnceLock<Option<NodeId>>,
    right: OnceLock<Option<NodeId>>,
    descendants: OnceLock<Vec<NodeId>>,
    absolute_path: OnceLock<AbsolutePath>,
}

struct Frozen<S> {
    arena: NodeArena<S>,
    root: NodeId,
    caches: HashMap<NodeId, NodeCache>,
    nodes: OnceLock<Vec<NodeId>>,
    by_path: OnceLock<BTreeMap<AbsolutePath, NodeId>>,
    semantics: OnceLock<BTreeMap<AbsolutePath, S>>,
}

impl<S> Frozen<S> {
    fn new(arena: NodeArena<S>, root: NodeId) -> Self {
        let caches = arena.ids().map(|id| (id, NodeCache::default())).collect();
        Self {
            arena,
            root,
            caches,
            nodes: OnceLock::new(),
            by_path: OnceLock::new(),
            semantics: OnceLock::new(),
        }
    }
}

/// A tree whose structure never changes after construction.
///
/// Clones alias the same frozen nodes, so copying is free and the tree can be
/// read from several threads at once. Derived properties are computed on first
/// use and kept.
pub struct ImmutableTree<S> {
    frozen: Arc<Frozen<S>>,
    history: SnapshotHistory<S>,
}

impl<S> Clone for ImmutableTree<S> {
    fn clone(&self) -> Self {
        Self {
            frozen: Arc::clone(&self.frozen),
            history: self.history.clone(),
        }
    }
}

impl<S: Semantics> ImmutableTree<S> {
    pub fn mapper() -> Mapper<ImmutableNodeFactory<S>> {
        Mapper::new()
    }

    pub fn node_factory() -> ImmutableNodeFactory<S> {
        ImmutableNodeFactory::default()
    }

    /// Single-node tree.
    pub fn leaf(semantics: S) -> Self {
        let mut factory = Self::node_factory();
        let root = factory.create_detached(semantics);
        factory.bind(root);
        factory.into_tree(root, SnapshotHistory::empty())
    }

    fn frozen(arena: NodeArena<S>, root: NodeId) -> Self {
        Self {
            frozen: Arc::new(Frozen::new(arena, root)),
            history: SnapshotHistory::empty(),
        }
    }

    fn with_history(arena: NodeArena<S>, root: NodeId, history: SnapshotHistory<S>) -> Self {
        let mut tree = Self::frozen(arena, root);
        tree.history = history.capture(&tree);
        tree
    }

    /// Borrowed form of [`Tree::as_map`], computed once per tree.
    pub fn as_map_ref(&self) -> &BTreeMap<AbsolutePath, S> {
        self.frozen.semantics.get_or_init(|| {
            trace!(root = %self.frozen.root, "caching semantics map");
            self.nodes_ref()
                .iter()
                .filter_map(|&id| Some((self.absolute_path(id)?, self.semantics(id)?)))
                .collect()
        })
    }

    fn nodes_ref(&self) -> &[NodeId] {
        self.frozen.nodes.get_or_init(|| {
            let root = self.frozen.root;
            let mut nodes = vec![root];
            nodes.extend(self.descendants_ref(root));
            nodes
        })
    }

    fn descendants_ref(&self, id: NodeId) -> &[NodeId] {
        match self.cache(id) {
            Some(cache) => cache
                .descendants
                .get_or_init(|| self.frozen.arena.descendants(id))
                .as_slice(),
            None => &[],
        }
    }

    fn cache(&self, id: NodeId) -> Option<&NodeCache> {
        self.frozen.caches.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes_ref().iter().copied()
    }

    /// True if both trees share the same frozen nodes.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.frozen, &other.frozen)
    }
}

impl<S: Semantics> Tree<S> for ImmutableTree<S> {
    fn arena(&self) -> &NodeArena<S> {
        &self.frozen.arena
    }

    fn root(&self) -> NodeId {
        self.frozen.root
    }

    fn history(&self) -> &SnapshotHistory<S> {
        &self.history
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn root_of(&self, id: NodeId) -> Option<NodeId> {
        *self
            .cache(id)?
            .root
            .get_or_init(|| self.frozen.arena.root_of(id))
    }

    fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        *self
            .cache(id)?
            .left
            .get_or_init(|| self.frozen.arena.left_sibling(id))
    }

    fn right_sibling(&self, id: NodeId) -> Option<NodeId> {
        *self
            .cache(id)?
            .right
            .get_or_init(|| self.frozen.arena.right_sibling(id))
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants_ref(id).to_vec()
    }

    fn absolute_path(&self, id: NodeId) -> Option<AbsolutePath> {
        let cached = |node: NodeId| self.cache(node)?.absolute_path.get().cloned();
        if let Some(path) = cached(id) {
            return Some(path);
        }

        // Climb to the nearest ancestor with a known path, then fill downwards
        let mut uncached = vec![id];
        let mut top = id;
        let mut path = AbsolutePath::root();
        while let Some(parent) = self.parent(top) {
            match cached(parent) {
                Some(known) => {
                    path = known;
                    break;
                }
                None => {
                    uncached.push(parent);
                    top = parent;
                }
            }
        }

        for &node in uncached.iter().rev() {
            path = match self.child_index(node) {
                Some(index) => path.child(index),
                None => AbsolutePath::root(),
            };
            self.cache(node)?.absolute_path.get_or_init(|| path.clone());
        }
        Some(path)
    }

    fn node(&self, path: &AbsolutePath) -> Option<NodeId> {
        self.frozen
            .by_path
            .get_or_init(|| {
                self.nodes_ref()
                    .iter()
                    .filter_map(|&id| Some((self.absolute_path(id)?, id)))
                    .collect()
            })
            .get(path)
            .copied()
    }

    fn nodes(&self) -> Vec<NodeId> {
        self.nodes_ref().to_vec()
    }

    fn node_count(&self) -> usize {
        self.nodes_ref().len()
    }

    fn as_map(&self) -> BTreeMap<AbsolutePath, S> {
        self.as_map_ref().clone()
    }

    fn snapshot(&self) -> ImmutableTree<S> {
        Self {
            frozen: Arc::clone(&self.frozen),
            history: SnapshotHistory::empty(),
        }
    }

    fn immutable(&self) -> ImmutableTree<S> {
        self.clone()
    }
}

/// Structural equality: same paths carrying equal semantics. History is ignored.
impl<S: Semantics> PartialEq for ImmutableTree<S> {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if self.node_count() != other.node_count() {
            return false;
        }
        // Equal shapes visited in lockstep carry equal payloads at equal paths
        let other_nodes = other.frozen.arena.iter(other.frozen.root);
        self.frozen
            .arena
            .iter(self.frozen.root)
            .zip(other_nodes)
            .all(|((_, mine), (_, theirs))| {
                mine.children().len() == theirs.children().len()
                    && mine.semantics() == theirs.semantics()
            })
    }
}

impl<S: Semantics> fmt::Debug for ImmutableTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImmutableTree")
            .field("root", &self.frozen.root)
            .field("nodes", self.as_map_ref())
            .field("snapshots", &self.history.len())
            .finish()
    }
}

/// Builds the nodes of an [`ImmutableTree`] before it is frozen.
#[derive(Debug)]
pub struct ImmutableNodeFactory<S> {
    arena: NodeArena<S>,
}

impl<S> Default for ImmutableNodeFactory<S> {
    fn default() -> Self {
        Self {
            arena: NodeArena::new(),
        }
    }
}

impl<S: Semantics> ImmutableNodeFactory<S> {
    /// Publishes the nodes without recording any history.
    pub(crate) fn freeze(self, root: NodeId) -> ImmutableTree<S> {
        ImmutableTree::frozen(self.arena, root)
    }
}

impl<S: Semantics> NodeFactory for ImmutableNodeFactory<S> {
    type Semantics = S;
    type Tree = ImmutableTree<S>;

    fn create_node(&mut self, parent: Option<NodeId>, children: Vec<NodeId>, semantics: S) -> NodeId {
        self.arena.create_node(parent, children, semantics)
    }

    fn bind(&mut self, node: NodeId) {
        self.arena.bind(node);
    }

    fn into_tree(self, root: NodeId, history: SnapshotHistory<S>) -> ImmutableTree<S> {
        ImmutableTree::with_history(self.arena, root, history)
    }
}

//! Arena storage for tree nodes.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::path::AbsolutePath;
use crate::domain::semantics::Semantics;

/// Handle of a node inside the arena of the tree owning it.
///
/// A handle whose node was freed never resolves to another node: the arena
/// generation tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode<S> {
    /// Payload bound to this node
    semantics: S,
    /// Parent node, None for roots
    parent: Option<NodeId>,
    /// Child nodes in sibling order
    children: Vec<NodeId>,
    /// Distance to the root
    depth: usize,
}

impl<S> TreeNode<S> {
    pub fn semantics(&self) -> &S {
        &self.semantics
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena holding the nodes of one tree.
///
/// Uses generational arena for memory-safe node handles and O(1) lookups.
/// Detached subtrees stay in the arena as independent roots until freed.
#[derive(Debug, Clone)]
pub struct NodeArena<S> {
    arena: Arena<TreeNode<S>>,
}

impl<S> Default for NodeArena<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> NodeArena<S> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arena.iter().map(|(idx, _)| NodeId(idx))
    }

    /// Inserts a node as the last child of `parent`, or as a new root.
    ///
    /// An unknown parent handle is treated as no parent.
    #[instrument(level = "trace", skip(self, semantics))]
    pub fn insert_node(&mut self, semantics: S, parent: Option<NodeId>) -> NodeId {
        let parent = parent.filter(|&p| self.contains(p));
        let depth = parent
            .and_then(|p| self.get_node(p))
            .map_or(0, |p| p.depth + 1);
        let node = TreeNode {
            semantics,
            parent,
            children: Vec::new(),
            depth,
        };
        let node_id = NodeId(self.arena.insert(node));

        if let Some(parent_id) = parent {
            if let Some(parent) = self.arena.get_mut(parent_id.0) {
                parent.children.push(node_id);
            }
        }

        node_id
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode<S>> {
        self.arena.get(id.0)
    }

    pub(crate) fn get_node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode<S>> {
        self.arena.get_mut(id.0)
    }

    /// Walks the parent chain up to the node without parent.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        let mut node = self.get_node(current)?;
        while let Some(parent) = node.parent {
            current = parent;
            node = self.get_node(current)?;
        }
        Some(current)
    }

    /// True if `ancestor` lies on the parent chain of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get_node(node).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get_node(id).and_then(|n| n.parent);
        }
        false
    }

    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.get_node(id)?.parent?;
        self.get_node(parent)?
            .children
            .iter()
            .position(|&child| child == id)
    }

    pub fn left_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.get_node(id)?.parent?;
        let index = self.child_index(id)?.checked_sub(1)?;
        self.get_node(parent)?.children.get(index).copied()
    }

    pub fn right_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.get_node(id)?.parent?;
        let index = self.child_index(id)? + 1;
        self.get_node(parent)?.children.get(index).copied()
    }

    /// Child indexes from the root of the node's own hierarchy down to `id`.
    pub fn absolute_path(&self, id: NodeId) -> Option<AbsolutePath> {
        let mut indexes = Vec::with_capacity(self.get_node(id)?.depth);
        let mut current = id;
        while let Some(index) = self.child_index(current) {
            indexes.push(index);
            current = self.get_node(current)?.parent?;
        }
        indexes.reverse();
        Some(AbsolutePath::new(indexes))
    }

    /// Direct children first, then the descendants of each child in child order.
    ///
    /// Every node contributes its children in the pre-order position of the
    /// node itself, which yields exactly that order without recursion.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.iter(id)
            .flat_map(|(_, node)| node.children.iter().copied())
            .collect()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self, root: NodeId) -> TreeIterator<'_, S> {
        TreeIterator::new(self, root)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self, root: NodeId) -> PostOrderIterator<'_, S> {
        PostOrderIterator::new(self, root)
    }

    /// Number of levels below and including `root`.
    #[instrument(level = "debug", skip(self))]
    pub fn height(&self, root: NodeId) -> usize {
        let mut height = 0;
        let mut stack = vec![(root, 1)];
        while let Some((current, level)) = stack.pop() {
            if let Some(node) = self.get_node(current) {
                height = height.max(level);
                stack.extend(node.children.iter().map(|&child| (child, level + 1)));
            }
        }
        height
    }

    /// Collects all nodes without children below `root`, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self, root: NodeId) -> Vec<NodeId> {
        self.iter(root)
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// Inserts a node under `parent` and adopts the given root `children`.
    ///
    /// Children that are not roots, or that would close a cycle, are skipped.
    pub(crate) fn create_node(
        &mut self,
        parent: Option<NodeId>,
        children: Vec<NodeId>,
        semantics: S,
    ) -> NodeId {
        let node_id = self.insert_node(semantics, parent);
        for child in children {
            let adoptable = self.get_node(child).is_some_and(TreeNode::is_root)
                && child != node_id
                && !self.is_ancestor(child, node_id);
            if adoptable {
                let index = self.get_node(node_id).map_or(0, |n| n.children.len());
                self.attach(child, node_id, index);
                self.refresh_depths(child);
            }
        }
        node_id
    }

    /// Unlinks `id` from its parent, returning the former parent and child index.
    pub(crate) fn detach(&mut self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.get_node_mut(id)?.parent.take()?;
        let parent_node = self.get_node_mut(parent)?;
        let index = parent_node.children.iter().position(|&c| c == id)?;
        parent_node.children.remove(index);
        Some((parent, index))
    }

    /// Links a root node under `parent` at `index`; the caller has validated both.
    pub(crate) fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) {
        if let Some(parent_node) = self.get_node_mut(parent) {
            parent_node.children.insert(index, id);
        }
        if let Some(node) = self.get_node_mut(id) {
            node.parent = Some(parent);
        }
    }

    /// Recomputes the stored depth of `id` and its whole subtree.
    pub(crate) fn refresh_depths(&mut self, id: NodeId) {
        let base = self
            .get_node(id)
            .and_then(|node| node.parent)
            .and_then(|parent| self.get_node(parent))
            .map_or(0, |parent| parent.depth + 1);

        let mut stack = vec![(id, base)];
        while let Some((current, depth)) = stack.pop() {
            if let Some(node) = self.get_node_mut(current) {
                node.depth = depth;
                stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }
    }

    /// Frees `root` and all of its descendants.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn remove_subtree(&mut self, root: NodeId) -> usize {
        let doomed: Vec<NodeId> = self.iter_postorder(root).map(|(id, _)| id).collect();
        for id in &doomed {
            self.arena.remove(id.0);
        }
        doomed.len()
    }
}

impl<S: Semantics> NodeArena<S> {
    /// Rebinds the payload of `id` to its final node identity.
    pub(crate) fn bind(&mut self, id: NodeId) {
        if let Some(node) = self.get_node_mut(id) {
            node.semantics = node.semantics.bind(id);
        }
    }
}

/// Pre-order traversal: parent before children, children left to right.
pub struct TreeIterator<'a, S> {
    arena: &'a NodeArena<S>,
    stack: Vec<NodeId>,
}

impl<'a, S> TreeIterator<'a, S> {
    fn new(arena: &'a NodeArena<S>, root: NodeId) -> Self {
        let mut stack = Vec::new();
        if arena.contains(root) {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a, S> Iterator for TreeIterator<'a, S> {
    type Item = (NodeId, &'a TreeNode<S>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_id) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_id) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_id, node));
            }
        }
        None
    }
}

/// Post-order traversal: children before their parent.
pub struct PostOrderIterator<'a, S> {
    arena: &'a NodeArena<S>,
    stack: Vec<(NodeId, bool)>,
}

impl<'a, S> PostOrderIterator<'a, S> {
    fn new(arena: &'a NodeArena<S>, root: NodeId) -> Self {
        let mut stack = Vec::new();
        if arena.contains(root) {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a, S> Iterator for PostOrderIterator<'a, S> {
    type Item = (NodeId, &'a TreeNode<S>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_id, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_id) {
                if !visited {
                    self.stack.push((current_id, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_id, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    //      r
    //     / \
    //    a   b
    //    |   |
    //    c   d
    //    |
    //    e
    fn sample() -> (NodeArena<&'static str>, Vec<NodeId>) {
        let mut arena = NodeArena::new();
        let r = arena.insert_node("r", None);
        let a = arena.insert_node("a", Some(r));
        let b = arena.insert_node("b", Some(r));
        let c = arena.insert_node("c", Some(a));
        let d = arena.insert_node("d", Some(b));
        let e = arena.insert_node("e", Some(c));
        (arena, vec![r, a, b, c, d, e])
    }

    fn labels(arena: &NodeArena<&'static str>, ids: &[NodeId]) -> Vec<&'static str> {
        ids.iter()
            .map(|&id| *arena.get_node(id).unwrap().semantics())
            .collect()
    }

    #[test]
    fn given_inserted_nodes_when_reading_then_parent_children_and_depth_agree() {
        let (arena, ids) = sample();
        let (r, a, c, e) = (ids[0], ids[1], ids[3], ids[5]);

        assert_eq!(arena.get_node(r).unwrap().children(), &[ids[1], ids[2]]);
        assert_eq!(arena.get_node(a).unwrap().parent(), Some(r));
        assert_eq!(arena.get_node(e).unwrap().depth(), 3);
        assert_eq!(arena.child_index(c), Some(0));
        assert_eq!(arena.child_index(r), None);
        assert_eq!(arena.root_of(e), Some(r));
    }

    #[test]
    fn given_nested_tree_when_listing_descendants_then_children_come_before_grandchildren_lists() {
        let (arena, ids) = sample();

        let descendants = arena.descendants(ids[0]);

        // children of r, then descendants of a, then descendants of b
        assert_eq!(labels(&arena, &descendants), vec!["a", "b", "c", "e", "d"]);
    }

    #[test]
    fn given_tree_when_iterating_then_preorder_and_postorder_visit_all() {
        let (arena, ids) = sample();

        let pre: Vec<NodeId> = arena.iter(ids[0]).map(|(id, _)| id).collect();
        let post: Vec<NodeId> = arena.iter_postorder(ids[0]).map(|(id, _)| id).collect();

        assert_eq!(labels(&arena, &pre), vec!["r", "a", "c", "e", "b", "d"]);
        assert_eq!(labels(&arena, &post), vec!["e", "c", "a", "d", "b", "r"]);
        assert_eq!(arena.height(ids[0]), 4);
        assert_eq!(labels(&arena, &arena.leaf_nodes(ids[0])), vec!["e", "d"]);
    }

    #[test]
    fn given_moved_subtree_when_refreshing_depths_then_whole_subtree_is_updated() {
        let (mut arena, ids) = sample();
        let (b, c, e) = (ids[2], ids[3], ids[5]);

        assert_eq!(arena.detach(c), Some((ids[1], 0)));
        arena.refresh_depths(c);
        assert_eq!(arena.get_node(e).unwrap().depth(), 1);

        let d = ids[4];
        arena.attach(c, d, 0);
        arena.refresh_depths(c);

        assert_eq!(arena.get_node(c).unwrap().depth(), 3);
        assert_eq!(arena.get_node(e).unwrap().depth(), 4);
        assert!(arena.is_ancestor(b, e));
    }

    #[test]
    fn given_removed_subtree_when_using_stale_handle_then_it_resolves_to_nothing() {
        let (mut arena, ids) = sample();
        let c = ids[3];
        arena.detach(c);

        let removed = arena.remove_subtree(c);
        let fresh = arena.insert_node("f", None);

        assert_eq!(removed, 2);
        assert!(arena.get_node(c).is_none());
        assert!(arena.get_node(ids[5]).is_none());
        assert_ne!(fresh, c);
        assert_eq!(arena.len(), 5);
    }
}

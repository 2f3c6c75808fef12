//! Stateful locator used while building trees.

use crate::domain::arena::NodeId;
use crate::domain::path::{AbsolutePath, TreePath};
use crate::domain::semantics::Semantics;
use crate::domain::tree::Tree;

/// Current focus inside a tree.
///
/// A cursor is invalid after a move past a structural boundary, e.g. to the
/// left of a first child. Relative moves keep it invalid until it is
/// repositioned with [`go_to_root`](Self::go_to_root),
/// [`go_to_path`](Self::go_to_path) or [`go_to_node`](Self::go_to_node).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeCursor {
    current: Option<NodeId>,
    previous: Option<NodeId>,
}

impl TreeCursor {
    pub fn at(node: NodeId) -> Self {
        Self {
            current: Some(node),
            previous: None,
        }
    }

    pub fn get(&self) -> Option<NodeId> {
        self.current
    }

    /// Last valid position before the most recent move.
    pub fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    pub fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    pub fn path<S, T>(&self, tree: &T) -> Option<AbsolutePath>
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        tree.absolute_path(self.current?)
    }

    pub fn go_to_node(&mut self, node: NodeId) -> &mut Self {
        self.set(Some(node))
    }

    pub fn go_to_root<S, T>(&mut self, tree: &T) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.set(Some(tree.root()))
    }

    pub fn go_to_path<S, T>(&mut self, tree: &T, path: &AbsolutePath) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.set(path.get(tree))
    }

    pub fn go_to<S, T>(&mut self, tree: &T, path: &TreePath) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.step(|current| path.follow_from(tree, current))
    }

    pub fn go_to_parent<S, T>(&mut self, tree: &T) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.step(|current| tree.parent(current))
    }

    pub fn go_to_child<S, T>(&mut self, tree: &T, index: usize) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.step(|current| tree.child(current, index).ok())
    }

    pub fn go_to_first_child<S, T>(&mut self, tree: &T) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.step(|current| tree.first_child(current))
    }

    pub fn go_to_last_child<S, T>(&mut self, tree: &T) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.step(|current| tree.last_child(current))
    }

    pub fn go_left<S, T>(&mut self, tree: &T) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.step(|current| tree.left_sibling(current))
    }

    pub fn go_right<S, T>(&mut self, tree: &T) -> &mut Self
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.step(|current| tree.right_sibling(current))
    }

    /// Moves relative to the current node; stays invalid once invalid.
    pub fn step<F>(&mut self, next: F) -> &mut Self
    where
        F: FnOnce(NodeId) -> Option<NodeId>,
    {
        let next = self.current.and_then(next);
        self.set(next)
    }

    /// The same position in another tree, resolved through the absolute path.
    pub fn relocate<S, A, B>(&self, from: &A, to: &B) -> TreeCursor
    where
        S: Semantics,
        A: Tree<S> + ?Sized,
        B: Tree<S> + ?Sized,
    {
        TreeCursor {
            current: self.path(from).and_then(|path| path.get(to)),
            previous: None,
        }
    }

    fn set(&mut self, next: Option<NodeId>) -> &mut Self {
        if self.current.is_some() {
            self.previous = self.current;
        }
        self.current = next;
        self
    }
}

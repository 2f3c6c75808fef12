//! Whole-tree transformations and in-place modifications.

use tracing::debug;

use crate::domain::error::TreeResult;
use crate::domain::immutable::ImmutableTree;
use crate::domain::mutable::MutableTree;
use crate::domain::path::AbsolutePath;
use crate::domain::semantics::Semantics;
use crate::domain::tree::Tree;

/// Maps one immutable tree version to the next.
pub trait TreeTransformation<S: Semantics> {
    fn transform(&self, tree: ImmutableTree<S>) -> ImmutableTree<S>;
}

impl<S, F> TreeTransformation<S> for F
where
    S: Semantics,
    F: Fn(ImmutableTree<S>) -> ImmutableTree<S>,
{
    fn transform(&self, tree: ImmutableTree<S>) -> ImmutableTree<S> {
        self(tree)
    }
}

/// Edits a mutable tree in place.
pub trait TreeModification<S: Semantics> {
    /// Applies the modification once; `Ok(false)` if there was nothing to do.
    fn modify(&self, tree: &mut MutableTree<S>) -> TreeResult<bool>;

    /// Applies the modification until it reports no change, returning the
    /// number of applied rounds. A modification that always reports a change
    /// never terminates.
    fn modify_all(&self, tree: &mut MutableTree<S>) -> TreeResult<usize> {
        let mut rounds = 0;
        while self.modify(tree)? {
            rounds += 1;
        }
        Ok(rounds)
    }

    /// Applies the modification once to a mutable copy of `tree`.
    fn apply<T>(&self, tree: &T) -> TreeResult<ImmutableTree<S>>
    where
        T: Tree<S> + ?Sized,
        Self: Sized,
    {
        let mut working = tree.mutable();
        self.modify(&mut working)?;
        Ok(working.immutable())
    }
}

/// Moves the node at `from` so that it becomes the child at `to`.
///
/// The parent of `to` is resolved before the move and the last index of `to`
/// is the slot among that parent's children after the move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveNode {
    pub from: AbsolutePath,
    pub to: AbsolutePath,
}

impl MoveNode {
    pub fn new(from: AbsolutePath, to: AbsolutePath) -> Self {
        Self { from, to }
    }
}

impl<S: Semantics> TreeModification<S> for MoveNode {
    fn modify(&self, tree: &mut MutableTree<S>) -> TreeResult<bool> {
        if self.from == self.to {
            return Ok(false);
        }
        let (Some(parent_path), Some(index)) = (self.to.parent(), self.to.last_index()) else {
            return Ok(false);
        };
        let (Some(node), Some(parent)) = (tree.node(&self.from), tree.node(&parent_path)) else {
            return Ok(false);
        };

        let moved = tree.insert_child(parent, node, index)?;
        debug!(from = %self.from, to = %self.to, moved, "move node");
        Ok(moved)
    }
}

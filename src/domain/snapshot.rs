//! Version history of a tree.

use std::collections::HashSet;
use std::fmt;

use tracing::trace;

use crate::domain::arena::NodeId;
use crate::domain::immutable::ImmutableTree;
use crate::domain::path::AbsolutePath;
use crate::domain::semantics::Semantics;
use crate::domain::tree::Tree;

/// Immutable captures of earlier tree versions, most recent first.
///
/// Two consecutive entries are never structurally equal. With a limit, the
/// oldest entries are dropped once it is exceeded.
pub struct SnapshotHistory<S> {
    snapshots: Vec<ImmutableTree<S>>,
    limit: Option<usize>,
}

impl<S> Clone for SnapshotHistory<S> {
    fn clone(&self) -> Self {
        Self {
            snapshots: self.snapshots.clone(),
            limit: self.limit,
        }
    }
}

impl<S: Semantics> fmt::Debug for SnapshotHistory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotHistory")
            .field("snapshots", &self.snapshots)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<S> Default for SnapshotHistory<S> {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            limit: None,
        }
    }
}

impl<S: Semantics> SnapshotHistory<S> {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keeps at most `max` versions; `None` or zero keeps everything.
    pub fn with_limit(max: Option<usize>) -> Self {
        Self {
            snapshots: Vec::new(),
            limit: max.filter(|&m| m > 0),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Copy of this history with `tree` recorded on top.
    pub fn capture<T>(&self, tree: &T) -> Self
    where
        T: Tree<S> + ?Sized,
    {
        let mut history = self.clone();
        history.take_snapshot(tree);
        history
    }

    /// Records `tree` unless it equals the most recent entry.
    pub fn take_snapshot<T>(&mut self, tree: &T) -> bool
    where
        T: Tree<S> + ?Sized,
    {
        let snapshot = tree.snapshot();
        if self.recent().is_some_and(|recent| *recent == snapshot) {
            trace!(snapshots = self.snapshots.len(), "snapshot equals head, skipped");
            return false;
        }

        self.snapshots.insert(0, snapshot);
        if let Some(limit) = self.limit {
            self.snapshots.truncate(limit);
        }
        trace!(snapshots = self.snapshots.len(), "snapshot recorded");
        true
    }

    pub fn recent(&self) -> Option<&ImmutableTree<S>> {
        self.snapshots.first()
    }

    /// Recorded versions, most recent first.
    pub fn all(&self) -> Vec<ImmutableTree<S>> {
        self.snapshots.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImmutableTree<S>> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Nodes of `tree` whose paths occur in none of the `snapshots_ago`
    /// versions preceding it.
    ///
    /// The head entry is the version of `tree` itself when it equals `tree`,
    /// and is not counted.
    pub fn recently_added<T>(&self, tree: &T, snapshots_ago: usize) -> Vec<NodeId>
    where
        T: Tree<S> + ?Sized,
    {
        let current = tree.as_map();
        let skip = usize::from(
            self.recent()
                .is_some_and(|head| *head.as_map_ref() == current),
        );

        let known: HashSet<&AbsolutePath> = self
            .snapshots
            .iter()
            .skip(skip)
            .take(snapshots_ago)
            .flat_map(|snapshot| snapshot.as_map_ref().keys())
            .collect();

        tree.nodes()
            .into_iter()
            .filter(|&id| {
                tree.absolute_path(id)
                    .is_some_and(|path| !known.contains(&path))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mutable::MutableTree;

    fn tree_with(children: &[&'static str]) -> MutableTree<&'static str> {
        let mut tree = MutableTree::new("R");
        let root = tree.root();
        for &label in children {
            tree.add_child(root, label).unwrap();
        }
        tree
    }

    #[test]
    fn given_equal_consecutive_versions_when_capturing_then_only_one_is_recorded() {
        let tree = tree_with(&["A"]);
        let mut history = SnapshotHistory::empty();

        assert!(history.take_snapshot(&tree));
        assert!(!history.take_snapshot(&tree));
        assert!(!history.take_snapshot(&tree.immutable()));

        assert_eq!(history.len(), 1);
    }

    #[test]
    fn given_limit_when_capturing_more_versions_then_oldest_are_dropped() {
        let mut history = SnapshotHistory::with_limit(Some(2));

        history.take_snapshot(&tree_with(&[]));
        history.take_snapshot(&tree_with(&["A"]));
        history.take_snapshot(&tree_with(&["A", "B"]));

        assert_eq!(history.len(), 2);
        assert_eq!(history.recent().unwrap().node_count(), 3);
        assert_eq!(history.iter().last().unwrap().node_count(), 2);
    }

    #[test]
    fn given_capture_when_original_history_is_reused_then_it_is_unchanged() {
        let history = SnapshotHistory::empty();

        let captured = history.capture(&tree_with(&["A"]));

        assert!(history.is_empty());
        assert_eq!(captured.len(), 1);
        assert!(captured.recent().unwrap().history().is_empty());
    }

    #[test]
    fn given_older_versions_when_asking_recently_added_then_diff_is_against_those_versions() {
        let mut history = SnapshotHistory::empty();
        history.take_snapshot(&tree_with(&[]));
        history.take_snapshot(&tree_with(&["A"]));
        let tree = tree_with(&["A", "B", "C"]);

        let one_back: Vec<_> = history
            .recently_added(&tree, 1)
            .into_iter()
            .filter_map(|id| tree.semantics(id))
            .collect();
        let none_back = history.recently_added(&tree, 0);

        assert_eq!(one_back, vec!["B", "C"]);
        assert_eq!(none_back.len(), 4);
    }
}

//! Relative and absolute paths between tree nodes.
//!
//! A relative [`TreePath`] is a list of steps applicable from any node. An
//! [`AbsolutePath`] is the list of child indexes leading from the root to a
//! node, i.e. the canonical address of that node.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::arena::NodeId;
use crate::domain::error::PathParseError;
use crate::domain::semantics::Semantics;
use crate::domain::tree::Tree;

/// One hop between directly related nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStep {
    Parent,
    Child(usize),
    FirstChild,
    LastChild,
    Left,
    Right,
}

impl PathStep {
    /// The node one step away from `node`, if there is one.
    pub fn next<S, T>(self, tree: &T, node: NodeId) -> Option<NodeId>
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        match self {
            PathStep::Parent => tree.parent(node),
            PathStep::Child(index) => tree.child(node, index).ok(),
            PathStep::FirstChild => tree.first_child(node),
            PathStep::LastChild => tree.last_child(node),
            PathStep::Left => tree.left_sibling(node),
            PathStep::Right => tree.right_sibling(node),
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Parent => write!(f, ".."),
            PathStep::Child(index) => write!(f, "{}", index),
            PathStep::FirstChild => write!(f, "first"),
            PathStep::LastChild => write!(f, "last"),
            PathStep::Left => write!(f, "<"),
            PathStep::Right => write!(f, ">"),
        }
    }
}

/// A route from an arbitrary start node.
///
/// ```text
/// root -|- n1
///       |- n2 - n4
///       |- n3 - n5
/// ```
/// From `n4` the path `.. / > / 0` leads to `n5`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreePath {
    steps: Vec<PathStep>,
}

impl TreePath {
    pub fn new(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// The empty path, leading to the start node itself.
    pub fn here() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn then(mut self, step: PathStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn up(self) -> Self {
        self.then(PathStep::Parent)
    }

    pub fn child(self, index: usize) -> Self {
        self.then(PathStep::Child(index))
    }

    /// This path followed by `other`.
    pub fn join(&self, other: &TreePath) -> TreePath {
        self.steps.iter().chain(&other.steps).copied().collect()
    }

    /// Applies every step in order starting at `node`.
    ///
    /// A step that cannot be resolved voids the whole path.
    pub fn follow_from<S, T>(&self, tree: &T, node: NodeId) -> Option<NodeId>
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.steps
            .iter()
            .try_fold(node, |current, step| step.next(tree, current))
    }
}

impl FromIterator<PathStep> for TreePath {
    fn from_iter<I: IntoIterator<Item = PathStep>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl From<&AbsolutePath> for TreePath {
    fn from(path: &AbsolutePath) -> Self {
        path.indexes().iter().map(|&i| PathStep::Child(i)).collect()
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.steps.iter().join("/"))
        }
    }
}

/// The address of a node: child indexes of consecutive ancestors, starting
/// below the root. The root itself has the empty path.
///
/// Paths order ancestors before descendants and left siblings before right
/// siblings, which is the derived lexicographic order of the index list.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AbsolutePath(Vec<usize>);

impl AbsolutePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(indexes: Vec<usize>) -> Self {
        Self(indexes)
    }

    pub fn indexes(&self) -> &[usize] {
        &self.0
    }

    /// Depth of the addressed node.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<Self> {
        let (_, ancestors) = self.0.split_last()?;
        Some(Self(ancestors.to_vec()))
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indexes = self.0.clone();
        indexes.push(index);
        Self(indexes)
    }

    pub fn left(&self) -> Option<Self> {
        let (last, ancestors) = self.0.split_last()?;
        let index = last.checked_sub(1)?;
        Some(Self(ancestors.to_vec()).child(index))
    }

    /// The address right of this one; the tree decides whether it exists.
    pub fn right(&self) -> Option<Self> {
        let (last, ancestors) = self.0.split_last()?;
        Some(Self(ancestors.to_vec()).child(last.checked_add(1)?))
    }

    /// Strict ancestry: a path is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &AbsolutePath) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }

    /// Resolves this address from the root of `tree`.
    pub fn get<S, T>(&self, tree: &T) -> Option<NodeId>
    where
        S: Semantics,
        T: Tree<S> + ?Sized,
    {
        self.0
            .iter()
            .try_fold(tree.root(), |node, &index| tree.child(node, index).ok())
    }

    pub fn to_relative(&self) -> TreePath {
        TreePath::from(self)
    }
}

impl From<Vec<usize>> for AbsolutePath {
    fn from(indexes: Vec<usize>) -> Self {
        Self(indexes)
    }
}

impl fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.iter().join("/"))
    }
}

impl FromStr for AbsolutePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| PathParseError {
            input: s.to_string(),
            reason,
        };

        let rest = s
            .trim()
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'".to_string()))?;
        if rest.is_empty() {
            return Ok(Self::root());
        }

        rest.split('/')
            .map(|segment| {
                segment
                    .parse::<usize>()
                    .map_err(|e| invalid(format!("segment {:?}: {}", segment, e)))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn path(indexes: &[usize]) -> AbsolutePath {
        AbsolutePath::new(indexes.to_vec())
    }

    #[rstest]
    #[case(&[], &[0])]
    #[case(&[0], &[0, 0])]
    #[case(&[0, 5], &[1])]
    #[case(&[1, 0], &[1, 1])]
    #[case(&[2], &[10])]
    fn given_two_paths_when_comparing_then_ancestors_and_left_siblings_come_first(
        #[case] before: &[usize],
        #[case] after: &[usize],
    ) {
        assert!(path(before) < path(after));
        assert!(path(after) > path(before));
    }

    #[test]
    fn given_path_when_navigating_then_relatives_are_computed() {
        let p = path(&[2, 1]);

        assert_eq!(p.parent(), Some(path(&[2])));
        assert_eq!(p.child(4), path(&[2, 1, 4]));
        assert_eq!(p.left(), Some(path(&[2, 0])));
        assert_eq!(p.right(), Some(path(&[2, 2])));
        assert_eq!(path(&[2, 0]).left(), None);
        assert_eq!(AbsolutePath::root().parent(), None);
        assert_eq!(AbsolutePath::root().right(), None);
        assert!(path(&[2]).is_ancestor_of(&p));
        assert!(!p.is_ancestor_of(&p));
        assert!(AbsolutePath::root().is_ancestor_of(&p));
    }

    #[test]
    fn given_last_index_at_maximum_when_going_right_then_there_is_no_right_path() {
        let text = format!("/1/{}", usize::MAX);
        let p: AbsolutePath = text.parse().unwrap();

        assert_eq!(p.right(), None);
        assert_eq!(p.left(), Some(path(&[1, usize::MAX - 1])));
    }

    #[rstest]
    #[case("/", &[])]
    #[case("/0", &[0])]
    #[case("/3/0/12", &[3, 0, 12])]
    fn given_valid_text_when_parsing_then_round_trips_through_display(
        #[case] text: &str,
        #[case] expected: &[usize],
    ) {
        let parsed: AbsolutePath = text.parse().unwrap();

        assert_eq!(parsed, path(expected));
        assert_eq!(parsed.to_string(), text);
    }

    #[rstest]
    #[case("")]
    #[case("0/1")]
    #[case("/a")]
    #[case("/1//2")]
    #[case("/-1")]
    fn given_invalid_text_when_parsing_then_errors(#[case] text: &str) {
        assert!(text.parse::<AbsolutePath>().is_err());
    }

    #[test]
    fn given_relative_path_when_joining_then_steps_concatenate() {
        let up = TreePath::here().up();
        let down = TreePath::here().then(PathStep::Right).child(0);

        let joined = up.join(&down);

        assert_eq!(
            joined.steps(),
            &[PathStep::Parent, PathStep::Right, PathStep::Child(0)]
        );
        assert_eq!(joined.to_string(), "../>/0");
        assert_eq!(TreePath::here().to_string(), ".");
        assert_eq!(
            path(&[1, 2]).to_relative().steps(),
            &[PathStep::Child(1), PathStep::Child(2)]
        );
    }
}

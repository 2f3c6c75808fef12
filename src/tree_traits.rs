//! Text rendering of trees through `termtree`.
//!
//! ```text
//! R
//! ├── A
//! │   └── C
//! └── B
//! ```

use std::fmt;

use termtree::Tree as TermTree;
use tracing::instrument;

use crate::domain::{ImmutableTree, MutableTree, Semantics, Tree};

pub trait TreeNodeConvert<S> {
    fn to_tree_string(&self) -> TermTree<String>;
}

impl<S, T> TreeNodeConvert<S> for T
where
    S: Semantics + fmt::Display,
    T: Tree<S>,
{
    /// Assembles the rendering bottom-up: in post-order, the children of a
    /// node are the last finished subtrees when the node itself comes up.
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> TermTree<String> {
        let mut finished: Vec<TermTree<String>> = Vec::new();
        for (id, node) in self.arena().iter_postorder(self.root()) {
            let label = node.semantics().bind(id).to_string();
            let first_child = finished.len().saturating_sub(node.children().len());
            let leaves = finished.split_off(first_child);
            finished.push(TermTree::new(label).with_leaves(leaves));
        }
        finished.pop().unwrap_or_else(|| TermTree::new(String::new()))
    }
}

impl<S: Semantics + fmt::Display> fmt::Display for ImmutableTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tree_string())
    }
}

impl<S: Semantics + fmt::Display> fmt::Display for MutableTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_tree_string())
    }
}

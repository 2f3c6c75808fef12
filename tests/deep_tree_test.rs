//! Tests for chain-shaped trees far deeper than a thread stack could recurse

use std::thread;

use semtree::{AbsolutePath, ImmutableTree, MutableTree, Tree};

const SMALL_STACK: usize = 256 * 1024;

/// 0 - 1 - 2 - ... - depth
fn chain(depth: usize) -> MutableTree<usize> {
    let mut tree = MutableTree::new(0);
    let mut tip = tree.root();
    for level in 1..=depth {
        tip = tree.add_child(tip, level).unwrap();
    }
    tree
}

fn on_small_stack<F>(test: F)
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .stack_size(SMALL_STACK)
        .spawn(test)
        .unwrap()
        .join()
        .unwrap();
}

#[test]
fn given_very_deep_chain_when_mapping_and_walking_then_every_level_is_visited() {
    on_small_stack(|| {
        // Arrange
        let tree = chain(100_000);

        // Act
        let frozen = tree.immutable();
        let copied = frozen.mutable();
        let nodes = tree.nodes();

        // Assert
        assert_eq!(nodes.len(), 100_001);
        assert_eq!(tree.semantics(nodes[100_000]), Some(100_000));
        assert_eq!(frozen.node_count(), 100_001);
        assert_eq!(frozen.descendants(frozen.root()).len(), 100_000);
        assert_eq!(frozen.height(), 100_001);
        assert_eq!(tree.height(), 100_001);
        assert_eq!(copied.height(), 100_001);
        assert_eq!(frozen.leaves().len(), 1);
        assert_eq!(copied.immutable(), frozen);
        assert_ne!(chain(99_999).immutable(), frozen);
    });
}

#[test]
fn given_deep_subtree_when_copying_it_out_then_it_is_rebuilt_without_recursion() {
    on_small_stack(|| {
        // Arrange
        let tree: ImmutableTree<usize> = chain(50_000).immutable();
        let first = tree.first_child(tree.root()).unwrap();

        // Act
        let subtree = tree.subtree(first).unwrap();

        // Assert
        assert_eq!(subtree.node_count(), 50_000);
        assert_eq!(subtree.semantics(subtree.root()), Some(1));
        assert_eq!(subtree.depth(subtree.leaves()[0]), Some(49_999));
    });
}

#[test]
fn given_deep_chain_when_reading_paths_then_they_are_derived_level_by_level() {
    on_small_stack(|| {
        // Arrange
        let tree = chain(2_000).immutable();
        let deepest = AbsolutePath::new(vec![0; 2_000]);
        let leaf = tree.leaves()[0];

        // Act
        let map = tree.as_map();

        // Assert
        assert_eq!(map.len(), 2_001);
        assert_eq!(map.get(&deepest), Some(&2_000));
        assert_eq!(tree.absolute_path(leaf), Some(deepest.clone()));
        assert_eq!(tree.node(&deepest), Some(leaf));
    });
}

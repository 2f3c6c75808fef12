//! Tests for transformations and in-place modifications

use semtree::util::testing::init_test_setup;
use semtree::{
    AbsolutePath, ImmutableTree, MoveNode, MutableTree, NodeId, Tree, TreeBuilder, TreeError,
    TreeModification, TreeResult,
};

fn labels<T: Tree<&'static str>>(tree: &T, ids: &[NodeId]) -> Vec<&'static str> {
    ids.iter().filter_map(|&id| tree.semantics(id)).collect()
}

fn path(indexes: &[usize]) -> AbsolutePath {
    AbsolutePath::new(indexes.to_vec())
}

/// R -|- A - C
///    |- B
fn sample() -> ImmutableTree<&'static str> {
    let mut builder = TreeBuilder::tree("R");
    builder
        .add_child("A")
        .unwrap()
        .add_child("B")
        .unwrap()
        .go_to_first_child()
        .add_child("C")
        .unwrap();
    builder.build().unwrap()
}

/// Removes the leftmost leaf below the root.
struct PruneFirstLeaf;

impl TreeModification<&'static str> for PruneFirstLeaf {
    fn modify(&self, tree: &mut MutableTree<&'static str>) -> TreeResult<bool> {
        let root = tree.root();
        let Some(leaf) = tree.leaves().into_iter().find(|&id| id != root) else {
            return Ok(false);
        };
        tree.detach(leaf)?;
        tree.prune(leaf)?;
        Ok(true)
    }
}

// ============================================================================
// Transformations
// ============================================================================

#[test]
fn given_closure_transformation_when_applied_then_result_records_previous_version() {
    init_test_setup();
    // Arrange
    let tree = sample();
    let add_leaf = |tree: ImmutableTree<&'static str>| {
        let mut builder = tree.to_builder();
        builder.go_to_path(&path(&[1])).add_child("X").unwrap();
        builder.build().unwrap()
    };

    // Act
    let transformed = tree.transform(&add_leaf);

    // Assert
    assert_eq!(transformed.node_count(), 5);
    assert_eq!(labels(&transformed, &transformed.recently_added(1)), vec!["X"]);
    assert_eq!(transformed.history().all()[1], tree);
}

#[test]
fn given_identity_transformation_when_applied_then_no_version_is_added() {
    // Arrange
    let tree = sample();

    // Act
    let same = tree.transform(&|tree: ImmutableTree<&'static str>| tree.mutable().immutable());

    // Assert
    assert_eq!(same, tree);
    assert_eq!(same.history().len(), tree.history().len());
}

// ============================================================================
// Modifications
// ============================================================================

#[test]
fn given_move_node_when_modifying_then_node_lands_at_target() {
    // Arrange
    let mut tree = sample().mutable();
    let move_c = MoveNode::new(path(&[0, 0]), path(&[1, 0]));

    // Act
    let moved = move_c.modify(&mut tree).unwrap();

    // Assert
    assert!(moved);
    assert_eq!(labels(&tree, &tree.nodes()), vec!["R", "A", "B", "C"]);
    assert_eq!(tree.semantics(tree.node(&path(&[1, 0])).unwrap()), Some("C"));
    assert_eq!(move_c.modify(&mut tree), Ok(false));
}

#[test]
fn given_move_node_when_modifying_all_then_it_stops_once_source_is_gone() {
    // Arrange
    let mut tree = sample().mutable();

    // Act
    let rounds = MoveNode::new(path(&[0, 0]), path(&[1, 0]))
        .modify_all(&mut tree)
        .unwrap();

    // Assert
    assert_eq!(rounds, 1);
}

#[test]
fn given_unresolvable_or_trivial_move_when_modifying_then_nothing_changes() {
    // Arrange
    let mut tree = sample().mutable();
    let before = tree.as_map();

    // Act & Assert
    assert_eq!(MoveNode::new(path(&[7]), path(&[0])).modify(&mut tree), Ok(false));
    assert_eq!(MoveNode::new(path(&[1]), path(&[3, 0])).modify(&mut tree), Ok(false));
    assert_eq!(MoveNode::new(path(&[1]), AbsolutePath::root()).modify(&mut tree), Ok(false));
    assert_eq!(MoveNode::new(path(&[1]), path(&[1])).modify(&mut tree), Ok(false));
    assert_eq!(tree.as_map(), before);
}

#[test]
fn given_move_into_own_subtree_when_modifying_then_cycle_is_rejected() {
    // Arrange
    let mut tree = sample().mutable();

    // Act
    let result = MoveNode::new(path(&[0]), path(&[0, 0, 0])).modify(&mut tree);

    // Assert
    assert!(matches!(result, Err(TreeError::CyclicParent { .. })));
}

#[test]
fn given_repeating_modification_when_modifying_all_then_rounds_are_counted() {
    // Arrange
    let mut tree = sample().mutable();

    // Act
    let rounds = PruneFirstLeaf.modify_all(&mut tree).unwrap();

    // Assert
    assert_eq!(rounds, 3);
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn given_immutable_tree_when_applying_modification_then_copy_is_modified() {
    // Arrange
    let tree = sample();

    // Act
    let modified = MoveNode::new(path(&[1]), path(&[0, 0])).apply(&tree).unwrap();

    // Assert
    assert_eq!(tree.node_count(), 4);
    assert_eq!(labels(&modified, &modified.nodes()), vec!["R", "A", "B", "C"]);
    assert_eq!(modified.semantics(modified.node(&path(&[0, 0])).unwrap()), Some("B"));
    assert_eq!(modified.history().len(), 2);
}

//! TreeOps: descendant enumeration, pre-order successor and index paths.

use rstest::{fixture, rstest};

use outliner::util::testing::{self, SampleTree};
use outliner::{IndexPath, NodeArena, NodeId};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

#[fixture]
fn sample() -> (NodeArena, SampleTree) {
    let mut arena = NodeArena::new();
    let tree = SampleTree::build(&mut arena);
    (arena, tree)
}

// ============================================================
// Enumeration
// ============================================================

#[rstest]
fn given_sample_tree_when_listing_descendants_then_preorder(sample: (NodeArena, SampleTree)) {
    let (arena, tree) = sample;

    assert_eq!(
        arena.descendants(tree.root).unwrap(),
        vec![tree.a, tree.l1, tree.l2, tree.b]
    );
    assert!(arena.descendants(tree.l1).unwrap().is_empty());
}

#[rstest]
fn given_sample_tree_when_listing_leaves_and_groups_then_filtered(
    sample: (NodeArena, SampleTree),
) {
    let (arena, tree) = sample;

    assert_eq!(arena.all_child_leafs(tree.root).unwrap(), vec![tree.l1, tree.l2]);
    assert_eq!(arena.group_children(tree.root).unwrap(), vec![tree.a, tree.b]);
    assert!(arena.group_children(tree.a).unwrap().is_empty());
}

#[rstest]
fn given_nested_node_when_listing_ancestors_then_nearest_first(sample: (NodeArena, SampleTree)) {
    let (arena, tree) = sample;

    assert_eq!(arena.ancestors(tree.l2).unwrap(), vec![tree.a, tree.root]);
    assert_eq!(arena.root_ancestor(tree.l2).unwrap(), tree.root);
    assert_eq!(arena.root_ancestor(tree.root).unwrap(), tree.root);
}

// ============================================================
// Successor
// ============================================================

#[rstest]
fn given_root_when_following_next_node_then_visits_preorder(sample: (NodeArena, SampleTree)) {
    let (arena, tree) = sample;

    let mut visited = Vec::new();
    let mut current = arena.next_node(tree.root).unwrap();
    while let Some(id) = current {
        visited.push(id);
        current = arena.next_node(id).unwrap();
    }

    assert_eq!(visited, vec![tree.a, tree.l1, tree.l2, tree.b]);
}

#[rstest]
fn given_last_child_when_asking_next_sibling_then_none(sample: (NodeArena, SampleTree)) {
    let (arena, tree) = sample;

    assert_eq!(arena.next_sibling(tree.l1).unwrap(), Some(tree.l2));
    assert_eq!(arena.next_sibling(tree.l2).unwrap(), None);
    assert_eq!(arena.next_sibling(tree.root).unwrap(), None);
}

// ============================================================
// Index paths
// ============================================================

#[rstest]
fn given_leaf_when_resolving_index_path_then_positions_from_forest(
    sample: (NodeArena, SampleTree),
) {
    let (arena, tree) = sample;

    let path = arena.index_path_in(tree.l1, &[tree.root]).unwrap();

    assert_eq!(path, Some(IndexPath::from(vec![0, 0, 0])));
    assert_eq!(path.map(|p| p.to_string()), Some("0.0.0".to_string()));
}

#[rstest]
fn given_second_root_when_resolving_index_path_then_first_index_is_root_position(
    sample: (NodeArena, SampleTree),
) {
    let (mut arena, tree) = sample;
    let other = arena.new_group();
    let child = arena.new_leaf();
    arena.add_child(other, child).unwrap();

    let path = arena.index_path_in(child, &[tree.root, other]).unwrap();

    assert_eq!(path.as_ref().map(IndexPath::indexes), Some(&[1, 0][..]));
    assert_eq!(
        arena.index_path_in(tree.b, &[tree.root, other]).unwrap(),
        Some(IndexPath::from(vec![0, 1]))
    );
}

#[rstest]
fn given_node_outside_forest_when_resolving_index_path_then_none(
    sample: (NodeArena, SampleTree),
) {
    let (mut arena, tree) = sample;
    let stranger: NodeId = arena.new_leaf();

    assert_eq!(arena.index_path_in(stranger, &[tree.root]).unwrap(), None);
    assert_eq!(arena.index_path_in(tree.l1, &[tree.b]).unwrap(), None);
}

#[rstest]
fn given_deep_chain_when_walking_then_no_stack_overflow() {
    let mut arena: NodeArena = NodeArena::new();
    let root = arena.new_group();
    let mut tip = root;
    for _ in 0..10_000 {
        let next = arena.new_group();
        arena.add_child(tip, next).unwrap();
        tip = next;
    }

    assert_eq!(arena.descendants(root).unwrap().len(), 10_000);
    assert_eq!(arena.root_ancestor(tip).unwrap(), root);
    let path = arena.index_path_in(tip, &[root]).unwrap().unwrap();
    assert_eq!(path.len(), 10_001);
}

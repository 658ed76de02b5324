use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rankbtree::{BTree, NaturalOrder, Rank, ReverseOrder};

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 2_000;

fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Generates values in a range small enough to produce duplicates.
fn value_strategy() -> impl Strategy<Value = i64> {
    -1_000i64..1_000i64
}

// ─── Operations enum for driving randomized tests ────────────────────────────

#[derive(Debug, Clone)]
enum TreeOp {
    Insert(i64),
    Remove(i64),
    Exists(i64),
    PopFirst,
    PopLast,
    RemoveByRank(usize),
}

fn tree_op_strategy() -> impl Strategy<Value = TreeOp> {
    prop_oneof![
        6 => value_strategy().prop_map(TreeOp::Insert),
        3 => value_strategy().prop_map(TreeOp::Remove),
        2 => value_strategy().prop_map(TreeOp::Exists),
        1 => Just(TreeOp::PopFirst),
        1 => Just(TreeOp::PopLast),
        1 => any::<usize>().prop_map(TreeOp::RemoveByRank),
    ]
}

/// A sorted `Vec` standing in for the tree.
#[derive(Default)]
struct Model(Vec<i64>);

impl Model {
    fn insert(&mut self, v: i64) {
        let at = self.0.partition_point(|&x| x < v);
        self.0.insert(at, v);
    }

    fn remove(&mut self, v: i64) -> Option<i64> {
        let at = self.0.binary_search(&v).ok()?;
        Some(self.0.remove(at))
    }
}

/// Replays `ops` on a tree of the given order and on the model, comparing every result.
fn replay<const ORDER: usize>(ops: &[TreeOp]) -> Result<(), TestCaseError> {
    let mut tree: BTree<i64, NaturalOrder, ORDER> = BTree::default();
    let mut model = Model::default();

    for op in ops {
        match *op {
            TreeOp::Insert(v) => {
                let position = tree.insert(v);
                prop_assert_eq!(tree.get(position), Some(&v), "insert({})", v);
                model.insert(v);
            }
            TreeOp::Remove(v) => {
                prop_assert_eq!(tree.remove(&v), model.remove(v), "remove({})", v);
            }
            TreeOp::Exists(v) => {
                let expected = model.0.binary_search(&v).is_ok();
                prop_assert_eq!(tree.exists(&v), expected, "exists({})", v);
                prop_assert_eq!(tree.contains(&v), expected, "contains({})", v);
            }
            TreeOp::PopFirst => {
                let expected = if model.0.is_empty() { None } else { Some(model.0.remove(0)) };
                prop_assert_eq!(tree.pop_first(), expected, "pop_first()");
            }
            TreeOp::PopLast => {
                prop_assert_eq!(tree.pop_last(), model.0.pop(), "pop_last()");
            }
            TreeOp::RemoveByRank(r) => {
                if model.0.is_empty() {
                    prop_assert!(tree.find_by_index(r).is_none());
                    continue;
                }
                let rank = r % model.0.len();
                let position = tree.find_by_index(rank).unwrap();
                prop_assert_eq!(tree.remove_by_position(position), Some(model.0.remove(rank)));
            }
        }
        prop_assert_eq!(tree.len(), model.0.len());
    }

    prop_assert_eq!(tree.validate(), Ok(()));
    prop_assert_eq!(tree.to_vec(), model.0);
    Ok(())
}

// ─── Core operations against a sorted Vec ────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn ops_match_model_order_3(ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE)) {
        replay::<3>(&ops)?;
    }

    #[test]
    fn ops_match_model_order_4(ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE)) {
        replay::<4>(&ops)?;
    }

    #[test]
    fn ops_match_model_order_5(ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE)) {
        replay::<5>(&ops)?;
    }

    #[test]
    fn ops_match_model_order_6(ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE)) {
        replay::<6>(&ops)?;
    }

    #[test]
    fn ops_match_model_order_9(ops in proptest::collection::vec(tree_op_strategy(), TEST_SIZE)) {
        replay::<9>(&ops)?;
    }

    /// Every insertion sequence walks back out in non-decreasing order, with `len()` keys.
    #[test]
    fn in_order_is_sorted(values in proptest::collection::vec(value_strategy(), 0..TEST_SIZE)) {
        let tree: BTree<i64> = values.iter().copied().collect();
        let walked: Vec<i64> = tree.in_order().map(|ctx| *ctx.key).collect();
        prop_assert!(walked.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(walked.len(), tree.size());
    }

    /// Removing a present key makes it disappear (when unique) and shrinks the tree by one;
    /// removing an absent key changes nothing.
    #[test]
    fn remove_is_exact(values in proptest::collection::hash_set(value_strategy(), 1..500), probe in value_strategy()) {
        let mut tree: BTree<i64> = values.iter().copied().collect();
        let before = tree.len();
        let snapshot = tree.to_vec();
        let height = tree.height();

        if values.contains(&probe) {
            prop_assert_eq!(tree.remove(&probe), Some(probe));
            prop_assert!(!tree.exists(&probe));
            prop_assert_eq!(tree.size(), before - 1);
        } else {
            prop_assert_eq!(tree.remove(&probe), None);
            prop_assert_eq!(tree.size(), before);
            prop_assert_eq!(tree.height(), height);
            prop_assert_eq!(tree.to_vec(), snapshot);
        }
        prop_assert_eq!(tree.validate(), Ok(()));
    }
}

// ─── Order-statistic operations ──────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn find_by_index_matches_in_order(values in proptest::collection::vec(value_strategy(), 0..TEST_SIZE)) {
        let tree: BTree<i64, NaturalOrder, 4> = values.iter().copied().collect();
        for (rank, expected) in tree.iter().enumerate() {
            let position = tree.find_by_index(rank).unwrap();
            prop_assert_eq!(tree.get(position), Some(expected));
            prop_assert_eq!(&tree[Rank(rank)], expected);
        }
        prop_assert!(tree.find_by_index(tree.len()).is_none());
    }

    #[test]
    fn rank_of_matches_sorted_vec(values in proptest::collection::vec(value_strategy(), 0..TEST_SIZE), probe in value_strategy()) {
        let tree: BTree<i64> = values.iter().copied().collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        let expected = sorted.iter().position(|&v| v == probe);
        prop_assert_eq!(tree.rank_of(&probe), expected);
    }

    #[test]
    fn neighbours_match_ranks(values in proptest::collection::vec(value_strategy(), 1..TEST_SIZE)) {
        let tree: BTree<i64, NaturalOrder, 3> = values.iter().copied().collect();
        let mut position = tree.find_by_index(0);
        let mut rank = 0;
        while let Some(p) = position {
            prop_assert_eq!(tree.get(p), tree.get_by_rank(rank));
            if rank > 0 {
                let previous = tree.prev_payload(p).unwrap();
                prop_assert_eq!(tree.get(previous), tree.get_by_rank(rank - 1));
            }
            position = tree.next_payload(p);
            rank += 1;
        }
        prop_assert_eq!(rank, tree.len());
    }
}

// ─── Concrete scenarios ──────────────────────────────────────────────────────

#[test]
fn fifth_insert_splits_order_5_root() {
    init_test_logger();
    let mut tree = BTree::new();
    for key in [9, 11, 2, 7] {
        tree.insert(key);
    }
    assert_eq!(tree.height(), 1);
    tree.insert(3);
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.to_vec(), [2, 3, 7, 9, 11]);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn remove_internal_key_keeps_invariants() {
    init_test_logger();
    let mut tree = BTree::from([9, 11, 2, 7, 3, 5, 13, 17, 19]);
    assert!(tree.exists(&13));
    assert_eq!(tree.remove(&13), Some(13));
    assert!(!tree.exists(&13));
    assert_eq!(tree.size(), 8);
    assert_eq!(tree.to_vec(), [2, 3, 5, 7, 9, 11, 17, 19]);
    assert_eq!(tree.validate(), Ok(()));
}

#[test]
fn random_permutation_round_trip_empties_tree() {
    init_test_logger();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..8 {
        let mut keys: Vec<u32> = (0..1_500).collect();
        keys.shuffle(&mut rng);
        let mut tree: BTree<u32, NaturalOrder, 4> = BTree::default();
        tree.extend(keys.iter().copied());
        assert_eq!(tree.validate(), Ok(()));

        keys.shuffle(&mut rng);
        for (removed, key) in keys.iter().enumerate() {
            assert_eq!(tree.remove(key), Some(*key));
            if removed % 97 == 0 {
                assert_eq!(tree.validate(), Ok(()));
            }
        }
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.root().map(|root| root.payload_count()), Some(0));
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.validate(), Ok(()));
    }
}

#[test]
fn duplicates_are_kept_and_removed_one_at_a_time() {
    let mut tree: BTree<u8, NaturalOrder, 3> = BTree::default();
    tree.extend([4, 4, 4, 1, 4, 9, 4]);
    assert_eq!(tree.len(), 7);
    assert_eq!(tree.rank_of(&4), Some(1));
    assert_eq!(tree.validate(), Ok(()));
    for left in (0..5).rev() {
        assert_eq!(tree.remove(&4), Some(4));
        assert_eq!(tree.iter().filter(|&&k| k == 4).count(), left);
        assert_eq!(tree.validate(), Ok(()));
    }
    assert_eq!(tree.to_vec(), [1, 9]);
}

#[test]
fn custom_comparators_drive_the_order() {
    let mut tree: BTree<i32, ReverseOrder, 4> = BTree::default();
    tree.extend(0..30);
    assert_eq!(tree.first(), Some(&29));
    assert_eq!(tree.last(), Some(&0));
    assert_eq!(tree.rank_of(&27), Some(2));
    assert_eq!(tree.validate(), Ok(()));

    let mut by_len: BTree<&str, _> = BTree::with_comparator(|a: &&str, b: &&str| a.len().cmp(&b.len()));
    by_len.extend(["pear", "fig", "banana", "kiwi"]);
    assert_eq!(by_len.first(), Some(&"fig"));
    assert_eq!(by_len.last(), Some(&"banana"));
    assert!(by_len.contains(&"plum"));
}

#[test]
fn stale_positions_are_harmless() {
    let mut tree: BTree<u32, NaturalOrder, 3> = (0..20).collect();
    let position = tree.find(&19).unwrap();
    tree.clear();
    assert_eq!(tree.get(position), None);
    assert_eq!(tree.next_payload(position), None);
    assert_eq!(tree.remove_by_position(position), None);
    assert!(tree.cursor(position).is_none());
    assert!(tree.node(position.node()).is_none());
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
}

#[test]
fn clear_then_reuse() {
    let mut tree: BTree<u32> = (0..100).collect();
    tree.clear();
    assert_eq!(tree.validate(), Ok(()));
    tree.extend(50..60);
    assert_eq!(tree.to_vec(), (50..60).collect::<Vec<_>>());
    assert_eq!(tree.first(), Some(&50));
}

#[test]
fn pop_drains_both_ends() {
    let mut tree: BTree<u32, NaturalOrder, 6> = (0..200).collect();
    let mut low = 0;
    let mut high = 199;
    while !tree.is_empty() {
        assert_eq!(tree.pop_first(), Some(low));
        if let Some(top) = tree.pop_last() {
            assert_eq!(top, high);
        }
        low += 1;
        high -= 1;
        assert_eq!(tree.validate(), Ok(()));
    }
    assert_eq!(tree.pop_first(), None);
    assert_eq!(tree.pop_last(), None);
}

// ─── Out-of-bounds Rank indexing panic tests ──────────────────────────────────

#[test]
#[should_panic(expected = "rank out of bounds")]
fn index_rank_empty_tree_panics() {
    let tree: BTree<i64> = BTree::new();
    let _ = tree[Rank(0)];
}

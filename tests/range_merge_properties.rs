//! Range Merge Property Tests
//!
//! Seeded randomized checks of the merge guarantees:
//! - Output ranges are pairwise disjoint
//! - Output covers exactly the keys the inputs cover
//! - Output is independent of input order
//! - Insert then remove restores the tree

use aerorange::observability::MetricsRegistry;
use aerorange::range::{
    remove_overlapping_ranges, validate_range_collection, Cut, MergePolicy, Range,
    RangeColumnExpr, RangeColumnExprTree, RangeMerger, SqlType, Value,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const INT: SqlType = SqlType::Int64;

// =============================================================================
// Helper Functions
// =============================================================================

/// Random column range over [0, span] with random bound types, sometimes
/// with NULL-inclusive or unbounded ends.
fn random_column(rng: &mut StdRng, span: i64) -> RangeColumnExpr {
    let a = rng.gen_range(0..=span);
    let b = rng.gen_range(a..=span);
    let lower = match rng.gen_range(0..10) {
        0 => Cut::BelowNull,
        1 => Cut::AboveNull,
        2..=5 => Cut::Below(Value::Int(a)),
        _ => Cut::Above(Value::Int(a)),
    };
    let upper = match rng.gen_range(0..10) {
        0 => Cut::AboveAll,
        1..=5 => Cut::Above(Value::Int(b)),
        _ => Cut::Below(Value::Int(b)),
    };
    RangeColumnExpr::new(lower, upper, INT)
}

fn random_range(rng: &mut StdRng, columns: usize, span: i64) -> Range {
    Range::new((0..columns).map(|_| random_column(rng, span)).collect())
}

/// Every key in [-1, span + 1] per column, plus NULL
fn grid(columns: usize, span: i64) -> Vec<Vec<Option<Value>>> {
    let axis: Vec<Option<Value>> = std::iter::once(None)
        .chain((-1..=span + 1).map(|v| Some(Value::Int(v))))
        .collect();
    let mut keys: Vec<Vec<Option<Value>>> = vec![Vec::new()];
    for _ in 0..columns {
        let mut next = Vec::with_capacity(keys.len() * axis.len());
        for key in &keys {
            for v in &axis {
                let mut k = key.clone();
                k.push(v.clone());
                next.push(k);
            }
        }
        keys = next;
    }
    keys
}

fn assert_exact_cover(inputs: &[Range], merged: &[Range], columns: usize, span: i64) {
    for key in grid(columns, span) {
        let covered = inputs.iter().any(|r| r.contains(&key).unwrap());
        let hits = merged.iter().filter(|r| r.contains(&key).unwrap()).count();
        assert_eq!(
            hits,
            usize::from(covered),
            "key {:?} covered={} hits={}",
            key,
            covered,
            hits
        );
    }
}

fn strings(ranges: &[Range]) -> Vec<String> {
    ranges.iter().map(|r| r.to_string()).collect()
}

// =============================================================================
// Single Column
// =============================================================================

/// Flattening a one-column tree yields disjoint ranges covering the inputs.
#[test]
fn test_single_column_collection_is_exact() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        let inputs: Vec<Range> = (0..rng.gen_range(1..20))
            .map(|_| random_range(&mut rng, 1, 30))
            .collect();
        let mut tree = RangeColumnExprTree::new(&inputs[0]).unwrap();
        for r in &inputs[1..] {
            tree.insert(r).unwrap();
        }

        let merged = tree.get_range_collection().unwrap();
        let non_empty: Vec<Range> = merged
            .into_iter()
            .filter(|r| !r.is_empty().unwrap())
            .collect();
        validate_range_collection(&non_empty).unwrap();
        assert_exact_cover(&inputs, &non_empty, 1, 30);
    }
}

/// Adjacent-values merging never changes which integer keys are covered.
#[test]
fn test_adjacent_policy_preserves_cover() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..50 {
        let inputs: Vec<Range> = (0..rng.gen_range(1..15))
            .map(|_| random_range(&mut rng, 1, 20))
            .collect();
        let merged: Vec<Range> = remove_overlapping_ranges(&inputs, MergePolicy::AdjacentValues)
            .unwrap()
            .into_iter()
            .filter(|r| !r.is_empty().unwrap())
            .collect();
        validate_range_collection(&merged).unwrap();
        assert_exact_cover(&inputs, &merged, 1, 20);
    }
}

// =============================================================================
// Multiple Columns
// =============================================================================

/// Overlap removal over two columns yields disjoint boxes covering the
/// inputs exactly.
#[test]
fn test_two_column_merge_is_exact() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..40 {
        let inputs: Vec<Range> = (0..rng.gen_range(1..10))
            .map(|_| random_range(&mut rng, 2, 8))
            .collect();
        let merged: Vec<Range> = remove_overlapping_ranges(&inputs, MergePolicy::Connected)
            .unwrap()
            .into_iter()
            .filter(|r| !r.is_empty().unwrap())
            .collect();
        validate_range_collection(&merged).unwrap();
        assert_exact_cover(&inputs, &merged, 2, 8);
    }
}

/// Three columns, smaller domain.
#[test]
fn test_three_column_merge_is_exact() {
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..20 {
        let inputs: Vec<Range> = (0..rng.gen_range(1..8))
            .map(|_| random_range(&mut rng, 3, 4))
            .collect();
        let merged: Vec<Range> = remove_overlapping_ranges(&inputs, MergePolicy::Connected)
            .unwrap()
            .into_iter()
            .filter(|r| !r.is_empty().unwrap())
            .collect();
        validate_range_collection(&merged).unwrap();
        assert_exact_cover(&inputs, &merged, 3, 4);
    }
}

/// Single-column merges are canonical: input order does not matter.
#[test]
fn test_single_column_merge_order_independent() {
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..30 {
        let mut inputs: Vec<Range> = (0..rng.gen_range(2..12))
            .map(|_| random_range(&mut rng, 1, 25))
            .collect();
        let first = remove_overlapping_ranges(&inputs, MergePolicy::Connected).unwrap();
        inputs.shuffle(&mut rng);
        let second = remove_overlapping_ranges(&inputs, MergePolicy::Connected).unwrap();
        assert_eq!(strings(&first), strings(&second));
    }
}

// =============================================================================
// Tree Round Trips
// =============================================================================

/// Inserting a fresh range and removing it again restores the collection.
#[test]
fn test_insert_remove_restores_collection() {
    let mut rng = StdRng::seed_from_u64(6);
    let base: Vec<Range> = (0..30).map(|_| random_range(&mut rng, 2, 10)).collect();
    let mut tree = RangeColumnExprTree::new(&base[0]).unwrap();
    for r in &base[1..] {
        tree.insert(r).unwrap();
    }
    let before = strings(&tree.get_range_collection().unwrap());
    let size = tree.len();

    for _ in 0..50 {
        let extra = random_range(&mut rng, 2, 10);
        if base.iter().any(|b| b.equals(&extra).unwrap()) {
            continue;
        }
        tree.insert(&extra).unwrap();
        tree.remove(&extra).unwrap();
        assert_eq!(tree.len(), size);
        assert_eq!(strings(&tree.get_range_collection().unwrap()), before);
    }
}

// =============================================================================
// Metrics
// =============================================================================

/// Emitted plus merged ranges account for every input.
#[test]
fn test_flatten_metrics_account_for_inputs() {
    let mut rng = StdRng::seed_from_u64(7);
    let metrics = MetricsRegistry::new();
    let merger = RangeMerger::new(MergePolicy::Connected).with_metrics(&metrics);

    let mut total_inputs = 0u64;
    for _ in 0..10 {
        let inputs: Vec<Range> = (0..rng.gen_range(1..10))
            .map(|_| random_range(&mut rng, 1, 10))
            .collect();
        total_inputs += inputs.len() as u64;
        merger.merge(&inputs).unwrap();
    }

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.collections_flattened, 10);
    assert_eq!(
        snapshot.ranges_emitted + snapshot.ranges_merged,
        total_inputs
    );
    assert_eq!(snapshot.compare_failures, 0);
}

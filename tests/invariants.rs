//! Property-based invariant tests plus the boundary behaviors: a
//! fully-disconnected universe yields only singletons, and a clique on n
//! aliases yields 2^n - 1 subplans.

use joinsub_enumerator::{enumerate, EnumerationOptions};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

const ALIASES: [&str; 4] = ["A", "B", "C", "D"];
const PAIRS: [(usize, usize); 6] = [(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)];

/// Builds a query joining all four aliases on a comma FROM, with one
/// `alias.k = alias.k` WHERE predicate per edge present in `mask`.
fn build_sql(mask: &[bool]) -> Option<String> {
    let edges: Vec<(usize, usize)> = PAIRS
        .iter()
        .cloned()
        .zip(mask.iter())
        .filter(|(_, on)| **on)
        .map(|(p, _)| p)
        .collect();
    if edges.is_empty() {
        return None;
    }
    let from = ALIASES.join(", ");
    let where_clause = edges
        .iter()
        .map(|&(i, j)| format!("{}.k = {}.k", ALIASES[i], ALIASES[j]))
        .collect::<Vec<_>>()
        .join(" AND ");
    Some(format!("SELECT * FROM {from} WHERE {where_clause};"))
}

proptest! {
    /// Invariants 1, 3, 7: every decomposition is a valid, previously-emitted
    /// binary partition of its subset; every canonical subset key is unique;
    /// re-running the same query yields byte-identical output.
    #[test]
    fn decomposition_uniqueness_and_determinism(mask in prop::collection::vec(any::<bool>(), 6)) {
        let Some(sql) = build_sql(&mask) else { return Ok(()); };
        let outcome = enumerate(&sql, &EnumerationOptions::default()).unwrap();

        let mut seen = HashSet::new();
        for sp in &outcome.subplans {
            prop_assert!(
                seen.insert(sp.subset.as_str().to_string()),
                "duplicate subset key {}",
                sp.subset
            );
        }

        for (idx, sp) in outcome.subplans.iter().enumerate() {
            if let (Some(left), Some(right)) = (&sp.left, &sp.right) {
                let left_aliases: BTreeSet<&str> = left.aliases().into_iter().collect();
                let right_aliases: BTreeSet<&str> = right.aliases().into_iter().collect();
                prop_assert!(left_aliases.is_disjoint(&right_aliases));

                let subset_aliases: BTreeSet<&str> = sp.subset.aliases().into_iter().collect();
                let union: BTreeSet<&str> = left_aliases.union(&right_aliases).cloned().collect();
                prop_assert_eq!(union, subset_aliases);

                let left_idx = outcome
                    .subplans
                    .iter()
                    .position(|s| &s.subset == left)
                    .expect("left side of a decomposition must have been emitted");
                let right_idx = outcome
                    .subplans
                    .iter()
                    .position(|s| &s.subset == right)
                    .expect("right side of a decomposition must have been emitted");
                prop_assert!(left_idx < idx);
                prop_assert!(right_idx < idx);
            }
        }

        let outcome2 = enumerate(&sql, &EnumerationOptions::default()).unwrap();
        prop_assert_eq!(outcome.subplans, outcome2.subplans);
        prop_assert_eq!(outcome.queries, outcome2.queries);
    }
}

#[test]
fn fully_disconnected_four_aliases_yield_only_singletons() {
    let sql = "SELECT * FROM A, B, C, D WHERE A.w > 1 AND B.w > 2 AND C.w > 3 AND D.w > 4;";
    let outcome = enumerate(sql, &EnumerationOptions::default()).unwrap();
    assert_eq!(outcome.subplans.len(), 4);
    assert!(outcome.subplans.iter().all(|s| s.is_singleton()));
}

#[test]
fn clique_on_four_aliases_yields_fifteen_subplans() {
    let sql = build_sql(&[true; 6]).unwrap();
    let outcome = enumerate(&sql, &EnumerationOptions::default()).unwrap();
    assert_eq!(outcome.subplans.len(), 15);

    let mut keys: Vec<&str> = outcome.subplans.iter().map(|s| s.subset.as_str()).collect();
    let unique: HashSet<&str> = keys.iter().cloned().collect();
    assert_eq!(unique.len(), keys.len());
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 15);
}

#[test]
fn max_level_bound_never_emits_a_subset_above_the_bound() {
    let sql = build_sql(&[true; 6]).unwrap();
    let options = EnumerationOptions {
        max_level: Some(2),
        ..EnumerationOptions::default()
    };
    let outcome = enumerate(&sql, &options).unwrap();
    assert!(outcome.subplans.iter().all(|s| s.level <= 2));
    assert_eq!(outcome.subplans.len(), 4 + 6);
}

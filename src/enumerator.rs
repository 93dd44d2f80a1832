//! C3 — Subset Enumerator.
//!
//! Level-by-level dynamic-programming enumeration of every connected subset
//! of an alias universe, recording one deterministic binary decomposition
//! per subset. Combination generation follows ascending-lexicographic
//! ("odometer") order, so results are stable across runs.

use std::collections::HashSet;

use crate::join_graph::JoinGraph;
use crate::types::{issue_codes, Diagnostic, Subplan, SubsetKey};

fn combinations(items: &[String], k: usize) -> Vec<Vec<String>> {
    let mut result = Vec::new();
    let mut current = Vec::new();
    combinations_helper(items, k, 0, &mut current, &mut result);
    result
}

fn combinations_helper(
    items: &[String],
    k: usize,
    start: usize,
    current: &mut Vec<String>,
    result: &mut Vec<Vec<String>>,
) {
    if current.len() == k {
        result.push(current.clone());
        return;
    }
    for i in start..items.len() {
        current.push(items[i].clone());
        combinations_helper(items, k, i + 1, current, result);
        current.pop();
    }
}

/// Enumerates every connected subset of `aliases`, level by level, against
/// a built [`JoinGraph`].
pub struct Enumerator<'a> {
    aliases: Vec<String>,
    graph: &'a JoinGraph,
}

impl<'a> Enumerator<'a> {
    /// `aliases` need not be pre-sorted or deduplicated; this constructor
    /// normalizes them to the canonical lexicographic order the rest of the
    /// enumerator relies on for deterministic subset keys.
    pub fn new(aliases: Vec<String>, graph: &'a JoinGraph) -> Self {
        let mut aliases = aliases;
        aliases.sort();
        aliases.dedup();
        Self { aliases, graph }
    }

    /// Runs the full level-1..=top enumeration. `max_level` caps the
    /// largest subset size considered; when it truncates the universe a
    /// single informational diagnostic records how many aliases were
    /// dropped from consideration above that level.
    pub fn enumerate(&self, max_level: Option<usize>) -> (Vec<Subplan>, Vec<Diagnostic>) {
        let n = self.aliases.len();
        let mut subplans = Vec::new();
        let mut dp: HashSet<SubsetKey> = HashSet::new();
        let mut diagnostics = Vec::new();

        for alias in &self.aliases {
            let subplan = Subplan::singleton(alias);
            dp.insert(subplan.subset.clone());
            subplans.push(subplan);
        }

        let top_level = max_level.map(|k| k.min(n)).unwrap_or(n);
        if let Some(k) = max_level {
            if k < n {
                diagnostics.push(Diagnostic::info(
                    issue_codes::MAX_LEVEL_TRUNCATED,
                    format!(
                        "max_level={k} truncated enumeration; {} alias(es) above that level were not considered",
                        n - k
                    ),
                ));
            }
        }

        for level in 2..=top_level {
            for combo in combinations(&self.aliases, level) {
                let key = SubsetKey::from_sorted_aliases(&combo);
                if dp.contains(&key) {
                    continue;
                }
                if !self.graph.connected(&combo) {
                    continue;
                }
                match self.find_decomposition(&combo, &dp) {
                    Some((left, right)) => {
                        dp.insert(key.clone());
                        subplans.push(Subplan {
                            level,
                            subset: key,
                            left: Some(left),
                            right: Some(right),
                        });
                    }
                    None => {
                        diagnostics.push(
                            Diagnostic::error(
                                issue_codes::INTERNAL_NO_DECOMPOSITION,
                                format!("connected subset {key} had no valid decomposition"),
                            )
                            .with_subset(key),
                        );
                    }
                }
            }
        }

        (subplans, diagnostics)
    }

    /// Smallest-left-size-first, lexicographic-within-size search for the
    /// first `(left, right)` split already in `dp` with `can_join(left,
    /// right)` true.
    fn find_decomposition(
        &self,
        combo: &[String],
        dp: &HashSet<SubsetKey>,
    ) -> Option<(SubsetKey, SubsetKey)> {
        let l = combo.len();
        for left_size in 1..=(l / 2) {
            for left_combo in combinations(combo, left_size) {
                let right_combo: Vec<String> = combo
                    .iter()
                    .filter(|a| !left_combo.contains(a))
                    .cloned()
                    .collect();
                let left_key = SubsetKey::from_sorted_aliases(&left_combo);
                let right_key = SubsetKey::from_sorted_aliases(&right_combo);
                if dp.contains(&left_key)
                    && dp.contains(&right_key)
                    && self.graph.can_join(&left_combo, &right_combo)
                {
                    return Some((left_key, right_key));
                }
            }
        }
        None
    }
}

//! C4 — Sub-query Reconstructor.
//!
//! Renders one SQL sub-query per enumerated subplan: a singleton scan, or a
//! JOIN tree grown from the lexicographically smallest alias, preferring
//! original edges over derived ones, with a WHERE clause assembled from
//! selections, complex predicates, and any join predicate not already used
//! as an ON-clause condition.

use std::collections::{HashMap, HashSet};

use crate::classifier::ClassifiedPredicates;
use crate::join_graph::JoinGraph;
use crate::types::{JoinPredicateRecord, ReconstructedQuery, RelationRef, Subplan};

fn predicates_between_set_and(
    graph: &JoinGraph,
    added: &[String],
    candidate: &str,
) -> Vec<JoinPredicateRecord> {
    let mut details = Vec::new();
    for a in added {
        details.extend(graph.join_predicates_on(a, candidate).iter().cloned());
    }
    details
}

/// Scans `remaining` in order; returns the first candidate with an original
/// edge to `added`, or the first candidate with any edge at all if none is
/// original. `None` if no candidate in `remaining` has any edge to `added`.
fn choose_next(
    added: &[String],
    remaining: &[String],
    graph: &JoinGraph,
) -> Option<(String, Option<JoinPredicateRecord>)> {
    let mut fallback: Option<(String, JoinPredicateRecord)> = None;
    for candidate in remaining {
        let details = predicates_between_set_and(graph, added, candidate);
        if details.is_empty() {
            continue;
        }
        if let Some(original) = details.iter().find(|d| d.original) {
            return Some((candidate.clone(), Some(original.clone())));
        }
        if fallback.is_none() {
            fallback = Some((candidate.clone(), details[0].clone()));
        }
    }
    fallback.map(|(candidate, pred)| (candidate, Some(pred)))
}

fn where_clause(conjuncts: &[String]) -> String {
    if conjuncts.is_empty() {
        String::new()
    } else {
        format!("\nWHERE {}", conjuncts.join("\n  AND "))
    }
}

/// Looks up `alias` in `relations`, falling back to an alias-equals-base
/// reference if it's somehow absent. The pipeline always populates every
/// alias in the subplan's universe; this keeps reconstruction total rather
/// than relying on that invariant to never be violated.
fn relation_for(relations: &HashMap<String, RelationRef>, alias: &str) -> RelationRef {
    relations
        .get(alias)
        .cloned()
        .unwrap_or_else(|| RelationRef::new(alias, alias))
}

/// Renders the SQL for one subplan. `relations` maps every alias in the
/// query's universe to its [`RelationRef`].
pub fn reconstruct(
    subplan: &Subplan,
    relations: &HashMap<String, RelationRef>,
    classified: &ClassifiedPredicates,
    graph: &JoinGraph,
) -> ReconstructedQuery {
    let sorted_aliases: Vec<String> = subplan.subset.aliases().iter().map(|a| a.to_string()).collect();

    if subplan.is_singleton() {
        let alias = &sorted_aliases[0];
        let rel = relation_for(relations, alias);
        let preds = classified.predicates_for(&sorted_aliases);
        let mut conjuncts: Vec<String> = preds.selections.iter().map(|s| s.to_string()).collect();
        conjuncts.extend(preds.complex.iter().map(|s| s.to_string()));

        let sql = format!("SELECT * FROM {}{};", rel.rendered(), where_clause(&conjuncts));
        return ReconstructedQuery {
            subset: subplan.subset.clone(),
            sql,
        };
    }

    let first_alias = sorted_aliases[0].clone();
    let mut added = vec![first_alias.clone()];
    let mut remaining: Vec<String> = sorted_aliases[1..].to_vec();
    let mut used: HashSet<String> = HashSet::new();

    let first_rel = relation_for(relations, &first_alias);
    let mut sql = format!("SELECT * FROM {}", first_rel.rendered());

    while !remaining.is_empty() {
        match choose_next(&added, &remaining, graph) {
            Some((chosen, predicate)) => {
                let rel = relation_for(relations, &chosen);
                sql.push_str(&format!("\nJOIN {}", rel.rendered()));
                if let Some(pred) = &predicate {
                    let rendered = pred.render();
                    sql.push_str(&format!(" ON {rendered}"));
                    used.insert(rendered);
                }
                remaining.retain(|a| a != &chosen);
                added.push(chosen);
            }
            None => break,
        }
    }

    let preds = classified.predicates_for(&sorted_aliases);
    let mut conjuncts: Vec<String> = preds.selections.iter().map(|s| s.to_string()).collect();
    conjuncts.extend(preds.complex.iter().map(|s| s.to_string()));
    for join in &preds.joins {
        let rendered = join.render();
        if !used.contains(&rendered) {
            conjuncts.push(rendered);
        }
    }

    sql.push_str(&where_clause(&conjuncts));
    sql.push(';');

    ReconstructedQuery {
        subset: subplan.subset.clone(),
        sql,
    }
}

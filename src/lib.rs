//! Connected-subset join enumeration and sub-query reconstruction for
//! inner-join SQL.
//!
//! Given a single-statement inner-join query, [`enumerate`] finds the
//! connected alias subsets implied by its join graph (C2: original `=`
//! predicates, plus derived equality from constant-equality inference and
//! column-aware transitive closure), enumerates every such subset level by
//! level (C3), and reconstructs one equivalent SQL sub-query per subset (C4).
//!
//! ```text
//! front (FROM/JOIN) ─┐
//! classifier (WHERE) ─┴─▶ join_graph ─▶ enumerator ─▶ reconstructor
//! ```
//!
//! A malformed `FROM` clause is the only fatal condition ([`AnalysisError`]);
//! everything else — unbalanced predicates, unsupported constructs, a
//! closure that didn't converge, a `max_level` bound that truncated
//! enumeration — is recorded as a [`Diagnostic`] alongside a normal result.

pub mod classifier;
pub mod enumerator;
pub mod error;
pub mod front;
pub mod join_graph;
pub mod reconstructor;
pub mod text_scan;
pub mod types;

use std::collections::HashMap;

pub use error::AnalysisError;
pub use types::{
    ColumnRef, Diagnostic, EnumerationOptions, EnumerationOutcome, EquivalenceClass,
    JoinPredicateRecord, RelationRef, ReconstructedQuery, Severity, Subplan, SubsetKey,
};

use enumerator::Enumerator;
use join_graph::JoinGraph;

/// Runs the full pipeline over `sql`: parses the `FROM`/`JOIN` clause and any
/// `WHERE` predicates, builds the join graph, enumerates every connected
/// alias subset up to `options.max_level`, and reconstructs a sub-query for
/// each.
///
/// Returns `Err` only when the query's shape can't be made sense of at all
/// (no `FROM` clause, no alias extractable, zero relations). Every other
/// irregularity is folded into [`EnumerationOutcome::diagnostics`].
pub fn enumerate(
    sql: &str,
    options: &EnumerationOptions,
) -> Result<EnumerationOutcome, AnalysisError> {
    #[cfg(feature = "tracing")]
    tracing::debug!(sql_len = sql.len(), "starting join-subset enumeration");

    let front::FrontResult {
        relations,
        explicit_predicates,
    } = front::parse_from(sql)?;

    let mut classified = classifier::classify(sql);
    for item in explicit_predicates {
        classified.push_item(item);
    }

    let mut graph = JoinGraph::new();
    for join in &classified.joins {
        graph.ingest_original(join.left.clone(), join.right.clone());
    }
    graph.infer_constant_equalities(&classified.selections);

    let mut diagnostics = classified.diagnostics.clone();
    if let Some(d) = graph.run_transitive_closure(options.closure_iteration_cap) {
        #[cfg(feature = "tracing")]
        tracing::warn!(code = %d.code, "{}", d.message);
        diagnostics.push(d);
    }

    let relations_by_alias: HashMap<String, RelationRef> = relations
        .iter()
        .map(|r| (r.alias.clone(), r.clone()))
        .collect();
    let aliases: Vec<String> = relations.iter().map(|r| r.alias.clone()).collect();

    let enumerator = Enumerator::new(aliases, &graph);
    let (subplans, enum_diagnostics) = enumerator.enumerate(options.max_level);
    diagnostics.extend(enum_diagnostics);

    let queries = subplans
        .iter()
        .map(|subplan| reconstructor::reconstruct(subplan, &relations_by_alias, &classified, &graph))
        .collect();

    #[cfg(feature = "tracing")]
    tracing::debug!(
        subplans = subplans.len(),
        diagnostics = diagnostics.len(),
        "join-subset enumeration finished"
    );

    Ok(EnumerationOutcome {
        subplans,
        queries,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_to_end_s1_produces_expected_query() {
        let outcome = enumerate(
            "SELECT * FROM A, B WHERE A.x = B.y AND A.z > 10;",
            &EnumerationOptions::default(),
        )
        .unwrap();

        assert_eq!(outcome.subplans.len(), 3);
        let ab = outcome
            .queries
            .iter()
            .find(|q| q.subset.as_str() == "A,B")
            .expect("A,B should be enumerated");
        assert_eq!(ab.sql, "SELECT * FROM A\nJOIN B ON A.x = B.y\nWHERE A.z > 10;");
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn no_from_clause_is_fatal_end_to_end() {
        assert!(matches!(
            enumerate("SELECT 1", &EnumerationOptions::default()),
            Err(AnalysisError::NoFromClause)
        ));
    }

    #[test]
    fn max_level_truncation_surfaces_as_diagnostic() {
        let options = EnumerationOptions {
            max_level: Some(1),
            ..EnumerationOptions::default()
        };
        let outcome = enumerate(
            "SELECT * FROM A, B WHERE A.x = B.y;",
            &options,
        )
        .unwrap();
        assert_eq!(outcome.subplans.len(), 2);
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.code == types::issue_codes::MAX_LEVEL_TRUNCATED));
    }

    #[test]
    fn explicit_join_on_clause_feeds_the_join_graph() {
        let outcome = enumerate(
            "SELECT * FROM t1 a JOIN t2 b ON a.x = b.y",
            &EnumerationOptions::default(),
        )
        .unwrap();
        let ab = outcome
            .queries
            .iter()
            .find(|q| q.subset.as_str() == "a,b")
            .expect("a,b should be connected via the explicit ON predicate");
        assert_eq!(ab.sql, "SELECT * FROM t1 a\nJOIN t2 b ON a.x = b.y;");
    }
}

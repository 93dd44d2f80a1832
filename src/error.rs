//! Fatal error type for join-subset enumeration.
//!
//! # Error handling strategy
//!
//! This crate uses two complementary patterns, mirroring a parse/analysis
//! split common to SQL tooling:
//!
//! - [`AnalysisError`]: a fatal error that stops processing of the whole
//!   query. It is returned as `Result<_, AnalysisError>` from
//!   [`crate::enumerate`] and covers the one input-shape failure that leaves
//!   nothing to analyze — no `FROM` clause, no alias extractable, zero
//!   relations detected.
//! - [`crate::types::Diagnostic`]: every other failure mode (`PredicateShape`,
//!   `UnsupportedConstruct`, `ClosureFuel`, `Internal`) is non-fatal and
//!   accumulated in a vector alongside a successful result, so the core
//!   never aborts a query over a malformed predicate or an exhausted
//!   closure budget.

use thiserror::Error;

/// Fatal failure to make sense of the query's shape at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// No `FROM` clause (case-insensitively) could be located in the input.
    #[error("no FROM clause found in query")]
    NoFromClause,

    /// A `FROM`/`JOIN` clause was found but no alias or base-table name
    /// could be extracted from it.
    #[error("no relation alias could be extracted from the FROM clause")]
    NoAliasExtractable,

    /// Parsing succeeded structurally but zero relations were detected.
    #[error("zero base relations detected in query")]
    ZeroRelations,
}

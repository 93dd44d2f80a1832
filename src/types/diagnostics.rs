use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::SubsetKey;

/// Severity of a non-fatal [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A non-fatal condition encountered during analysis or enumeration.
///
/// Diagnostics are accumulated, never raised: a malformed WHERE clause, an
/// unsupported construct preserved as a complex predicate, a closure that
/// hit its iteration cap, a subset that could not be decomposed, or a
/// `max_level` bound that truncated enumeration all surface here rather than
/// aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<SubsetKey>,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            subset: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            subset: None,
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code: code.into(),
            message: message.into(),
            subset: None,
        }
    }

    pub fn with_subset(mut self, subset: SubsetKey) -> Self {
        self.subset = Some(subset);
        self
    }
}

/// Machine-readable diagnostic codes, one per non-fatal failure mode the
/// core can encounter (the one fatal category is modeled separately as
/// [`crate::error::AnalysisError`] instead).
pub mod issue_codes {
    /// Unbalanced quotes/parens in the WHERE clause; classifier proceeded
    /// with a best-effort partial split.
    pub const PREDICATE_SHAPE: &str = "PREDICATE_SHAPE";
    /// A top-level OR, non-equality comparison, OUTER/SEMI/ANTI join, or
    /// subquery was preserved verbatim as a complex predicate.
    pub const UNSUPPORTED_CONSTRUCT: &str = "UNSUPPORTED_CONSTRUCT";
    /// Column-aware transitive closure hit its iteration cap before
    /// reaching a fixpoint.
    pub const CLOSURE_FUEL_EXCEEDED: &str = "CLOSURE_FUEL_EXCEEDED";
    /// A connected subset had no valid decomposition; it was skipped.
    pub const INTERNAL_NO_DECOMPOSITION: &str = "INTERNAL_NO_DECOMPOSITION";
    /// `EnumerationOptions::max_level` truncated enumeration before all
    /// aliases were covered.
    pub const MAX_LEVEL_TRUNCATED: &str = "MAX_LEVEL_TRUNCATED";
}

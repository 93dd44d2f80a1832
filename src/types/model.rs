use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{canonical_edge_key, SUBSET_KEY_SEP};

/// A relation reference: an alias paired with the base-table name it stands
/// for. When the query gives no alias, `alias == base_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelationRef {
    /// The identifier used inside the query (`FROM t1 a1` -> `a1`).
    pub alias: String,
    /// The physical relation name (`FROM t1 a1` -> `t1`).
    pub base_table: String,
}

impl RelationRef {
    pub fn new(alias: impl Into<String>, base_table: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            base_table: base_table.into(),
        }
    }

    /// Renders the relation as it belongs in a `FROM`/`JOIN` clause:
    /// just the base table when alias == base_table, otherwise `base alias`.
    pub fn rendered(&self) -> String {
        if self.alias == self.base_table {
            self.base_table.clone()
        } else {
            format!("{} {}", self.base_table, self.alias)
        }
    }
}

/// A column reference: `(alias, column-name)`, rendered as `alias.column`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    pub alias: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }

    /// The `alias.column` string used as an equivalence-class member key.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.alias, self.column)
    }
}

/// An equality join predicate between two column references from distinct
/// aliases, plus its canonical edge key and provenance flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinPredicateRecord {
    pub left: ColumnRef,
    pub right: ColumnRef,
    pub edge_key: String,
    /// `true` when extracted verbatim from the WHERE/ON clause; `false` when
    /// derived by closure (column-aware transitivity or constant equality).
    pub original: bool,
}

impl JoinPredicateRecord {
    pub fn new(left: ColumnRef, right: ColumnRef, original: bool) -> Self {
        let edge_key = canonical_edge_key(&left.alias, &right.alias);
        Self {
            left,
            right,
            edge_key,
            original,
        }
    }

    /// Literal `t1.t1col = t2.t2col` rendering, left side first.
    pub fn render(&self) -> String {
        format!(
            "{} = {}",
            self.left.qualified(),
            self.right.qualified()
        )
    }

    /// The unordered column-pair used to de-duplicate derived predicates
    /// against existing ones on the same edge key.
    pub fn unordered_column_pair(&self) -> (ColumnRef, ColumnRef) {
        if self.left <= self.right {
            (self.left.clone(), self.right.clone())
        } else {
            (self.right.clone(), self.left.clone())
        }
    }
}

/// An unordered set of column references (`alias.column` strings) known to
/// be pairwise equal through transitive closure of `=` join predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EquivalenceClass(Vec<String>);

impl EquivalenceClass {
    pub fn from_members(mut members: Vec<String>) -> Self {
        members.sort();
        Self(members)
    }

    pub fn members(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.0.iter().any(|m| m == qualified)
    }
}

/// Canonical subset key: the sorted sequence of aliases joined by a fixed
/// separator. Two subsets with the same alias set always produce the same
/// key regardless of construction order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SubsetKey(String);

impl SubsetKey {
    /// Builds the canonical key from an arbitrary (possibly unsorted) slice
    /// of aliases.
    pub fn from_aliases<S: AsRef<str>>(aliases: &[S]) -> Self {
        let mut sorted: Vec<&str> = aliases.iter().map(AsRef::as_ref).collect();
        sorted.sort_unstable();
        Self(sorted.join(SUBSET_KEY_SEP))
    }

    /// Builds the key directly from a slice already known to be sorted.
    pub fn from_sorted_aliases<S: AsRef<str>>(sorted_aliases: &[S]) -> Self {
        let joined = sorted_aliases
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(SUBSET_KEY_SEP);
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the key back into its constituent aliases, in canonical
    /// (sorted) order.
    pub fn aliases(&self) -> Vec<&str> {
        self.0.split(SUBSET_KEY_SEP).collect()
    }

    pub fn len(&self) -> usize {
        self.aliases().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SubsetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One enumerated subplan: a subset, its level, and the binary decomposition
/// that proves it connected (absent for singletons).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subplan {
    pub level: usize,
    pub subset: SubsetKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<SubsetKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<SubsetKey>,
}

impl Subplan {
    pub fn singleton(alias: &str) -> Self {
        Self {
            level: 1,
            subset: SubsetKey::from_aliases(&[alias]),
            left: None,
            right: None,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// The reconstructed SQL text for one enumerated subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructedQuery {
    pub subset: SubsetKey,
    pub sql: String,
}

/// The full result of one [`crate::enumerate`] call: every enumerated
/// subplan paired with its reconstructed SQL, plus any diagnostics
/// accumulated along the way. `subplans[i]` and `queries[i]` share an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnumerationOutcome {
    pub subplans: Vec<Subplan>,
    pub queries: Vec<ReconstructedQuery>,
    pub diagnostics: Vec<super::Diagnostic>,
}

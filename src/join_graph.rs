//! C2 — Join Graph & Equivalence-Class Engine.
//!
//! Ingests original join predicates, builds equivalence classes over
//! `alias.column` references, infers derived joins from constant-equality
//! selections and column-aware transitive closure, and answers the
//! connectivity queries C3 and C4 need.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::OnceLock;

use regex::Regex;

use crate::text_scan;
use crate::types::{canonical_edge_key, issue_codes, ColumnRef, Diagnostic, EquivalenceClass, JoinPredicateRecord};

fn alias_of(qualified: &str) -> &str {
    qualified.split('.').next().unwrap_or(qualified)
}

fn constant_equality_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.+)$")
            .expect("static constant-equality regex is valid")
    })
}

fn constant_in_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)\s+IN\s*\((.+)\)\s*$")
            .expect("static constant-IN regex is valid")
    })
}

/// Strips an outer matching quote pair, a trailing `::type` cast suffix, and
/// surrounding whitespace from a literal token.
fn normalize_literal(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(idx) = s.find("::") {
        s = &s[..idx];
    }
    s = s.trim();
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        let first = bytes[0] as char;
        let last = bytes[bytes.len() - 1] as char;
        if (first == '\'' && last == '\'') || (first == '"' && last == '"') {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}

/// Recognizes `alias.col = <literal>` or `alias.col IN (<single literal>)`,
/// returning `(column, normalized literal)`.
fn extract_constant_equality(text: &str) -> Option<(String, String)> {
    let trimmed = text.trim();
    if let Some(caps) = constant_equality_regex().captures(trimmed) {
        let col = caps[2].to_string();
        let literal = normalize_literal(&caps[3]);
        return Some((col, literal));
    }
    if let Some(caps) = constant_in_regex().captures(trimmed) {
        let inner = &caps[3];
        let parts = text_scan::split_top_level_commas(inner);
        if parts.len() == 1 {
            let col = caps[2].to_string();
            let literal = normalize_literal(&parts[0]);
            return Some((col, literal));
        }
    }
    None
}

fn columns_match(a: &ColumnRef, b: &ColumnRef) -> bool {
    a.alias == b.alias && a.column == b.column
}

fn build_if_distinct(a: &ColumnRef, b: &ColumnRef) -> Option<JoinPredicateRecord> {
    if a.alias == b.alias {
        return None;
    }
    Some(JoinPredicateRecord::new(a.clone(), b.clone(), false))
}

/// Checks whether `d1` and `d2` share a relation *and* agree on the column
/// on that shared relation, and if so derives the resulting transitive edge
/// on the other two endpoints. Four orientations are checked.
fn derive_transitive(d1: &JoinPredicateRecord, d2: &JoinPredicateRecord) -> Option<JoinPredicateRecord> {
    if columns_match(&d1.left, &d2.left) {
        return build_if_distinct(&d1.right, &d2.right);
    }
    if columns_match(&d1.left, &d2.right) {
        return build_if_distinct(&d1.right, &d2.left);
    }
    if columns_match(&d1.right, &d2.left) {
        return build_if_distinct(&d1.left, &d2.right);
    }
    if columns_match(&d1.right, &d2.right) {
        return build_if_distinct(&d1.left, &d2.left);
    }
    None
}

/// Stores join-predicate details keyed by canonical edge key, plus the
/// equivalence-class partition over `alias.column` references.
#[derive(Debug, Default)]
pub struct JoinGraph {
    edges: HashMap<String, Vec<JoinPredicateRecord>>,
    ec_next_id: usize,
    ec_members: HashMap<usize, BTreeSet<String>>,
    ec_owner: HashMap<String, usize>,
}

impl JoinGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union-find merge of `a` and `b` over the four cases: both already in
    /// the same class (no-op), both in distinct classes (merge), one known
    /// (extend), neither known (create a new class with both).
    fn merge_columns(&mut self, a: &str, b: &str) {
        match (self.ec_owner.get(a).copied(), self.ec_owner.get(b).copied()) {
            (Some(ia), Some(ib)) if ia == ib => {}
            (Some(ia), Some(ib)) => {
                let moved = self.ec_members.remove(&ib).unwrap_or_default();
                for m in &moved {
                    self.ec_owner.insert(m.clone(), ia);
                }
                self.ec_members.entry(ia).or_default().extend(moved);
            }
            (Some(ia), None) => {
                self.ec_owner.insert(b.to_string(), ia);
                self.ec_members.entry(ia).or_default().insert(b.to_string());
            }
            (None, Some(ib)) => {
                self.ec_owner.insert(a.to_string(), ib);
                self.ec_members.entry(ib).or_default().insert(a.to_string());
            }
            (None, None) => {
                let id = self.ec_next_id;
                self.ec_next_id += 1;
                let mut set = BTreeSet::new();
                set.insert(a.to_string());
                set.insert(b.to_string());
                self.ec_owner.insert(a.to_string(), id);
                self.ec_owner.insert(b.to_string(), id);
                self.ec_members.insert(id, set);
            }
        }
    }

    /// Stores a predicate detail if its unordered column pair is not
    /// already present on the same edge key, merging its endpoints' ECs.
    /// Returns `true` iff a new detail was stored.
    fn store_detail(&mut self, record: JoinPredicateRecord) -> bool {
        let pair = record.unordered_column_pair();
        let is_duplicate = self
            .edges
            .get(&record.edge_key)
            .map(|existing| existing.iter().any(|r| r.unordered_column_pair() == pair))
            .unwrap_or(false);
        if is_duplicate {
            return false;
        }
        let (left_q, right_q) = (record.left.qualified(), record.right.qualified());
        self.edges.entry(record.edge_key.clone()).or_default().push(record);
        self.merge_columns(&left_q, &right_q);
        true
    }

    /// Ingests one directly-extracted (WHERE or ON) join predicate.
    pub fn ingest_original(&mut self, left: ColumnRef, right: ColumnRef) {
        self.store_detail(JoinPredicateRecord::new(left, right, true));
    }

    /// Groups single-table selections constraining a column to one literal
    /// value, and derives pairwise joins across aliases that share a
    /// (column, literal) pair.
    pub fn infer_constant_equalities(&mut self, selections: &HashMap<String, Vec<String>>) {
        let mut groups: HashMap<(String, String), Vec<String>> = HashMap::new();
        for (alias, texts) in selections {
            for text in texts {
                if let Some((col, literal)) = extract_constant_equality(text) {
                    groups.entry((col, literal)).or_default().push(alias.clone());
                }
            }
        }
        for ((col, _literal), mut aliases) in groups {
            aliases.sort();
            aliases.dedup();
            if aliases.len() < 2 {
                continue;
            }
            for i in 0..aliases.len() {
                for j in (i + 1)..aliases.len() {
                    let left = ColumnRef::new(aliases[i].clone(), col.clone());
                    let right = ColumnRef::new(aliases[j].clone(), col.clone());
                    self.store_detail(JoinPredicateRecord::new(left, right, false));
                }
            }
        }
    }

    /// Column-aware transitive closure, iterated to a fixpoint and capped
    /// at `cap` rounds. Returns a `CLOSURE_FUEL_EXCEEDED` diagnostic if the
    /// cap was hit before reaching a fixpoint.
    pub fn run_transitive_closure(&mut self, cap: usize) -> Option<Diagnostic> {
        for _ in 0..cap {
            let snapshot: Vec<(String, JoinPredicateRecord)> = self
                .edges
                .iter()
                .flat_map(|(key, recs)| recs.iter().map(move |r| (key.clone(), r.clone())))
                .collect();

            let mut derived = Vec::new();
            for i in 0..snapshot.len() {
                for j in 0..snapshot.len() {
                    if snapshot[i].0 == snapshot[j].0 {
                        continue;
                    }
                    if let Some(new_rec) = derive_transitive(&snapshot[i].1, &snapshot[j].1) {
                        derived.push(new_rec);
                    }
                }
            }

            let mut added_any = false;
            for rec in derived {
                if self.store_detail(rec) {
                    added_any = true;
                }
            }
            if !added_any {
                return None;
            }
        }
        Some(Diagnostic::warning(
            issue_codes::CLOSURE_FUEL_EXCEEDED,
            format!("column-aware transitive closure did not reach a fixpoint within {cap} iterations"),
        ))
    }

    /// `true` iff some equivalence class contains a column from `a` and a
    /// column from `b`.
    pub fn ec_connected(&self, a: &str, b: &str) -> bool {
        self.ec_members
            .values()
            .any(|set| set.iter().any(|c| alias_of(c) == a) && set.iter().any(|c| alias_of(c) == b))
    }

    /// `true` iff an explicit edge (original or derived) spans `a` and `b`.
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edges.contains_key(&canonical_edge_key(a, b))
    }

    /// `connected(subset)`: BFS over `subset`, treating two aliases as
    /// adjacent if EC-connected or joined by an explicit edge. Empty and
    /// singleton subsets are connected by definition.
    pub fn connected(&self, subset: &[String]) -> bool {
        if subset.len() <= 1 {
            return true;
        }
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::new();
        let first = subset[0].as_str();
        visited.insert(first);
        queue.push_back(first);

        while let Some(cur) = queue.pop_front() {
            for other in subset {
                let other = other.as_str();
                if visited.contains(other) {
                    continue;
                }
                if self.ec_connected(cur, other) || self.has_edge(cur, other) {
                    visited.insert(other);
                    queue.push_back(other);
                }
            }
        }

        visited.len() == subset.len()
    }

    /// `can_join(left, right)`: true iff some alias in `left` is linked to
    /// some alias in `right` by an EC or an explicit edge.
    pub fn can_join(&self, left: &[String], right: &[String]) -> bool {
        left.iter()
            .any(|l| right.iter().any(|r| self.ec_connected(l, r) || self.has_edge(l, r)))
    }

    /// All stored predicate details between `a` and `b`, regardless of
    /// argument order.
    pub fn join_predicates_on(&self, a: &str, b: &str) -> &[JoinPredicateRecord] {
        self.edges
            .get(&canonical_edge_key(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Snapshot of the current equivalence-class partition, for diagnostics
    /// or external inspection.
    pub fn equivalence_classes(&self) -> Vec<EquivalenceClass> {
        self.ec_members
            .values()
            .map(|set| EquivalenceClass::from_members(set.iter().cloned().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(alias: &str, column: &str) -> ColumnRef {
        ColumnRef::new(alias, column)
    }

    #[test]
    fn ec_merges_two_singleton_classes() {
        let mut g = JoinGraph::new();
        g.ingest_original(col("A", "x"), col("B", "y"));
        g.ingest_original(col("B", "y"), col("C", "z"));
        assert!(g.ec_connected("A", "C"));
    }

    #[test]
    fn ec_does_not_connect_different_columns_on_shared_alias() {
        let mut g = JoinGraph::new();
        g.ingest_original(col("A", "x"), col("B", "y"));
        g.ingest_original(col("B", "z"), col("C", "w"));
        assert!(!g.ec_connected("A", "C"));
    }

    #[test]
    fn transitive_closure_adds_matching_column_edge() {
        let mut g = JoinGraph::new();
        g.ingest_original(col("C", "a"), col("D", "b"));
        g.ingest_original(col("D", "b"), col("E", "c"));
        assert!(g.run_transitive_closure(10).is_none());
        assert!(g.has_edge("C", "E"));
        let derived = g.join_predicates_on("C", "E");
        assert_eq!(derived.len(), 1);
        assert!(!derived[0].original);
    }

    #[test]
    fn transitive_closure_skips_mismatched_column() {
        let mut g = JoinGraph::new();
        g.ingest_original(col("A", "x"), col("B", "y"));
        g.ingest_original(col("B", "z"), col("C", "w"));
        g.run_transitive_closure(10);
        assert!(!g.has_edge("A", "C"));
    }

    #[test]
    fn constant_equality_derives_cross_alias_join() {
        let mut g = JoinGraph::new();
        let mut selections = HashMap::new();
        selections.insert("X".to_string(), vec!["X.k = 'p'".to_string()]);
        selections.insert("Y".to_string(), vec!["Y.k = 'p'".to_string()]);
        g.infer_constant_equalities(&selections);
        assert!(g.has_edge("X", "Y"));
        let recs = g.join_predicates_on("X", "Y");
        assert_eq!(recs.len(), 1);
        assert!(!recs[0].original);
    }

    #[test]
    fn constant_equality_ignores_distinct_values() {
        let mut g = JoinGraph::new();
        let mut selections = HashMap::new();
        selections.insert("X".to_string(), vec!["X.k = 'p'".to_string()]);
        selections.insert("Y".to_string(), vec!["Y.k = 'q'".to_string()]);
        g.infer_constant_equalities(&selections);
        assert!(!g.has_edge("X", "Y"));
    }

    #[test]
    fn connected_true_for_singleton_and_empty() {
        let g = JoinGraph::new();
        assert!(g.connected(&[]));
        assert!(g.connected(&["A".to_string()]));
    }

    #[test]
    fn connected_false_when_no_link() {
        let mut g = JoinGraph::new();
        g.ingest_original(col("A", "x"), col("B", "y"));
        let subset = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert!(!g.connected(&subset));
    }

    #[test]
    fn can_join_checks_both_directions() {
        let mut g = JoinGraph::new();
        g.ingest_original(col("A", "x"), col("B", "y"));
        let left = vec!["A".to_string()];
        let right = vec!["B".to_string()];
        assert!(g.can_join(&left, &right));
        assert!(g.can_join(&right, &left));
    }
}

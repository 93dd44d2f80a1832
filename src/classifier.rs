//! C1 — Predicate Classifier.
//!
//! Locates the WHERE clause, splits it at top-level `AND` boundaries, and
//! classifies each resulting predicate as a join, a single-table selection,
//! or a multi-table complex predicate.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::text_scan;
use crate::types::{issue_codes, ColumnRef, Diagnostic, JoinPredicateRecord};

fn alias_column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)")
            .expect("static alias.column regex is valid")
    })
}

fn join_predicate_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^\s*
            ([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)
            \s*==?\s*
            ([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)
            \s*$
            ",
        )
        .expect("static join predicate regex is valid")
    })
}

/// A single classified predicate: a join, a single-table selection, or a
/// multi-table complex predicate (optionally flagged as a multi-table-OR
/// candidate for the peripheral UNION-expansion collaborator).
#[derive(Debug, Clone)]
pub enum ClassifiedItem {
    Join(JoinPredicateRecord),
    Selection { alias: String, text: String },
    Complex {
        text: String,
        aliases: Vec<String>,
        multi_table_or_candidate: bool,
    },
}

/// Extracts the distinct aliases referenced in `text`, in order of first
/// appearance, by scanning for `identifier.identifier` tokens.
pub fn extract_aliases(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in alias_column_regex().captures_iter(text) {
        let alias = caps[1].to_string();
        if !seen.contains(&alias) {
            seen.push(alias);
        }
    }
    seen
}

/// Classifies a single predicate conjunct: a two-alias equality becomes a
/// join, a single-alias predicate becomes a selection, and everything else
/// (a top-level `OR`, a non-equality multi-table comparison) is preserved
/// verbatim as a complex predicate.
pub fn classify_predicate_text(text: &str) -> ClassifiedItem {
    let trimmed = text.trim();
    let aliases = extract_aliases(trimmed);

    if text_scan::has_top_level_or(trimmed) {
        return ClassifiedItem::Complex {
            text: trimmed.to_string(),
            aliases,
            multi_table_or_candidate: false,
        };
    }

    if aliases.len() == 2 {
        if let Some(caps) = join_predicate_regex().captures(trimmed) {
            let left_alias = &caps[1];
            let right_alias = &caps[3];
            if left_alias != right_alias {
                let left = ColumnRef::new(left_alias, &caps[2]);
                let right = ColumnRef::new(right_alias, &caps[4]);
                return ClassifiedItem::Join(JoinPredicateRecord::new(left, right, true));
            }
        }
    }

    if aliases.len() == 1 {
        return ClassifiedItem::Selection {
            alias: aliases[0].clone(),
            text: trimmed.to_string(),
        };
    }

    let multi_table_or_candidate = trimmed.starts_with('(') && contains_word_or(trimmed);

    ClassifiedItem::Complex {
        text: trimmed.to_string(),
        aliases,
        multi_table_or_candidate,
    }
}

fn or_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bOR\b").expect("static OR regex is valid"))
}

fn contains_word_or(text: &str) -> bool {
    or_keyword_regex().is_match(text)
}

/// All predicates classified from a query's WHERE clause.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedPredicates {
    /// alias -> verbatim selection predicate texts
    pub selections: HashMap<String, Vec<String>>,
    /// original (`original == true`) join predicates
    pub joins: Vec<JoinPredicateRecord>,
    pub complex: Vec<ComplexPredicate>,
    pub diagnostics: Vec<Diagnostic>,
}

fn unsupported_construct_diagnostic(text: &str) -> Diagnostic {
    Diagnostic::warning(
        issue_codes::UNSUPPORTED_CONSTRUCT,
        format!(
            "predicate `{text}` is a top-level OR, non-equality multi-table comparison, or other \
             unsupported construct; preserved verbatim as a complex predicate and excluded from \
             join and EC inference"
        ),
    )
}

#[derive(Debug, Clone)]
pub struct ComplexPredicate {
    pub text: String,
    pub aliases: Vec<String>,
    pub multi_table_or_candidate: bool,
}

impl ClassifiedPredicates {
    /// Folds one classified predicate into the appropriate bucket. `pub(crate)`
    /// so the pipeline can merge in predicates classified from explicit
    /// `ON` clauses alongside this module's own WHERE-clause classification.
    pub(crate) fn push_item(&mut self, item: ClassifiedItem) {
        match item {
            ClassifiedItem::Join(j) => self.joins.push(j),
            ClassifiedItem::Selection { alias, text } => {
                self.selections.entry(alias).or_default().push(text);
            }
            ClassifiedItem::Complex {
                text,
                aliases,
                multi_table_or_candidate,
            } => {
                self.diagnostics.push(unsupported_construct_diagnostic(&text));
                self.complex.push(ComplexPredicate {
                    text,
                    aliases,
                    multi_table_or_candidate,
                });
            }
        }
    }

    /// `predicates_for(subset)`: selections for any alias in `subset`, joins
    /// whose both endpoints lie in `subset`, complex predicates whose every
    /// referenced alias lies in `subset`.
    pub fn predicates_for<'a>(&'a self, subset: &[String]) -> PredicatesForSubset<'a> {
        let in_subset = |a: &str| subset.iter().any(|s| s == a);

        let mut selections = Vec::new();
        for alias in subset {
            if let Some(texts) = self.selections.get(alias) {
                selections.extend(texts.iter().map(String::as_str));
            }
        }

        let joins: Vec<&JoinPredicateRecord> = self
            .joins
            .iter()
            .filter(|j| in_subset(&j.left.alias) && in_subset(&j.right.alias))
            .collect();

        let complex: Vec<&str> = self
            .complex
            .iter()
            .filter(|c| c.aliases.iter().all(|a| in_subset(a)))
            .map(|c| c.text.as_str())
            .collect();

        PredicatesForSubset {
            selections,
            joins,
            complex,
        }
    }

    /// `join_predicates_between(left, right)`: original join predicates with
    /// one endpoint in `left` and the other in `right`.
    pub fn join_predicates_between(
        &self,
        left: &[String],
        right: &[String],
    ) -> Vec<&JoinPredicateRecord> {
        self.joins
            .iter()
            .filter(|j| {
                (left.iter().any(|a| a == &j.left.alias) && right.iter().any(|a| a == &j.right.alias))
                    || (left.iter().any(|a| a == &j.right.alias)
                        && right.iter().any(|a| a == &j.left.alias))
            })
            .collect()
    }
}

pub struct PredicatesForSubset<'a> {
    pub selections: Vec<&'a str>,
    pub joins: Vec<&'a JoinPredicateRecord>,
    pub complex: Vec<&'a str>,
}

/// Locates the WHERE clause in `sql`: from a top-level `WHERE` keyword up to
/// the next top-level `GROUP BY` / `ORDER BY` / `LIMIT`, or the end of the
/// statement (trailing `;` stripped).
pub fn locate_where_clause(sql: &str) -> Option<String> {
    let m = text_scan::find_first_top_level_keyword(sql, &[&["WHERE"]])?;
    let rest = &sql[text_scan::char_byte_offset(sql, m.end)..];
    let terminator = text_scan::find_first_top_level_keyword(
        rest,
        &[&["GROUP", "BY"], &["ORDER", "BY"], &["LIMIT"]],
    );
    let end = terminator
        .map(|t| text_scan::char_byte_offset(rest, t.start))
        .unwrap_or(rest.len());
    let mut clause = rest[..end].trim();
    if let Some(stripped) = clause.strip_suffix(';') {
        clause = stripped.trim();
    }
    if clause.is_empty() {
        None
    } else {
        Some(clause.to_string())
    }
}

/// Runs the full C1 pipeline over the complete query text: locates the
/// WHERE clause, splits it at top-level `AND`, and classifies each
/// conjunct. A malformed (unbalanced) WHERE clause still yields a
/// best-effort partial result plus a `PREDICATE_SHAPE` diagnostic.
pub fn classify(sql: &str) -> ClassifiedPredicates {
    let mut result = ClassifiedPredicates::default();

    let Some(where_clause) = locate_where_clause(sql) else {
        return result;
    };

    if !text_scan::is_balanced(&where_clause) {
        result.diagnostics.push(Diagnostic::warning(
            issue_codes::PREDICATE_SHAPE,
            "WHERE clause has unbalanced quotes or parentheses; proceeding with a best-effort split",
        ));
    }

    for conjunct in text_scan::split_top_level_and(&where_clause) {
        result.push_item(classify_predicate_text(&conjunct));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_join_predicate() {
        match classify_predicate_text("a.x = b.y") {
            ClassifiedItem::Join(j) => {
                assert_eq!(j.left, ColumnRef::new("a", "x"));
                assert_eq!(j.right, ColumnRef::new("b", "y"));
                assert!(j.original);
            }
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn classifies_double_equals_join() {
        match classify_predicate_text("a.x == b.y") {
            ClassifiedItem::Join(_) => {}
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn classifies_selection() {
        match classify_predicate_text("a.z > 10") {
            ClassifiedItem::Selection { alias, text } => {
                assert_eq!(alias, "a");
                assert_eq!(text, "a.z > 10");
            }
            other => panic!("expected Selection, got {other:?}"),
        }
    }

    #[test]
    fn classifies_complex_non_equality_two_table() {
        match classify_predicate_text("a.x > b.y") {
            ClassifiedItem::Complex { aliases, .. } => {
                assert_eq!(aliases, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected Complex, got {other:?}"),
        }
    }

    #[test]
    fn classifies_top_level_or_as_complex() {
        match classify_predicate_text("a.x = 1 OR a.y = 2") {
            ClassifiedItem::Complex { .. } => {}
            other => panic!("expected Complex, got {other:?}"),
        }
    }

    #[test]
    fn flags_multi_table_or_candidate() {
        match classify_predicate_text("(a.x = 1 OR b.y = 2)") {
            ClassifiedItem::Complex {
                multi_table_or_candidate,
                ..
            } => assert!(multi_table_or_candidate),
            other => panic!("expected Complex, got {other:?}"),
        }
    }

    #[test]
    fn locates_where_clause_up_to_group_by() {
        let where_text =
            locate_where_clause("SELECT * FROM a WHERE a.x = 1 GROUP BY a.x").unwrap();
        assert_eq!(where_text, "a.x = 1");
    }

    #[test]
    fn locates_where_clause_to_end_with_semicolon() {
        let where_text = locate_where_clause("SELECT * FROM a WHERE a.x = 1;").unwrap();
        assert_eq!(where_text, "a.x = 1");
    }

    #[test]
    fn no_where_clause_returns_none() {
        assert!(locate_where_clause("SELECT * FROM a").is_none());
    }

    #[test]
    fn full_classify_two_table_where() {
        let c = classify("SELECT * FROM A, B WHERE A.x = B.y AND A.z > 10;");
        assert_eq!(c.joins.len(), 1);
        assert_eq!(c.selections.get("A").unwrap(), &vec!["A.z > 10".to_string()]);
        assert!(c.complex.is_empty());
        assert!(c.diagnostics.is_empty());
    }

    #[test]
    fn complex_predicate_emits_unsupported_construct_diagnostic() {
        let c = classify("SELECT * FROM A, B WHERE A.x = 1 OR B.y = 2;");
        assert_eq!(c.complex.len(), 1);
        assert_eq!(c.diagnostics.len(), 1);
        assert_eq!(c.diagnostics[0].code, issue_codes::UNSUPPORTED_CONSTRUCT);
    }
}

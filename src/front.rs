//! Analyzer front: FROM/JOIN parsing.
//!
//! Feeds the classifier and join graph with the alias universe and any join
//! predicates written as explicit `ON` clauses. Style is detected by the
//! presence of a whitespace-bounded `JOIN` keyword: explicit-JOIN style
//! (`FROM t1 a1 JOIN t2 a2 ON ...`) if found, comma-style
//! (`FROM t1 a1, t2 a2 WHERE ...`) otherwise.

use std::sync::OnceLock;

use regex::Regex;

use crate::classifier::{self, ClassifiedItem};
use crate::error::AnalysisError;
use crate::text_scan;
use crate::types::RelationRef;

/// Output of the FROM/JOIN front: the discovered relations in source order,
/// plus any join predicates written as explicit `ON` clauses (each tagged
/// `original = true` once classified).
pub struct FrontResult {
    pub relations: Vec<RelationRef>,
    pub explicit_predicates: Vec<ClassifiedItem>,
}

fn table_alias_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:(?:AS\s+)?([A-Za-z_][A-Za-z0-9_]*))?\s*$")
            .expect("static table/alias regex is valid")
    })
}

fn parse_table_alias(text: &str) -> Option<RelationRef> {
    let caps = table_alias_regex().captures(text.trim())?;
    let base_table = caps[1].to_string();
    let alias = caps
        .get(2)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| base_table.clone());
    Some(RelationRef::new(alias, base_table))
}

const JOIN_PHRASES: &[&[&str]] = &[&["INNER", "JOIN"], &["JOIN"]];

/// Locates the `FROM ... [WHERE|GROUP BY|ORDER BY|LIMIT|;|$]` region and
/// parses it into relations plus any explicit-JOIN `ON` predicates.
pub fn parse_from(sql: &str) -> Result<FrontResult, AnalysisError> {
    let from_match = text_scan::find_first_top_level_keyword(sql, &[&["FROM"]])
        .ok_or(AnalysisError::NoFromClause)?;
    let after_from = &sql[text_scan::char_byte_offset(sql, from_match.end)..];

    let end_match = text_scan::find_first_top_level_keyword(
        after_from,
        &[&["WHERE"], &["GROUP", "BY"], &["ORDER", "BY"], &["LIMIT"]],
    );
    let region_end = end_match
        .map(|m| text_scan::char_byte_offset(after_from, m.start))
        .unwrap_or(after_from.len());
    let mut region = after_from[..region_end].trim();
    if let Some(stripped) = region.strip_suffix(';') {
        region = stripped.trim();
    }

    if region.trim().is_empty() {
        return Err(AnalysisError::ZeroRelations);
    }

    let result = if text_scan::has_join_keyword(region) {
        parse_explicit_join(region)
    } else {
        parse_comma_list(region)
    };

    if result.relations.is_empty() {
        return Err(AnalysisError::NoAliasExtractable);
    }

    Ok(result)
}

fn parse_comma_list(region: &str) -> FrontResult {
    let mut relations = Vec::new();
    for item in text_scan::split_top_level_commas(region) {
        if let Some(rel) = parse_table_alias(&item) {
            relations.push(rel);
        }
    }
    FrontResult {
        relations,
        explicit_predicates: Vec::new(),
    }
}

fn parse_explicit_join(region: &str) -> FrontResult {
    let mut relations = Vec::new();
    let mut explicit_predicates = Vec::new();

    let Some(first_join) = text_scan::find_first_top_level_keyword(region, JOIN_PHRASES) else {
        // `has_join_keyword` said yes but a top-level match failed (e.g. the
        // only JOIN occurrence is nested in parens); fall back to treating
        // the whole region as a single relation.
        if let Some(rel) = parse_table_alias(region) {
            relations.push(rel);
        }
        return FrontResult {
            relations,
            explicit_predicates,
        };
    };

    let first_segment_end = text_scan::char_byte_offset(region, first_join.start);
    if let Some(rel) = parse_table_alias(&region[..first_segment_end]) {
        relations.push(rel);
    }

    let mut remaining = &region[text_scan::char_byte_offset(region, first_join.end)..];

    loop {
        let next_join = text_scan::find_first_top_level_keyword(remaining, JOIN_PHRASES);
        let segment = match next_join {
            Some(nj) => &remaining[..text_scan::char_byte_offset(remaining, nj.start)],
            None => remaining,
        };

        let on_match = text_scan::find_first_top_level_keyword(segment, &[&["ON"]]);
        match on_match {
            Some(onm) => {
                let table_part = &segment[..text_scan::char_byte_offset(segment, onm.start)];
                let predicate_part = &segment[text_scan::char_byte_offset(segment, onm.end)..];
                if let Some(rel) = parse_table_alias(table_part) {
                    relations.push(rel);
                }
                for conjunct in text_scan::split_top_level_and(predicate_part) {
                    explicit_predicates.push(classifier::classify_predicate_text(&conjunct));
                }
            }
            None => {
                // Cross join: no ON clause.
                if let Some(rel) = parse_table_alias(segment) {
                    relations.push(rel);
                }
            }
        }

        match next_join {
            Some(nj) => {
                remaining = &remaining[text_scan::char_byte_offset(remaining, nj.end)..];
            }
            None => break,
        }
    }

    FrontResult {
        relations,
        explicit_predicates,
    }
}

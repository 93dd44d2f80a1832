//! Paren/quote-aware top-level tokenization.
//!
//! The predicate classifier and the FROM-clause front both need to split
//! text at a separator (`AND`, a comma) while treating parenthesized groups
//! and quoted string literals as opaque, and — for `AND` specifically —
//! while not treating the `AND` inside `BETWEEN x AND y` as a splitter. This
//! module holds the single character-level scanner both rely on, rather
//! than duplicating paren/quote bookkeeping in each caller.
//!
//! Regex handles the rest of the analyzer's tokenization (identifier
//! extraction, clause-boundary keywords); this module exists because parens,
//! quotes, and `BETWEEN` nesting are not regular.

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_word_start(chars: &[char], i: usize) -> bool {
    is_word_char(chars[i]) && (i == 0 || !is_word_char(chars[i - 1]))
}

/// Matches a single case-insensitive whole word at char index `i`. Returns
/// the index just past the match, or `None`.
fn match_word(chars: &[char], i: usize, word: &str) -> Option<usize> {
    let wchars: Vec<char> = word.chars().collect();
    let wl = wchars.len();
    if i + wl > chars.len() {
        return None;
    }
    for (k, wc) in wchars.iter().enumerate() {
        if !chars[i + k].eq_ignore_ascii_case(wc) {
            return None;
        }
    }
    if i + wl < chars.len() && is_word_char(chars[i + wl]) {
        return None;
    }
    Some(i + wl)
}

/// Matches a case-insensitive whole-word phrase (words separated by
/// whitespace, e.g. `["GROUP", "BY"]`) at char index `i`.
fn match_phrase(chars: &[char], i: usize, words: &[&str]) -> Option<usize> {
    let mut pos = i;
    for (idx, word) in words.iter().enumerate() {
        pos = match_word(chars, pos, word)?;
        if idx + 1 < words.len() {
            let ws_start = pos;
            while pos < chars.len() && chars[pos].is_whitespace() {
                pos += 1;
            }
            if pos == ws_start {
                return None;
            }
        }
    }
    Some(pos)
}

/// Result of scanning a predicate/relation-list text for top-level
/// structure: comma positions, `AND`-split boundaries (excluding the `AND`
/// inside `BETWEEN ... AND ...`), and whether a top-level `OR` was seen.
pub struct TopLevelScan {
    pub commas: Vec<usize>,
    pub and_breaks: Vec<(usize, usize)>,
    pub or_found: bool,
}

/// Scans `input` at paren-depth 0, outside quoted string literals (single or
/// double quotes, backslash-escaped), recording top-level commas, top-level
/// `AND` boundaries, and whether any top-level `OR` occurs. The `AND` inside
/// a `BETWEEN x AND y` is tracked and excluded from `and_breaks`.
pub fn scan_top_level(input: &str) -> TopLevelScan {
    let chars: Vec<char> = input.chars().collect();
    let n = chars.len();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut i = 0usize;
    let mut commas = Vec::new();
    let mut and_breaks = Vec::new();
    let mut or_found = false;
    let mut between_pending: u32 = 0;

    while i < n {
        let c = chars[i];

        if let Some(q) = quote {
            if c == '\\' && i + 1 < n {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                i += 1;
                continue;
            }
            '(' => {
                depth += 1;
                i += 1;
                continue;
            }
            ')' => {
                depth -= 1;
                i += 1;
                continue;
            }
            ',' => {
                if depth == 0 {
                    commas.push(i);
                }
                i += 1;
                continue;
            }
            _ => {}
        }

        if depth == 0 && is_word_start(&chars, i) {
            if let Some(end) = match_word(&chars, i, "BETWEEN") {
                between_pending += 1;
                i = end;
                continue;
            }
            if let Some(end) = match_word(&chars, i, "AND") {
                if between_pending > 0 {
                    between_pending -= 1;
                } else {
                    and_breaks.push((i, end));
                }
                i = end;
                continue;
            }
            if let Some(end) = match_word(&chars, i, "OR") {
                or_found = true;
                i = end;
                continue;
            }
            let mut j = i + 1;
            while j < n && is_word_char(chars[j]) {
                j += 1;
            }
            i = j;
            continue;
        }

        i += 1;
    }

    TopLevelScan {
        commas,
        and_breaks,
        or_found,
    }
}

fn char_slice(chars: &[char], start: usize, end: usize) -> String {
    chars[start..end].iter().collect::<String>().trim().to_string()
}

/// Splits `input` at top-level `AND` boundaries (see [`scan_top_level`]),
/// dropping empty fragments.
pub fn split_top_level_and(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let scan = scan_top_level(input);
    let mut parts = Vec::new();
    let mut start = 0usize;
    for (bstart, bend) in scan.and_breaks {
        parts.push(char_slice(&chars, start, bstart));
        start = bend;
    }
    parts.push(char_slice(&chars, start, chars.len()));
    parts.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Splits `input` at top-level commas, dropping empty fragments.
pub fn split_top_level_commas(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let scan = scan_top_level(input);
    let mut parts = Vec::new();
    let mut start = 0usize;
    for idx in scan.commas {
        parts.push(char_slice(&chars, start, idx));
        start = idx + 1;
    }
    parts.push(char_slice(&chars, start, chars.len()));
    parts.into_iter().filter(|s| !s.is_empty()).collect()
}

/// `true` iff `input` contains a top-level `OR` (outside parens and quoted
/// strings).
pub fn has_top_level_or(input: &str) -> bool {
    scan_top_level(input).or_found
}

/// `true` iff parens and quotes in `input` are balanced (every `(` closed,
/// every quoted string terminated). An unbalanced WHERE clause still gets a
/// best-effort split, but this flags it for a diagnostic.
pub fn is_balanced(input: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let chars: Vec<char> = input.chars().collect();
    let n = chars.len();
    let mut i = 0usize;
    while i < n {
        let c = chars[i];
        if let Some(q) = quote {
            if c == '\\' && i + 1 < n {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        i += 1;
    }
    depth == 0 && quote.is_none()
}

/// Converts a char index within `s` to the corresponding byte offset, so a
/// char-index result from the scanners in this module can be used to slice
/// the same `&str` it was computed from.
pub fn char_byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// A keyword-phrase match found by [`find_first_top_level_keyword`].
#[derive(Debug, Clone, Copy)]
pub struct KeywordMatch {
    pub phrase_index: usize,
    pub start: usize,
    pub end: usize,
}

/// Scans `input` left to right at paren-depth 0, outside quoted strings, and
/// returns the earliest occurrence of any of `phrases` (each phrase is a
/// sequence of whole words, e.g. `&["GROUP", "BY"]`). Longer phrases are not
/// specially prioritized over shorter ones at the same position; callers
/// should order ambiguous prefixes accordingly (none of this crate's clause
/// keywords share a prefix).
pub fn find_first_top_level_keyword(input: &str, phrases: &[&[&str]]) -> Option<KeywordMatch> {
    let chars: Vec<char> = input.chars().collect();
    let n = chars.len();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut i = 0usize;

    while i < n {
        let c = chars[i];

        if let Some(q) = quote {
            if c == '\\' && i + 1 < n {
                i += 2;
                continue;
            }
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '\'' | '"' => {
                quote = Some(c);
                i += 1;
                continue;
            }
            '(' => {
                depth += 1;
                i += 1;
                continue;
            }
            ')' => {
                depth -= 1;
                i += 1;
                continue;
            }
            _ => {}
        }

        if depth == 0 && is_word_start(&chars, i) {
            for (idx, phrase) in phrases.iter().enumerate() {
                if let Some(end) = match_phrase(&chars, i, phrase) {
                    return Some(KeywordMatch {
                        phrase_index: idx,
                        start: i,
                        end,
                    });
                }
            }
        }

        i += 1;
    }

    None
}

/// `true` iff `input` contains a whitespace-bounded (whole-word) `JOIN`
/// keyword, case-insensitively, anywhere — used for comma-vs-explicit-JOIN
/// style detection.
pub fn has_join_keyword(input: &str) -> bool {
    let chars: Vec<char> = input.chars().collect();
    let n = chars.len();
    let mut i = 0;
    while i < n {
        if is_word_start(&chars, i) {
            if match_word(&chars, i, "JOIN").is_some() {
                return true;
            }
            let mut j = i + 1;
            while j < n && is_word_char(chars[j]) {
                j += 1;
            }
            i = j;
            continue;
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_conjunction() {
        let parts = split_top_level_and("a.x = b.y AND a.z > 10");
        assert_eq!(parts, vec!["a.x = b.y", "a.z > 10"]);
    }

    #[test]
    fn respects_parens() {
        let parts = split_top_level_and("(a.x = 1 AND a.y = 2) AND b.z = 3");
        assert_eq!(parts, vec!["(a.x = 1 AND a.y = 2)", "b.z = 3"]);
    }

    #[test]
    fn respects_quotes() {
        let parts = split_top_level_and("a.name = 'foo AND bar' AND b.z = 3");
        assert_eq!(parts, vec!["a.name = 'foo AND bar'", "b.z = 3"]);
    }

    #[test]
    fn respects_escaped_quote() {
        let parts = split_top_level_and(r"a.name = 'it\'s AND that' AND b.z = 3");
        assert_eq!(parts, vec![r"a.name = 'it\'s AND that'", "b.z = 3"]);
    }

    #[test]
    fn between_and_is_not_a_split_point() {
        let parts = split_top_level_and("a.x BETWEEN 1 AND 10 AND b.y = 2");
        assert_eq!(parts, vec!["a.x BETWEEN 1 AND 10", "b.y = 2"]);
    }

    #[test]
    fn and_inside_identifier_is_not_a_split_point() {
        let parts = split_top_level_and("a.LANDING = 1 AND b.y = 2");
        assert_eq!(parts, vec!["a.LANDING = 1", "b.y = 2"]);
    }

    #[test]
    fn detects_top_level_or() {
        assert!(has_top_level_or("a.x = 1 OR a.y = 2"));
        assert!(!has_top_level_or("a.x IN (1, 2, 3)"));
    }

    #[test]
    fn or_inside_parens_is_not_top_level() {
        assert!(!has_top_level_or("a.x IN (1, 2) AND a.y = 3"));
    }

    #[test]
    fn finds_first_clause_boundary() {
        let m = find_first_top_level_keyword(
            "a.x = 1 GROUP BY a.x ORDER BY a.x",
            &[&["WHERE"], &["GROUP", "BY"], &["ORDER", "BY"], &["LIMIT"]],
        )
        .unwrap();
        assert_eq!(m.phrase_index, 1);
    }

    #[test]
    fn join_keyword_detection_ignores_substrings() {
        assert!(has_join_keyword("FROM a JOIN b ON a.x = b.x"));
        assert!(!has_join_keyword("FROM a, b WHERE a.name = 'Joint'"));
    }

    #[test]
    fn split_top_level_commas_respects_parens() {
        let parts = split_top_level_commas("t1 a1, t2 a2, t3 a3");
        assert_eq!(parts, vec!["t1 a1", "t2 a2", "t3 a3"]);
    }
}

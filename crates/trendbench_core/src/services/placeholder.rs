//! Placeholder scanning for SQL text.
//!
//! A placeholder is a colon followed by one or more ASCII letters, digits or
//! underscores. The scan is purely lexical: placeholders inside string
//! literals and the right-hand side of `::` casts are reported too.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("placeholder regex is valid"));

/// Distinct placeholder names in first-occurrence order.
///
/// Matching is case-sensitive, so `:BlendID` and `:blendid` are two names.
pub fn scan(sql: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_RE
        .captures_iter(sql)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(String::from)
        .collect()
}

/// Check if SQL text references any placeholder.
pub fn has_placeholders(sql: &str) -> bool {
    PLACEHOLDER_RE.is_match(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_empty() {
        assert!(scan("").is_empty());
        assert!(scan("SELECT 1").is_empty());
        assert!(!has_placeholders("SELECT 1"));
    }

    #[test]
    fn test_scan_dedupes_in_first_occurrence_order() {
        let sql = "SELECT * FROM t WHERE b = :b AND a = :a AND b2 = :b OR x = :a_1 OR y = :b";
        assert_eq!(scan(sql), vec!["b", "a", "a_1"]);
    }

    #[test]
    fn test_scan_is_case_sensitive() {
        assert_eq!(scan(":BlendID :blendid :BlendID"), vec!["BlendID", "blendid"]);
    }

    #[test]
    fn test_scan_stops_at_non_word_characters() {
        assert_eq!(scan("WHERE id=:id, n=:n;"), vec!["id", "n"]);
        assert_eq!(scan("WHERE a = : b"), Vec::<String>::new());
    }

    #[test]
    fn test_scan_is_lexical() {
        // Casts and literals are not parsed
        assert_eq!(scan("SELECT x::int, ':lit' FROM t"), vec!["int", "lit"]);
    }
}

//! Allow-list validation and extraction of SQL queries surfaced in
//! agent tool traces.
//!
//! The guard checks keyword tokens only. Identifiers and literals are
//! not validated and structure is not parsed; a keyword hidden inside an
//! identifier (e.g. `select_all`) passes. That scope is deliberate: the
//! guard exists to block non-read statements, statement chaining, and
//! comment injection, not to be a SQL parser.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// SQL keywords a trace-extracted query may use.
const ALLOWED_SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "IN", "LIKE", "LIMIT", "ORDER", "BY", "ASC", "DESC",
    "GROUP", "HAVING", "JOIN",
];

/// SQL vocabulary recognized as keywords at all. Tokens outside this set
/// are treated as identifiers or literals and skipped. Recognized
/// keywords outside the allow-list reject the query.
const RECOGNIZED_SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "IN", "LIKE", "LIMIT", "ORDER", "BY", "ASC", "DESC",
    "GROUP", "HAVING", "JOIN", "DROP", "DELETE", "INSERT", "UPDATE", "CREATE", "ALTER", "TRUNCATE",
    "UNION", "EXEC", "EXECUTE", "GRANT", "REVOKE", "INTO", "VALUES", "SET", "MERGE", "CALL",
];

/// Tokens ignored entirely (connectives that double as ordinary English).
const STOPWORDS: &[&str] = &["AND", "OR", "IN", "THE", "AS", "ON"];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("valid word regex"));

/// Non-greedy match from the first `SELECT` up to (not including) a line
/// starting with "Returned information", or end of input.
static SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(SELECT.*?)(?:\n\s*Returned information|\z)")
        .expect("valid query extraction regex")
});

/// Validate a candidate query against the keyword allow-list and
/// statement-injection patterns.
pub fn validate_query(query: &str) -> bool {
    let upper = query.to_uppercase();
    let tokens: HashSet<&str> = WORD_RE
        .find_iter(&upper)
        .map(|m| m.as_str())
        .filter(|word| !STOPWORDS.contains(word))
        .collect();

    let disallowed: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|word| {
            RECOGNIZED_SQL_KEYWORDS.contains(word) && !ALLOWED_SQL_KEYWORDS.contains(word)
        })
        .collect();
    if !disallowed.is_empty() {
        tracing::warn!(keywords = ?disallowed, "query contains disallowed SQL keywords");
        return false;
    }

    // Statement chaining and comment injection.
    if query.contains(';') || query.contains("--") || query.contains("/*") {
        tracing::warn!("query contains statement or comment delimiters");
        return false;
    }

    true
}

/// Locate the first `SELECT ...` substring in free text and return it if
/// it passes [`validate_query`].
pub fn extract_query(text: &str) -> Option<String> {
    let captures = SELECT_RE.captures(text)?;
    let query = captures.get(1)?.as_str().trim().to_string();
    if validate_query(&query) {
        Some(query)
    } else {
        tracing::warn!("extracted query failed validation");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_query_with_identifiers() {
        // Identifiers and literals are not validated, documented scope.
        assert!(validate_query("SELECT name FROM users WHERE id = 1"));
    }

    #[test]
    fn stopwords_are_ignored() {
        assert!(validate_query(
            "SELECT price FROM items WHERE tag IN (1, 2) AND name LIKE 'the%'"
        ));
    }

    #[test]
    fn rejects_statement_chaining() {
        assert!(!validate_query("SELECT * FROM users; DROP TABLE users"));
    }

    #[test]
    fn rejects_disallowed_keyword_without_delimiters() {
        assert!(!validate_query("DELETE FROM users WHERE id = 1"));
        assert!(!validate_query("SELECT a FROM b UNION SELECT c FROM d"));
    }

    #[test]
    fn keyword_inside_identifier_passes() {
        assert!(validate_query("SELECT select_all FROM dropped_items"));
    }

    #[test]
    fn rejects_comment_injection() {
        assert!(!validate_query("SELECT a FROM b -- hidden"));
        assert!(!validate_query("SELECT a /* hidden */ FROM b"));
    }

    #[test]
    fn extract_stops_before_returned_information() {
        let text = "Executing tool.\nSELECT name FROM users LIMIT 5\nReturned information: 3 rows";
        assert_eq!(
            extract_query(text),
            Some("SELECT name FROM users LIMIT 5".to_string())
        );
    }

    #[test]
    fn extract_runs_to_end_of_input_without_marker() {
        let text = "select id from events\nwhere kind = 'audit' order by id";
        assert_eq!(
            extract_query(text),
            Some("select id from events\nwhere kind = 'audit' order by id".to_string())
        );
    }

    #[test]
    fn extract_is_case_insensitive_on_marker() {
        let text = "SELECT a FROM b\n  Returned information follows";
        assert_eq!(extract_query(text), Some("SELECT a FROM b".to_string()));
    }

    #[test]
    fn extract_rejects_invalid_query() {
        assert_eq!(extract_query("SELECT secrets; DROP TABLE users"), None);
    }

    #[test]
    fn extract_returns_none_without_select() {
        assert_eq!(extract_query("no query in this output"), None);
    }
}

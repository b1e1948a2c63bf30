use std::sync::LazyLock;

use regex::Regex;

/// Default maximum question length in code points.
pub const DEFAULT_MAX_INPUT_LENGTH: usize = 1000;

/// Word characters, whitespace, and common punctuation. Anything outside
/// this class (backticks, control characters, emoji) rejects the whole
/// input rather than being stripped.
static ALLOWED_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[\w\s\-\.,\?!@#\$%\^&\*\(\)\+=\[\]\{\}\|\\:;"'<>/]+$"#)
        .expect("valid allowed-chars regex")
});

/// A question that passed length and character-class validation.
///
/// Constructed only by [`sanitize`]; immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedInput(String);

impl SanitizedInput {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Why an input was rejected. Logged, never surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    TooLong,
    DisallowedCharacters,
}

/// Validate and trim a raw question with the default length limit.
pub fn sanitize(raw: &str) -> Result<SanitizedInput, RejectReason> {
    sanitize_with_limit(raw, DEFAULT_MAX_INPUT_LENGTH)
}

/// Validate and trim a raw question.
///
/// Rejects input exceeding `max_len` code points or containing any
/// character outside the allowed class. On success returns the trimmed
/// string unchanged in content.
pub fn sanitize_with_limit(raw: &str, max_len: usize) -> Result<SanitizedInput, RejectReason> {
    if raw.is_empty() {
        tracing::warn!(reason = "empty", "input rejected");
        return Err(RejectReason::Empty);
    }

    let char_count = raw.chars().count();
    if char_count > max_len {
        tracing::warn!(
            reason = "too_long",
            length = char_count,
            max = max_len,
            "input rejected"
        );
        return Err(RejectReason::TooLong);
    }

    if !ALLOWED_CHARS_RE.is_match(raw) {
        tracing::warn!(reason = "disallowed_characters", "input rejected");
        return Err(RejectReason::DisallowedCharacters);
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(reason = "empty", "input rejected");
        return Err(RejectReason::Empty);
    }

    Ok(SanitizedInput(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_trims_allowed_input() {
        let out = sanitize("  What is a SQL injection vulnerability?  ").unwrap();
        assert_eq!(out.as_str(), "What is a SQL injection vulnerability?");
    }

    #[test]
    fn accepts_full_punctuation_class() {
        let input = r#"a-b.c,d?e!f@g#h$i%j^k&l*m(n)o+p=q[r]s{t}u|v\w:x;y"z'<>/ ok"#;
        assert!(sanitize(input).is_ok());
    }

    #[test]
    fn rejects_over_length_input() {
        let input = "a".repeat(DEFAULT_MAX_INPUT_LENGTH + 1);
        assert_eq!(sanitize(&input), Err(RejectReason::TooLong));
    }

    #[test]
    fn length_limit_counts_code_points_not_bytes() {
        // 1000 two-byte characters are exactly at the limit.
        let input = "ü".repeat(DEFAULT_MAX_INPUT_LENGTH);
        assert!(sanitize(&input).is_ok());
    }

    #[test]
    fn rejects_backtick() {
        assert_eq!(
            sanitize("run `rm -rf`"),
            Err(RejectReason::DisallowedCharacters)
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(sanitize(""), Err(RejectReason::Empty));
    }

    #[test]
    fn rejects_whitespace_only_input() {
        assert_eq!(sanitize("   \t  "), Err(RejectReason::Empty));
    }

    #[test]
    fn custom_limit_applies() {
        assert!(sanitize_with_limit("abcdef", 5).is_err());
        assert!(sanitize_with_limit("abcde", 5).is_ok());
    }
}

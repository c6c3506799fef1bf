//! Course-code canonicalization: `MATH123` becomes `MATH-123`.

use regex::Regex;
use std::sync::LazyLock;

static LETTER_DIGIT_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z]+)([0-9]+)").expect("literal regex"));

// Department part: no digits, no hyphen, no whitespace.
static CANONICAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^0-9\-\s]+-[0-9]+$").expect("literal regex"));

/// Inserts a hyphen at every letters→digits boundary. Text without such a
/// boundary (including already hyphenated codes) is returned unchanged.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    LETTER_DIGIT_BOUNDARY
        .replace_all(raw, "$1-$2")
        .into_owned()
}

/// Anchored `DEPT-NUMBER` shape check, applied after [`normalize`].
pub fn is_valid(code: &str) -> bool {
    CANONICAL_CODE.is_match(code)
}

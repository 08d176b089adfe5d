use std::sync::LazyLock;

use regex::Regex;

use crate::data::DEFAULT_TAG_TYPE;

/// Characters that make a tag key unusable as a column value, e.g. free-text
/// annotation keys such as `note,extra` or `fixme?`. Any Unicode whitespace
/// counts, not just ASCII space, tab and line breaks.
static PROBLEM_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[=+/&<>;'"?%#$@,.\s]"#).expect("problem character pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagClass<'a> {
    pub tag_type: &'a str,
    pub key: &'a str,
}

pub fn has_problem_chars(raw_key: &str) -> bool {
    PROBLEM_CHARS.is_match(raw_key)
}

/// Splits `raw_key` on its first colon into namespace and local key.
/// `addr:street` gives `("addr", "street")`, `highway` gives `("regular", "highway")`.
///
/// Keys are expected to have passed [`has_problem_chars`] already.
pub fn classify(raw_key: &str) -> TagClass<'_> {
    match raw_key.split_once(':') {
        Some((tag_type, key)) => TagClass { tag_type, key },
        None => TagClass {
            tag_type: DEFAULT_TAG_TYPE,
            key: raw_key,
        },
    }
}

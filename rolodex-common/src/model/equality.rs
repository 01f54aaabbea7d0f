//! Content equality for contact fields
//!
//! Equality here ignores row identity and compares only content. A missing
//! value equals another missing value and nothing else.

/// Per-field-type value-equality predicate
pub trait ItemEquality {
    /// True when both values carry the same content, identity aside
    fn same_content(&self, other: &Self) -> bool;
}

/// Exact comparison of two optional strings
pub fn equals_strings(first: &Option<String>, second: &Option<String>) -> bool {
    match (first, second) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Case-insensitive comparison of two optional strings (labels)
pub fn equals_ignore_case(first: &Option<String>, second: &Option<String>) -> bool {
    match (first, second) {
        (None, None) => true,
        (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
        _ => false,
    }
}

impl ItemEquality for Option<String> {
    fn same_content(&self, other: &Self) -> bool {
        equals_strings(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_equals_strings_null_handling() {
        assert!(equals_strings(&None, &None));
        assert!(!equals_strings(&None, &s("")));
        assert!(!equals_strings(&s(""), &None));
        assert!(equals_strings(&s("a"), &s("a")));
        assert!(!equals_strings(&s("a"), &s("A")));
    }

    #[test]
    fn test_equals_ignore_case() {
        assert!(equals_ignore_case(&s("Mobile"), &s("mobile")));
        assert!(!equals_ignore_case(&s("mobile"), &None));
        assert!(equals_ignore_case(&None, &None));
    }
}

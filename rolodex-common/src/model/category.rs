//! Well-known label categories
//!
//! Labeled fields persist a category (`kind`) plus a free-text label that is
//! only kept for custom categories. Matching against the well-known names is
//! case-insensitive, so "Mobile" is stored and read back as "mobile".

use super::field::FieldType;

const PHONE_LABELS: &[&str] = &[
    "home", "work", "mobile", "main", "fax work", "fax home", "pager", "other",
];
const EMAIL_LABELS: &[&str] = &["home", "work", "mobile", "other"];
const POSTAL_LABELS: &[&str] = &["home", "work", "other"];
const WEBSITE_LABELS: &[&str] = &["homepage", "blog", "profile", "home", "work", "ftp", "other"];
const IM_LABELS: &[&str] = &[
    "aim", "msn", "yahoo", "skype", "qq", "google talk", "icq", "jabber", "other",
];
const RELATION_LABELS: &[&str] = &[
    "assistant",
    "brother",
    "child",
    "domestic partner",
    "father",
    "friend",
    "manager",
    "mother",
    "parent",
    "partner",
    "referred by",
    "relative",
    "sister",
    "spouse",
];
const EVENT_LABELS: &[&str] = &["anniversary", "other"];

/// Stored category of a labeled item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Known(&'static str),
    Custom,
}

impl LabelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelKind::Known(name) => name,
            LabelKind::Custom => "custom",
        }
    }
}

fn known_labels(field: FieldType) -> &'static [&'static str] {
    match field {
        FieldType::Phone => PHONE_LABELS,
        FieldType::Email => EMAIL_LABELS,
        FieldType::PostalAddress => POSTAL_LABELS,
        FieldType::Website => WEBSITE_LABELS,
        FieldType::Im => IM_LABELS,
        FieldType::Relation => RELATION_LABELS,
        FieldType::Event => EVENT_LABELS,
        _ => &[],
    }
}

/// Resolve a label into its stored category and custom text
///
/// A missing label falls back to "other" where the field defines it.
pub fn classify_label(field: FieldType, label: Option<&str>) -> (LabelKind, Option<String>) {
    let known = known_labels(field);
    match label {
        None => match known.iter().find(|name| **name == "other") {
            Some(other) => (LabelKind::Known(other), None),
            None => (LabelKind::Custom, None),
        },
        Some(label) => {
            let lowered = label.trim().to_lowercase();
            match known.iter().find(|name| **name == lowered) {
                Some(name) => (LabelKind::Known(name), None),
                None => (LabelKind::Custom, Some(label.to_string())),
            }
        }
    }
}

/// Label shown for a stored category
///
/// Custom categories without text read back as an empty label.
pub fn label_for_kind(kind: &str, custom: Option<String>) -> String {
    if kind == LabelKind::Custom.as_str() {
        custom.unwrap_or_default()
    } else {
        kind.to_string()
    }
}

/// Label as it reads back once stored under `field`
///
/// Known categories come back lowercased and trimmed, a missing label comes
/// back as "other" where the field has it, and an empty label comes back
/// missing.
pub fn canonical_label(field: FieldType, label: Option<&str>) -> Option<String> {
    let (kind, custom) = classify_label(field, label);
    Some(label_for_kind(kind.as_str(), custom)).filter(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_label_is_case_insensitive() {
        let (kind, custom) = classify_label(FieldType::Phone, Some("Mobile"));
        assert_eq!(kind, LabelKind::Known("mobile"));
        assert_eq!(custom, None);
        assert_eq!(label_for_kind(kind.as_str(), custom), "mobile");
    }

    #[test]
    fn test_custom_label_keeps_text() {
        let (kind, custom) = classify_label(FieldType::Email, Some("Club"));
        assert_eq!(kind, LabelKind::Custom);
        assert_eq!(label_for_kind(kind.as_str(), custom), "Club");
    }

    #[test]
    fn test_missing_label() {
        let (kind, _) = classify_label(FieldType::PostalAddress, None);
        assert_eq!(kind, LabelKind::Known("other"));

        let (kind, custom) = classify_label(FieldType::Relation, None);
        assert_eq!(kind, LabelKind::Custom);
        assert_eq!(label_for_kind(kind.as_str(), custom), "");
    }

    #[test]
    fn test_labels_are_per_field() {
        assert_eq!(
            classify_label(FieldType::Website, Some("blog")).0,
            LabelKind::Known("blog")
        );
        assert_eq!(classify_label(FieldType::Phone, Some("blog")).0, LabelKind::Custom);
    }

    #[test]
    fn test_canonical_label_matches_stored_form() {
        assert_eq!(canonical_label(FieldType::Phone, None).as_deref(), Some("other"));
        assert_eq!(canonical_label(FieldType::Phone, Some(" Mobile ")).as_deref(), Some("mobile"));
        assert_eq!(canonical_label(FieldType::Phone, Some("")), None);
        assert_eq!(canonical_label(FieldType::Relation, None), None);
        assert_eq!(canonical_label(FieldType::Email, Some("Club")).as_deref(), Some("Club"));
    }
}

//! Multi-valued contact items

use super::equality::{equals_ignore_case, equals_strings, ItemEquality};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backing-store id of a parent (raw contact) record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParentId(pub i64);

impl fmt::Display for ParentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Surrogate id of a label group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub i64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Treats an empty identifier the same as a missing one
fn non_empty(identifier: &Option<String>) -> Option<&str> {
    identifier.as_deref().filter(|id| !id.is_empty())
}

/// Phone, email, website, IM address, relation or dated event
///
/// `identifier` is the row id and is only present once the item has been
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabeledItem {
    pub identifier: Option<String>,
    pub label: Option<String>,
    pub value: Option<String>,
}

impl LabeledItem {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            identifier: None,
            label: Some(label.to_string()),
            value: Some(value.to_string()),
        }
    }

    pub fn with_identifier(identifier: &str, label: &str, value: &str) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            ..Self::new(label, value)
        }
    }

    /// Row id, or `None` when missing or empty
    pub fn row_id(&self) -> Option<&str> {
        non_empty(&self.identifier)
    }
}

impl ItemEquality for LabeledItem {
    fn same_content(&self, other: &Self) -> bool {
        equals_ignore_case(&self.label, &other.label) && equals_strings(&self.value, &other.value)
    }
}

/// Structured postal address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostalAddress {
    pub identifier: Option<String>,
    pub label: Option<String>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub formatted_address: Option<String>,
}

impl PostalAddress {
    /// Row id, or `None` when missing or empty
    pub fn row_id(&self) -> Option<&str> {
        non_empty(&self.identifier)
    }
}

impl ItemEquality for PostalAddress {
    fn same_content(&self, other: &Self) -> bool {
        equals_ignore_case(&self.label, &other.label)
            && equals_strings(&self.street, &other.street)
            && equals_strings(&self.locality, &other.locality)
            && equals_strings(&self.city, &other.city)
            && equals_strings(&self.postcode, &other.postcode)
            && equals_strings(&self.region, &other.region)
            && equals_strings(&self.country, &other.country)
            && equals_strings(&self.formatted_address, &other.formatted_address)
    }
}

impl fmt::Display for PostalAddress {
    /// One-line rendering: "street, locality, city, region postcode, country"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = String::new();
        let parts = [
            (&self.street, ", "),
            (&self.locality, ", "),
            (&self.city, ", "),
            (&self.region, ", "),
            (&self.postcode, " "),
            (&self.country, ", "),
        ];
        for (part, separator) in parts {
            if let Some(part) = part {
                if !line.is_empty() {
                    line.push_str(separator);
                }
                line.push_str(part);
            }
        }
        f.write_str(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_identifier_is_no_identifier() {
        let mut item = LabeledItem::new("home", "a@x.com");
        assert_eq!(item.row_id(), None);
        item.identifier = Some(String::new());
        assert_eq!(item.row_id(), None);
        item.identifier = Some("7".to_string());
        assert_eq!(item.row_id(), Some("7"));
    }

    #[test]
    fn test_labeled_equality_ignores_identity_and_label_case() {
        let a = LabeledItem::with_identifier("1", "Home", "a@x.com");
        let b = LabeledItem::with_identifier("2", "home", "a@x.com");
        assert!(a.same_content(&b));

        let c = LabeledItem::new("home", "A@x.com");
        assert!(!a.same_content(&c));
    }

    #[test]
    fn test_postal_equality_includes_formatted_address() {
        let a = PostalAddress {
            label: Some("work".into()),
            city: Some("Oslo".into()),
            formatted_address: Some("Oslo".into()),
            ..Default::default()
        };
        let mut b = a.clone();
        assert!(a.same_content(&b));
        b.formatted_address = None;
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_postal_display() {
        let address = PostalAddress {
            street: Some("1 Main St".into()),
            city: Some("Springfield".into()),
            region: Some("IL".into()),
            postcode: Some("62701".into()),
            country: Some("USA".into()),
            ..Default::default()
        };
        assert_eq!(address.to_string(), "1 Main St, Springfield, IL 62701, USA");
    }
}

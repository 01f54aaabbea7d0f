//! Field type tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of contact field types
///
/// Stored verbatim in the `field` column of `contact_data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Phone,
    Email,
    PostalAddress,
    Website,
    Im,
    Relation,
    Event,
    Label,
    Name,
    Organization,
    Nickname,
    Sip,
    Note,
    Birthday,
}

impl FieldType {
    /// All field types, in the order update batches visit them
    pub const ALL: [FieldType; 14] = [
        FieldType::Name,
        FieldType::Organization,
        FieldType::Nickname,
        FieldType::Sip,
        FieldType::Note,
        FieldType::Email,
        FieldType::Phone,
        FieldType::PostalAddress,
        FieldType::Website,
        FieldType::Im,
        FieldType::Relation,
        FieldType::Label,
        FieldType::Event,
        FieldType::Birthday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Phone => "phone",
            FieldType::Email => "email",
            FieldType::PostalAddress => "postal_address",
            FieldType::Website => "website",
            FieldType::Im => "im",
            FieldType::Relation => "relation",
            FieldType::Event => "event",
            FieldType::Label => "label",
            FieldType::Name => "name",
            FieldType::Organization => "organization",
            FieldType::Nickname => "nickname",
            FieldType::Sip => "sip",
            FieldType::Note => "note",
            FieldType::Birthday => "birthday",
        }
    }

    /// Parse the stored column value back into a field type
    pub fn from_db(value: &str) -> Option<FieldType> {
        FieldType::ALL.iter().copied().find(|f| f.as_str() == value)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

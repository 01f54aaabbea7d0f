//! Contact aggregate

use super::equality::{equals_strings, ItemEquality};
use super::item::{GroupId, LabeledItem, PostalAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Structured name (all nine sub-fields compared together)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuredName {
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub family_name: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub phonetic_given_name: Option<String>,
    pub phonetic_middle_name: Option<String>,
    pub phonetic_family_name: Option<String>,
}

impl ItemEquality for StructuredName {
    fn same_content(&self, other: &Self) -> bool {
        equals_strings(&self.given_name, &other.given_name)
            && equals_strings(&self.middle_name, &other.middle_name)
            && equals_strings(&self.family_name, &other.family_name)
            && equals_strings(&self.prefix, &other.prefix)
            && equals_strings(&self.suffix, &other.suffix)
            && equals_strings(&self.phonetic_given_name, &other.phonetic_given_name)
            && equals_strings(&self.phonetic_middle_name, &other.phonetic_middle_name)
            && equals_strings(&self.phonetic_family_name, &other.phonetic_family_name)
    }
}

/// Organization fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Organization {
    pub company: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
}

impl ItemEquality for Organization {
    fn same_content(&self, other: &Self) -> bool {
        equals_strings(&self.company, &other.company)
            && equals_strings(&self.job_title, &other.job_title)
            && equals_strings(&self.department, &other.department)
    }
}

/// Row ids of the singleton fields and label memberships
///
/// Only populated on aggregates read back from the store; a desired
/// aggregate built by a caller leaves this empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedRows {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub nickname: Option<String>,
    pub sip: Option<String>,
    pub note: Option<String>,
    pub birthday: Option<String>,
    /// Membership row id per label group
    pub memberships: BTreeMap<GroupId, String>,
}

/// Full in-memory contact record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Aggregate {
    /// Stable external key; absent until the contact is created
    pub identifier: Option<String>,
    /// Derived on read, never written
    pub display_name: Option<String>,
    pub account_type: Option<String>,
    pub account_name: Option<String>,
    #[serde(flatten)]
    pub name: StructuredName,
    #[serde(flatten)]
    pub organization: Organization,
    pub nickname: Option<String>,
    pub note: Option<String>,
    pub sip: Option<String>,
    pub birthday: Option<String>,
    pub phones: Vec<LabeledItem>,
    pub emails: Vec<LabeledItem>,
    pub postal_addresses: Vec<PostalAddress>,
    pub websites: Vec<LabeledItem>,
    pub instant_message_addresses: Vec<LabeledItem>,
    pub relations: Vec<LabeledItem>,
    pub dates: Vec<LabeledItem>,
    pub labels: Vec<String>,
    #[serde(skip)]
    pub rows: PersistedRows,
}

impl Aggregate {
    /// Stable key, or `None` when missing or empty
    pub fn key(&self) -> Option<&str> {
        self.identifier.as_deref().filter(|id| !id.is_empty())
    }

    /// Display name as shown in contact lists
    ///
    /// Joins the non-empty name parts; falls back to nickname, company,
    /// first email, then first phone.
    pub fn derive_display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [
            &self.name.prefix,
            &self.name.given_name,
            &self.name.middle_name,
            &self.name.family_name,
            &self.name.suffix,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

        if !parts.is_empty() {
            return Some(parts.join(" "));
        }

        [
            self.nickname.as_deref(),
            self.organization.company.as_deref(),
            self.emails.first().and_then(|e| e.value.as_deref()),
            self.phones.first().and_then(|p| p.value.as_deref()),
        ]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.trim().is_empty())
        .map(str::to_string)
    }
}

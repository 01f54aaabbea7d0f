//! Mutation operations
//!
//! A batch is an ordered `Vec<Operation>`. Children of a parent created in
//! the same batch address it through [`ParentRef::BackReference`], which the
//! store swaps for the generated id while committing.

use rolodex_common::model::{GroupId, Organization, ParentId, StructuredName};
use rolodex_common::{FieldType, LabeledItem, PostalAddress};
use serde::Serialize;

/// Parent of a field row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentRef {
    /// Already persisted parent
    Id(ParentId),
    /// Parent created by the operation at this 0-based batch position
    BackReference(usize),
}

/// New parent record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRecord {
    /// Stable external key assigned to the new contact
    pub identifier: String,
    pub account_type: Option<String>,
    pub account_name: Option<String>,
}

/// Content written by an insert or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FieldValue {
    Labeled(LabeledItem),
    Postal(PostalAddress),
    Name(StructuredName),
    Organization(Organization),
    Text(Option<String>),
    Membership(GroupId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Bootstrap a brand-new parent record
    CreateParent(ParentRecord),
    /// Remove a parent record together with all of its rows
    DeleteParent { parent: ParentId },
    Insert {
        field: FieldType,
        value: FieldValue,
        parent: ParentRef,
    },
    Update {
        field: FieldType,
        row_id: String,
        value: FieldValue,
    },
    Delete { field: FieldType, row_id: String },
}

impl Operation {
    /// Field the operation touches; `None` for parent operations
    pub fn field(&self) -> Option<FieldType> {
        match self {
            Operation::CreateParent(_) | Operation::DeleteParent { .. } => None,
            Operation::Insert { field, .. }
            | Operation::Update { field, .. }
            | Operation::Delete { field, .. } => Some(*field),
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert { .. })
    }

    pub fn is_update(&self) -> bool {
        matches!(self, Operation::Update { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::Delete { .. })
    }

    /// Row id targeted by an update or delete
    pub fn row_id(&self) -> Option<&str> {
        match self {
            Operation::Update { row_id, .. } | Operation::Delete { row_id, .. } => Some(row_id),
            _ => None,
        }
    }
}

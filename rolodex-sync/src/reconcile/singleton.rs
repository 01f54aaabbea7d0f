//! Reconcilers for at-most-one-valued fields

use crate::operation::{FieldValue, Operation, ParentRef};
use rolodex_common::model::{ItemEquality, Organization, StructuredName};
use rolodex_common::FieldType;
use tracing::debug;

/// Value of a singleton field
pub trait SingletonValue: ItemEquality {
    fn to_value(&self) -> FieldValue;
}

impl SingletonValue for StructuredName {
    fn to_value(&self) -> FieldValue {
        FieldValue::Name(self.clone())
    }
}

impl SingletonValue for Organization {
    fn to_value(&self) -> FieldValue {
        FieldValue::Organization(self.clone())
    }
}

/// Nickname, SIP address and note
impl SingletonValue for Option<String> {
    fn to_value(&self) -> FieldValue {
        FieldValue::Text(self.clone())
    }
}

/// Insert-or-update reconciler; singleton rows are overwritten, never deleted
#[derive(Debug, Clone, Copy)]
pub struct SingletonReconciler {
    field: FieldType,
    parent: ParentRef,
}

impl SingletonReconciler {
    pub fn new(field: FieldType, parent: ParentRef) -> Self {
        Self { field, parent }
    }

    /// Unconditional insert, used when creating a contact
    pub fn insert<T: SingletonValue>(&self, desired: &T) -> Operation {
        Operation::Insert {
            field: self.field,
            value: desired.to_value(),
            parent: self.parent,
        }
    }

    pub fn reconcile<T: SingletonValue>(
        &self,
        existing_row: Option<&str>,
        existing: &T,
        desired: &T,
    ) -> Option<Operation> {
        match existing_row {
            None => {
                debug!("{}: no row yet, inserting", self.field);
                Some(self.insert(desired))
            }
            Some(_) if desired.same_content(existing) => None,
            Some(row_id) => {
                debug!("{}: updating row {}", self.field, row_id);
                Some(Operation::Update {
                    field: self.field,
                    row_id: row_id.to_string(),
                    value: desired.to_value(),
                })
            }
        }
    }
}

/// Birthday: a singleton that is deleted when the desired value goes away
#[derive(Debug, Clone, Copy)]
pub struct BirthdayReconciler {
    parent: ParentRef,
}

impl BirthdayReconciler {
    pub fn new(parent: ParentRef) -> Self {
        Self { parent }
    }

    pub fn insert(&self, desired: Option<&str>) -> Operation {
        Operation::Insert {
            field: FieldType::Birthday,
            value: FieldValue::Text(desired.map(str::to_string)),
            parent: self.parent,
        }
    }

    /// A row that exists but holds no date (left by a create without a
    /// birthday) is reused by update rather than shadowed by a second insert.
    pub fn reconcile(
        &self,
        existing_row: Option<&str>,
        existing: Option<&str>,
        desired: Option<&str>,
    ) -> Option<Operation> {
        match (existing_row, existing, desired) {
            (None, _, None) => None,
            (None, _, Some(date)) => Some(self.insert(Some(date))),
            (Some(row_id), Some(_), None) => Some(Operation::Delete {
                field: FieldType::Birthday,
                row_id: row_id.to_string(),
            }),
            (Some(_), None, None) => None,
            (Some(_), Some(current), Some(date)) if current == date => None,
            (Some(row_id), _, Some(date)) => Some(Operation::Update {
                field: FieldType::Birthday,
                row_id: row_id.to_string(),
                value: FieldValue::Text(Some(date.to_string())),
            }),
        }
    }
}

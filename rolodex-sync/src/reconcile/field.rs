//! Generic reconciler for multi-valued, identity-bearing fields

use crate::error::ReconcileError;
use crate::operation::{FieldValue, Operation, ParentRef};
use rolodex_common::config::OrphanPolicy;
use rolodex_common::model::{canonical_label, ItemEquality};
use rolodex_common::{FieldType, LabeledItem, PostalAddress};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Item of a multi-valued field
pub trait ReconcilableItem: ItemEquality {
    /// Persisted row id; `None` for new items
    fn row_id(&self) -> Option<&str>;

    /// Content written on insert or update
    fn to_value(&self) -> FieldValue;

    /// Copy with the label in the form the store reads back for `field`
    fn with_stored_label(&self, field: FieldType) -> Self;
}

impl ReconcilableItem for LabeledItem {
    fn row_id(&self) -> Option<&str> {
        LabeledItem::row_id(self)
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Labeled(self.clone())
    }

    fn with_stored_label(&self, field: FieldType) -> Self {
        Self {
            label: canonical_label(field, self.label.as_deref()),
            ..self.clone()
        }
    }
}

impl ReconcilableItem for PostalAddress {
    fn row_id(&self) -> Option<&str> {
        PostalAddress::row_id(self)
    }

    fn to_value(&self) -> FieldValue {
        FieldValue::Postal(self.clone())
    }

    fn with_stored_label(&self, field: FieldType) -> Self {
        Self {
            label: canonical_label(field, self.label.as_deref()),
            ..self.clone()
        }
    }
}

/// Computes inserts, updates and deletes for one collection
#[derive(Debug, Clone, Copy)]
pub struct FieldReconciler {
    field: FieldType,
    parent: ParentRef,
    orphan_policy: OrphanPolicy,
}

impl FieldReconciler {
    pub fn new(field: FieldType, parent: ParentRef) -> Self {
        Self {
            field,
            parent,
            orphan_policy: OrphanPolicy::default(),
        }
    }

    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    pub fn field(&self) -> FieldType {
        self.field
    }

    /// One insert per item, in order
    pub fn insert_all<T: ReconcilableItem>(&self, items: &[T]) -> Vec<Operation> {
        items.iter().map(|item| self.insert(item)).collect()
    }

    /// Diff `existing` against `desired`
    ///
    /// Desired items without a row id are inserted; items whose row id is
    /// known are updated only when their content changed; existing rows not
    /// resubmitted are deleted. Deletes come last, in existing order.
    /// Desired labels are compared in the form the store would keep, so a
    /// label the store normalizes never counts as a change.
    pub fn reconcile<T: ReconcilableItem>(
        &self,
        existing: &[T],
        desired: &[T],
    ) -> Result<Vec<Operation>, ReconcileError> {
        let mut remaining: Vec<&str> = Vec::with_capacity(existing.len());
        let mut by_id: HashMap<&str, &T> = HashMap::with_capacity(existing.len());
        for item in existing {
            if let Some(id) = item.row_id() {
                if by_id.insert(id, item).is_none() {
                    remaining.push(id);
                }
            }
        }

        if !remaining.is_empty() && desired.is_empty() {
            debug!("{}: clearing {} rows", self.field, remaining.len());
            return Ok(remaining.into_iter().map(|id| self.delete(id)).collect());
        }
        if remaining.is_empty() {
            if !desired.is_empty() {
                debug!("{}: populating {} rows", self.field, desired.len());
            }
            return Ok(self.insert_all(desired));
        }

        let mut operations = Vec::new();
        for item in desired {
            let Some(id) = item.row_id() else {
                operations.push(self.insert(item));
                continue;
            };

            if let Some(position) = remaining.iter().position(|candidate| *candidate == id) {
                remaining.remove(position);
                if let Some(current) = by_id.get(id) {
                    // existing items are in stored form already
                    if !item.with_stored_label(self.field).same_content(current) {
                        operations.push(self.update(id, item));
                    }
                }
            } else if by_id.contains_key(id) {
                debug!("{}: row {} submitted twice, keeping the first", self.field, id);
            } else {
                match self.orphan_policy {
                    OrphanPolicy::Ignore => {
                        warn!("{}: ignoring item with unknown row id {}", self.field, id);
                    }
                    OrphanPolicy::Insert => {
                        debug!("{}: inserting item with stale row id {}", self.field, id);
                        operations.push(self.insert(item));
                    }
                    OrphanPolicy::Reject => {
                        return Err(ReconcileError::OrphanedItem {
                            field: self.field,
                            row_id: id.to_string(),
                        });
                    }
                }
            }
        }

        operations.extend(remaining.into_iter().map(|id| self.delete(id)));
        Ok(operations)
    }

    fn insert<T: ReconcilableItem>(&self, item: &T) -> Operation {
        Operation::Insert {
            field: self.field,
            value: item.to_value(),
            parent: self.parent,
        }
    }

    fn update<T: ReconcilableItem>(&self, row_id: &str, item: &T) -> Operation {
        Operation::Update {
            field: self.field,
            row_id: row_id.to_string(),
            value: item.to_value(),
        }
    }

    fn delete(&self, row_id: &str) -> Operation {
        Operation::Delete {
            field: self.field,
            row_id: row_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolodex_common::model::ParentId;

    const PARENT: ParentRef = ParentRef::Id(ParentId(1));

    fn emails() -> FieldReconciler {
        FieldReconciler::new(FieldType::Email, PARENT)
    }

    fn item(id: &str, label: &str, value: &str) -> LabeledItem {
        LabeledItem::with_identifier(id, label, value)
    }

    #[test]
    fn test_changed_email_yields_single_update() {
        let existing = vec![item("7", "home", "a@x.com")];
        let desired = vec![item("7", "home", "b@x.com")];

        let ops = emails().reconcile(&existing, &desired).unwrap();

        assert_eq!(
            ops,
            vec![Operation::Update {
                field: FieldType::Email,
                row_id: "7".to_string(),
                value: FieldValue::Labeled(item("7", "home", "b@x.com")),
            }]
        );
    }

    #[test]
    fn test_unchanged_items_produce_nothing() {
        let existing = vec![item("1", "home", "a@x.com"), item("2", "work", "b@x.com")];
        let desired = vec![item("2", "WORK", "b@x.com"), item("1", "home", "a@x.com")];

        assert!(emails().reconcile(&existing, &desired).unwrap().is_empty());
    }

    #[test]
    fn test_clear_collection_deletes_every_row() {
        let existing = vec![item("1", "home", "a"), item("2", "home", "b"), item("3", "home", "c")];

        let ops = emails().reconcile(&existing, &[]).unwrap();

        assert_eq!(ops.len(), 3);
        assert!(ops.iter().all(Operation::is_delete));
        let ids: Vec<_> = ops.iter().filter_map(Operation::row_id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_populate_collection_inserts_every_item() {
        let desired = vec![LabeledItem::new("home", "a"), LabeledItem::new("work", "b")];

        let ops = emails().reconcile::<LabeledItem>(&[], &desired).unwrap();

        assert_eq!(ops.len(), 2);
        assert!(ops.iter().all(Operation::is_insert));
        assert!(ops.iter().all(|op| matches!(op, Operation::Insert { parent, .. } if *parent == PARENT)));
    }

    #[test]
    fn test_mixed_insert_update_delete() {
        let existing = vec![item("1", "home", "a"), item("2", "home", "b"), item("3", "home", "c")];
        let desired = vec![
            item("2", "home", "b-changed"),
            LabeledItem::new("work", "new"),
            item("3", "home", "c"),
        ];

        let ops = emails().reconcile(&existing, &desired).unwrap();

        assert_eq!(ops.len(), 3);
        assert!(ops[0].is_update());
        assert_eq!(ops[0].row_id(), Some("2"));
        assert!(ops[1].is_insert());
        assert!(ops[2].is_delete());
        assert_eq!(ops[2].row_id(), Some("1"));
    }

    #[test]
    fn test_empty_identifier_is_inserted() {
        let existing = vec![item("1", "home", "a")];
        let mut fresh = LabeledItem::new("home", "b");
        fresh.identifier = Some(String::new());
        let desired = vec![item("1", "home", "a"), fresh];

        let ops = emails().reconcile(&existing, &desired).unwrap();

        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_insert());
    }

    #[test]
    fn test_orphan_ignored_by_default() {
        let existing = vec![item("1", "home", "a")];
        let desired = vec![item("1", "home", "a"), item("99", "home", "stale")];

        let ops = emails().reconcile(&existing, &desired).unwrap();

        assert!(ops.is_empty());
    }

    #[test]
    fn test_orphan_policies() {
        let existing = vec![item("1", "home", "a")];
        let desired = vec![item("1", "home", "a"), item("99", "home", "stale")];

        let ops = emails()
            .with_orphan_policy(OrphanPolicy::Insert)
            .reconcile(&existing, &desired)
            .unwrap();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_insert());

        let err = emails()
            .with_orphan_policy(OrphanPolicy::Reject)
            .reconcile(&existing, &desired)
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::OrphanedItem { field: FieldType::Email, ref row_id } if row_id == "99"
        ));
    }

    #[test]
    fn test_duplicate_resubmission_updates_once() {
        let existing = vec![item("1", "home", "a"), item("2", "home", "b")];
        let desired = vec![item("1", "home", "x"), item("1", "home", "y"), item("2", "home", "b")];

        let ops = emails().reconcile(&existing, &desired).unwrap();

        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            Operation::Update { value: FieldValue::Labeled(v), .. } if v.value.as_deref() == Some("x")
        ));
    }

    #[test]
    fn test_postal_formatted_address_change_is_update() {
        let current = PostalAddress {
            identifier: Some("5".into()),
            label: Some("home".into()),
            city: Some("Oslo".into()),
            ..Default::default()
        };
        let mut desired = current.clone();
        desired.formatted_address = Some("Oslo, Norway".into());

        let ops = FieldReconciler::new(FieldType::PostalAddress, PARENT)
            .reconcile(&[current], &[desired.clone()])
            .unwrap();

        assert_eq!(
            ops,
            vec![Operation::Update {
                field: FieldType::PostalAddress,
                row_id: "5".to_string(),
                value: FieldValue::Postal(desired),
            }]
        );
    }

    #[test]
    fn test_label_normalized_by_store_is_not_a_change() {
        let phones = FieldReconciler::new(FieldType::Phone, PARENT);
        let stored = |label: Option<&str>| LabeledItem {
            identifier: Some("6".into()),
            label: label.map(str::to_string),
            value: Some("555".into()),
        };

        for (desired, existing) in [
            (None, Some("other")),
            (Some(""), None),
            (Some(" Mobile "), Some("mobile")),
        ] {
            let ops = phones
                .reconcile(&[stored(existing)], &[stored(desired)])
                .unwrap();
            assert!(ops.is_empty(), "label {:?} produced {:?}", desired, ops);
        }

        let ops = phones
            .reconcile(&[stored(Some("other"))], &[stored(Some("work"))])
            .unwrap();
        assert_eq!(ops.len(), 1);
    }
}

//! Orchestrates all field reconcilers into one ordered batch

use super::field::FieldReconciler;
use super::labels::{insert_memberships, reconcile_labels, LabelGroupResolver};
use super::raw::RawRecordCreator;
use super::singleton::{BirthdayReconciler, SingletonReconciler};
use crate::error::ReconcileError;
use crate::operation::{Operation, ParentRef};
use crate::ports::{ContactRepository, LabelGroupStore};
use rolodex_common::config::{BirthdayOnCreate, OrphanPolicy, RolodexConfig};
use rolodex_common::model::ParentId;
use rolodex_common::{Aggregate, FieldType};
use tracing::{debug, info};

/// Knobs for the two legacy behaviors left open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanOptions {
    pub orphan_policy: OrphanPolicy,
    pub birthday_on_create: BirthdayOnCreate,
}

impl From<&RolodexConfig> for PlanOptions {
    fn from(config: &RolodexConfig) -> Self {
        Self {
            orphan_policy: config.orphan_policy,
            birthday_on_create: config.birthday_on_create,
        }
    }
}

pub struct ReconciliationDriver<'a> {
    contacts: &'a dyn ContactRepository,
    groups: &'a dyn LabelGroupStore,
    options: PlanOptions,
}

impl<'a> ReconciliationDriver<'a> {
    pub fn new(
        contacts: &'a dyn ContactRepository,
        groups: &'a dyn LabelGroupStore,
        options: PlanOptions,
    ) -> Self {
        Self {
            contacts,
            groups,
            options,
        }
    }

    /// Batch creating `desired` as a new contact
    ///
    /// Order: parent, name, organization, nickname, sip, note, every
    /// multi-valued item, birthday, label memberships.
    pub async fn plan_create(&self, desired: &Aggregate) -> Result<Vec<Operation>, ReconcileError> {
        let (parent_op, parent) = RawRecordCreator::create_parent(desired, 0);
        let mut operations = vec![parent_op];

        operations.push(SingletonReconciler::new(FieldType::Name, parent).insert(&desired.name));
        operations.push(
            SingletonReconciler::new(FieldType::Organization, parent).insert(&desired.organization),
        );
        operations.push(SingletonReconciler::new(FieldType::Nickname, parent).insert(&desired.nickname));
        operations.push(SingletonReconciler::new(FieldType::Sip, parent).insert(&desired.sip));
        operations.push(SingletonReconciler::new(FieldType::Note, parent).insert(&desired.note));

        operations.extend(FieldReconciler::new(FieldType::Phone, parent).insert_all(&desired.phones));
        operations.extend(FieldReconciler::new(FieldType::Email, parent).insert_all(&desired.emails));
        operations.extend(
            FieldReconciler::new(FieldType::PostalAddress, parent)
                .insert_all(&desired.postal_addresses),
        );
        operations.extend(FieldReconciler::new(FieldType::Website, parent).insert_all(&desired.websites));
        operations.extend(
            FieldReconciler::new(FieldType::Im, parent)
                .insert_all(&desired.instant_message_addresses),
        );
        operations.extend(FieldReconciler::new(FieldType::Relation, parent).insert_all(&desired.relations));
        operations.extend(FieldReconciler::new(FieldType::Event, parent).insert_all(&desired.dates));

        let birthday = desired.birthday.as_deref();
        match (self.options.birthday_on_create, birthday) {
            (BirthdayOnCreate::WhenPresent, None) => debug!("birthday: absent, skipped on create"),
            _ => operations.push(BirthdayReconciler::new(parent).insert(birthday)),
        }

        let mut resolver = LabelGroupResolver::new(self.groups);
        operations.extend(insert_memberships(&mut resolver, parent, &desired.labels).await?);

        info!("Planned create: {} operations", operations.len());
        Ok(operations)
    }

    /// Batch turning `existing` into `desired`
    ///
    /// Fails before any write when `desired` has no key or the key does not
    /// resolve to a parent record. An empty result means nothing changed.
    pub async fn plan_update(
        &self,
        existing: &Aggregate,
        desired: &Aggregate,
    ) -> Result<Vec<Operation>, ReconcileError> {
        let key = desired.key().ok_or(ReconcileError::MissingIdentifier)?;
        let parent_id = self
            .contacts
            .resolve_parent_id(key)
            .await?
            .ok_or_else(|| ReconcileError::ContactNotFound(key.to_string()))?;
        let parent = ParentRef::Id(parent_id);
        let rows = &existing.rows;
        let mut operations = Vec::new();

        let singleton = |field| SingletonReconciler::new(field, parent);
        operations.extend(singleton(FieldType::Name).reconcile(
            rows.name.as_deref(),
            &existing.name,
            &desired.name,
        ));
        operations.extend(singleton(FieldType::Organization).reconcile(
            rows.organization.as_deref(),
            &existing.organization,
            &desired.organization,
        ));
        operations.extend(singleton(FieldType::Nickname).reconcile(
            rows.nickname.as_deref(),
            &existing.nickname,
            &desired.nickname,
        ));
        operations.extend(singleton(FieldType::Sip).reconcile(
            rows.sip.as_deref(),
            &existing.sip,
            &desired.sip,
        ));
        operations.extend(singleton(FieldType::Note).reconcile(
            rows.note.as_deref(),
            &existing.note,
            &desired.note,
        ));

        let collection = |field| {
            FieldReconciler::new(field, parent).with_orphan_policy(self.options.orphan_policy)
        };
        operations.extend(collection(FieldType::Email).reconcile(&existing.emails, &desired.emails)?);
        operations.extend(collection(FieldType::Phone).reconcile(&existing.phones, &desired.phones)?);
        operations.extend(
            collection(FieldType::PostalAddress)
                .reconcile(&existing.postal_addresses, &desired.postal_addresses)?,
        );
        operations.extend(collection(FieldType::Website).reconcile(&existing.websites, &desired.websites)?);
        operations.extend(collection(FieldType::Im).reconcile(
            &existing.instant_message_addresses,
            &desired.instant_message_addresses,
        )?);
        operations.extend(
            collection(FieldType::Relation).reconcile(&existing.relations, &desired.relations)?,
        );

        let mut resolver = LabelGroupResolver::new(self.groups);
        operations.extend(
            reconcile_labels(
                &mut resolver,
                parent,
                &existing.labels,
                &rows.memberships,
                &desired.labels,
            )
            .await?,
        );

        operations.extend(collection(FieldType::Event).reconcile(&existing.dates, &desired.dates)?);

        operations.extend(BirthdayReconciler::new(parent).reconcile(
            rows.birthday.as_deref(),
            existing.birthday.as_deref(),
            desired.birthday.as_deref(),
        ));

        info!("Planned update of {}: {} operations", key, operations.len());
        Ok(operations)
    }

    /// Batch deleting every resolvable contact in `identifiers`
    ///
    /// Unknown keys are skipped; the keys actually planned for deletion are
    /// returned alongside the batch.
    pub async fn plan_delete(
        &self,
        identifiers: &[String],
    ) -> Result<(Vec<Operation>, Vec<String>), ReconcileError> {
        let mut operations = Vec::new();
        let mut planned = Vec::new();
        let mut seen: Vec<ParentId> = Vec::new();

        for identifier in identifiers.iter().filter(|id| !id.is_empty()) {
            match self.contacts.resolve_parent_id(identifier).await? {
                Some(parent) if !seen.contains(&parent) => {
                    seen.push(parent);
                    operations.push(Operation::DeleteParent { parent });
                    planned.push(identifier.clone());
                }
                Some(_) => debug!("{}: listed twice, deleting once", identifier),
                None => debug!("{}: no such contact, skipping delete", identifier),
            }
        }

        Ok((operations, planned))
    }
}

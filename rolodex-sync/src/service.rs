//! Contact service: plan, apply and announce
//!
//! The engine assumes no two batches for the same contact are planned and
//! applied concurrently; the service enforces that with a per-identifier
//! async lock held from fetch through commit.

use crate::error::{ReconcileError, SyncError};
use crate::executor::BatchExecutor;
use crate::operation::Operation;
use crate::ports::{ContactRepository, LabelGroupStore, TransactionalBatchStore};
use crate::reconcile::{PlanOptions, ReconciliationDriver};
use chrono::Utc;
use rolodex_common::config::RolodexConfig;
use rolodex_common::events::{ContactEvent, EventBus};
use rolodex_common::{Aggregate, FieldType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, SyncError>;

/// One async mutex per contact identifier
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // entries nobody holds or waits on
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

pub struct ContactService<S> {
    store: Arc<S>,
    options: PlanOptions,
    commit_timeout: Duration,
    events: Arc<EventBus>,
    locks: KeyedLocks,
}

impl<S> ContactService<S>
where
    S: ContactRepository + LabelGroupStore + TransactionalBatchStore,
{
    pub fn new(
        store: Arc<S>,
        options: PlanOptions,
        commit_timeout: Duration,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            options,
            commit_timeout,
            events,
            locks: KeyedLocks::default(),
        }
    }

    pub fn from_config(store: Arc<S>, config: &RolodexConfig) -> Self {
        Self::new(
            store,
            PlanOptions::from(config),
            Duration::from_millis(config.commit_timeout_ms),
            Arc::new(EventBus::new(config.event_capacity)),
        )
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    fn driver(&self) -> ReconciliationDriver<'_> {
        ReconciliationDriver::new(self.store.as_ref(), self.store.as_ref(), self.options)
    }

    fn executor(&self) -> BatchExecutor<'_> {
        BatchExecutor::new(self.store.as_ref(), self.commit_timeout)
    }

    /// Operations that would create `desired`, without applying them
    pub async fn plan_create(&self, desired: &Aggregate) -> Result<Vec<Operation>> {
        Ok(self.driver().plan_create(desired).await?)
    }

    /// Operations that would bring the stored contact to `desired`, without
    /// applying them
    pub async fn plan_update(&self, desired: &Aggregate) -> Result<Vec<Operation>> {
        let key = desired.key().ok_or(ReconcileError::MissingIdentifier)?;
        let existing = self.fetch_existing(key).await?;
        Ok(self.driver().plan_update(&existing, desired).await?)
    }

    /// Create `desired` as a new contact; returns its identifier
    pub async fn add_contact(&self, desired: &Aggregate) -> Result<String> {
        let operations = self.driver().plan_create(desired).await?;
        let identifier = match operations.first() {
            Some(Operation::CreateParent(record)) => record.identifier.clone(),
            _ => {
                return Err(SyncError::Store(rolodex_common::Error::Internal(
                    "create plan does not start with a parent insert".to_string(),
                )))
            }
        };

        self.executor().apply(&operations).await?;

        info!("Added contact {}", identifier);
        self.events.emit_lossy(ContactEvent::Created {
            identifier: identifier.clone(),
            operations: operations.len(),
            timestamp: Utc::now(),
        });
        Ok(identifier)
    }

    /// Reconcile the stored contact keyed by `desired.identifier` with
    /// `desired`; returns the number of operations applied
    pub async fn update_contact(&self, desired: &Aggregate) -> Result<usize> {
        let key = desired.key().ok_or(ReconcileError::MissingIdentifier)?;
        let _guard = self.locks.lock(key).await;

        let existing = self.fetch_existing(key).await?;
        let operations = self.driver().plan_update(&existing, desired).await?;
        if operations.is_empty() {
            debug!("Contact {} unchanged", key);
            return Ok(0);
        }

        self.executor().apply(&operations).await?;

        info!("Updated contact {} ({} operations)", key, operations.len());
        self.events.emit_lossy(ContactEvent::Updated {
            identifier: key.to_string(),
            operations: operations.len(),
            timestamp: Utc::now(),
        });
        Ok(operations.len())
    }

    /// Delete every resolvable contact in one batch; returns the deleted keys
    pub async fn delete_contacts(&self, identifiers: &[String]) -> Result<Vec<String>> {
        let mut keys: Vec<&str> = identifiers.iter().map(String::as_str).collect();
        keys.sort_unstable();
        keys.dedup();

        // fixed order so two overlapping deletes cannot deadlock
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.locks.lock(key).await);
        }

        let (operations, deleted) = self.driver().plan_delete(identifiers).await?;
        if operations.is_empty() {
            return Ok(deleted);
        }

        self.executor().apply(&operations).await?;

        info!("Deleted {} contacts", deleted.len());
        self.events.emit_lossy(ContactEvent::Deleted {
            identifiers: deleted.clone(),
            timestamp: Utc::now(),
        });
        Ok(deleted)
    }

    pub async fn get_contact(&self, identifier: &str) -> Result<Option<Aggregate>> {
        Ok(self.store.fetch_by_key(identifier).await?)
    }

    pub async fn list_identifiers(&self) -> Result<Vec<String>> {
        Ok(self.store.list_identifiers().await?)
    }

    /// Identifiers of contacts holding exactly this phone number
    pub async fn find_by_phone(&self, number: &str) -> Result<Vec<String>> {
        Ok(self.store.find_by_value(FieldType::Phone, number).await?)
    }

    /// Identifiers of contacts holding exactly this email address
    pub async fn find_by_email(&self, address: &str) -> Result<Vec<String>> {
        Ok(self.store.find_by_value(FieldType::Email, address).await?)
    }

    async fn fetch_existing(&self, key: &str) -> Result<Aggregate> {
        self.store
            .fetch_by_key(key)
            .await?
            .ok_or_else(|| ReconcileError::ContactNotFound(key.to_string()).into())
    }
}

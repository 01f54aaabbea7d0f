//! Collaborator interfaces consumed by the engine
//!
//! [`crate::store::SqliteStore`] implements all three; tests may substitute
//! their own.

use crate::error::BatchError;
use crate::operation::Operation;
use async_trait::async_trait;
use rolodex_common::model::{GroupId, ParentId};
use rolodex_common::{Aggregate, FieldType, Result};
use std::time::Duration;

/// Read side of the contact store
#[async_trait]
pub trait ContactRepository: Send + Sync {
    /// Materialize the persisted aggregate for a stable key
    async fn fetch_by_key(&self, identifier: &str) -> Result<Option<Aggregate>>;

    /// Map a stable key to the backing store's parent id
    async fn resolve_parent_id(&self, identifier: &str) -> Result<Option<ParentId>>;

    /// All stable keys, in creation order
    async fn list_identifiers(&self) -> Result<Vec<String>>;

    /// Keys of contacts holding `value` in `field`
    async fn find_by_value(&self, field: FieldType, value: &str) -> Result<Vec<String>>;
}

/// Durable label-group side table keyed by exact title
#[async_trait]
pub trait LabelGroupStore: Send + Sync {
    async fn find_by_title(&self, title: &str) -> Result<Option<GroupId>>;

    /// Create a group; returns the existing id if the title is already taken
    async fn create(&self, title: &str) -> Result<GroupId>;
}

/// Atomic-apply primitive
#[async_trait]
pub trait TransactionalBatchStore: Send + Sync {
    /// Apply every operation or none of them
    async fn commit(&self, operations: &[Operation]) -> std::result::Result<(), BatchError>;

    /// `commit` with a deadline; expiry is reported as a Timeout `BatchError`
    ///
    /// The default bounds the whole call, so a Timeout from it may race a
    /// commit that already landed. Stores that can tell the two apart should
    /// bound only the operations and let the final commit finish.
    async fn commit_within(
        &self,
        operations: &[Operation],
        deadline: Duration,
    ) -> std::result::Result<(), BatchError> {
        match tokio::time::timeout(deadline, self.commit(operations)).await {
            Ok(result) => result,
            Err(_) => Err(BatchError::timeout(format!("commit exceeded {:?}", deadline))),
        }
    }
}

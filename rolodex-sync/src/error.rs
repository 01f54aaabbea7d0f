//! Error types for planning and applying batches

use rolodex_common::FieldType;
use thiserror::Error;

/// Planning failure; raised before any write happens
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Update requested for a contact with no stable key
    #[error("Contact has no identifier")]
    MissingIdentifier,

    /// Key does not resolve to a parent record
    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    /// Desired item carries a row id unknown to the existing contact
    #[error("Orphaned {field} item with unknown row id {row_id}")]
    OrphanedItem { field: FieldType, row_id: String },

    /// Store failure while resolving label groups or the parent id
    #[error("Store error: {0}")]
    Store(#[from] rolodex_common::Error),
}

/// How a batch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchErrorKind {
    /// The store refused the operation (constraint, unknown row, bad reference)
    Rejected,
    /// Busy, locked or I/O failure; retrying may succeed
    Transient,
    /// The commit did not finish before the deadline
    Timeout,
}

/// Batch failure; nothing from the batch was committed
///
/// `index` is the 1-based position of the failing operation, or 0 when the
/// failure was not tied to one operation (begin, commit, timeout).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Batch failed at operation {index} ({kind:?}): {detail}")]
pub struct BatchError {
    pub index: usize,
    pub field: Option<FieldType>,
    pub kind: BatchErrorKind,
    pub detail: String,
}

impl BatchError {
    pub fn rejected(index: usize, field: Option<FieldType>, detail: impl Into<String>) -> Self {
        Self {
            index,
            field,
            kind: BatchErrorKind::Rejected,
            detail: detail.into(),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            index: 0,
            field: None,
            kind: BatchErrorKind::Timeout,
            detail: detail.into(),
        }
    }

    /// Classify a database error raised while running operation `index`
    pub fn from_sqlx(index: usize, field: Option<FieldType>, err: &sqlx::Error) -> Self {
        let kind = match err {
            sqlx::Error::Database(db) => {
                // primary result code lives in the low byte of sqlite's extended code
                let code = db.code().and_then(|c| c.parse::<i32>().ok()).unwrap_or(0);
                match code & 0xff {
                    5 | 6 => BatchErrorKind::Transient,
                    _ => BatchErrorKind::Rejected,
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => BatchErrorKind::Transient,
            _ => BatchErrorKind::Rejected,
        };

        Self {
            index,
            field,
            kind,
            detail: err.to_string(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.kind, BatchErrorKind::Transient | BatchErrorKind::Timeout)
    }
}

/// Any failure of a service-level contact operation
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Store(#[from] rolodex_common::Error),
}

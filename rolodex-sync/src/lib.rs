//! # rolodex-sync
//!
//! Reconciles a desired contact against its persisted state and applies the
//! resulting operations as one atomic batch.
//!
//! Planning (`reconcile`) is pure apart from label-group resolution and the
//! parent-id lookup; applying (`executor`) is a single transaction against a
//! [`ports::TransactionalBatchStore`]. [`service::ContactService`] ties the two
//! together for callers.

pub mod error;
pub mod executor;
pub mod operation;
pub mod ports;
pub mod reconcile;
pub mod service;
pub mod store;

pub use error::{BatchError, BatchErrorKind, ReconcileError, SyncError};
pub use executor::BatchExecutor;
pub use operation::{FieldValue, Operation, ParentRecord, ParentRef};
pub use reconcile::{PlanOptions, ReconciliationDriver};
pub use service::ContactService;
pub use store::SqliteStore;

//! Reconciliation engine
//!
//! Turns (existing, desired) contact pairs into ordered operation lists.
//! Everything here except label resolution and the parent lookup is pure.

pub mod driver;
pub mod field;
pub mod labels;
pub mod raw;
pub mod singleton;

pub use driver::{PlanOptions, ReconciliationDriver};
pub use field::{FieldReconciler, ReconcilableItem};
pub use labels::{insert_memberships, reconcile_labels, LabelGroupResolver};
pub use raw::RawRecordCreator;
pub use singleton::{BirthdayReconciler, SingletonReconciler, SingletonValue};

//! Contact aggregate model
//!
//! The aggregate is a value object: one in-memory snapshot of a contact,
//! owned by whichever read, create or update is in flight.

pub mod aggregate;
pub mod category;
pub mod equality;
pub mod field;
pub mod item;

pub use aggregate::{Aggregate, Organization, PersistedRows, StructuredName};
pub use category::{canonical_label, classify_label, label_for_kind, LabelKind};
pub use equality::{equals_ignore_case, equals_strings, ItemEquality};
pub use field::FieldType;
pub use item::{GroupId, LabeledItem, ParentId, PostalAddress};

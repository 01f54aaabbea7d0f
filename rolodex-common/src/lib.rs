//! # Rolodex Common Library
//!
//! Shared code for the rolodex crates:
//! - Contact aggregate model and per-field content equality
//! - Label categories for labeled fields
//! - Configuration loading
//! - Database initialization and migrations
//! - Contact event bus

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod model;

pub use error::{Error, Result};
pub use model::{Aggregate, FieldType, LabeledItem, PostalAddress};

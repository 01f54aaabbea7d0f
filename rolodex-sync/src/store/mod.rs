//! SQLite-backed store
//!
//! One pool serves the read side, the label-group table and batch commits.

mod rows;
mod sqlite;

pub use sqlite::SqliteStore;

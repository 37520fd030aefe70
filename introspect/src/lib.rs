//! Database introspection and reverse engineering
//!
//! [`Introspector`] reads tables, columns, constraints and sequences through
//! a [`polydb_drivers::Connection`] using the dialect's metadata views:
//! `information_schema` for Generic, PostgreSQL and SQL Server, the `all_*`
//! dictionary for Oracle and `sqlite_master` with the pragma functions for
//! SQLite. Column types are classified by [`polydb_types::parse_native_type`],
//! so every engine feeds the same reverse mapper.
//!
//! [`reverse`] turns the result into a [`polydb_core::Schema`] and compares an
//! existing model against a database.

mod info;
mod introspector;
pub mod queries;
pub mod reverse;

pub use info::{ConstraintInfo, ConstraintType, IndexInfo, SequenceInfo, TableInfo};
pub use introspector::Introspector;
pub use reverse::{Mismatch, attach_foreign_keys, build_schema, verify};

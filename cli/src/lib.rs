//! polydb CLI - Command-line front-end for the polydb crates
//!
//! The CLI works from plain files so that scripts can be produced without
//! writing Rust code:
//!
//! - a **schema file** (TOML or JSON) holding a serialized [`Schema`]
//! - a **connection file** (TOML) holding a [`ConnectionDescriptor`]
//!
//! # Schema file
//!
//! ```toml
//! name = ""
//!
//! [[tables]]
//! name = "customers"
//!
//! [[tables.columns]]
//! name = "id"
//! semantic = { data_type = "BigInt" }
//! primaryKey = true
//! autoIncrement = true
//!
//! [[tables.columns]]
//! name = "name"
//! semantic = { data_type = "String", size = 80 }
//! notNull = true
//! ```
//!
//! # Commands
//!
//! - `polydb ddl <schema> --dialect pg` - Generate a create or drop script
//! - `polydb split <script> --dialect mssql` - Split a script on batch separators
//! - `polydb introspect --sqlite app.db` - Read tables back from a database
//! - `polydb inspect-type "NUMBER(10,0)"` - Classify native type text
//!
//! [`Schema`]: polydb_core::Schema
//! [`ConnectionDescriptor`]: polydb_core::ConnectionDescriptor

pub mod commands;
pub mod error;
pub mod input;
pub mod output;

pub use error::CliError;

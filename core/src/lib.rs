//! Core model shared by every polydb crate
//!
//! - [`Fault`] - the error taxonomy (configuration, coercion, engine)
//! - [`Value`] / [`Row`] - runtime column values
//! - [`schema`] - the caller-owned schema-model graph
//! - [`ConnectionDescriptor`] - connection settings loaded from TOML
//! - [`normalize`] - engine error flattening with display-name substitution

pub mod config;
pub mod error;
pub mod normalize;
pub mod schema;
mod tracing;
pub mod value;

pub use config::ConnectionDescriptor;
pub use error::{EngineError, Fault, Result};
pub use schema::{
    Column, ColumnKind, Constraint, ConstraintKind, ForeignKey, Index, Procedure, ProcedureKind,
    Schema, Sequence, Table, TableKind,
};
pub use value::{Row, Value};

pub use polydb_types as types;

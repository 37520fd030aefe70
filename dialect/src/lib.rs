//! Dialect rule tables, DDL/DML generation and value marshaling
//!
//! Everything here is pure text and value transformation; nothing touches a
//! connection.

pub mod ddl;
pub mod dialects;
pub mod dml;
pub mod format;
pub mod literal;
pub mod marshal;
mod table;

// Re-export key types and traits
pub use ddl::{DdlGenerator, DdlOp, DdlScript, TableOptions, split_script};
pub use dml::{DmlGenerator, InsertPlan, KeySource, Values};
pub use marshal::{NativeParam, native_param, read_row, read_value, write_value};
pub use table::{
    AlterStrategy, DialectTable, DialectTableExt, IdentityStrategy, LOB_TABLE, LobStrategy,
    Paging, SEQUENCE_TABLE, SchemaSupport, SequenceStorage,
};

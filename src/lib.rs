//! # polydb
//!
//! A multi-dialect database layer: one schema model, five SQL dialects.
//!
//! ## Quick Start
//!
//! ```rust
//! use polydb::prelude::*;
//!
//! # fn main() -> polydb::Result<()> {
//! let mut schema = Schema::new("")
//!     .table(
//!         Table::new("customers")
//!             .column(Column::new("id", DataType::BigInt).primary_key())
//!             .column(Column::new("name", SemanticType::string(80)).not_null()),
//!     )
//!     .sequence(Sequence::new("customers_seq"));
//!
//! let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory())?;
//! let script = DdlGenerator::new(DialectKind::Sqlite).schema(DdlOp::Create, &schema)?;
//! session::run_script(&mut conn, &script)?;
//!
//! let key = session::insert(&mut conn, &mut schema, "customers", &Row::new().with("name", "Ada"))?;
//! assert_eq!(key, Some(Value::I64(1)));
//!
//! let rows = session::load_rows(&mut conn, schema.find_table("customers").unwrap())?;
//! assert_eq!(rows[0].get("name"), Some(&Value::from("Ada")));
//! # Ok(())
//! # }
//! ```
//!
//! ## Dialect Support
//!
//! | Dialect    | DDL / DML | Driver         | Feature Flag     |
//! |------------|-----------|----------------|------------------|
//! | SQLite     | ✅        | rusqlite       | `rusqlite`       |
//! | PostgreSQL | ✅        | postgres       | `postgres-sync`  |
//! | PostgreSQL | ✅        | tokio-postgres | `tokio-postgres` |
//! | SQL Server | ✅        | -              | -                |
//! | Oracle     | ✅        | -              | -                |
//! | Generic    | ✅        | -              | -                |
//!
//! Dialects without a driver still get scripts, statements and marshaling;
//! any type implementing [`Connection`] can execute them.

// =============================================================================
// Member crates
// =============================================================================

pub use polydb_core as core;
pub use polydb_dialect as dialect;
pub use polydb_drivers as drivers;
pub use polydb_introspect as introspect;
pub use polydb_types as types;

// =============================================================================
// Root-level exports
// =============================================================================

pub use polydb_core::{ConnectionDescriptor, Fault, Result, Row, Value};
pub use polydb_dialect::{DdlGenerator, DdlOp, DialectTable, DialectTableExt, DmlGenerator};
pub use polydb_drivers::{AsyncConnection, Connection, gateway, lob, session};
pub use polydb_introspect::Introspector;
pub use polydb_types::{DataType, DialectKind, SemanticType};

/// Prelude module for convenient imports
pub mod prelude {
    pub use polydb_core::{
        Column, ConnectionDescriptor, Constraint, ForeignKey, Index, Procedure, Row, Schema,
        Sequence, Table, Value,
    };
    pub use polydb_dialect::{
        DdlGenerator, DdlOp, DialectTableExt, DmlGenerator, KeySource, Values, split_script,
    };
    pub use polydb_drivers::{
        AsyncConnection, Connection, CursorBehavior, Expect, LobStore, Outcome, RowCursor,
        lob_store, session,
    };
    #[cfg(feature = "postgres-sync")]
    pub use polydb_drivers::open_postgres;
    #[cfg(feature = "rusqlite")]
    pub use polydb_drivers::open_sqlite;
    #[cfg(feature = "tokio-postgres")]
    pub use polydb_drivers::connect_tokio_postgres;
    pub use polydb_introspect::{Introspector, reverse};
    pub use polydb_types::{DataType, DialectKind, SemanticType, parse_native_type};
}

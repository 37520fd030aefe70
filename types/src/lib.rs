//! Shared type definitions for polydb
//!
//! This crate provides the engine-agnostic vocabulary used across the polydb
//! crates:
//!
//! - [`DialectKind`] - the closed set of supported database engines
//! - [`DataType`] / [`SemanticType`] - the logical column type model
//! - [`ColumnInfo`] / [`parse_native_type`] - the reverse mapper from native
//!   type text back into the semantic model
//!
//! # Features
//!
//! - `serde` - Enable serde serialization/deserialization

mod data_type;
mod dialect;
pub mod native;

pub use data_type::{DataType, SemanticType, TypeFamily, ValueKind};
pub use dialect::{DialectKind, DialectParseError};
pub use native::{ColumnInfo, NativeTypeText, parse_native_type};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ColumnInfo, DataType, DialectKind, SemanticType, TypeFamily, ValueKind, parse_native_type,
    };
}

//! Per-engine rule tables
//!
//! One immutable [`DialectTable`] exists per [`DialectKind`], defined as a
//! `static` in [`crate::dialects`]. Behaviour that differs between engines is
//! either a plain field or a function pointer; the generators never branch on
//! anything that is not in this table.

use chrono::{NaiveDateTime, TimeDelta};
use polydb_core::{ConnectionDescriptor, Fault, Result, Value};
use polydb_types::{DataType, DialectKind, SemanticType, ValueKind};

use crate::dialects;
use crate::format;

/// How the primary key of a new row is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityStrategy {
    /// Sequence call embedded in the `VALUES` clause
    InlineSequence,
    /// Next value assigned to a session variable before the insert, selected after
    PrePostStatement,
    /// Counter row incremented in a side table, then read back
    SideTableCounter,
}

/// Where large-object payloads live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LobStrategy {
    /// Engine large-object API with transaction-scoped handles
    Native,
    /// Side table accessed through a seekable temporary file
    Buffered,
    /// Side table keyed by an engine-issued row id
    SideTable,
}

/// How `Alter` is expressed for an object kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlterStrategy {
    /// Dedicated `ALTER` statement
    Native,
    /// `Drop` followed by `Create`
    DropCreate,
}

/// Where sequences are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceStorage {
    /// `CREATE SEQUENCE` objects
    Native,
    /// Rows in the [`SEQUENCE_TABLE`] counter table
    CounterTable,
}

/// Namespace support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaSupport {
    None,
    Plain,
    /// `CREATE SCHEMA IF NOT EXISTS`
    IfNotExists,
}

/// Row-limiting syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Paging {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    OffsetFetch,
}

/// Counter table used by dialects without sequence objects
pub const SEQUENCE_TABLE: &str = "db_sequence";

/// Side table used by dialects without a native large-object type
pub const LOB_TABLE: &str = "db_lob";

/// Immutable rule set for one engine
pub struct DialectTable {
    pub kind: DialectKind,
    pub name: &'static str,
    /// Prefix of named parameters (`@name`, `:name`)
    pub parameter_prefix: char,
    /// Line separating independently executable statements
    pub batch_separator: &'static str,
    /// Native type template per semantic type
    pub type_map: &'static [(DataType, &'static str)],
    /// Opening and closing identifier quote
    pub quote: (char, char),
    pub identity: IdentityStrategy,
    pub sequences: SequenceStorage,
    pub lob: LobStrategy,
    pub column_alter: AlterStrategy,
    pub sequence_alter: AlterStrategy,
    /// Constraints and foreign keys can only be declared inside `CREATE TABLE`
    pub inline_constraints: bool,
    pub schemas: SchemaSupport,
    pub procedures: bool,
    pub paging: Paging,
    /// Keyword introducing a new column in `ALTER TABLE`
    pub add_column: &'static str,
    /// Column clause for engine-generated identity values
    pub auto_increment: &'static str,
    /// Query returning the identity generated by the last insert
    pub last_identity: Option<&'static str>,
    /// `TRUE`/`FALSE` literals
    pub bool_literals: (&'static str, &'static str),
    /// Prefix of string literals (`N` for national character literals)
    pub text_literal_prefix: &'static str,
    pub bytes_literal: fn(&[u8]) -> String,
    pub datetime_literal: fn(&NaiveDateTime) -> String,
    /// `None` when the span is outside the dialect's interval range
    pub timespan_literal: fn(&TimeDelta) -> Option<String>,
    /// Storage representation applied after widening on write
    pub store: fn(Value) -> Value,
    /// Allowed `(native kind, declared type)` conversions on read
    pub read_matrix: &'static [(ValueKind, DataType)],
    pub connection_string: fn(&ConnectionDescriptor) -> String,
}

impl DialectTable {
    /// Table for a dialect
    #[must_use]
    pub fn of(kind: DialectKind) -> &'static DialectTable {
        match kind {
            DialectKind::Generic => &dialects::generic::TABLE,
            DialectKind::PostgreSql => &dialects::postgres::TABLE,
            DialectKind::MsSql => &dialects::mssql::TABLE,
            DialectKind::Oracle => &dialects::oracle::TABLE,
            DialectKind::Sqlite => &dialects::sqlite::TABLE,
        }
    }

    /// Native type template for a semantic type
    pub fn template(&self, data_type: DataType) -> Result<&'static str> {
        self.type_map
            .iter()
            .find(|(t, _)| *t == data_type)
            .map(|(_, template)| *template)
            .ok_or(Fault::MissingTypeMapping {
                dialect: self.kind,
                data_type,
            })
    }

    /// Native type text for a semantic type
    ///
    /// # Examples
    ///
    /// ```
    /// use polydb_dialect::DialectTable;
    /// use polydb_types::{DialectKind, SemanticType};
    ///
    /// let generic = DialectTable::of(DialectKind::Generic);
    /// assert_eq!(generic.format_type(SemanticType::decimal(10, 2)).unwrap(), "DECIMAL(10,2)");
    /// ```
    pub fn format_type(&self, semantic: SemanticType) -> Result<String> {
        let template = self.template(semantic.data_type)?;
        Ok(format::expand_template(template, semantic.size, semantic.scale))
    }

    /// Identifier, quoted only when needed
    #[must_use]
    pub fn quote(&self, identifier: &str) -> String {
        format::quote_identifier(identifier, self.quote)
    }

    /// Object name qualified with its namespace when the dialect has namespaces
    #[must_use]
    pub fn qualify(&self, namespace: Option<&str>, name: &str) -> String {
        match namespace {
            Some(ns) if !ns.is_empty() && self.schemas != SchemaSupport::None => {
                format!("{}.{}", self.quote(ns), self.quote(name))
            }
            _ => self.quote(name),
        }
    }

    /// Named parameter placeholder
    #[must_use]
    pub fn parameter(&self, name: &str) -> String {
        format!("{}{}", self.parameter_prefix, name)
    }

    /// Separator line for generated scripts
    #[inline]
    #[must_use]
    pub const fn separator(&self) -> &'static str {
        self.batch_separator
    }

    #[inline]
    #[must_use]
    pub fn supports_schemas(&self) -> bool {
        self.schemas != SchemaSupport::None
    }

    /// Engine-specific connection string for a descriptor
    #[must_use]
    pub fn connection_string(&self, descriptor: &ConnectionDescriptor) -> String {
        (self.connection_string)(descriptor)
    }

    /// Returns `true` when a native `kind` may be read into a `declared` column
    #[must_use]
    pub fn can_read(&self, native: ValueKind, declared: DataType) -> bool {
        native == declared.value_kind()
            || self
                .read_matrix
                .iter()
                .any(|(from, to)| *from == native && *to == declared)
    }
}

impl std::fmt::Debug for DialectTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectTable")
            .field("kind", &self.kind)
            .field("parameter_prefix", &self.parameter_prefix)
            .field("batch_separator", &self.batch_separator)
            .field("identity", &self.identity)
            .field("lob", &self.lob)
            .finish_non_exhaustive()
    }
}

/// Access to the static table from a [`DialectKind`]
pub trait DialectTableExt {
    fn table(self) -> &'static DialectTable;
}

impl DialectTableExt for DialectKind {
    #[inline]
    fn table(self) -> &'static DialectTable {
        DialectTable::of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_dialect_maps_every_type() {
        for kind in DialectKind::ALL {
            let table = kind.table();
            assert_eq!(table.kind, kind);
            for data_type in DataType::ALL {
                assert!(
                    table.template(data_type).is_ok(),
                    "{kind} lacks {data_type}"
                );
            }
        }
    }

    #[test]
    fn test_missing_mapping_is_configuration_error() {
        let empty = DialectTable {
            type_map: &[],
            ..*DialectKind::Generic.table()
        };
        let err = empty.format_type(SemanticType::string(10)).unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(
            err,
            Fault::MissingTypeMapping {
                data_type: DataType::String,
                ..
            }
        ));
    }

    #[test]
    fn test_qualify() {
        let pg = DialectKind::PostgreSql.table();
        assert_eq!(pg.qualify(Some("sales"), "orders"), "sales.orders");
        assert_eq!(pg.qualify(Some(""), "orders"), "orders");
        let sqlite = DialectKind::Sqlite.table();
        assert_eq!(sqlite.qualify(Some("sales"), "orders"), "orders");
        let mssql = DialectKind::MsSql.table();
        assert_eq!(mssql.qualify(Some("dbo"), "order"), "dbo.[order]");
    }

    #[test]
    fn test_parameters() {
        assert_eq!(DialectKind::Oracle.table().parameter("id"), ":id");
        assert_eq!(DialectKind::MsSql.table().parameter("id"), "@id");
    }
}

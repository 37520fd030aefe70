//! SQLite
//!
//! File based, dynamically typed storage. Sequences are rows of a counter
//! table, constraints can only be declared inside `CREATE TABLE`, and there
//! are no namespaces or stored procedures.

use chrono::TimeDelta;
use polydb_core::{ConnectionDescriptor, Value};
use polydb_types::{DataType, DialectKind, ValueKind};

use super::{hex_literal, quoted_datetime, total_micros};
use crate::table::{
    AlterStrategy, DialectTable, IdentityStrategy, LobStrategy, Paging, SchemaSupport,
    SequenceStorage,
};

/// Text form of stored datetimes; sorts lexically
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const TYPE_MAP: &[(DataType, &str)] = &[
    (DataType::String, "VARCHAR{size}"),
    (DataType::Clob, "TEXT"),
    (DataType::DateTime, "DATETIME"),
    (DataType::ByteArray, "BLOB"),
    (DataType::Blob, "BLOB"),
    (DataType::BigInt, "BIGINT"),
    (DataType::Int, "INTEGER"),
    (DataType::ShortInt, "SMALLINT"),
    (DataType::TinyInt, "TINYINT"),
    (DataType::Float, "REAL"),
    (DataType::Double, "DOUBLE"),
    (DataType::Decimal, "DECIMAL{size}"),
    (DataType::TimeSpan, "INTERVAL"),
    (DataType::Bool, "BOOLEAN"),
    (DataType::LargeObject, "INTEGER"),
    (DataType::ByteSerializable, "BLOB"),
];

/// Storage classes are INTEGER, REAL, TEXT and BLOB
const READ_MATRIX: &[(ValueKind, DataType)] = &[
    (ValueKind::I64, DataType::Bool),
    (ValueKind::I64, DataType::TinyInt),
    (ValueKind::I64, DataType::ShortInt),
    (ValueKind::I64, DataType::Int),
    (ValueKind::I64, DataType::Float),
    (ValueKind::I64, DataType::Double),
    (ValueKind::I64, DataType::Decimal),
    (ValueKind::I64, DataType::TimeSpan),
    (ValueKind::F64, DataType::Float),
    (ValueKind::F64, DataType::Decimal),
    (ValueKind::Text, DataType::Decimal),
    (ValueKind::Text, DataType::DateTime),
];

fn store(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::I64(i64::from(b)),
        Value::I8(v) => Value::I64(i64::from(v)),
        Value::I16(v) => Value::I64(i64::from(v)),
        Value::I32(v) => Value::I64(i64::from(v)),
        Value::F32(v) => Value::F64(f64::from(v)),
        Value::Decimal(d) => Value::Text(d.to_string()),
        Value::DateTime(dt) => Value::Text(dt.format(DATETIME_FORMAT).to_string()),
        Value::TimeSpan(span) => Value::I64(total_micros(&span)),
        other => other,
    }
}

fn timespan_literal(value: &TimeDelta) -> Option<String> {
    value.num_microseconds().map(|micros| micros.to_string())
}

fn connection_string(desc: &ConnectionDescriptor) -> String {
    let source = desc
        .path
        .as_deref()
        .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string());
    format!("Data Source={source}")
}

pub static TABLE: DialectTable = DialectTable {
    kind: DialectKind::Sqlite,
    name: "SQLite",
    parameter_prefix: '@',
    batch_separator: "--go",
    type_map: TYPE_MAP,
    quote: ('"', '"'),
    identity: IdentityStrategy::SideTableCounter,
    sequences: SequenceStorage::CounterTable,
    lob: LobStrategy::SideTable,
    column_alter: AlterStrategy::DropCreate,
    // counter row UPDATE
    sequence_alter: AlterStrategy::Native,
    inline_constraints: true,
    schemas: SchemaSupport::None,
    procedures: false,
    paging: Paging::LimitOffset,
    add_column: "ADD COLUMN",
    auto_increment: " AUTOINCREMENT",
    last_identity: Some("SELECT last_insert_rowid()"),
    bool_literals: ("1", "0"),
    text_literal_prefix: "",
    bytes_literal: hex_literal,
    datetime_literal: quoted_datetime,
    timespan_literal,
    store,
    read_matrix: READ_MATRIX,
    connection_string,
};

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_storage_classes() {
        assert_eq!(store(Value::Bool(true)), Value::I64(1));
        assert_eq!(store(Value::I16(-2)), Value::I64(-2));
        assert_eq!(
            store(Value::Decimal(Decimal::new(1999, 2))),
            Value::Text("19.99".into())
        );
        assert_eq!(
            store(Value::TimeSpan(TimeDelta::milliseconds(1500))),
            Value::I64(1_500_000)
        );
    }

    #[test]
    fn test_memory_connection_string() {
        assert_eq!(
            connection_string(&ConnectionDescriptor::sqlite_memory()),
            "Data Source=:memory:"
        );
    }
}

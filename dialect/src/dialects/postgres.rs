//! PostgreSQL

use chrono::TimeDelta;
use polydb_core::{ConnectionDescriptor, Value};
use polydb_types::{DataType, DialectKind, ValueKind};

use super::quoted_datetime;
use crate::format::hex;
use crate::table::{
    AlterStrategy, DialectTable, IdentityStrategy, LobStrategy, Paging, SchemaSupport,
    SequenceStorage,
};

const TYPE_MAP: &[(DataType, &str)] = &[
    (DataType::String, "VARCHAR{size}"),
    (DataType::Clob, "TEXT"),
    (DataType::DateTime, "TIMESTAMP"),
    (DataType::ByteArray, "BYTEA"),
    (DataType::Blob, "BYTEA"),
    (DataType::BigInt, "BIGINT"),
    (DataType::Int, "INTEGER"),
    (DataType::ShortInt, "SMALLINT"),
    // no single-byte integer type
    (DataType::TinyInt, "SMALLINT"),
    (DataType::Float, "REAL"),
    (DataType::Double, "DOUBLE PRECISION"),
    (DataType::Decimal, "NUMERIC{size}"),
    (DataType::TimeSpan, "INTERVAL"),
    (DataType::Bool, "BOOLEAN"),
    (DataType::LargeObject, "BIGINT"),
    (DataType::ByteSerializable, "BYTEA"),
];

const READ_MATRIX: &[(ValueKind, DataType)] = &[
    (ValueKind::I16, DataType::TinyInt),
    (ValueKind::I64, DataType::Int),
    (ValueKind::I32, DataType::LargeObject),
    (ValueKind::Decimal, DataType::Double),
    (ValueKind::Decimal, DataType::Float),
    (ValueKind::F64, DataType::Float),
    (ValueKind::Text, DataType::DateTime),
];

fn store(value: Value) -> Value {
    match value {
        Value::I8(v) => Value::I16(i16::from(v)),
        other => other,
    }
}

fn bytes_literal(bytes: &[u8]) -> String {
    format!("decode('{}', 'hex')", hex(bytes))
}

fn timespan_literal(value: &TimeDelta) -> Option<String> {
    Some(format!("INTERVAL '{} microseconds'", value.num_microseconds()?))
}

/// Quote a libpq keyword value when it contains spaces or quotes
fn libpq_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '\'', '\\']) {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    } else {
        value.to_string()
    }
}

/// libpq keyword/value connection string
fn connection_string(desc: &ConnectionDescriptor) -> String {
    let mut parts = Vec::new();
    if let Some(host) = &desc.host {
        parts.push(format!("host={}", libpq_value(host)));
    }
    parts.push(format!("port={}", desc.port()));
    if let Some(database) = &desc.database {
        parts.push(format!("dbname={}", libpq_value(database)));
    }
    if let Some(user) = &desc.user {
        parts.push(format!("user={}", libpq_value(user)));
    }
    if let Some(password) = &desc.password {
        parts.push(format!("password={}", libpq_value(password)));
    }
    if let Some(timeout) = desc.timeout {
        parts.push(format!("connect_timeout={timeout}"));
    }
    if let Some(schema) = &desc.schema {
        parts.push(format!(
            "options={}",
            libpq_value(&format!("-c search_path={schema}"))
        ));
    }
    parts.push(format!(
        "sslmode={}",
        if desc.encrypt { "require" } else { "prefer" }
    ));
    parts.join(" ")
}

pub static TABLE: DialectTable = DialectTable {
    kind: DialectKind::PostgreSql,
    name: "PostgreSQL",
    parameter_prefix: ':',
    batch_separator: "--go",
    type_map: TYPE_MAP,
    quote: ('"', '"'),
    identity: IdentityStrategy::InlineSequence,
    sequences: SequenceStorage::Native,
    lob: LobStrategy::Native,
    column_alter: AlterStrategy::Native,
    sequence_alter: AlterStrategy::Native,
    inline_constraints: false,
    schemas: SchemaSupport::IfNotExists,
    procedures: true,
    paging: Paging::LimitOffset,
    add_column: "ADD COLUMN",
    auto_increment: " GENERATED BY DEFAULT AS IDENTITY",
    last_identity: Some("SELECT lastval()"),
    bool_literals: ("TRUE", "FALSE"),
    text_literal_prefix: "",
    bytes_literal,
    datetime_literal: quoted_datetime,
    timespan_literal,
    store,
    read_matrix: READ_MATRIX,
    connection_string,
};

//! Oracle

use chrono::NaiveDateTime;
use polydb_core::{ConnectionDescriptor, Value};
use polydb_types::{DataType, DialectKind, ValueKind};

use super::{day_to_second_literal, pair};
use crate::format::hex;
use crate::table::{
    AlterStrategy, DialectTable, IdentityStrategy, LobStrategy, Paging, SchemaSupport,
    SequenceStorage,
};

const TYPE_MAP: &[(DataType, &str)] = &[
    (DataType::String, "VARCHAR2{size:4000}"),
    (DataType::Clob, "CLOB"),
    (DataType::DateTime, "TIMESTAMP"),
    (DataType::ByteArray, "RAW{size:2000}"),
    (DataType::Blob, "BLOB"),
    (DataType::BigInt, "NUMBER(19)"),
    (DataType::Int, "NUMBER(10)"),
    (DataType::ShortInt, "NUMBER(5)"),
    (DataType::TinyInt, "NUMBER(3)"),
    (DataType::Float, "BINARY_FLOAT"),
    (DataType::Double, "BINARY_DOUBLE"),
    (DataType::Decimal, "DECIMAL{size}"),
    (DataType::TimeSpan, "INTERVAL DAY TO SECOND"),
    (DataType::Bool, "NUMBER(1)"),
    (DataType::LargeObject, "NUMBER(19)"),
    (DataType::ByteSerializable, "BLOB"),
];

/// Every NUMBER column may surface as a decimal
const READ_MATRIX: &[(ValueKind, DataType)] = &[
    (ValueKind::Decimal, DataType::Bool),
    (ValueKind::Decimal, DataType::TinyInt),
    (ValueKind::Decimal, DataType::ShortInt),
    (ValueKind::Decimal, DataType::Int),
    (ValueKind::Decimal, DataType::BigInt),
    (ValueKind::Decimal, DataType::LargeObject),
    (ValueKind::Decimal, DataType::Double),
    (ValueKind::Decimal, DataType::Float),
    (ValueKind::I16, DataType::Bool),
    (ValueKind::I16, DataType::TinyInt),
    (ValueKind::I32, DataType::ShortInt),
    (ValueKind::I64, DataType::Int),
    (ValueKind::I64, DataType::ShortInt),
    (ValueKind::F64, DataType::Float),
    (ValueKind::F32, DataType::Double),
    (ValueKind::Text, DataType::DateTime),
];

/// NUMBER(1) booleans and no single-byte integers
fn store(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::I16(i16::from(b)),
        Value::I8(v) => Value::I16(i16::from(v)),
        other => other,
    }
}

fn bytes_literal(bytes: &[u8]) -> String {
    format!("HEXTORAW('{}')", hex(bytes))
}

fn datetime_literal(value: &NaiveDateTime) -> String {
    format!(
        "TO_TIMESTAMP('{}', 'YYYY-MM-DD HH24:MI:SS.FF')",
        value.format("%Y-%m-%d %H:%M:%S%.6f")
    )
}

/// ODP.NET style connection string with an EZConnect data source
fn connection_string(desc: &ConnectionDescriptor) -> String {
    let mut parts = Vec::new();
    let service = desc.database.as_deref().unwrap_or_default();
    if let Some(host) = &desc.host {
        pair(
            &mut parts,
            "Data Source",
            format!("//{host}:{}/{service}", desc.port()),
        );
    }
    if desc.integrated_security {
        pair(&mut parts, "User Id", "/");
    } else {
        if let Some(user) = &desc.user {
            pair(&mut parts, "User Id", user);
        }
        if let Some(password) = &desc.password {
            pair(&mut parts, "Password", password);
        }
    }
    pair(&mut parts, "Pooling", desc.pooling);
    if let Some(timeout) = desc.timeout {
        pair(&mut parts, "Connection Timeout", timeout);
    }
    parts.join(";")
}

pub static TABLE: DialectTable = DialectTable {
    kind: DialectKind::Oracle,
    name: "Oracle",
    parameter_prefix: ':',
    batch_separator: "/",
    type_map: TYPE_MAP,
    quote: ('"', '"'),
    identity: IdentityStrategy::InlineSequence,
    sequences: SequenceStorage::Native,
    lob: LobStrategy::Buffered,
    column_alter: AlterStrategy::DropCreate,
    sequence_alter: AlterStrategy::DropCreate,
    inline_constraints: false,
    schemas: SchemaSupport::None,
    procedures: true,
    paging: Paging::OffsetFetch,
    add_column: "ADD",
    auto_increment: " GENERATED BY DEFAULT AS IDENTITY",
    last_identity: None,
    bool_literals: ("1", "0"),
    text_literal_prefix: "",
    bytes_literal,
    datetime_literal,
    timespan_literal: day_to_second_literal,
    store,
    read_matrix: READ_MATRIX,
    connection_string,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_stored_as_number() {
        assert_eq!(store(Value::Bool(true)), Value::I16(1));
    }

    #[test]
    fn test_timestamp_literal() {
        let dt = NaiveDateTime::parse_from_str("2024-01-02 03:04:05", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        assert_eq!(
            datetime_literal(&dt),
            "TO_TIMESTAMP('2024-01-02 03:04:05.000000', 'YYYY-MM-DD HH24:MI:SS.FF')"
        );
    }

    #[test]
    fn test_connection_string() {
        let desc = ConnectionDescriptor::new(DialectKind::Oracle)
            .host("ora")
            .database("ORCLPDB1")
            .credentials("scott", "tiger");
        assert_eq!(
            connection_string(&desc),
            "Data Source=//ora:1521/ORCLPDB1;User Id=scott;Password=tiger;Pooling=true"
        );
    }
}

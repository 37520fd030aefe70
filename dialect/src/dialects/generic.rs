//! Generic ANSI-ish dialect, used when no engine-specific rule applies

use polydb_core::ConnectionDescriptor;
use polydb_types::{DataType, DialectKind, ValueKind};

use super::{day_to_second_literal, hex_literal, keep, pair, quoted_datetime};
use crate::table::{
    AlterStrategy, DialectTable, IdentityStrategy, LobStrategy, Paging, SchemaSupport,
    SequenceStorage,
};

const TYPE_MAP: &[(DataType, &str)] = &[
    (DataType::String, "VARCHAR{size}"),
    (DataType::Clob, "CLOB"),
    (DataType::DateTime, "TIMESTAMP"),
    (DataType::ByteArray, "VARBINARY{size}"),
    (DataType::Blob, "BLOB"),
    (DataType::BigInt, "BIGINT"),
    (DataType::Int, "INTEGER"),
    (DataType::ShortInt, "SMALLINT"),
    (DataType::TinyInt, "TINYINT"),
    (DataType::Float, "REAL"),
    (DataType::Double, "DOUBLE PRECISION"),
    (DataType::Decimal, "DECIMAL{size}"),
    (DataType::TimeSpan, "INTERVAL DAY TO SECOND"),
    (DataType::Bool, "BOOLEAN"),
    (DataType::LargeObject, "BIGINT"),
    (DataType::ByteSerializable, "BLOB"),
];

const READ_MATRIX: &[(ValueKind, DataType)] = &[
    (ValueKind::I16, DataType::TinyInt),
    (ValueKind::I32, DataType::TinyInt),
    (ValueKind::I32, DataType::ShortInt),
    (ValueKind::I64, DataType::Int),
    (ValueKind::I64, DataType::ShortInt),
    (ValueKind::I64, DataType::TinyInt),
    (ValueKind::I32, DataType::BigInt),
    (ValueKind::Decimal, DataType::Double),
    (ValueKind::Decimal, DataType::Float),
    (ValueKind::F64, DataType::Float),
    (ValueKind::F32, DataType::Double),
    (ValueKind::Text, DataType::DateTime),
];

fn connection_string(desc: &ConnectionDescriptor) -> String {
    let mut parts = Vec::new();
    if let Some(host) = &desc.host {
        pair(&mut parts, "Server", host);
    }
    if let Some(port) = desc.port_number {
        pair(&mut parts, "Port", port);
    }
    if let Some(database) = &desc.database {
        pair(&mut parts, "Database", database);
    }
    if let Some(user) = &desc.user {
        pair(&mut parts, "User Id", user);
    }
    if let Some(password) = &desc.password {
        pair(&mut parts, "Password", password);
    }
    if let Some(timeout) = desc.timeout {
        pair(&mut parts, "Timeout", timeout);
    }
    parts.join(";")
}

pub static TABLE: DialectTable = DialectTable {
    kind: DialectKind::Generic,
    name: "Generic",
    parameter_prefix: '@',
    batch_separator: "GO",
    type_map: TYPE_MAP,
    quote: ('"', '"'),
    identity: IdentityStrategy::InlineSequence,
    sequences: SequenceStorage::Native,
    lob: LobStrategy::SideTable,
    column_alter: AlterStrategy::DropCreate,
    sequence_alter: AlterStrategy::DropCreate,
    inline_constraints: false,
    schemas: SchemaSupport::Plain,
    procedures: true,
    paging: Paging::LimitOffset,
    add_column: "ADD",
    auto_increment: " GENERATED BY DEFAULT AS IDENTITY",
    last_identity: None,
    bool_literals: ("TRUE", "FALSE"),
    text_literal_prefix: "",
    bytes_literal: hex_literal,
    datetime_literal: quoted_datetime,
    timespan_literal: day_to_second_literal,
    store: keep,
    read_matrix: READ_MATRIX,
    connection_string,
};

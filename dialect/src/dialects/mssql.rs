//! Microsoft SQL Server

use chrono::TimeDelta;
use polydb_core::ConnectionDescriptor;
use polydb_types::{DataType, DialectKind, ValueKind};

use super::{duration_parts, keep, pair, quoted_datetime};
use crate::format::hex;
use crate::table::{
    AlterStrategy, DialectTable, IdentityStrategy, LobStrategy, Paging, SchemaSupport,
    SequenceStorage,
};

const TYPE_MAP: &[(DataType, &str)] = &[
    (DataType::String, "NVARCHAR{size:MAX}"),
    (DataType::Clob, "NVARCHAR(MAX)"),
    (DataType::DateTime, "DATETIME2"),
    (DataType::ByteArray, "VARBINARY{size:MAX}"),
    (DataType::Blob, "VARBINARY(MAX)"),
    (DataType::BigInt, "BIGINT"),
    (DataType::Int, "INT"),
    (DataType::ShortInt, "SMALLINT"),
    (DataType::TinyInt, "TINYINT"),
    (DataType::Float, "REAL"),
    (DataType::Double, "FLOAT"),
    (DataType::Decimal, "DECIMAL{size}"),
    (DataType::TimeSpan, "TIME"),
    (DataType::Bool, "BIT"),
    (DataType::LargeObject, "BIGINT"),
    (DataType::ByteSerializable, "VARBINARY(MAX)"),
];

const READ_MATRIX: &[(ValueKind, DataType)] = &[
    (ValueKind::I16, DataType::TinyInt),
    (ValueKind::I16, DataType::Bool),
    (ValueKind::I32, DataType::ShortInt),
    (ValueKind::I64, DataType::Int),
    (ValueKind::Decimal, DataType::Double),
    (ValueKind::Decimal, DataType::Float),
    (ValueKind::Decimal, DataType::BigInt),
    (ValueKind::F64, DataType::Float),
    (ValueKind::Text, DataType::DateTime),
];

fn bytes_literal(bytes: &[u8]) -> String {
    format!("0x{}", hex(bytes))
}

/// `TIME` literal; `TIME` holds time of day only, so spans outside
/// `[0, 24h)` have none
fn timespan_literal(value: &TimeDelta) -> Option<String> {
    let (negative, days, hours, minutes, seconds, micros) = duration_parts(value);
    if negative || days > 0 {
        return None;
    }
    Some(format!("'{hours:02}:{minutes:02}:{seconds:02}.{micros:06}'"))
}

/// ADO.NET style connection string
fn connection_string(desc: &ConnectionDescriptor) -> String {
    let mut parts = Vec::new();
    if let Some(host) = &desc.host {
        pair(&mut parts, "Server", format!("tcp:{host},{}", desc.port()));
    }
    if let Some(database) = &desc.database {
        pair(&mut parts, "Database", database);
    }
    if desc.integrated_security {
        pair(&mut parts, "Integrated Security", "true");
    } else {
        if let Some(user) = &desc.user {
            pair(&mut parts, "User Id", user);
        }
        if let Some(password) = &desc.password {
            pair(&mut parts, "Password", password);
        }
    }
    pair(&mut parts, "Encrypt", desc.encrypt);
    pair(&mut parts, "Pooling", desc.pooling);
    if let Some(timeout) = desc.timeout {
        pair(&mut parts, "Connect Timeout", timeout);
    }
    parts.join(";")
}

pub static TABLE: DialectTable = DialectTable {
    kind: DialectKind::MsSql,
    name: "SQL Server",
    parameter_prefix: '@',
    batch_separator: "GO",
    type_map: TYPE_MAP,
    quote: ('[', ']'),
    identity: IdentityStrategy::PrePostStatement,
    sequences: SequenceStorage::Native,
    lob: LobStrategy::Buffered,
    column_alter: AlterStrategy::Native,
    sequence_alter: AlterStrategy::Native,
    inline_constraints: false,
    schemas: SchemaSupport::Plain,
    procedures: true,
    paging: Paging::OffsetFetch,
    add_column: "ADD",
    auto_increment: " IDENTITY(1,1)",
    last_identity: Some("SELECT SCOPE_IDENTITY()"),
    bool_literals: ("1", "0"),
    text_literal_prefix: "N",
    bytes_literal,
    datetime_literal: quoted_datetime,
    timespan_literal,
    store: keep,
    read_matrix: READ_MATRIX,
    connection_string,
};

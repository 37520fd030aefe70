//! Inline SQL literals

use polydb_core::{Column, Result, Value};

use crate::format::escape_literal;
use crate::marshal::{invalid_cast, write_value};
use crate::table::DialectTable;

/// Render a value as an inline literal in the dialect's syntax
///
/// The value is rendered as-is; use [`column_literal`] to apply the column's
/// storage conversion first. Returns `None` when the dialect has no literal
/// that holds the value exactly: non-finite floats, or spans outside the
/// range of the dialect's interval type.
///
/// # Examples
///
/// ```
/// use polydb_core::Value;
/// use polydb_dialect::{DialectTableExt, literal::literal};
/// use polydb_types::DialectKind;
///
/// let mssql = DialectKind::MsSql.table();
/// assert_eq!(literal(DialectKind::Generic.table(), &Value::from("O'Brien")).unwrap(), "'O''Brien'");
/// assert_eq!(literal(mssql, &Value::from("x")).unwrap(), "N'x'");
/// assert_eq!(literal(mssql, &Value::Bytes(vec![1, 255])).unwrap(), "0x01FF");
/// assert_eq!(literal(mssql, &Value::F64(f64::NAN)), None);
/// ```
#[must_use]
pub fn literal(dialect: &DialectTable, value: &Value) -> Option<String> {
    Some(match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => dialect.bool_literals.0.to_string(),
        Value::Bool(false) => dialect.bool_literals.1.to_string(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F32(v) => float_literal(f64::from(*v))?,
        Value::F64(v) => float_literal(*v)?,
        Value::Decimal(d) => d.to_string(),
        Value::Text(s) => text_literal(dialect, s),
        Value::Bytes(b) => (dialect.bytes_literal)(b),
        Value::DateTime(dt) => (dialect.datetime_literal)(dt),
        Value::TimeSpan(span) => (dialect.timespan_literal)(span)?,
        Value::Enum { discriminant, .. } => discriminant.to_string(),
    })
}

/// Quoted string literal with the dialect's prefix
#[must_use]
pub fn text_literal(dialect: &DialectTable, text: &str) -> String {
    format!("{}'{}'", dialect.text_literal_prefix, escape_literal(text))
}

fn float_literal(v: f64) -> Option<String> {
    v.is_finite().then(|| format!("{v:?}"))
}

/// Literal for a value written into `column`
///
/// # Errors
///
/// [`polydb_core::Fault::InvalidCast`] when the value does not fit the column
/// or has no exact literal in the dialect.
pub fn column_literal(dialect: &DialectTable, column: &Column, value: &Value) -> Result<String> {
    literal(dialect, &write_value(dialect, column, value)?)
        .ok_or_else(|| invalid_cast(column, value.kind()))
}

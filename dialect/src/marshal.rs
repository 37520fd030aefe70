//! Value marshaling between semantic column values and native values
//!
//! Writes only ever widen. Reads accept the declared kind directly and any
//! other native kind only when the dialect's read matrix lists the pair;
//! narrowing is checked and never truncates.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use polydb_core::{Column, Fault, Result, Row, Table, Value};
use polydb_types::{DataType, TypeFamily, ValueKind};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::table::DialectTable;

/// Native parameter ready to bind
#[derive(Debug, Clone, PartialEq)]
pub struct NativeParam {
    /// Placeholder name including the dialect prefix
    pub name: String,
    pub value: Value,
    pub data_type: DataType,
    pub size: u32,
    pub scale: u32,
}

pub(crate) fn invalid_cast(column: &Column, from: ValueKind) -> Fault {
    Fault::InvalidCast {
        column: column.name.clone(),
        from,
        to: column.data_type(),
    }
}

/// Convert a semantic value into the dialect's native storage form
///
/// # Examples
///
/// ```
/// use polydb_core::{Column, Value};
/// use polydb_dialect::{DialectTable, marshal::write_value};
/// use polydb_types::{DataType, DialectKind};
///
/// let flag = Column::new("active", DataType::Bool);
/// let oracle = DialectTable::of(DialectKind::Oracle);
/// assert_eq!(write_value(oracle, &flag, &Value::Bool(true)).unwrap(), Value::I16(1));
/// ```
pub fn write_value(dialect: &DialectTable, column: &Column, value: &Value) -> Result<Value> {
    let declared = column.data_type();
    let widened = match value {
        Value::Null => return Ok(Value::Null),
        Value::Enum { name, discriminant } => match declared.family() {
            TypeFamily::Integer => narrow_int(*discriminant, declared.value_kind()),
            TypeFamily::Text => Some(Value::Text(name.clone())),
            _ => None,
        },
        other => widen(other.clone(), declared.value_kind()),
    }
    .ok_or_else(|| invalid_cast(column, value.kind()))?;

    Ok((dialect.store)(widened))
}

/// [`write_value`] bundled with the parameter name and declared type
pub fn native_param(dialect: &DialectTable, column: &Column, value: &Value) -> Result<NativeParam> {
    Ok(NativeParam {
        name: dialect.parameter(&column.name),
        value: write_value(dialect, column, value)?,
        data_type: column.data_type(),
        size: column.semantic.size,
        scale: column.semantic.scale,
    })
}

/// Convert a native value read from the engine into the column's declared kind
///
/// # Errors
///
/// [`Fault::InvalidCast`] when the pair is outside the dialect's matrix or
/// the value does not fit the declared type.
pub fn read_value(dialect: &DialectTable, column: &Column, native: Value) -> Result<Value> {
    if native.is_null() {
        return Ok(Value::Null);
    }
    let declared = column.data_type();
    let target = declared.value_kind();
    let from = native.kind();
    if from == target {
        return Ok(native);
    }
    if !dialect.can_read(from, declared) {
        return Err(invalid_cast(column, from));
    }
    coerce(native, target).ok_or_else(|| invalid_cast(column, from))
}

/// Apply [`read_value`] to every column of `row` known to `table`
///
/// Columns the table does not declare pass through unchanged.
pub fn read_row(dialect: &DialectTable, table: &Table, row: Row) -> Result<Row> {
    row.iter()
        .map(|(name, value)| {
            let value = match table.find_column(name) {
                Some(column) => read_value(dialect, column, value.clone())?,
                None => value.clone(),
            };
            Ok((name.to_string(), value))
        })
        .collect()
}

const fn int_rank(kind: ValueKind) -> Option<u8> {
    match kind {
        ValueKind::I8 => Some(1),
        ValueKind::I16 => Some(2),
        ValueKind::I32 => Some(3),
        ValueKind::I64 => Some(4),
        _ => None,
    }
}

fn narrow_int(v: i64, target: ValueKind) -> Option<Value> {
    match target {
        ValueKind::I8 => i8::try_from(v).ok().map(Value::I8),
        ValueKind::I16 => i16::try_from(v).ok().map(Value::I16),
        ValueKind::I32 => i32::try_from(v).ok().map(Value::I32),
        ValueKind::I64 => Some(Value::I64(v)),
        _ => None,
    }
}

/// Lossless conversions only
fn widen(value: Value, target: ValueKind) -> Option<Value> {
    let from = value.kind();
    if from == target {
        return Some(value);
    }
    match (int_rank(from), int_rank(target)) {
        (Some(a), Some(b)) if a <= b => return narrow_int(value.as_i64()?, target),
        (Some(_), Some(_)) => return None,
        _ => {}
    }
    match (value, target) {
        (Value::F32(f), ValueKind::F64) => Some(Value::F64(f64::from(f))),
        (v @ (Value::I8(_) | Value::I16(_) | Value::I32(_) | Value::I64(_)), ValueKind::Decimal) => {
            Some(Value::Decimal(Decimal::from(v.as_i64()?)))
        }
        (Value::I8(v), ValueKind::F32) => Some(Value::F32(f32::from(v))),
        (Value::I16(v), ValueKind::F32) => Some(Value::F32(f32::from(v))),
        (Value::I8(v), ValueKind::F64) => Some(Value::F64(f64::from(v))),
        (Value::I16(v), ValueKind::F64) => Some(Value::F64(f64::from(v))),
        (Value::I32(v), ValueKind::F64) => Some(Value::F64(f64::from(v))),
        _ => None,
    }
}

/// Largest integer magnitude exactly representable in an f64 mantissa
const F64_EXACT: u64 = 1 << 53;
const F32_EXACT: u64 = 1 << 24;

/// Checked conversion of a native value into `target`
fn coerce(value: Value, target: ValueKind) -> Option<Value> {
    match (value, target) {
        (Value::Decimal(d), ValueKind::Bool) => {
            if d == Decimal::ONE {
                Some(Value::Bool(true))
            } else if d.is_zero() {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        (v, ValueKind::Bool) => match v.as_i64()? {
            0 => Some(Value::Bool(false)),
            1 => Some(Value::Bool(true)),
            _ => None,
        },
        (Value::Decimal(d), t) if int_rank(t).is_some() => {
            if !d.fract().is_zero() {
                return None;
            }
            narrow_int(d.to_i64()?, t)
        }
        (v, t) if int_rank(t).is_some() && int_rank(v.kind()).is_some() => {
            narrow_int(v.as_i64()?, t)
        }
        (Value::Decimal(d), ValueKind::F64) => d.to_f64().map(Value::F64),
        (Value::Decimal(d), ValueKind::F32) => d.to_f32().map(Value::F32),
        (Value::F64(f), ValueKind::F32) => {
            if f.is_finite() && f.abs() > f64::from(f32::MAX) {
                None
            } else {
                Some(Value::F32(f as f32))
            }
        }
        (Value::F32(f), ValueKind::F64) => Some(Value::F64(f64::from(f))),
        (Value::I64(i), ValueKind::F64) if i.unsigned_abs() <= F64_EXACT => Some(Value::F64(i as f64)),
        (Value::I64(i), ValueKind::F32) if i.unsigned_abs() <= F32_EXACT => Some(Value::F32(i as f32)),
        (v @ (Value::I8(_) | Value::I16(_) | Value::I32(_) | Value::I64(_)), ValueKind::Decimal) => {
            Some(Value::Decimal(Decimal::from(v.as_i64()?)))
        }
        (Value::F64(f), ValueKind::Decimal) => Decimal::try_from(f).ok().map(Value::Decimal),
        (Value::Text(s), ValueKind::Decimal) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
                .map(Value::Decimal)
        }
        (Value::Text(s), ValueKind::DateTime) => parse_datetime(&s).map(Value::DateTime),
        (Value::I64(micros), ValueKind::TimeSpan) => {
            Some(Value::TimeSpan(TimeDelta::microseconds(micros)))
        }
        _ => None,
    }
}

/// Parse the datetime text forms engines and drivers produce
#[must_use]
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DialectTableExt;
    use polydb_types::{DialectKind, SemanticType};

    fn col(data_type: DataType) -> Column {
        Column::new("c", data_type)
    }

    #[test]
    fn test_write_widens_never_narrows() {
        let generic = DialectKind::Generic.table();
        assert_eq!(
            write_value(generic, &col(DataType::BigInt), &Value::I16(7)).unwrap(),
            Value::I64(7)
        );
        assert_eq!(
            write_value(generic, &col(DataType::Double), &Value::F32(0.5)).unwrap(),
            Value::F64(0.5)
        );
        let err = write_value(generic, &col(DataType::ShortInt), &Value::I64(7)).unwrap_err();
        assert!(err.is_coercion());
    }

    #[test]
    fn test_write_enum_as_integer() {
        let generic = DialectKind::Generic.table();
        let status = Value::Enum {
            name: "Shipped".into(),
            discriminant: 3,
        };
        assert_eq!(
            write_value(generic, &col(DataType::TinyInt).enumeration(), &status).unwrap(),
            Value::I8(3)
        );
        assert_eq!(
            write_value(generic, &col(DataType::String), &status).unwrap(),
            Value::Text("Shipped".into())
        );
        let big = Value::Enum {
            name: "Huge".into(),
            discriminant: 1_000,
        };
        assert!(write_value(generic, &col(DataType::TinyInt), &big).is_err());
    }

    #[test]
    fn test_write_null_passes_through() {
        let sqlite = DialectKind::Sqlite.table();
        assert_eq!(
            write_value(sqlite, &col(DataType::Decimal), &Value::Null).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_native_param_carries_size() {
        let column = Column::new("price", SemanticType::decimal(10, 2));
        let param = native_param(
            DialectKind::PostgreSql.table(),
            &column,
            &Value::Decimal(Decimal::new(1250, 2)),
        )
        .unwrap();
        assert_eq!(param.name, ":price");
        assert_eq!((param.size, param.scale), (10, 2));
        assert_eq!(param.data_type, DataType::Decimal);
    }

    #[test]
    fn test_read_checked_narrowing() {
        let generic = DialectKind::Generic.table();
        assert_eq!(
            read_value(generic, &col(DataType::TinyInt), Value::I16(100)).unwrap(),
            Value::I8(100)
        );
        let err = read_value(generic, &col(DataType::TinyInt), Value::I16(300)).unwrap_err();
        assert!(matches!(
            err,
            Fault::InvalidCast {
                from: ValueKind::I16,
                to: DataType::TinyInt,
                ..
            }
        ));
    }

    #[test]
    fn test_read_outside_matrix_fails() {
        // generic does not allow short -> bool
        let generic = DialectKind::Generic.table();
        assert!(read_value(generic, &col(DataType::Bool), Value::I16(1)).is_err());
        // oracle does
        let oracle = DialectKind::Oracle.table();
        assert_eq!(
            read_value(oracle, &col(DataType::Bool), Value::I16(1)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_read_sqlite_storage_classes() {
        let sqlite = DialectKind::Sqlite.table();
        assert_eq!(
            read_value(sqlite, &col(DataType::Decimal), Value::Text("19.99".into())).unwrap(),
            Value::Decimal(Decimal::new(1999, 2))
        );
        assert_eq!(
            read_value(sqlite, &col(DataType::TimeSpan), Value::I64(2_000_000)).unwrap(),
            Value::TimeSpan(TimeDelta::seconds(2))
        );
        let dt = read_value(
            sqlite,
            &col(DataType::DateTime),
            Value::Text("2024-03-01 08:30:00.5".into()),
        )
        .unwrap();
        assert_eq!(
            dt,
            Value::DateTime(parse_datetime("2024-03-01T08:30:00.500").unwrap())
        );
        assert!(read_value(sqlite, &col(DataType::Int), Value::Text("1".into())).is_err());
    }

    #[test]
    fn test_read_oracle_numbers() {
        let oracle = DialectKind::Oracle.table();
        assert_eq!(
            read_value(oracle, &col(DataType::Int), Value::Decimal(Decimal::from(42))).unwrap(),
            Value::I32(42)
        );
        assert!(
            read_value(oracle, &col(DataType::Int), Value::Decimal(Decimal::new(425, 1))).is_err()
        );
    }

    #[test]
    fn test_read_row() {
        let table = Table::new("t")
            .column(Column::new("id", DataType::Int))
            .column(Column::new("flag", DataType::Bool));
        let row = Row::new()
            .with("id", 5_i64)
            .with("flag", 0_i64)
            .with("extra", "x");
        let read = read_row(DialectKind::Sqlite.table(), &table, row).unwrap();
        assert_eq!(read.get("id"), Some(&Value::I32(5)));
        assert_eq!(read.get("flag"), Some(&Value::Bool(false)));
        assert_eq!(read.get("extra"), Some(&Value::Text("x".into())));
    }
}

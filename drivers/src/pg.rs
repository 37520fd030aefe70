//! PostgreSQL value conversions shared by the sync and async drivers
//!
//! [`PgParam`] accepts every server type and converts on the fly, so a
//! value marshaled for one column type still binds when the server infers a
//! wider one (an `I64` parameter into an `oid` argument, `I32` into
//! `numeric`). Narrowing conversions are checked.

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use polydb_core::{Fault, Result, Row, Value};
use postgres_types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

#[cfg(feature = "postgres-sync")]
use postgres::Row as PgRow;
#[cfg(all(feature = "tokio-postgres", not(feature = "postgres-sync")))]
use tokio_postgres::Row as PgRow;

use crate::connection::Param;
use crate::params::{bind, rewrite_named};

type BoxError = Box<dyn std::error::Error + Sync + Send>;

const MICROS_PER_DAY: i64 = 86_400_000_000;

//------------------------------------------------------------------------------
// Parameters
//------------------------------------------------------------------------------

/// Owned [`Value`] bound as a PostgreSQL parameter
#[derive(Debug, Clone, PartialEq)]
pub struct PgParam(pub Value);

impl ToSql for PgParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match &self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            Value::Bool(b) => int_to_sql(i64::from(*b), ty, out),
            Value::I8(v) => int_to_sql(i64::from(*v), ty, out),
            Value::I16(v) => int_to_sql(i64::from(*v), ty, out),
            Value::I32(v) => int_to_sql(i64::from(*v), ty, out),
            Value::I64(v) => int_to_sql(*v, ty, out),
            Value::Enum { discriminant, .. } => int_to_sql(*discriminant, ty, out),
            Value::F32(f) => match *ty {
                Type::FLOAT8 => f64::from(*f).to_sql(ty, out),
                Type::NUMERIC => decimal_from_f64(f64::from(*f))?.to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::F64(f) => match *ty {
                Type::NUMERIC => decimal_from_f64(*f)?.to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Decimal(d) => match *ty {
                Type::FLOAT8 => d
                    .to_f64()
                    .ok_or_else(|| BoxError::from(format!("{d} does not fit float8")))?
                    .to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => d.to_string().to_sql(ty, out),
                _ => d.to_sql(ty, out),
            },
            Value::Text(s) => s.as_str().to_sql(ty, out),
            Value::Bytes(b) => b.as_slice().to_sql(ty, out),
            Value::DateTime(dt) => match *ty {
                Type::TIMESTAMPTZ => {
                    DateTime::<Utc>::from_naive_utc_and_offset(*dt, Utc).to_sql(ty, out)
                }
                Type::DATE => dt.date().to_sql(ty, out),
                _ => dt.to_sql(ty, out),
            },
            Value::TimeSpan(span) => match *ty {
                Type::INT8 => micros(span)?.to_sql(ty, out),
                _ => {
                    // interval: microseconds, days, months
                    out.put_i64(micros(span)?);
                    out.put_i32(0);
                    out.put_i32(0);
                    Ok(IsNull::No)
                }
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn int_to_sql(v: i64, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => (v != 0).to_sql(ty, out),
        Type::CHAR => i8::try_from(v)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::NUMERIC => Decimal::from(v).to_sql(ty, out),
        Type::TEXT | Type::VARCHAR => v.to_string().to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

fn decimal_from_f64(f: f64) -> std::result::Result<Decimal, BoxError> {
    Decimal::from_f64(f).ok_or_else(|| format!("{f} does not fit numeric").into())
}

fn micros(span: &TimeDelta) -> std::result::Result<i64, BoxError> {
    span.num_microseconds()
        .ok_or_else(|| "interval out of range".into())
}

/// Rewrite `:name` placeholders to `$n` and collect the matching parameters
pub fn positional(sql: &str, prefix: char, params: &[Param<'_>]) -> Result<(String, Vec<PgParam>)> {
    let (sql, names) = rewrite_named(sql, prefix);
    let values = bind(&names, params)?
        .into_iter()
        .map(|value| PgParam(value.clone()))
        .collect();
    Ok((sql, values))
}

//------------------------------------------------------------------------------
// Results
//------------------------------------------------------------------------------

/// `interval` read as a [`TimeDelta`]; a month counts as 30 days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgInterval(pub TimeDelta);

impl<'a> FromSql<'a> for PgInterval {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        let raw: &[u8; 16] = raw
            .try_into()
            .map_err(|_| "invalid interval message length")?;
        let micros = i64::from_be_bytes([
            raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
        ]);
        let days = i32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]);
        let months = i32::from_be_bytes([raw[12], raw[13], raw[14], raw[15]]);

        let total = (i64::from(months) * 30 + i64::from(days))
            .checked_mul(MICROS_PER_DAY)
            .and_then(|day_micros| day_micros.checked_add(micros))
            .ok_or("interval out of range")?;
        Ok(PgInterval(TimeDelta::microseconds(total)))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::INTERVAL
    }
}

fn get<'r, T: FromSql<'r>>(row: &'r PgRow, index: usize) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(index).map_err(Fault::engine)
}

/// Native [`Value`] of one column, chosen by the column's server type
fn decode(row: &PgRow, index: usize, ty: &Type) -> Result<Value> {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, index)?.map(Value::Bool),
        Type::CHAR => get::<i8>(row, index)?.map(Value::I8),
        Type::INT2 => get::<i16>(row, index)?.map(Value::I16),
        Type::INT4 => get::<i32>(row, index)?.map(Value::I32),
        Type::INT8 => get::<i64>(row, index)?.map(Value::I64),
        Type::OID => get::<u32>(row, index)?.map(|v| Value::I64(i64::from(v))),
        Type::FLOAT4 => get::<f32>(row, index)?.map(Value::F32),
        Type::FLOAT8 => get::<f64>(row, index)?.map(Value::F64),
        Type::NUMERIC => get::<Decimal>(row, index)?.map(Value::Decimal),
        Type::BYTEA => get::<Vec<u8>>(row, index)?.map(Value::Bytes),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index)?.map(Value::DateTime),
        Type::TIMESTAMPTZ => {
            get::<DateTime<Utc>>(row, index)?.map(|v| Value::DateTime(v.naive_utc()))
        }
        Type::DATE => {
            get::<NaiveDate>(row, index)?.map(|d| Value::DateTime(d.and_time(NaiveTime::MIN)))
        }
        Type::TIME => get::<NaiveTime>(row, index)?
            .map(|t| Value::TimeSpan(t.signed_duration_since(NaiveTime::MIN))),
        Type::INTERVAL => get::<PgInterval>(row, index)?.map(|i| Value::TimeSpan(i.0)),
        _ => get::<String>(row, index)?.map(Value::Text),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Every column of a result row
pub fn row_values(row: &PgRow) -> Result<Row> {
    let mut values = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        values.set(column.name(), decode(row, index, column.type_())?);
    }
    Ok(values)
}

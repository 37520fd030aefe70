//! SQLite through [`rusqlite`]
//!
//! Values cross the boundary in SQLite's four storage classes. Anything else
//! is first brought into storage form by the dialect's `store` rule, so a
//! raw [`Value::DateTime`] binds the same text a marshaled one would.

use polydb_core::{Fault, Result, Row, Value, polydb_trace_sql, polydb_trace_tx};
use polydb_dialect::DialectTableExt;
use polydb_types::DialectKind;
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Statement, ToSql};

use crate::connection::{Connection, Param};

/// Borrowed [`Value`] bound as a rusqlite parameter
#[derive(Debug, Clone, Copy)]
pub struct SqliteParam<'a>(pub &'a Value);

impl ToSql for SqliteParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::I64(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::F64(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Enum { discriminant, .. } => {
                ToSqlOutput::Owned(rusqlite::types::Value::Integer(*discriminant))
            }
            other => ToSqlOutput::Owned(storage_class((DialectKind::Sqlite.table().store)(
                other.clone(),
            ))),
        })
    }
}

fn storage_class(value: Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(i64::from(b)),
        Value::I8(i) => rusqlite::types::Value::Integer(i64::from(i)),
        Value::I16(i) => rusqlite::types::Value::Integer(i64::from(i)),
        Value::I32(i) => rusqlite::types::Value::Integer(i64::from(i)),
        Value::I64(i) => rusqlite::types::Value::Integer(i),
        Value::F32(f) => rusqlite::types::Value::Real(f64::from(f)),
        Value::F64(f) => rusqlite::types::Value::Real(f),
        Value::Enum { discriminant, .. } => rusqlite::types::Value::Integer(discriminant),
        Value::Bytes(b) => rusqlite::types::Value::Blob(b),
        Value::Text(s) => rusqlite::types::Value::Text(s),
        other => rusqlite::types::Value::Text(format!("{other:?}")),
    }
}

/// Native value read from a rusqlite row
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteValue(pub Value);

impl FromSql for SqliteValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(SqliteValue(value_from_ref(value)))
    }
}

/// Storage class to [`Value`]: INTEGER is `I64`, REAL is `F64`
#[must_use]
pub fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::I64(i),
        ValueRef::Real(r) => Value::F64(r),
        ValueRef::Text(items) => Value::Text(String::from_utf8_lossy(items).into_owned()),
        ValueRef::Blob(items) => Value::Bytes(items.to_vec()),
    }
}

/// Parameters the statement declares, under the name it declares them with
fn named_params<'p>(
    stmt: &Statement<'_>,
    params: &'p [Param<'_>],
) -> Result<Vec<(String, SqliteParam<'p>)>> {
    let mut bound = Vec::with_capacity(params.len());
    for (name, value) in params {
        let bare = crate::params::strip_prefix(name);
        for prefix in ['@', ':', '$'] {
            let candidate = format!("{prefix}{bare}");
            if stmt
                .parameter_index(&candidate)
                .map_err(Fault::engine)?
                .is_some()
            {
                bound.push((candidate, SqliteParam(value)));
                break;
            }
        }
    }
    Ok(bound)
}

fn as_refs<'a>(bound: &'a [(String, SqliteParam<'_>)]) -> Vec<(&'a str, &'a dyn ToSql)> {
    bound
        .iter()
        .map(|(name, value)| (name.as_str(), value as &dyn ToSql))
        .collect()
}

impl Connection for rusqlite::Connection {
    fn dialect(&self) -> DialectKind {
        DialectKind::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &[Param<'_>]) -> Result<u64> {
        polydb_trace_sql!(sql, params.len());
        let mut stmt = self.prepare(sql).map_err(Fault::engine)?;
        let bound = named_params(&stmt, params)?;
        let affected = stmt
            .execute(as_refs(&bound).as_slice())
            .map_err(Fault::engine)?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>> {
        polydb_trace_sql!(sql, params.len());
        let mut stmt = self.prepare(sql).map_err(Fault::engine)?;
        let bound = named_params(&stmt, params)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt
            .query(as_refs(&bound).as_slice())
            .map_err(Fault::engine)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(Fault::engine)? {
            let mut values = Row::new();
            for (index, name) in columns.iter().enumerate() {
                let value = row.get_ref(index).map_err(Fault::engine)?;
                values.set(name.clone(), value_from_ref(value));
            }
            out.push(values);
        }
        Ok(out)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        polydb_trace_sql!(sql, 0);
        rusqlite::Connection::execute_batch(self, sql).map_err(Fault::engine)
    }

    fn begin(&mut self) -> Result<()> {
        polydb_trace_tx!("begin", "sqlite.rusqlite");
        rusqlite::Connection::execute_batch(self, "BEGIN").map_err(Fault::engine)
    }

    fn commit(&mut self) -> Result<()> {
        polydb_trace_tx!("commit", "sqlite.rusqlite");
        rusqlite::Connection::execute_batch(self, "COMMIT").map_err(Fault::engine)
    }

    fn rollback(&mut self) -> Result<()> {
        polydb_trace_tx!("rollback", "sqlite.rusqlite");
        rusqlite::Connection::execute_batch(self, "ROLLBACK").map_err(Fault::engine)
    }
}

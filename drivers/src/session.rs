//! Generated SQL executed against a live connection
//!
//! These helpers pair the generators in `polydb_dialect` with a
//! [`Connection`]: scripts run statement by statement, best-effort drops log
//! and continue, and inserts execute the dialect's identity strategy and
//! report the new key.

use polydb_core::{Fault, Result, Row, Schema, Sequence, Table, Value, polydb_trace_skip};
use polydb_dialect::{
    DdlGenerator, DdlOp, DdlScript, DialectTable, DialectTableExt, DmlGenerator, IdentityStrategy,
    InsertPlan, KeySource, Values, read_row, read_value, write_value,
};

use crate::connection::{Connection, Param};

// =============================================================================
// Scripts
// =============================================================================

/// Execute every statement of a script in order, stopping at the first error
pub fn run_script<C: Connection>(conn: &mut C, script: &DdlScript) -> Result<()> {
    for statement in script.iter() {
        conn.execute_batch(statement)?;
    }
    Ok(())
}

/// Execute statements, logging and skipping the ones that fail
///
/// Returns the number of skipped statements.
pub fn run_best_effort<'s, C, I>(conn: &mut C, statements: I) -> usize
where
    C: Connection,
    I: IntoIterator<Item = &'s str>,
{
    let mut skipped = 0;
    for statement in statements {
        if let Err(_err) = conn.execute_batch(statement) {
            polydb_trace_skip!(statement, _err);
            skipped += 1;
        }
    }
    skipped
}

/// Drop every object of a schema, skipping what does not exist
///
/// Objects the dialect cannot express are left out of the script; engine
/// failures are logged and skipped.
pub fn drop_schema<C: Connection>(conn: &mut C, schema: &Schema) -> Result<usize> {
    let script = DdlGenerator::new(conn.dialect()).schema(DdlOp::Drop, schema)?;
    Ok(run_best_effort(conn, script.iter()))
}

/// Drop one table, skipping it when it does not exist
pub fn drop_table<C: Connection>(conn: &mut C, table: &Table) -> Result<usize> {
    let script = DdlGenerator::new(conn.dialect()).table(
        DdlOp::Drop,
        table,
        polydb_dialect::TableOptions::ALL,
    )?;
    Ok(run_best_effort(conn, script.iter()))
}

/// Drop a database before recreating it
///
/// A missing database is not an error. Dialects without `DROP DATABASE`
/// fail with [`Fault::Unsupported`].
pub fn drop_database<C: Connection>(conn: &mut C, name: &str) -> Result<usize> {
    let script = DdlGenerator::new(conn.dialect()).database(DdlOp::Drop, name)?;
    Ok(run_best_effort(conn, script.iter()))
}

// =============================================================================
// Rows
// =============================================================================

fn find_table<'s>(schema: &'s Schema, name: &str) -> Result<&'s Table> {
    schema
        .find_table(name)
        .ok_or_else(|| Fault::Config(format!("unknown table {name}")))
}

/// Marshaled values for the named columns of `row`
fn bind_row<'n>(
    dialect: &DialectTable,
    table: &Table,
    names: impl IntoIterator<Item = &'n str>,
    row: &Row,
) -> Result<Vec<Param<'n>>> {
    names
        .into_iter()
        .filter_map(|name| table.find_column(name).map(|column| (name, column)))
        .map(|(name, column)| {
            let value = row.get(name).unwrap_or(&Value::Null);
            Ok((name, write_value(dialect, column, value)?))
        })
        .collect()
}

fn dml(dialect: &DialectTable, namespace: Option<&str>) -> DmlGenerator {
    let dml = DmlGenerator::new(dialect.kind);
    match namespace {
        Some(ns) => dml.in_schema(ns),
        None => dml,
    }
}

fn run_plan<C: Connection>(conn: &mut C, plan: &InsertPlan, params: &[Param<'_>]) -> Result<Value> {
    if plan.strategy == Some(IdentityStrategy::PrePostStatement) {
        // session variables only live for one batch
        return conn.scalar(&plan.to_sql(), params);
    }

    for pre in &plan.pre {
        conn.execute(pre, &[])?;
    }
    match (&plan.post, &plan.returning) {
        (Some(post), _) => {
            conn.execute(&plan.statement, params)?;
            conn.scalar(post, &[])
        }
        (None, Some(_)) => conn.scalar(&plan.statement, params),
        (None, None) => {
            conn.execute(&plan.statement, params)?;
            Ok(Value::Null)
        }
    }
}

/// Insert one row and return its primary key
///
/// A non-null key in `row` is used as is unless the column is engine
/// generated. Otherwise the dialect's identity strategy produces one and the
/// schema's sequence mirror is bumped to the issued value. Returns `None`
/// when the table has no key or the engine does not report it.
pub fn insert<C: Connection>(
    conn: &mut C,
    schema: &mut Schema,
    table: &str,
    row: &Row,
) -> Result<Option<Value>> {
    let dialect = conn.dialect().table();
    let table = find_table(schema, table)?.clone();
    let key_column = table.primary_key();

    let key_source = match key_column
        .filter(|k| !k.auto_increment)
        .and_then(|k| row.get(&k.name))
    {
        Some(value) if !value.is_null() => KeySource::Literal(value.clone()),
        _ => KeySource::Strategy,
    };
    let plan = dml(dialect, schema.namespace())
        .sequences(&schema.sequences)
        .insert_with_key(&table, Values::Parameters, key_source.clone())?;
    let params = bind_row(dialect, &table, plan.parameters.iter().map(String::as_str), row)?;

    let raw = conn
        .transaction(|conn| run_plan(conn, &plan, &params))
        .map_err(|err| err.with_display_names(schema))?;

    let Some(key_column) = key_column else {
        return Ok(None);
    };
    let key = match key_source {
        KeySource::Literal(value) => value,
        KeySource::Strategy => read_value(dialect, key_column, raw)?,
    };
    if key.is_null() {
        return Ok(None);
    }

    if plan.strategy.is_some()
        && let Some(issued) = key.as_i64()
        && let Some(sequence) = schema.find_sequence_mut(&DmlGenerator::sequence_name(&table))
    {
        sequence.observe(issued);
    }
    Ok(Some(key))
}

/// Update one row by primary key; returns the affected row count
///
/// Only columns present in `row` are changed.
pub fn update<C: Connection>(conn: &mut C, schema: &Schema, table: &str, row: &Row) -> Result<u64> {
    let dialect = conn.dialect().table();
    let table = find_table(schema, table)?;
    let Some(sql) = DmlGenerator::new(dialect.kind).update(table, Values::Literals(row))? else {
        return Ok(0);
    };
    conn.execute(&sql, &[])
        .map_err(|err| err.with_display_names(schema))
}

/// Delete one row by primary key; returns the affected row count
pub fn delete<C: Connection>(conn: &mut C, schema: &Schema, table: &str, key: &Value) -> Result<u64> {
    let dialect = conn.dialect().table();
    let table = find_table(schema, table)?;
    let key_column = table.primary_key().ok_or_else(|| Fault::MissingPrimaryKey {
        table: table.name.clone(),
    })?;
    let sql = DmlGenerator::new(dialect.kind).delete(table, Values::Parameters)?;
    let params = [(key_column.name.as_str(), write_value(dialect, key_column, key)?)];
    conn.execute(&sql, &params)
        .map_err(|err| err.with_display_names(schema))
}

/// Every row of a table, converted to the declared column types
pub fn load_rows<C: Connection>(conn: &mut C, table: &Table) -> Result<Vec<Row>> {
    let dialect = conn.dialect().table();
    let sql = DmlGenerator::new(dialect.kind).select(table);
    conn.query(&sql, &[])?
        .into_iter()
        .map(|row| read_row(dialect, table, row))
        .collect()
}

/// One row by primary key, converted to the declared column types
pub fn load_row<C: Connection>(conn: &mut C, table: &Table, key: &Value) -> Result<Option<Row>> {
    let dialect = conn.dialect().table();
    let key_column = table.primary_key().ok_or_else(|| Fault::MissingPrimaryKey {
        table: table.name.clone(),
    })?;
    let sql = DmlGenerator::new(dialect.kind).select_by_key(table)?;
    let params = [(key_column.name.as_str(), write_value(dialect, key_column, key)?)];
    conn.query(&sql, &params)?
        .into_iter()
        .next()
        .map(|row| read_row(dialect, table, row))
        .transpose()
}

// =============================================================================
// Sequences
// =============================================================================

/// Draw the next value of a sequence and record it in the mirror
///
/// `namespace` is the schema the sequence was created in, as passed to
/// [`Schema::namespace`].
pub fn next_sequence_value<C: Connection>(
    conn: &mut C,
    namespace: Option<&str>,
    sequence: &mut Sequence,
) -> Result<i64> {
    let statements = dml(conn.dialect().table(), namespace).next_value(sequence);
    let value = conn.transaction(|conn| {
        let Some((read, updates)) = statements.split_last() else {
            return Ok(Value::Null);
        };
        for update in updates {
            conn.execute(update, &[])?;
        }
        conn.scalar(read, &[])
    })?;

    let issued = match &value {
        Value::Decimal(d) => rust_decimal::prelude::ToPrimitive::to_i64(d),
        other => other.as_i64(),
    }
    .ok_or_else(|| {
        Fault::engine_message(format!(
            "sequence {} returned {value:?} instead of an integer",
            sequence.name
        ))
    })?;
    sequence.observe(issued);
    Ok(issued)
}

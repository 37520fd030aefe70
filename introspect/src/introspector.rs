//! Running the metadata queries against a live connection

use std::collections::HashMap;

use polydb_core::{Fault, Result, Row, Value, polydb_trace_sql};
use polydb_dialect::{DialectTable, DialectTableExt};
use polydb_drivers::Connection;
use polydb_types::{ColumnInfo, DialectKind};
use rust_decimal::prelude::ToPrimitive;

use crate::info::{ConstraintType, IndexInfo, SequenceInfo, TableInfo};
use crate::queries::{self, Queries};

// =============================================================================
// Row access
// =============================================================================

fn text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::Text(s) => Some(s.clone()),
        Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        other => integer(other).map(|v| v.to_string()),
    }
}

fn required(row: &Row, column: &str) -> Result<String> {
    text(row, column).ok_or_else(|| {
        Fault::engine_message(format!("metadata row has no value for {column}"))
    })
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Decimal(d) => d.to_i64(),
        Value::Text(s) => s.trim().parse().ok(),
        other => other.as_i64(),
    }
}

fn int(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(integer)
}

/// Precision and scale only describe exact numerics; engines also report a
/// binary precision for integers and floats
fn is_exact_numeric(native_type: &str) -> bool {
    let upper = native_type.to_ascii_uppercase();
    ["NUMERIC", "DECIMAL", "NUMBER", "MONEY"]
        .iter()
        .any(|name| upper.starts_with(name))
}

fn column_info(row: &Row) -> Result<ColumnInfo> {
    let mut info = ColumnInfo::new(required(row, "column_name")?, required(row, "data_type")?);
    if let Some(length) = int(row, "max_length") {
        info = info.length(length);
    }
    if is_exact_numeric(&info.native_type)
        && let Some(precision) = int(row, "numeric_precision").and_then(|p| u32::try_from(p).ok())
    {
        let scale = int(row, "numeric_scale")
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(0);
        info = info.precision(precision, scale);
    }
    if text(row, "is_nullable").is_some_and(|n| n.eq_ignore_ascii_case("NO")) {
        info = info.not_null();
    }
    if let Some(default) = text(row, "column_default") {
        let default = default.trim();
        if !default.is_empty() && !default.eq_ignore_ascii_case("NULL") {
            info = info.default_text(default);
        }
    }
    Ok(info)
}

// =============================================================================
// Introspector
// =============================================================================

/// Reads tables, columns, constraints and sequences from a database
///
/// # Examples
///
/// ```
/// use polydb_core::ConnectionDescriptor;
/// use polydb_drivers::{Connection, open_sqlite};
/// use polydb_introspect::Introspector;
///
/// let mut conn = open_sqlite(&ConnectionDescriptor::sqlite_memory()).unwrap();
/// conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY, body VARCHAR(200))").unwrap();
///
/// let tables = Introspector::new(&mut conn).tables().unwrap();
/// assert_eq!(tables[0].name, "notes");
/// assert_eq!(tables[0].primary_key(), ["id"]);
/// ```
pub struct Introspector<'c, C: Connection> {
    conn: &'c mut C,
    dialect: &'static DialectTable,
    schema: Option<String>,
}

impl<'c, C: Connection> Introspector<'c, C> {
    pub fn new(conn: &'c mut C) -> Self {
        let dialect = conn.dialect().table();
        Self {
            conn,
            dialect,
            schema: None,
        }
    }

    /// Restrict introspection to one namespace
    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn dialect(&self) -> DialectKind {
        self.dialect.kind
    }

    fn queries(&self) -> Queries {
        queries::for_dialect(self.dialect, self.schema.as_deref())
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        polydb_trace_sql!(sql, 0);
        self.conn.query(sql, &[])
    }

    /// Every table and view with its columns, keys, foreign keys, checks and
    /// indexes, ordered by namespace and name
    pub fn tables(&mut self) -> Result<Vec<TableInfo>> {
        let queries = self.queries();
        let mut tables = Vec::new();
        let mut positions: HashMap<(Option<String>, String), usize> = HashMap::new();

        for row in self.query(&queries.tables)? {
            let schema = text(&row, "table_schema");
            let name = required(&row, "table_name")?;
            let mut info = TableInfo::new(schema.clone(), name.clone());
            info.is_view = text(&row, "table_type").is_some_and(|t| t.eq_ignore_ascii_case("VIEW"));
            if let Some(definition) = text(&row, "definition") {
                info.identity = autoincrement_column(&definition);
            }
            positions.insert((schema, name), tables.len());
            tables.push(info);
        }

        let lookup = |row: &Row| -> Result<Option<usize>> {
            let key = (text(row, "table_schema"), required(row, "table_name")?);
            Ok(positions.get(&key).copied())
        };

        for row in self.query(&queries.columns)? {
            let Some(at) = lookup(&row)? else { continue };
            let column = column_info(&row)?;
            let table = &mut tables[at];
            if table.identity.is_none()
                && column
                    .default_text
                    .as_deref()
                    .is_some_and(|d| d.to_ascii_lowercase().starts_with("nextval("))
            {
                table.identity = Some(column.name.clone());
            }
            table.columns.push(column);
        }

        for row in self.query(&queries.keys)? {
            let Some(at) = lookup(&row)? else { continue };
            let Some(kind) = text(&row, "constraint_type")
                .as_deref()
                .and_then(ConstraintType::from_metadata)
            else {
                continue;
            };
            tables[at].push_constraint_column(
                &required(&row, "constraint_name")?,
                || kind,
                required(&row, "column_name")?,
            );
        }

        for row in self.query(&queries.foreign_keys)? {
            let Some(at) = lookup(&row)? else { continue };
            let references = required(&row, "references_table")?;
            let references_column = text(&row, "references_column");
            let constraint = tables[at].push_constraint_column(
                &required(&row, "constraint_name")?,
                || ConstraintType::ForeignKey {
                    references_schema: text(&row, "references_schema"),
                    references,
                    references_columns: Vec::new(),
                    on_delete: text(&row, "delete_rule").filter(|rule| is_action(rule)),
                },
                required(&row, "column_name")?,
            );
            if let (ConstraintType::ForeignKey { references_columns, .. }, Some(column)) =
                (&mut constraint.kind, references_column)
            {
                references_columns.push(column);
            }
        }

        if let Some(sql) = &queries.checks {
            for row in self.query(sql)? {
                let Some(at) = lookup(&row)? else { continue };
                let clause = required(&row, "check_clause")?;
                tables[at].constraints.push(crate::info::ConstraintInfo {
                    name: required(&row, "constraint_name")?,
                    kind: ConstraintType::Check(clause),
                    columns: Vec::new(),
                });
            }
        }

        if let Some(sql) = &queries.indexes {
            for row in self.query(sql)? {
                let Some(at) = lookup(&row)? else { continue };
                let name = required(&row, "index_name")?;
                let column = required(&row, "column_name")?;
                let indexes = &mut tables[at].indexes;
                match indexes.iter_mut().find(|i| i.name == name) {
                    Some(index) => index.columns.push(column),
                    None => indexes.push(IndexInfo {
                        name,
                        columns: vec![column],
                        unique: int(&row, "is_unique").is_some_and(|u| u != 0),
                    }),
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(tables = tables.len(), dialect = %self.dialect.kind, "polydb.introspect");

        Ok(tables)
    }

    /// One table by name, compared case-insensitively
    pub fn table(&mut self, name: &str) -> Result<Option<TableInfo>> {
        Ok(self
            .tables()?
            .into_iter()
            .find(|t| t.name.eq_ignore_ascii_case(name)))
    }

    /// Sequences, or counter-table rows on engines without sequence objects
    pub fn sequences(&mut self) -> Result<Vec<SequenceInfo>> {
        let Some(sql) = self.queries().sequences else {
            return Ok(Vec::new());
        };
        if self.dialect.kind == DialectKind::Sqlite {
            let exists = self.conn.scalar(&queries::sqlite::counter_table_exists(), &[])?;
            if integer(&exists).unwrap_or(0) == 0 {
                return Ok(Vec::new());
            }
        }

        self.query(&sql)?
            .iter()
            .map(|row| {
                Ok(SequenceInfo {
                    schema: text(row, "table_schema"),
                    name: required(row, "sequence_name")?,
                    increment: int(row, "increment").unwrap_or(1),
                    current: int(row, "current_value"),
                    start: int(row, "start_value"),
                })
            })
            .collect()
    }
}

/// Referential actions other than the default
fn is_action(rule: &str) -> bool {
    !matches!(
        rule.trim().to_ascii_uppercase().as_str(),
        "" | "NO ACTION" | "RESTRICT"
    )
}

/// Column declared `AUTOINCREMENT` in a SQLite table definition
fn autoincrement_column(definition: &str) -> Option<String> {
    let upper = definition.to_ascii_uppercase();
    let end = upper.find("AUTOINCREMENT")?;
    let start = upper[..end].rfind(['(', ','])? + 1;
    definition[start..end]
        .split_whitespace()
        .next()
        .map(|name| name.trim_matches(['"', '`', '[', ']']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autoincrement_column() {
        assert_eq!(
            autoincrement_column(
                "CREATE TABLE db_lob (\n\tid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,\n\tdata BLOB\n)"
            ),
            Some("id".to_string())
        );
        assert_eq!(
            autoincrement_column("CREATE TABLE t (a TEXT, \"Key\" INTEGER PRIMARY KEY AUTOINCREMENT)"),
            Some("Key".to_string())
        );
        assert_eq!(autoincrement_column("CREATE TABLE t (id INTEGER)"), None);
    }

    #[test]
    fn test_column_info_ignores_binary_precision() {
        let row = Row::new()
            .with("column_name", "qty")
            .with("data_type", "integer")
            .with("numeric_precision", 32i32)
            .with("numeric_scale", 0i32)
            .with("is_nullable", "NO");
        let info = column_info(&row).unwrap();
        assert_eq!(info.precision, None);
        assert!(info.not_null);
    }

    #[test]
    fn test_column_info_keeps_decimal_precision() {
        let row = Row::new()
            .with("column_name", "total")
            .with("data_type", "numeric")
            .with("numeric_precision", Value::Decimal(10.into()))
            .with("numeric_scale", "2")
            .with("is_nullable", "YES")
            .with("column_default", "NULL");
        let info = column_info(&row).unwrap();
        assert_eq!((info.precision, info.scale), (Some(10), Some(2)));
        assert_eq!(info.default_text, None);
    }
}

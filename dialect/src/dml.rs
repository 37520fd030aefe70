//! DML generation
//!
//! Insert, update, delete and select statements for one dialect, with the
//! dialect's identity strategy resolving the primary key of new rows.

use polydb_core::{Column, Fault, Result, Row, Sequence, Table, Value};
use polydb_types::DialectKind;

use crate::format::escape_literal;
use crate::literal::column_literal;
use crate::table::{DialectTable, DialectTableExt, IdentityStrategy, Paging, SEQUENCE_TABLE};

/// Where column values come from
#[derive(Debug, Clone, Copy)]
pub enum Values<'a> {
    /// Named parameters with the dialect prefix
    Parameters,
    /// Inline literals from a row
    Literals(&'a Row),
}

/// How the key of a new row is obtained
#[derive(Debug, Clone, Default, PartialEq)]
pub enum KeySource {
    /// The dialect's identity strategy
    #[default]
    Strategy,
    /// A key already acquired by the caller
    Literal(Value),
}

/// Statements that insert one row and report its key
///
/// `pre` runs before `statement`, `post` (when present) returns the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    pub strategy: Option<IdentityStrategy>,
    pub pre: Vec<String>,
    pub statement: String,
    pub post: Option<String>,
    /// Primary key column the plan produces a value for
    pub key_column: Option<String>,
    /// Column returned by the statement's `RETURNING` clause
    pub returning: Option<String>,
    /// Parameter names in placeholder order
    pub parameters: Vec<String>,
}

impl InsertPlan {
    /// All statements as one `;`-separated batch
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.pre
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.statement.as_str()))
            .chain(self.post.as_deref())
            .collect::<Vec<_>>()
            .join(";\n")
    }
}

/// DML generator for one dialect
///
/// # Examples
///
/// ```
/// use polydb_core::{Column, Table};
/// use polydb_dialect::dml::{DmlGenerator, Values};
/// use polydb_types::{DataType, DialectKind, SemanticType};
///
/// let table = Table::new("users")
///     .column(Column::new("id", DataType::BigInt).primary_key())
///     .column(Column::new("name", SemanticType::string(40)));
///
/// let plan = DmlGenerator::new(DialectKind::PostgreSql)
///     .insert(&table, Values::Parameters)
///     .unwrap();
/// assert_eq!(
///     plan.statement,
///     "INSERT INTO users (id, name) VALUES (nextval('users_seq'), :name) RETURNING id"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DmlGenerator {
    dialect: &'static DialectTable,
    /// `(sequence, increment)` for sequences with a non-default increment
    increments: Vec<(String, i64)>,
    namespace: Option<String>,
}

impl DmlGenerator {
    #[must_use]
    pub fn new(kind: DialectKind) -> Self {
        Self {
            dialect: kind.table(),
            increments: Vec::new(),
            namespace: None,
        }
    }

    /// Qualify sequences of tables without their own schema with a namespace
    #[must_use]
    pub fn in_schema(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Use the increments of these sequences for counter-table keys
    #[must_use]
    pub fn sequences(mut self, sequences: &[Sequence]) -> Self {
        self.increments = sequences
            .iter()
            .map(|s| (s.name.clone(), s.increment))
            .collect();
        self
    }

    #[inline]
    #[must_use]
    pub fn dialect(&self) -> &'static DialectTable {
        self.dialect
    }

    fn increment(&self, sequence: &str) -> i64 {
        self.increments
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(sequence))
            .map_or(1, |(_, inc)| *inc)
    }

    fn table_name(&self, table: &Table) -> String {
        self.dialect.qualify(table.schema.as_deref(), &table.name)
    }

    /// Name of the sequence feeding a table's key
    #[must_use]
    pub fn sequence_name(table: &Table) -> String {
        table
            .sequence
            .clone()
            .unwrap_or_else(|| format!("{}_seq", table.name))
    }

    /// Value expression for a column, recording parameter names
    fn value_sql(
        &self,
        column: &Column,
        values: Values<'_>,
        parameters: &mut Vec<String>,
    ) -> Result<String> {
        match values {
            Values::Parameters => {
                parameters.push(column.name.clone());
                Ok(self.dialect.parameter(&column.name))
            }
            Values::Literals(row) => column_literal(
                self.dialect,
                column,
                row.get(&column.name).unwrap_or(&Value::Null),
            ),
        }
    }

    fn key_predicate(
        &self,
        table: &Table,
        values: Values<'_>,
        parameters: &mut Vec<String>,
    ) -> Result<String> {
        let key = table.primary_key().ok_or_else(|| Fault::MissingPrimaryKey {
            table: table.name.clone(),
        })?;
        if let Values::Literals(row) = values
            && row.get(&key.name).is_none_or(Value::is_null)
        {
            return Err(Fault::Config(format!(
                "row for {} has no value for key column {}",
                table.name, key.name
            )));
        }
        Ok(format!(
            "{} = {}",
            self.dialect.quote(&key.name),
            self.value_sql(key, values, parameters)?
        ))
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert one row, acquiring the key with the dialect's identity strategy
    pub fn insert(&self, table: &Table, values: Values<'_>) -> Result<InsertPlan> {
        self.insert_with_key(table, values, KeySource::Strategy)
    }

    /// Insert one row with an explicit key source
    ///
    /// A non-null key in a literal row always wins over the strategy.
    pub fn insert_with_key(
        &self,
        table: &Table,
        values: Values<'_>,
        key_source: KeySource,
    ) -> Result<InsertPlan> {
        let key = table.primary_key();
        let supplied_key = match values {
            Values::Literals(row) => key
                .and_then(|k| row.get(&k.name))
                .is_some_and(|v| !v.is_null()),
            Values::Parameters => false,
        };

        let mut plan = InsertPlan {
            strategy: None,
            pre: Vec::new(),
            statement: String::new(),
            post: None,
            key_column: key.map(|k| k.name.clone()),
            returning: None,
            parameters: Vec::new(),
        };
        let mut returning = None;

        let mut columns = Vec::new();
        let mut exprs = Vec::new();

        for column in table.persisted_columns() {
            let is_key = key.is_some_and(|k| std::ptr::eq(k, column));

            if is_key && column.auto_increment {
                match self.dialect.kind {
                    DialectKind::PostgreSql => returning = Some(column.name.clone()),
                    _ => plan.post = self.dialect.last_identity.map(str::to_string),
                }
                continue;
            }

            if let Values::Literals(row) = values
                && !is_key
                && row.get(&column.name).is_none()
            {
                continue;
            }

            let expr = if !is_key || supplied_key {
                self.value_sql(column, values, &mut plan.parameters)?
            } else if let KeySource::Literal(value) = &key_source {
                column_literal(self.dialect, column, value)?
            } else {
                let (expr, key_returning) = self.identity(table, column, &mut plan)?;
                returning = key_returning;
                expr
            };

            columns.push(self.dialect.quote(&column.name));
            exprs.push(expr);
        }

        let mut statement = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name(table),
            columns.join(", "),
            exprs.join(", ")
        );
        if let Some(column) = &returning {
            statement.push_str(" RETURNING ");
            statement.push_str(&self.dialect.quote(column));
        }
        plan.statement = statement;
        plan.returning = returning;
        Ok(plan)
    }

    /// Key expression for the dialect's identity strategy
    ///
    /// Fills `pre`/`post` of the plan and returns the key expression with the
    /// column to add as `RETURNING`, if any.
    fn identity(
        &self,
        table: &Table,
        key: &Column,
        plan: &mut InsertPlan,
    ) -> Result<(String, Option<String>)> {
        let sequence = Self::sequence_name(table);
        let namespace = table.schema.as_deref().or(self.namespace.as_deref());
        let qualified = self.dialect.qualify(namespace, &sequence);
        plan.strategy = Some(self.dialect.identity);

        Ok(match self.dialect.identity {
            IdentityStrategy::InlineSequence => match self.dialect.kind {
                DialectKind::PostgreSql => (
                    format!("nextval('{}')", escape_literal(&qualified)),
                    Some(key.name.clone()),
                ),
                DialectKind::Oracle => {
                    plan.post = Some(format!("SELECT {qualified}.CURRVAL FROM dual"));
                    (format!("{qualified}.NEXTVAL"), None)
                }
                _ => (format!("NEXT VALUE FOR {qualified}"), None),
            },
            IdentityStrategy::PrePostStatement => {
                let variable = self.dialect.parameter(&key.name);
                plan.pre.push(format!(
                    "DECLARE {variable} {}",
                    self.dialect.format_type(key.semantic)?
                ));
                plan.pre
                    .push(format!("SET {variable} = NEXT VALUE FOR {qualified}"));
                plan.post = Some(format!("SELECT {variable}"));
                (variable, None)
            }
            IdentityStrategy::SideTableCounter => {
                let name = escape_literal(&sequence);
                plan.pre.push(format!(
                    "UPDATE {SEQUENCE_TABLE} SET seq = seq + {} WHERE name = '{name}'",
                    self.increment(&sequence)
                ));
                let read = format!("SELECT seq FROM {SEQUENCE_TABLE} WHERE name = '{name}'");
                let expr = format!("({read})");
                plan.post = Some(read);
                (expr, None)
            }
        })
    }

    /// Statements returning the next value of a sequence
    ///
    /// Counter-table sequences need an `UPDATE` before the read. Native
    /// sequences are named as the DDL generator creates them.
    #[must_use]
    pub fn next_value(&self, sequence: &Sequence) -> Vec<String> {
        let name = self.dialect.qualify(self.namespace.as_deref(), &sequence.name);
        match self.dialect.kind {
            DialectKind::Sqlite => {
                let literal = escape_literal(&sequence.name);
                vec![
                    format!(
                        "UPDATE {SEQUENCE_TABLE} SET seq = seq + {} WHERE name = '{literal}'",
                        sequence.increment
                    ),
                    format!("SELECT seq FROM {SEQUENCE_TABLE} WHERE name = '{literal}'"),
                ]
            }
            DialectKind::PostgreSql => {
                vec![format!("SELECT nextval('{}')", escape_literal(&name))]
            }
            DialectKind::Oracle => vec![format!("SELECT {name}.NEXTVAL FROM dual")],
            DialectKind::Generic | DialectKind::MsSql => {
                vec![format!("SELECT NEXT VALUE FOR {name}")]
            }
        }
    }

    // =========================================================================
    // Update / Delete
    // =========================================================================

    /// Update one row by primary key
    ///
    /// Returns `None` when the table has no settable column. With literal
    /// values only the columns present in the row are set.
    pub fn update(&self, table: &Table, values: Values<'_>) -> Result<Option<String>> {
        let key = table.primary_key().ok_or_else(|| Fault::MissingPrimaryKey {
            table: table.name.clone(),
        })?;

        let mut parameters = Vec::new();
        let mut assignments = Vec::new();
        for column in table.persisted_columns() {
            if std::ptr::eq(column, key) {
                continue;
            }
            if let Values::Literals(row) = values
                && row.get(&column.name).is_none()
            {
                continue;
            }
            assignments.push(format!(
                "{} = {}",
                self.dialect.quote(&column.name),
                self.value_sql(column, values, &mut parameters)?
            ));
        }
        if assignments.is_empty() {
            return Ok(None);
        }

        Ok(Some(format!(
            "UPDATE {} SET {} WHERE {}",
            self.table_name(table),
            assignments.join(", "),
            self.key_predicate(table, values, &mut parameters)?
        )))
    }

    /// Delete one row by primary key
    pub fn delete(&self, table: &Table, values: Values<'_>) -> Result<String> {
        let predicate = self.key_predicate(table, values, &mut Vec::new())?;
        Ok(format!(
            "DELETE FROM {} WHERE {predicate}",
            self.table_name(table)
        ))
    }

    // =========================================================================
    // Select
    // =========================================================================

    fn projection(&self, table: &Table) -> String {
        table
            .columns
            .iter()
            .filter_map(|c| {
                let name = self.dialect.quote(&c.name);
                if c.is_persisted() || table.is_view() {
                    Some(name)
                } else {
                    c.expression.as_ref().map(|expr| format!("{expr} AS {name}"))
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Select every readable column
    #[must_use]
    pub fn select(&self, table: &Table) -> String {
        format!(
            "SELECT {} FROM {}",
            self.projection(table),
            self.table_name(table)
        )
    }

    /// Select one row by primary key parameter
    pub fn select_by_key(&self, table: &Table) -> Result<String> {
        let predicate = self.key_predicate(table, Values::Parameters, &mut Vec::new())?;
        Ok(format!("{} WHERE {predicate}", self.select(table)))
    }

    /// Select a page of rows
    ///
    /// `order` is an `ORDER BY` expression list. SQL Server requires one for
    /// `OFFSET ... FETCH` and falls back to `(SELECT NULL)`.
    #[must_use]
    pub fn select_page(
        &self,
        table: &Table,
        filter: Option<&str>,
        order: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> String {
        let mut sql = self.select(table);
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }

        let order = match (order, self.dialect.kind) {
            (Some(order), _) => Some(order),
            (None, DialectKind::MsSql) => Some("(SELECT NULL)"),
            (None, _) => None,
        };
        if let Some(order) = order {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        match self.dialect.paging {
            Paging::LimitOffset => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            Paging::OffsetFetch => sql.push_str(&format!(
                " OFFSET {offset} ROWS FETCH NEXT {limit} ROWS ONLY"
            )),
        }
        sql
    }
}

//! DDL generation
//!
//! [`DdlGenerator`] turns schema-model objects into [`DdlScript`]s for one
//! dialect. Every object kind supports [`DdlOp::Create`], [`DdlOp::Alter`] and
//! [`DdlOp::Drop`]; `Alter` is a drop followed by a create unless the dialect
//! has a dedicated statement for it.

mod script;
mod sql;

pub use script::{DdlScript, split_script};
pub use sql::{TableSql, column_list, column_sql, constraint_body, foreign_key_body};

use polydb_core::{
    Column, Constraint, ConstraintKind, Fault, ForeignKey, Index, Procedure, ProcedureKind,
    Result, Schema, Sequence, Table, polydb_trace_skip,
};
use polydb_types::DialectKind;

use crate::format::escape_literal;
use crate::table::{
    AlterStrategy, DialectTable, DialectTableExt, SEQUENCE_TABLE, SchemaSupport, SequenceStorage,
};

/// Operation to generate DDL for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DdlOp {
    Create,
    Alter,
    Drop,
}

/// Parts of a table generated together with the table itself
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Inline named constraints into `CREATE TABLE`
    pub constraints: bool,
    /// Inline foreign keys into `CREATE TABLE`
    pub foreign_keys: bool,
    /// Create (or drop) the table's indexes
    pub indexes: bool,
}

impl TableOptions {
    /// Only the table and its columns
    pub const BARE: Self = Self {
        constraints: false,
        foreign_keys: false,
        indexes: false,
    };

    /// Table with constraints, foreign keys and indexes
    pub const ALL: Self = Self {
        constraints: true,
        foreign_keys: true,
        indexes: true,
    };
}

/// DDL generator for one dialect
///
/// # Examples
///
/// ```
/// use polydb_core::{Column, Table};
/// use polydb_dialect::ddl::{DdlGenerator, DdlOp, TableOptions};
/// use polydb_types::{DataType, DialectKind, SemanticType};
///
/// let table = Table::new("users")
///     .column(Column::new("id", DataType::BigInt).primary_key())
///     .column(Column::new("email", SemanticType::string(120)).not_null());
///
/// let script = DdlGenerator::new(DialectKind::PostgreSql)
///     .table(DdlOp::Create, &table, TableOptions::BARE)
///     .unwrap();
///
/// assert_eq!(
///     script.statements,
///     ["CREATE TABLE users (\n\tid BIGINT PRIMARY KEY NOT NULL,\n\temail VARCHAR(120) NOT NULL\n)"]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DdlGenerator {
    dialect: &'static DialectTable,
    /// Namespace of sequences and procedures
    namespace: Option<String>,
}

impl DdlGenerator {
    #[must_use]
    pub fn new(kind: DialectKind) -> Self {
        Self {
            dialect: kind.table(),
            namespace: None,
        }
    }

    /// Qualify sequences and procedures with a namespace
    #[must_use]
    pub fn in_schema(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn dialect(&self) -> &'static DialectTable {
        self.dialect
    }

    fn script(&self) -> DdlScript {
        DdlScript::new(self.dialect.kind)
    }

    fn unsupported(&self, operation: impl Into<String>) -> Fault {
        Fault::unsupported(self.dialect.kind, operation)
    }

    fn table_name(&self, table: &Table) -> String {
        self.dialect.qualify(table.schema.as_deref(), &table.name)
    }

    fn object_name(&self, name: &str) -> String {
        self.dialect.qualify(self.namespace.as_deref(), name)
    }

    /// `Alter` as `Drop` + `Create`
    fn recreate(&self, f: impl Fn(DdlOp) -> Result<DdlScript>) -> Result<DdlScript> {
        let mut script = f(DdlOp::Drop)?;
        script.append(f(DdlOp::Create)?);
        Ok(script)
    }

    // =========================================================================
    // Sequences
    // =========================================================================

    /// Sequence DDL
    ///
    /// Dialects without sequence objects keep one row per sequence in the
    /// [`SEQUENCE_TABLE`] counter table.
    pub fn sequence(&self, op: DdlOp, sequence: &Sequence) -> Result<DdlScript> {
        self.sequence_with(op, sequence, true)
    }

    fn sequence_with(
        &self,
        op: DdlOp,
        sequence: &Sequence,
        counter_table: bool,
    ) -> Result<DdlScript> {
        match self.dialect.sequences {
            SequenceStorage::Native => self.native_sequence(op, sequence),
            SequenceStorage::CounterTable => {
                let mut script = self.script();
                if op == DdlOp::Create && counter_table {
                    script.push(self.counter_table_sql());
                }
                script.push(self.counter_row_sql(op, sequence));
                Ok(script)
            }
        }
    }

    fn native_sequence(&self, op: DdlOp, sequence: &Sequence) -> Result<DdlScript> {
        let name = self.object_name(&sequence.name);
        let mut script = self.script();
        match op {
            DdlOp::Create => {
                let as_type = if self.dialect.kind == DialectKind::MsSql {
                    format!(" AS {}", self.dialect.format_type(sequence.semantic)?)
                } else {
                    String::new()
                };
                script.push(format!(
                    "CREATE SEQUENCE {name}{as_type} START WITH {} INCREMENT BY {}",
                    sequence.start_value(),
                    sequence.increment
                ));
            }
            DdlOp::Alter => match self.dialect.sequence_alter {
                AlterStrategy::Native => script.push(format!(
                    "ALTER SEQUENCE {name} RESTART WITH {} INCREMENT BY {}",
                    sequence.start_value(),
                    sequence.increment
                )),
                AlterStrategy::DropCreate => {
                    return self.recreate(|op| self.native_sequence(op, sequence));
                }
            },
            DdlOp::Drop => script.push(format!("DROP SEQUENCE {name}")),
        }
        Ok(script)
    }

    fn counter_table_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {SEQUENCE_TABLE} (\n\tname VARCHAR(512) NOT NULL PRIMARY KEY,\n\tseq BIGINT NOT NULL\n)"
        )
    }

    fn counter_row_sql(&self, op: DdlOp, sequence: &Sequence) -> String {
        let name = escape_literal(&sequence.name);
        match op {
            DdlOp::Create => format!(
                "INSERT INTO {SEQUENCE_TABLE} (name, seq) VALUES ('{name}', {})",
                sequence.current.max(0)
            ),
            DdlOp::Alter => format!(
                "UPDATE {SEQUENCE_TABLE} SET seq = {} WHERE name = '{name}'",
                sequence.current
            ),
            DdlOp::Drop => format!("DELETE FROM {SEQUENCE_TABLE} WHERE name = '{name}'"),
        }
    }

    // =========================================================================
    // Columns
    // =========================================================================

    /// Column DDL against an existing table
    pub fn column(&self, op: DdlOp, table: &Table, column: &Column) -> Result<DdlScript> {
        if table.is_view() {
            return Err(self.unsupported("ALTER VIEW ... COLUMN"));
        }
        let name = self.table_name(table);
        let column_name = self.dialect.quote(&column.name);
        let mut script = self.script();
        match op {
            DdlOp::Create => script.push(format!(
                "ALTER TABLE {name} {} {}",
                self.dialect.add_column,
                column_sql(self.dialect, table, column, false, false)?
            )),
            DdlOp::Drop => script.push(format!("ALTER TABLE {name} DROP COLUMN {column_name}")),
            DdlOp::Alter => match self.dialect.column_alter {
                AlterStrategy::DropCreate => {
                    return self.recreate(|op| self.column(op, table, column));
                }
                AlterStrategy::Native => {
                    let native_type = self.dialect.format_type(column.semantic)?;
                    if self.dialect.kind == DialectKind::MsSql {
                        let nullability = if column.not_null { "NOT NULL" } else { "NULL" };
                        script.push(format!(
                            "ALTER TABLE {name} ALTER COLUMN {column_name} {native_type} {nullability}"
                        ));
                    } else {
                        let nullability = if column.not_null { "SET" } else { "DROP" };
                        script.push(format!(
                            "ALTER TABLE {name} ALTER COLUMN {column_name} TYPE {native_type}"
                        ));
                        script.push(format!(
                            "ALTER TABLE {name} ALTER COLUMN {column_name} {nullability} NOT NULL"
                        ));
                    }
                }
            },
        }
        Ok(script)
    }

    // =========================================================================
    // Constraints and foreign keys
    // =========================================================================

    /// Named constraint DDL against an existing table
    pub fn constraint(
        &self,
        op: DdlOp,
        table: &Table,
        constraint: &Constraint,
    ) -> Result<DdlScript> {
        if self.dialect.inline_constraints {
            return Err(self.unsupported("ALTER TABLE ... CONSTRAINT"));
        }
        if op == DdlOp::Alter {
            return self.recreate(|op| self.constraint(op, table, constraint));
        }

        let name = self.table_name(table);
        let constraint_name = self.dialect.quote(&constraint.name);
        let mut script = self.script();

        if let ConstraintKind::Default(expr) = &constraint.kind {
            script.push(self.default_constraint_sql(op, &name, constraint, expr)?);
            return Ok(script);
        }

        match op {
            DdlOp::Create => {
                if let Some(body) = constraint_body(self.dialect, constraint) {
                    script.push(format!(
                        "ALTER TABLE {name} ADD CONSTRAINT {constraint_name} {body}"
                    ));
                }
            }
            _ => script.push(format!("ALTER TABLE {name} DROP CONSTRAINT {constraint_name}")),
        }
        Ok(script)
    }

    fn default_constraint_sql(
        &self,
        op: DdlOp,
        table_name: &str,
        constraint: &Constraint,
        expr: &str,
    ) -> Result<String> {
        let column = constraint
            .columns
            .first()
            .map(|c| self.dialect.quote(c))
            .ok_or_else(|| {
                Fault::Config(format!(
                    "default constraint {} names no column",
                    constraint.name
                ))
            })?;
        let constraint_name = self.dialect.quote(&constraint.name);
        let create = op == DdlOp::Create;

        Ok(match self.dialect.kind {
            DialectKind::MsSql if create => format!(
                "ALTER TABLE {table_name} ADD CONSTRAINT {constraint_name} DEFAULT {expr} FOR {column}"
            ),
            DialectKind::MsSql => {
                format!("ALTER TABLE {table_name} DROP CONSTRAINT {constraint_name}")
            }
            DialectKind::Oracle => {
                let value = if create { expr } else { "NULL" };
                format!("ALTER TABLE {table_name} MODIFY {column} DEFAULT {value}")
            }
            _ if create => {
                format!("ALTER TABLE {table_name} ALTER COLUMN {column} SET DEFAULT {expr}")
            }
            _ => format!("ALTER TABLE {table_name} ALTER COLUMN {column} DROP DEFAULT"),
        })
    }

    /// Foreign key DDL against an existing table
    pub fn foreign_key(&self, op: DdlOp, table: &Table, fk: &ForeignKey) -> Result<DdlScript> {
        if self.dialect.inline_constraints {
            return Err(self.unsupported("ALTER TABLE ... FOREIGN KEY"));
        }
        let name = self.table_name(table);
        let fk_name = self.dialect.quote(&fk.name);
        let mut script = self.script();
        match op {
            DdlOp::Create => script.push(format!(
                "ALTER TABLE {name} ADD CONSTRAINT {fk_name} {}",
                foreign_key_body(self.dialect, table, fk)
            )),
            DdlOp::Alter => return self.recreate(|op| self.foreign_key(op, table, fk)),
            DdlOp::Drop => script.push(format!("ALTER TABLE {name} DROP CONSTRAINT {fk_name}")),
        }
        Ok(script)
    }

    // =========================================================================
    // Indexes
    // =========================================================================

    pub fn index(&self, op: DdlOp, table: &Table, index: &Index) -> Result<DdlScript> {
        let mut script = self.script();
        match op {
            DdlOp::Create => {
                let unique = if index.unique { "UNIQUE " } else { "" };
                script.push(format!(
                    "CREATE {unique}INDEX {} ON {} ({})",
                    self.dialect.quote(&index.name),
                    self.table_name(table),
                    column_list(self.dialect, &index.columns)
                ));
            }
            DdlOp::Alter => return self.recreate(|op| self.index(op, table, index)),
            DdlOp::Drop if self.dialect.kind == DialectKind::MsSql => script.push(format!(
                "DROP INDEX {} ON {}",
                self.dialect.quote(&index.name),
                self.table_name(table)
            )),
            DdlOp::Drop => script.push(format!(
                "DROP INDEX {}",
                self.dialect.qualify(table.schema.as_deref(), &index.name)
            )),
        }
        Ok(script)
    }

    // =========================================================================
    // Procedures
    // =========================================================================

    /// Stored procedure or function DDL
    pub fn procedure(&self, op: DdlOp, procedure: &Procedure) -> Result<DdlScript> {
        let keyword = match procedure.kind {
            ProcedureKind::Procedure => "PROCEDURE",
            ProcedureKind::Function => "FUNCTION",
        };
        if !self.dialect.procedures {
            return Err(self.unsupported(format!("CREATE {keyword}")));
        }

        let name = self.object_name(&procedure.name);
        let replace = self.dialect.kind == DialectKind::Oracle;
        let mut script = self.script();
        match op {
            DdlOp::Create => {
                let or_replace = if replace { "OR REPLACE " } else { "" };
                script.push(format!(
                    "CREATE {or_replace}{keyword} {name} {}",
                    procedure.source.trim()
                ));
            }
            DdlOp::Alter if replace => return self.procedure(DdlOp::Create, procedure),
            DdlOp::Alter => return self.recreate(|op| self.procedure(op, procedure)),
            DdlOp::Drop => script.push(format!("DROP {keyword} {name}")),
        }
        Ok(script)
    }

    // =========================================================================
    // Tables and views
    // =========================================================================

    /// Table or view DDL
    ///
    /// Dialects that only accept constraints inside `CREATE TABLE` always
    /// inline them. Drop removes indexes, foreign keys and named constraints
    /// before the table itself.
    pub fn table(&self, op: DdlOp, table: &Table, options: TableOptions) -> Result<DdlScript> {
        let sql = TableSql::new(self.dialect, table)
            .constraints(options.constraints || self.dialect.inline_constraints)
            .foreign_keys(options.foreign_keys || self.dialect.inline_constraints);
        let mut script = self.script();

        match op {
            DdlOp::Alter => return self.recreate(|op| self.table(op, table, options)),
            DdlOp::Create if table.is_view() => script.push(sql.create_view_sql()),
            DdlOp::Create => {
                script.push(sql.create_table_sql()?);
                if options.indexes {
                    for index in &table.indexes {
                        script.append(self.index(DdlOp::Create, table, index)?);
                    }
                }
            }
            DdlOp::Drop => {
                if !table.is_view() {
                    if options.indexes {
                        for index in &table.indexes {
                            script.append(self.index(DdlOp::Drop, table, index)?);
                        }
                    }
                    if !self.dialect.inline_constraints {
                        if options.foreign_keys {
                            for fk in table.foreign_keys.iter().rev() {
                                script.append(self.foreign_key(DdlOp::Drop, table, fk)?);
                            }
                        }
                        if options.constraints {
                            for constraint in table.constraints.iter().rev() {
                                script.append(self.constraint(DdlOp::Drop, table, constraint)?);
                            }
                        }
                    }
                }
                script.push(sql.drop_sql());
            }
        }
        Ok(script)
    }

    // =========================================================================
    // Namespaces and databases
    // =========================================================================

    /// Namespace DDL (`CREATE SCHEMA`)
    pub fn namespace(&self, op: DdlOp, name: &str) -> Result<DdlScript> {
        let quoted = self.dialect.quote(name);
        let mut script = self.script();
        match (op, self.dialect.schemas) {
            (_, SchemaSupport::None) => return Err(self.unsupported("CREATE SCHEMA")),
            (DdlOp::Create, SchemaSupport::IfNotExists) => {
                script.push(format!("CREATE SCHEMA IF NOT EXISTS {quoted}"));
            }
            (DdlOp::Create, _) => script.push(format!("CREATE SCHEMA {quoted}")),
            (DdlOp::Alter, _) => return Err(self.unsupported("ALTER SCHEMA")),
            (DdlOp::Drop, _) => script.push(format!("DROP SCHEMA {quoted}")),
        }
        Ok(script)
    }

    /// Database DDL
    ///
    /// Oracle databases are provisioned outside SQL and SQLite databases are
    /// files.
    pub fn database(&self, op: DdlOp, name: &str) -> Result<DdlScript> {
        if matches!(self.dialect.kind, DialectKind::Oracle | DialectKind::Sqlite) {
            return Err(self.unsupported("CREATE DATABASE"));
        }
        let quoted = self.dialect.quote(name);
        let mut script = self.script();
        match op {
            DdlOp::Create => script.push(format!("CREATE DATABASE {quoted}")),
            DdlOp::Alter => return Err(self.unsupported("ALTER DATABASE")),
            DdlOp::Drop => script.push(format!("DROP DATABASE {quoted}")),
        }
        Ok(script)
    }

    // =========================================================================
    // Whole schema
    // =========================================================================

    /// DDL for every object of a schema in dependency order
    ///
    /// Create order: namespace, tables, constraints, foreign keys, sequences,
    /// indexes, views, procedures. Drop runs in reverse. Objects the dialect
    /// cannot express are skipped.
    pub fn schema(&self, op: DdlOp, schema: &Schema) -> Result<DdlScript> {
        let scoped = match schema.namespace() {
            Some(ns) if self.dialect.supports_schemas() => self.clone().in_schema(ns),
            _ => self.clone(),
        };
        match op {
            DdlOp::Create => scoped.create_schema(schema),
            DdlOp::Drop => scoped.drop_schema(schema),
            DdlOp::Alter => {
                let mut script = scoped.drop_schema(schema)?;
                script.append(scoped.create_schema(schema)?);
                Ok(script)
            }
        }
    }

    fn create_schema(&self, schema: &Schema) -> Result<DdlScript> {
        let mut script = self.script();
        let (views, tables): (Vec<&Table>, Vec<&Table>) =
            schema.tables.iter().partition(|t| t.is_view());

        if let Some(ns) = schema.namespace() {
            skip_unsupported(&mut script, self.namespace(DdlOp::Create, ns))?;
        }
        for table in &tables {
            script.append(self.table(DdlOp::Create, table, TableOptions::BARE)?);
        }
        if !self.dialect.inline_constraints {
            for table in &tables {
                for constraint in &table.constraints {
                    script.append(self.constraint(DdlOp::Create, table, constraint)?);
                }
            }
            for table in &tables {
                for fk in &table.foreign_keys {
                    script.append(self.foreign_key(DdlOp::Create, table, fk)?);
                }
            }
        }
        for (i, sequence) in schema.sequences.iter().enumerate() {
            script.append(self.sequence_with(DdlOp::Create, sequence, i == 0)?);
        }
        for table in &tables {
            for index in &table.indexes {
                script.append(self.index(DdlOp::Create, table, index)?);
            }
        }
        for view in &views {
            script.append(self.table(DdlOp::Create, view, TableOptions::BARE)?);
        }
        for procedure in &schema.procedures {
            skip_unsupported(&mut script, self.procedure(DdlOp::Create, procedure))?;
        }
        Ok(script)
    }

    fn drop_schema(&self, schema: &Schema) -> Result<DdlScript> {
        let mut script = self.script();
        let (views, tables): (Vec<&Table>, Vec<&Table>) =
            schema.tables.iter().partition(|t| t.is_view());

        for procedure in schema.procedures.iter().rev() {
            skip_unsupported(&mut script, self.procedure(DdlOp::Drop, procedure))?;
        }
        for view in views.iter().rev() {
            script.append(self.table(DdlOp::Drop, view, TableOptions::BARE)?);
        }
        for table in tables.iter().rev() {
            for index in table.indexes.iter().rev() {
                script.append(self.index(DdlOp::Drop, table, index)?);
            }
        }
        for sequence in schema.sequences.iter().rev() {
            script.append(self.sequence(DdlOp::Drop, sequence)?);
        }
        if !self.dialect.inline_constraints {
            for table in tables.iter().rev() {
                for fk in table.foreign_keys.iter().rev() {
                    script.append(self.foreign_key(DdlOp::Drop, table, fk)?);
                }
            }
            for table in tables.iter().rev() {
                for constraint in table.constraints.iter().rev() {
                    script.append(self.constraint(DdlOp::Drop, table, constraint)?);
                }
            }
        }
        for table in tables.iter().rev() {
            script.append(self.table(DdlOp::Drop, table, TableOptions::BARE)?);
        }
        if let Some(ns) = schema.namespace() {
            skip_unsupported(&mut script, self.namespace(DdlOp::Drop, ns))?;
        }
        Ok(script)
    }
}

/// Append `part`, skipping objects the dialect cannot express
fn skip_unsupported(script: &mut DdlScript, part: Result<DdlScript>) -> Result<()> {
    match part {
        Ok(part) => script.append(part),
        Err(_err @ Fault::Unsupported { .. }) => {
            polydb_trace_skip!("ddl", _err);
        }
        Err(err) => return Err(err),
    }
    Ok(())
}

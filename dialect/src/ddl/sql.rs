//! SQL text for table-level definitions
//!
//! `CREATE TABLE` and `CREATE VIEW` bodies are built as a list of lines joined
//! with `",\n"`, each indented with a tab.

use polydb_core::{
    Column, Constraint, ConstraintKind, Fault, ForeignKey, Result, Table, TableKind,
};
use polydb_types::{DataType, DialectKind};

use crate::table::DialectTable;

// =============================================================================
// Table SQL Generation
// =============================================================================

/// A table definition with the parts to inline for SQL generation
#[derive(Clone, Debug)]
pub struct TableSql<'a> {
    pub dialect: &'static DialectTable,
    pub table: &'a Table,
    /// Inline named constraints
    pub constraints: bool,
    /// Inline foreign keys
    pub foreign_keys: bool,
}

impl<'a> TableSql<'a> {
    pub fn new(dialect: &'static DialectTable, table: &'a Table) -> Self {
        Self {
            dialect,
            table,
            constraints: false,
            foreign_keys: false,
        }
    }

    pub fn constraints(mut self, inline: bool) -> Self {
        self.constraints = inline;
        self
    }

    pub fn foreign_keys(mut self, inline: bool) -> Self {
        self.foreign_keys = inline;
        self
    }

    fn name(&self) -> String {
        self.dialect
            .qualify(self.table.schema.as_deref(), &self.table.name)
    }

    /// Generate CREATE TABLE SQL
    pub fn create_table_sql(&self) -> Result<String> {
        let mut lines = Vec::new();

        for column in self.table.persisted_columns() {
            lines.push(format!(
                "\t{}",
                column_sql(self.dialect, self.table, column, true, self.constraints)?
            ));
        }

        if self.constraints {
            let identity_key = self.trailing_identity_key();
            for constraint in &self.table.constraints {
                if let Some(key) = identity_key
                    && constraint.kind == ConstraintKind::PrimaryKey
                {
                    // the key is declared on the AUTOINCREMENT column
                    if let [only] = constraint.columns.as_slice()
                        && only.eq_ignore_ascii_case(&key.name)
                    {
                        continue;
                    }
                    return Err(Fault::unsupported(
                        self.dialect.kind,
                        format!(
                            "AUTOINCREMENT column {} in primary key {}",
                            key.name, constraint.name
                        ),
                    ));
                }
                if let Some(body) = constraint_body(self.dialect, constraint) {
                    lines.push(format!(
                        "\tCONSTRAINT {} {}",
                        self.dialect.quote(&constraint.name),
                        body
                    ));
                }
            }
        }

        if self.foreign_keys {
            for fk in &self.table.foreign_keys {
                lines.push(format!(
                    "\tCONSTRAINT {} {}",
                    self.dialect.quote(&fk.name),
                    foreign_key_body(self.dialect, self.table, fk)
                ));
            }
        }

        Ok(format!(
            "CREATE TABLE {} (\n{}\n)",
            self.name(),
            lines.join(",\n")
        ))
    }

    /// Auto-increment key that must carry `PRIMARY KEY AUTOINCREMENT` itself
    fn trailing_identity_key(&self) -> Option<&'a Column> {
        if self.dialect.kind != DialectKind::Sqlite {
            return None;
        }
        self.table
            .persisted_columns()
            .find(|c| c.primary_key && c.auto_increment)
    }

    /// Generate CREATE VIEW SQL
    ///
    /// Every column is projected as `<expression> AS <name>`; a column without
    /// an expression projects itself.
    pub fn create_view_sql(&self) -> String {
        let TableKind::View { base, filter } = &self.table.kind else {
            return self.create_view_from(&self.table.name, None);
        };
        self.create_view_from(base, filter.as_deref())
    }

    fn create_view_from(&self, base: &str, filter: Option<&str>) -> String {
        let projections = self
            .table
            .columns
            .iter()
            .map(|c| {
                let name = self.dialect.quote(&c.name);
                let source = c.expression.clone().unwrap_or_else(|| name.clone());
                format!("\t{source} AS {name}")
            })
            .collect::<Vec<_>>()
            .join(",\n");

        let mut sql = format!(
            "CREATE VIEW {} AS SELECT\n{}\nFROM {}",
            self.name(),
            projections,
            self.dialect.qualify(self.table.schema.as_deref(), base)
        );
        if let Some(filter) = filter {
            sql.push_str("\nWHERE ");
            sql.push_str(filter);
        }
        sql
    }

    /// Generate DROP TABLE / DROP VIEW SQL
    pub fn drop_sql(&self) -> String {
        let keyword = if self.table.is_view() { "VIEW" } else { "TABLE" };
        format!("DROP {keyword} {}", self.name())
    }
}

// =============================================================================
// Column SQL Generation
// =============================================================================

/// Column definition without leading/trailing punctuation
///
/// `in_create` is `false` for `ALTER TABLE ... ADD`, where a primary key
/// cannot be declared. With `inline_defaults`, a DEFAULT constraint on the
/// column becomes a column default.
pub fn column_sql(
    dialect: &DialectTable,
    table: &Table,
    column: &Column,
    in_create: bool,
    inline_defaults: bool,
) -> Result<String> {
    let trailing_identity = dialect.kind == DialectKind::Sqlite;
    let identity = column.auto_increment && column.primary_key;

    let native_type = if identity && trailing_identity {
        // AUTOINCREMENT is only accepted on INTEGER PRIMARY KEY
        dialect.format_type(DataType::Int.into())?
    } else {
        dialect.format_type(column.semantic)?
    };

    let mut sql = format!("{} {}", dialect.quote(&column.name), native_type);

    if identity && !trailing_identity {
        sql.push_str(dialect.auto_increment);
    }

    let pk_constraint = table
        .constraints
        .iter()
        .any(|c| c.kind == ConstraintKind::PrimaryKey);
    if in_create && column.primary_key && (!pk_constraint || (identity && trailing_identity)) {
        sql.push_str(" PRIMARY KEY");
        if identity && trailing_identity {
            sql.push_str(dialect.auto_increment);
        }
    }

    let default = column.default.clone().or_else(|| {
        (inline_defaults || dialect.inline_constraints)
            .then(|| inline_default(table, column))
            .flatten()
    });
    if let Some(default) = default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default);
    }

    if column.not_null {
        sql.push_str(" NOT NULL");
    }

    Ok(sql)
}

/// DEFAULT constraint expression targeting `column`
fn inline_default(table: &Table, column: &Column) -> Option<String> {
    table.constraints.iter().find_map(|c| match &c.kind {
        ConstraintKind::Default(expr)
            if c.columns
                .iter()
                .any(|n| n.eq_ignore_ascii_case(&column.name)) =>
        {
            Some(expr.clone())
        }
        _ => None,
    })
}

/// Comma-separated, quoted column list
pub fn column_list(dialect: &DialectTable, columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| dialect.quote(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Constraint body after `CONSTRAINT <name>`; `None` for DEFAULT constraints,
/// which are not table constraints in most engines
pub fn constraint_body(dialect: &DialectTable, constraint: &Constraint) -> Option<String> {
    match &constraint.kind {
        ConstraintKind::PrimaryKey => Some(format!(
            "PRIMARY KEY ({})",
            column_list(dialect, &constraint.columns)
        )),
        ConstraintKind::Unique => Some(format!(
            "UNIQUE ({})",
            column_list(dialect, &constraint.columns)
        )),
        ConstraintKind::Check(expr) => Some(format!("CHECK ({expr})")),
        ConstraintKind::Default(_) => None,
    }
}

/// Foreign key body after `CONSTRAINT <name>`
pub fn foreign_key_body(dialect: &DialectTable, table: &Table, fk: &ForeignKey) -> String {
    let mut sql = format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        column_list(dialect, &fk.columns),
        dialect.qualify(table.schema.as_deref(), &fk.references),
        column_list(dialect, &fk.references_columns)
    );
    if let Some(action) = &fk.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action);
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DialectTableExt;
    use polydb_core::Column;
    use polydb_types::SemanticType;

    fn users() -> Table {
        Table::new("users")
            .column(
                Column::new("id", DataType::BigInt)
                    .primary_key()
                    .auto_increment(),
            )
            .column(Column::new("email", SemanticType::string(120)).not_null())
            .column(Column::new("active", DataType::Bool).default("1"))
    }

    #[test]
    fn test_sqlite_autoincrement_uses_integer() {
        let table = users();
        let sqlite = DialectKind::Sqlite.table();
        assert_eq!(
            column_sql(sqlite, &table, &table.columns[0], true, false).unwrap(),
            "id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL"
        );
    }

    #[test]
    fn test_sqlite_autoincrement_survives_key_constraint() {
        let table = users().constraint(Constraint::primary_key("pk_users", ["id"]));
        let sqlite = DialectKind::Sqlite.table();
        let sql = TableSql::new(sqlite, &table)
            .constraints(true)
            .create_table_sql()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE users (\n\tid INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,\n\temail VARCHAR(120) NOT NULL,\n\tactive BOOLEAN DEFAULT 1\n)"
        );

        // other dialects keep the named constraint
        let pg = TableSql::new(DialectKind::PostgreSql.table(), &table)
            .constraints(true)
            .create_table_sql()
            .unwrap();
        assert!(pg.contains("\tid BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL"), "{pg}");
        assert!(pg.contains("CONSTRAINT pk_users PRIMARY KEY (id)"), "{pg}");
    }

    #[test]
    fn test_sqlite_autoincrement_in_composite_key_is_unsupported() {
        let table = users()
            .constraint(Constraint::primary_key("pk_users", ["id", "email"]));
        let err = TableSql::new(DialectKind::Sqlite.table(), &table)
            .constraints(true)
            .create_table_sql()
            .unwrap_err();
        assert!(matches!(err, Fault::Unsupported { .. }), "{err}");
    }

    #[test]
    fn test_identity_clause_precedes_primary_key() {
        let table = users();
        assert_eq!(
            column_sql(DialectKind::MsSql.table(), &table, &table.columns[0], true, false).unwrap(),
            "id BIGINT IDENTITY(1,1) PRIMARY KEY NOT NULL"
        );
        assert_eq!(
            column_sql(DialectKind::PostgreSql.table(), &table, &table.columns[0], true, false)
                .unwrap(),
            "id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY NOT NULL"
        );
    }

    #[test]
    fn test_default_before_not_null() {
        let table = users().column(
            Column::new("role", SemanticType::string(10))
                .default("'member'")
                .not_null(),
        );
        assert_eq!(
            column_sql(DialectKind::Oracle.table(), &table, &table.columns[3], true, false).unwrap(),
            "role VARCHAR2(10) DEFAULT 'member' NOT NULL"
        );
    }

    #[test]
    fn test_inline_default_constraint_on_sqlite_only() {
        let table = Table::new("t")
            .column(Column::new("n", DataType::Int))
            .constraint(Constraint::default_value("df_t_n", "n", "0"));
        assert_eq!(
            column_sql(DialectKind::Sqlite.table(), &table, &table.columns[0], true, false).unwrap(),
            "n INTEGER DEFAULT 0"
        );
        assert_eq!(
            column_sql(DialectKind::MsSql.table(), &table, &table.columns[0], true, false).unwrap(),
            "n INT"
        );
    }

    #[test]
    fn test_view_projection() {
        let view = Table::view("active_users", "users")
            .filter("active = 1")
            .column(Column::new("id", DataType::BigInt))
            .column(Column::new("mail", DataType::String).expression("lower(email)"));
        let sql = TableSql::new(DialectKind::Generic.table(), &view).create_view_sql();
        assert_eq!(
            sql,
            "CREATE VIEW active_users AS SELECT\n\tid AS id,\n\tlower(email) AS mail\nFROM users\nWHERE active = 1"
        );
    }
}

//! Schema-model graph
//!
//! The graph is owned by the caller: Schema -> Tables -> Columns, Constraints,
//! ForeignKeys, Indexes, and Schema -> Sequences, Procedures. Generators read
//! it; the only mutation performed by polydb is attaching foreign keys
//! discovered by introspection and bumping sequence mirrors after inserts.

use heck::ToTitleCase;
use polydb_types::{DataType, SemanticType};
use serde::{Deserialize, Serialize};

fn title(name: &str) -> String {
    name.to_title_case()
}

// =============================================================================
// Schema
// =============================================================================

/// A namespace of tables, sequences and procedures
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Namespace name; empty for the connection's default namespace
    pub name: String,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
}

impl Schema {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a table
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    /// Add a sequence
    #[must_use]
    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    /// Add a stored procedure or function
    #[must_use]
    pub fn procedure(mut self, procedure: Procedure) -> Self {
        self.procedures.push(procedure);
        self
    }

    /// Find a table by name (ASCII case-insensitive)
    #[must_use]
    pub fn find_table(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn find_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn find_sequence(&self, name: &str) -> Option<&Sequence> {
        self.sequences
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn find_sequence_mut(&mut self, name: &str) -> Option<&mut Sequence> {
        self.sequences
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Namespace name, `None` when empty
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        (!self.name.is_empty()).then_some(self.name.as_str())
    }

    /// Give every table and column without a display name the title-cased
    /// form of its name, as the builders do
    pub fn fill_display_names(&mut self) {
        for table in &mut self.tables {
            if table.display_name.is_empty() {
                table.display_name = title(&table.name);
            }
            for column in &mut table.columns {
                if column.display_name.is_empty() {
                    column.display_name = title(&column.name);
                }
            }
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// Whether a table is physical or a projection over another table
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum TableKind {
    #[default]
    Table,
    /// View selecting from `base`, optionally filtered
    View {
        base: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter: Option<String>,
    },
}

/// Table or view definition
///
/// # Examples
///
/// ```
/// use polydb_core::schema::{Column, Table};
/// use polydb_types::SemanticType;
///
/// let table = Table::new("order_line")
///     .column(Column::new("id", SemanticType::from(polydb_types::DataType::BigInt)).primary_key())
///     .column(Column::new("sku", SemanticType::string(40)).not_null());
///
/// assert_eq!(table.display_name, "Order Line");
/// assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("id"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub kind: TableKind,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Sequence feeding the primary key, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
}

impl Table {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: title(&name),
            name,
            ..Default::default()
        }
    }

    /// Create a view over `base`
    #[must_use]
    pub fn view(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            kind: TableKind::View {
                base: base.into(),
                filter: None,
            },
            ..Self::new(name)
        }
    }

    /// Set the view filter; ignored for physical tables
    #[must_use]
    pub fn filter(mut self, predicate: impl Into<String>) -> Self {
        if let TableKind::View { filter, .. } = &mut self.kind {
            *filter = Some(predicate.into());
        }
        self
    }

    #[must_use]
    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Feed the primary key from a sequence
    #[must_use]
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = Some(sequence.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn is_view(&self) -> bool {
        matches!(self.kind, TableKind::View { .. })
    }

    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Single-column primary key
    ///
    /// Falls back to the first column of a `PrimaryKey` constraint when no
    /// column is flagged directly.
    #[must_use]
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key).or_else(|| {
            self.constraints
                .iter()
                .find(|c| c.kind == ConstraintKind::PrimaryKey)
                .and_then(|c| c.columns.first())
                .and_then(|name| self.find_column(name))
        })
    }

    /// Columns stored in the table, in declaration order
    pub fn persisted_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_persisted())
    }
}

// =============================================================================
// Column
// =============================================================================

/// How a column's value is produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Stored column
    #[default]
    Data,
    /// Computed by an expression, never stored
    Computed,
    /// Bookkeeping column maintained by the application
    Internal,
    /// Filled by a query at load time
    Query,
}

/// Column definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// Empty in hand-written schema files; see [`Schema::fill_display_names`]
    #[serde(default)]
    pub display_name: String,
    pub semantic: SemanticType,
    #[serde(default)]
    pub kind: ColumnKind,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    /// Default value as SQL expression text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Source expression for computed columns and view projections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Values are application enums stored as integers
    #[serde(default)]
    pub is_enum: bool,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, semantic: impl Into<SemanticType>) -> Self {
        let name = name.into();
        Self {
            display_name: title(&name),
            name,
            semantic: semantic.into(),
            kind: ColumnKind::Data,
            not_null: false,
            primary_key: false,
            auto_increment: false,
            default: None,
            expression: None,
            is_enum: false,
        }
    }

    /// Primary key column; implies NOT NULL
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    #[must_use]
    pub fn default(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(expression.into());
        self
    }

    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Projection expression (view columns)
    #[must_use]
    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    /// Computed column, never stored
    #[must_use]
    pub fn computed(mut self, expression: impl Into<String>) -> Self {
        self.kind = ColumnKind::Computed;
        self.expression = Some(expression.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ColumnKind) -> Self {
        self.kind = kind;
        self
    }

    /// Column holds enum discriminants
    #[must_use]
    pub fn enumeration(mut self) -> Self {
        self.is_enum = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.kind == ColumnKind::Data
    }

    #[inline]
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.semantic.data_type
    }
}

// =============================================================================
// Constraints, foreign keys, indexes
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "expression")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    /// CHECK constraint with its predicate
    Check(String),
    /// DEFAULT constraint with its value expression
    Default(String),
}

/// Named table constraint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
}

impl Constraint {
    fn with_kind<I, S>(name: impl Into<String>, kind: ConstraintKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn primary_key<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(name, ConstraintKind::PrimaryKey, columns)
    }

    #[must_use]
    pub fn unique<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(name, ConstraintKind::Unique, columns)
    }

    #[must_use]
    pub fn check(name: impl Into<String>, predicate: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            ConstraintKind::Check(predicate.into()),
            Vec::<String>::new(),
        )
    }

    #[must_use]
    pub fn default_value(
        name: impl Into<String>,
        column: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            name,
            ConstraintKind::Default(expression.into()),
            [column.into()],
        )
    }
}

/// Foreign key from `columns` to `references(references_columns)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub name: String,
    pub columns: Vec<String>,
    pub references: String,
    pub references_columns: Vec<String>,
    /// Referential action, e.g. `CASCADE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

impl ForeignKey {
    #[must_use]
    pub fn new<I, S, J, T>(
        name: impl Into<String>,
        columns: I,
        references: impl Into<String>,
        references_columns: J,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            references: references.into(),
            references_columns: references_columns.into_iter().map(Into::into).collect(),
            on_delete: None,
        }
    }

    #[must_use]
    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl Index {
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

// =============================================================================
// Sequences and procedures
// =============================================================================

/// Client-side mirror of a database sequence
///
/// The authoritative counter lives in the database; `current` tracks the last
/// value this process has observed.
///
/// # Examples
///
/// ```
/// use polydb_core::schema::Sequence;
///
/// let mut seq = Sequence::new("order_seq");
/// assert_eq!(seq.start_value(), 1);
/// seq.observe(41);
/// assert_eq!(seq.start_value(), 42);
/// seq.observe(7);
/// assert_eq!(seq.current, 41);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub name: String,
    #[serde(default)]
    pub current: i64,
    #[serde(default = "default_increment")]
    pub increment: i64,
    #[serde(default = "default_sequence_type")]
    pub semantic: SemanticType,
}

fn default_increment() -> i64 {
    1
}

fn default_sequence_type() -> SemanticType {
    SemanticType::new(DataType::BigInt)
}

impl Sequence {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current: 0,
            increment: 1,
            semantic: SemanticType::new(DataType::BigInt),
        }
    }

    #[must_use]
    pub fn increment(mut self, increment: i64) -> Self {
        self.increment = increment;
        self
    }

    #[must_use]
    pub fn current(mut self, current: i64) -> Self {
        self.current = current;
        self
    }

    #[must_use]
    pub fn semantic(mut self, semantic: impl Into<SemanticType>) -> Self {
        self.semantic = semantic.into();
        self
    }

    /// Value the database sequence is (re)started at
    #[must_use]
    pub fn start_value(&self) -> i64 {
        if self.current < 1 {
            1
        } else {
            self.current + self.increment
        }
    }

    /// Record a value issued by the database; never moves backwards
    pub fn observe(&mut self, value: i64) {
        if value > self.current {
            self.current = value;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureKind {
    #[default]
    Procedure,
    Function,
}

/// Stored procedure or function
///
/// `source` is everything after `CREATE PROCEDURE <name>` (or `CREATE
/// FUNCTION <name>`): parameter list, return clause and body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    #[serde(default)]
    pub kind: ProcedureKind,
    pub source: String,
}

impl Procedure {
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ProcedureKind::Procedure,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn function(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: ProcedureKind::Function,
            ..Self::new(name, source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> Table {
        Table::new("orders")
            .column(Column::new("id", DataType::BigInt).primary_key())
            .column(Column::new("customer_id", DataType::Int).not_null())
            .column(Column::new("total", SemanticType::decimal(10, 2)))
            .column(Column::new("label", DataType::String).computed("'#' || id"))
    }

    #[test]
    fn test_display_names_default_to_title_case() {
        let table = orders();
        assert_eq!(table.display_name, "Orders");
        assert_eq!(table.columns[1].display_name, "Customer Id");
        let renamed = Column::new("qty", DataType::Int).display_name("Quantity");
        assert_eq!(renamed.display_name, "Quantity");
    }

    #[test]
    fn test_schema_file_without_display_names() {
        let mut schema: Schema = toml::from_str(
            r#"
            name = "sales"

            [[tables]]
            name = "order_line"

            [[tables.columns]]
            name = "unit_price"
            semantic = { data_type = "Decimal", size = 10, scale = 2 }

            [[sequences]]
            name = "order_line_seq"
            "#,
        )
        .unwrap();
        schema.fill_display_names();

        let table = &schema.tables[0];
        assert_eq!(table.display_name, "Order Line");
        assert_eq!(table.columns[0].display_name, "Unit Price");
        assert_eq!(table.columns[0].semantic, SemanticType::decimal(10, 2));
        assert_eq!(schema.sequences[0].semantic.data_type, DataType::BigInt);
        assert_eq!(schema.sequences[0].increment, 1);
    }

    #[test]
    fn test_persisted_columns_skip_computed() {
        let names: Vec<_> = orders().persisted_columns().map(|c| c.name.clone()).collect();
        assert_eq!(names, ["id", "customer_id", "total"]);
    }

    #[test]
    fn test_primary_key_from_constraint() {
        let table = Table::new("t")
            .column(Column::new("code", SemanticType::string(8)))
            .constraint(Constraint::primary_key("pk_t", ["code"]));
        assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("code"));
    }

    #[test]
    fn test_view_filter() {
        let view = Table::view("open_orders", "orders").filter("closed = 0");
        assert!(view.is_view());
        assert_eq!(
            view.kind,
            TableKind::View {
                base: "orders".into(),
                filter: Some("closed = 0".into())
            }
        );
        // filter is ignored on physical tables
        assert_eq!(Table::new("t").filter("x = 1").kind, TableKind::Table);
    }

    #[test]
    fn test_sequence_start_value() {
        let seq = Sequence::new("s").current(10).increment(5);
        assert_eq!(seq.start_value(), 15);
    }

    #[test]
    fn test_schema_serde_roundtrip() {
        let schema = Schema::new("sales")
            .table(orders())
            .sequence(Sequence::new("orders_seq"))
            .procedure(Procedure::function("touch", "() RETURNS void AS $$ $$ LANGUAGE sql"));
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }
}

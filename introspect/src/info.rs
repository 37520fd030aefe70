//! Raw metadata as reported by an engine

use polydb_types::ColumnInfo;

/// Kind of a key or check constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintType {
    PrimaryKey,
    Unique,
    ForeignKey {
        references_schema: Option<String>,
        references: String,
        /// Empty when the engine leaves the referenced key implicit
        references_columns: Vec<String>,
        on_delete: Option<String>,
    },
    Check(String),
}

impl ConstraintType {
    /// Parse the `constraint_type` column of the metadata views
    pub(crate) fn from_metadata(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "PRIMARY KEY" | "P" => Some(Self::PrimaryKey),
            "UNIQUE" | "U" => Some(Self::Unique),
            _ => None,
        }
    }
}

/// Named constraint over one or more columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub name: String,
    pub kind: ConstraintType,
    /// Columns in key order
    pub columns: Vec<String>,
}

impl ConstraintInfo {
    #[must_use]
    pub fn is_foreign_key(&self) -> bool {
        matches!(self.kind, ConstraintType::ForeignKey { .. })
    }
}

/// Secondary index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

/// Table or view with its columns and constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableInfo {
    /// Namespace, `None` on engines without schemas
    pub schema: Option<String>,
    pub name: String,
    pub is_view: bool,
    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
    pub constraints: Vec<ConstraintInfo>,
    pub indexes: Vec<IndexInfo>,
    /// Column whose values the engine generates
    pub identity: Option<String>,
}

impl TableInfo {
    pub fn new(schema: Option<String>, name: impl Into<String>) -> Self {
        Self {
            schema,
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Primary key columns in key order, empty when the table has none
    #[must_use]
    pub fn primary_key(&self) -> &[String] {
        self.constraints
            .iter()
            .find(|c| c.kind == ConstraintType::PrimaryKey)
            .map_or(&[], |c| c.columns.as_slice())
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &ConstraintInfo> {
        self.constraints.iter().filter(|c| c.is_foreign_key())
    }

    /// Add a column to the named constraint, creating it on first sight
    pub(crate) fn push_constraint_column(
        &mut self,
        name: &str,
        kind: impl FnOnce() -> ConstraintType,
        column: String,
    ) -> &mut ConstraintInfo {
        let position = match self.constraints.iter().position(|c| c.name == name) {
            Some(position) => position,
            None => {
                self.constraints.push(ConstraintInfo {
                    name: name.to_string(),
                    kind: kind(),
                    columns: Vec::new(),
                });
                self.constraints.len() - 1
            }
        };
        let constraint = &mut self.constraints[position];
        constraint.columns.push(column);
        constraint
    }
}

/// Sequence or counter row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceInfo {
    pub schema: Option<String>,
    pub name: String,
    pub increment: i64,
    /// Last issued value, when the engine reports it
    pub current: Option<i64>,
    /// First value the sequence will hand out, when reported instead
    pub start: Option<i64>,
}

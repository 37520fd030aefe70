//! Reverse engineering introspected metadata into the schema model
//!
//! [`build_schema`] produces a fresh graph without foreign keys; call
//! [`attach_foreign_keys`] once every table is in place, since a key may
//! reference a table that appears later in the listing.

use std::fmt;

use polydb_core::{Column, Constraint, ForeignKey, Index, Schema, Sequence, Table, polydb_trace_skip};
use polydb_types::TypeFamily;

use crate::info::{ConstraintType, SequenceInfo, TableInfo};

/// Schema named `name` holding every introspected table
///
/// Views are left out: their definition text cannot be mapped back to a base
/// table and filter.
#[must_use]
pub fn build_schema(name: &str, infos: &[TableInfo]) -> Schema {
    infos
        .iter()
        .filter(|info| !info.is_view)
        .fold(Schema::new(name), |schema, info| {
            schema.table(build_table(name, info))
        })
}

/// One table with columns, keys, checks and indexes
#[must_use]
pub fn build_table(namespace: &str, info: &TableInfo) -> Table {
    let mut table = Table::new(&info.name);
    if let Some(schema) = &info.schema
        && !schema.eq_ignore_ascii_case(namespace)
    {
        table = table.in_schema(schema);
    }

    let primary_key = info.primary_key();
    let single_key = (primary_key.len() == 1).then(|| primary_key[0].as_str());

    for column_info in &info.columns {
        let mut column = Column::new(&column_info.name, column_info.semantic_type());
        if column_info.not_null {
            column = column.not_null();
        }
        if single_key.is_some_and(|key| key.eq_ignore_ascii_case(&column_info.name)) {
            column = column.primary_key();
        }
        let identity = info
            .identity
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(&column_info.name));
        if identity {
            column = column.auto_increment();
        } else if let Some(default) = &column_info.default_text {
            column = column.default(default);
        }
        table = table.column(column);
    }

    for constraint in &info.constraints {
        table = match &constraint.kind {
            ConstraintType::PrimaryKey if single_key.is_some() => continue,
            ConstraintType::PrimaryKey => table.constraint(Constraint::primary_key(
                &constraint.name,
                &constraint.columns,
            )),
            ConstraintType::Unique => {
                table.constraint(Constraint::unique(&constraint.name, &constraint.columns))
            }
            ConstraintType::Check(clause) => {
                table.constraint(Constraint::check(&constraint.name, clause))
            }
            ConstraintType::ForeignKey { .. } => continue,
        };
    }

    for index in &info.indexes {
        let mut model = Index::new(&index.name, &index.columns);
        if index.unique {
            model = model.unique();
        }
        table = table.index(model);
    }
    table
}

/// Add the introspected foreign keys to the tables of `schema`
///
/// Keys whose referenced table is not part of `schema` are skipped, as are
/// keys the table already declares. Returns the number of keys added.
pub fn attach_foreign_keys(schema: &mut Schema, infos: &[TableInfo]) -> usize {
    let mut attached = 0;
    for info in infos.iter().filter(|info| !info.is_view) {
        for constraint in info.foreign_keys() {
            let ConstraintType::ForeignKey {
                references,
                references_columns,
                on_delete,
                ..
            } = &constraint.kind
            else {
                continue;
            };

            let Some(target) = schema.find_table(references) else {
                polydb_trace_skip!(
                    constraint.name,
                    format!("referenced table {references} is not in the schema")
                );
                continue;
            };
            // SQLite leaves the referenced columns out when they are the key
            let target_columns = if references_columns.is_empty() {
                target
                    .primary_key()
                    .map(|key| vec![key.name.clone()])
                    .unwrap_or_default()
            } else {
                references_columns.clone()
            };
            let target_name = target.name.clone();

            let Some(table) = schema.find_table_mut(&info.name) else {
                continue;
            };
            if table
                .foreign_keys
                .iter()
                .any(|fk| fk.name.eq_ignore_ascii_case(&constraint.name))
            {
                continue;
            }

            let mut fk = ForeignKey::new(
                &constraint.name,
                &constraint.columns,
                target_name,
                target_columns,
            );
            if let Some(action) = on_delete {
                fk = fk.on_delete(action);
            }
            table.foreign_keys.push(fk);
            attached += 1;
        }
    }
    attached
}

/// Sequence mirrors for introspected sequences
///
/// When the engine only reports the next value to hand out, the mirror's
/// `current` is set one increment before it.
#[must_use]
pub fn sequences(infos: &[SequenceInfo]) -> Vec<Sequence> {
    infos
        .iter()
        .map(|info| {
            let increment = if info.increment == 0 { 1 } else { info.increment };
            let current = match (info.current, info.start) {
                (Some(current), _) => current,
                (None, Some(start)) if start > 1 => start - increment,
                _ => 0,
            };
            Sequence::new(&info.name).increment(increment).current(current)
        })
        .collect()
}

// =============================================================================
// Verification
// =============================================================================

/// Difference between a schema model and the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    MissingTable {
        table: String,
    },
    MissingColumn {
        table: String,
        column: String,
    },
    /// The database column classifies into a different type family
    TypeFamily {
        table: String,
        column: String,
        expected: TypeFamily,
        found: TypeFamily,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::MissingTable { table } => write!(f, "table {table} does not exist"),
            Mismatch::MissingColumn { table, column } => {
                write!(f, "column {table}.{column} does not exist")
            }
            Mismatch::TypeFamily {
                table,
                column,
                expected,
                found,
            } => write!(
                f,
                "column {table}.{column} is {found:?}, expected {expected:?}"
            ),
        }
    }
}

/// Compare every persisted column of `schema` with the database
///
/// Columns are matched by name case-insensitively and compared by type
/// family, since native forms lose size and storage detail.
#[must_use]
pub fn verify(schema: &Schema, infos: &[TableInfo]) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for table in &schema.tables {
        let Some(info) = infos
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(&table.name))
        else {
            mismatches.push(Mismatch::MissingTable {
                table: table.name.clone(),
            });
            continue;
        };
        for column in table.persisted_columns() {
            let Some(found) = info.column(&column.name) else {
                mismatches.push(Mismatch::MissingColumn {
                    table: table.name.clone(),
                    column: column.name.clone(),
                });
                continue;
            };
            let expected = column.data_type().family();
            let found = found.semantic_type().data_type.family();
            if expected != found {
                mismatches.push(Mismatch::TypeFamily {
                    table: table.name.clone(),
                    column: column.name.clone(),
                    expected,
                    found,
                });
            }
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::ConstraintInfo;
    use polydb_types::{ColumnInfo, DataType};

    fn orders() -> TableInfo {
        TableInfo {
            schema: Some("public".into()),
            name: "orders".into(),
            columns: vec![
                ColumnInfo::new("id", "integer").not_null(),
                ColumnInfo::new("customer_id", "bigint").not_null(),
                ColumnInfo::new("total", "numeric").precision(10, 2),
                ColumnInfo::new("note", "character varying")
                    .length(200)
                    .default_text("''::character varying"),
            ],
            constraints: vec![
                ConstraintInfo {
                    name: "orders_pkey".into(),
                    kind: ConstraintType::PrimaryKey,
                    columns: vec!["id".into()],
                },
                ConstraintInfo {
                    name: "fk_orders_customer".into(),
                    kind: ConstraintType::ForeignKey {
                        references_schema: Some("public".into()),
                        references: "customers".into(),
                        references_columns: Vec::new(),
                        on_delete: Some("CASCADE".into()),
                    },
                    columns: vec!["customer_id".into()],
                },
            ],
            identity: Some("id".into()),
            ..Default::default()
        }
    }

    fn customers() -> TableInfo {
        TableInfo {
            schema: Some("sales".into()),
            name: "customers".into(),
            columns: vec![ColumnInfo::new("id", "bigint").not_null()],
            constraints: vec![ConstraintInfo {
                name: "customers_pkey".into(),
                kind: ConstraintType::PrimaryKey,
                columns: vec!["id".into()],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_build_table_classifies_columns() {
        let table = build_table("public", &orders());
        assert_eq!(table.schema, None);
        let id = table.find_column("id").unwrap();
        assert!(id.primary_key && id.auto_increment);
        assert_eq!(id.data_type(), DataType::Int);

        let total = table.find_column("total").unwrap();
        assert_eq!((total.semantic.size, total.semantic.scale), (10, 2));
        assert_eq!(
            table.find_column("note").unwrap().default.as_deref(),
            Some("''::character varying")
        );
        assert!(table.constraints.is_empty());
        assert!(table.foreign_keys.is_empty());
    }

    #[test]
    fn test_foreign_keys_resolve_implicit_columns() {
        let infos = [orders(), customers()];
        let mut schema = build_schema("public", &infos);
        assert_eq!(
            schema.find_table("customers").unwrap().schema.as_deref(),
            Some("sales")
        );

        assert_eq!(attach_foreign_keys(&mut schema, &infos), 1);
        assert_eq!(attach_foreign_keys(&mut schema, &infos), 0);

        let fk = &schema.find_table("orders").unwrap().foreign_keys[0];
        assert_eq!(fk.references, "customers");
        assert_eq!(fk.references_columns, ["id"]);
        assert_eq!(fk.on_delete.as_deref(), Some("CASCADE"));
    }

    #[test]
    fn test_missing_reference_is_skipped() {
        let infos = [orders()];
        let mut schema = build_schema("public", &infos);
        assert_eq!(attach_foreign_keys(&mut schema, &infos), 0);
    }

    #[test]
    fn test_composite_key_becomes_constraint() {
        let info = TableInfo {
            name: "lines".into(),
            columns: vec![
                ColumnInfo::new("order_id", "INTEGER"),
                ColumnInfo::new("line", "INTEGER"),
            ],
            constraints: vec![ConstraintInfo {
                name: "pk_lines".into(),
                kind: ConstraintType::PrimaryKey,
                columns: vec!["order_id".into(), "line".into()],
            }],
            ..Default::default()
        };
        let table = build_table("", &info);
        assert!(table.columns.iter().all(|c| !c.primary_key));
        assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("order_id"));
    }

    #[test]
    fn test_verify_reports_differences() {
        let schema = Schema::new("public")
            .table(
                Table::new("orders")
                    .column(Column::new("id", DataType::BigInt).primary_key())
                    .column(Column::new("total", DataType::Bool))
                    .column(Column::new("shipped", DataType::DateTime)),
            )
            .table(Table::new("ghosts").column(Column::new("id", DataType::Int)));

        let mismatches = verify(&schema, &[orders()]);
        assert_eq!(
            mismatches,
            [
                Mismatch::TypeFamily {
                    table: "orders".into(),
                    column: "total".into(),
                    expected: TypeFamily::Boolean,
                    found: TypeFamily::Numeric,
                },
                Mismatch::MissingColumn {
                    table: "orders".into(),
                    column: "shipped".into(),
                },
                Mismatch::MissingTable {
                    table: "ghosts".into(),
                },
            ]
        );
        assert_eq!(mismatches[2].to_string(), "table ghosts does not exist");
    }

    #[test]
    fn test_sequence_mirrors() {
        let mirrors = sequences(&[
            SequenceInfo {
                schema: None,
                name: "order_numbers".into(),
                increment: 10,
                current: None,
                start: Some(1010),
            },
            SequenceInfo {
                schema: None,
                name: "customers_seq".into(),
                increment: 1,
                current: Some(4),
                start: None,
            },
        ]);
        assert_eq!(mirrors[0].current, 1000);
        assert_eq!(mirrors[0].start_value(), 1010);
        assert_eq!(mirrors[1].current, 4);
    }
}

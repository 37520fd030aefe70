//! Introspect command implementation
//!
//! Reads tables and sequences back from a live database and prints them as a
//! summary or as a schema file. With `--verify`, compares a schema file
//! against the database instead.

use std::path::PathBuf;

use polydb_core::{ConnectionDescriptor, Schema};
use polydb_drivers::Connection;
use polydb_introspect::{Introspector, SequenceInfo, TableInfo, reverse};
use polydb_types::DialectKind;

use crate::error::CliError;
use crate::input::{self, SchemaFormat};
use crate::output;

/// How introspected metadata is printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    /// Human-readable table listing
    #[default]
    Summary,
    /// Schema file in TOML
    Toml,
    /// Schema file in JSON
    Json,
}

#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    pub connection: ConnectionDescriptor,
    /// Namespace to read; the connection's default when absent
    pub schema: Option<String>,
    pub format: ReportFormat,
    /// Schema file to compare against the database
    pub verify: Option<PathBuf>,
}

/// Run the introspect command
pub fn run(opts: IntrospectOptions) -> Result<(), CliError> {
    match opts.connection.dialect {
        #[cfg(feature = "rusqlite")]
        DialectKind::Sqlite => {
            let mut conn = polydb_drivers::open_sqlite(&opts.connection)?;
            report(&mut conn, &opts)
        }
        #[cfg(feature = "postgres-sync")]
        DialectKind::PostgreSql => {
            let mut conn = polydb_drivers::open_postgres(&opts.connection)?;
            report(&mut conn, &opts)
        }
        other => Err(CliError::NoDriver(other.to_string())),
    }
}

/// Introspect through an open connection and print the result
pub fn report<C: Connection>(conn: &mut C, opts: &IntrospectOptions) -> Result<(), CliError> {
    let mut introspector = Introspector::new(conn);
    if let Some(schema) = &opts.schema {
        introspector = introspector.in_schema(schema);
    }
    let tables = introspector.tables()?;
    let sequences = introspector.sequences()?;

    if let Some(path) = &opts.verify {
        let expected = input::load_schema(path)?;
        return verify(&expected, &tables);
    }

    match opts.format {
        ReportFormat::Summary => {
            print!("{}", summary(&tables, &sequences));
            Ok(())
        }
        ReportFormat::Toml => print_schema(opts, &tables, &sequences, SchemaFormat::Toml),
        ReportFormat::Json => print_schema(opts, &tables, &sequences, SchemaFormat::Json),
    }
}

/// Schema model rebuilt from introspected metadata
pub fn rebuild(name: &str, tables: &[TableInfo], sequences: &[SequenceInfo]) -> Schema {
    let mut schema = reverse::build_schema(name, tables);
    reverse::attach_foreign_keys(&mut schema, tables);
    schema.sequences = reverse::sequences(sequences);
    schema
}

fn print_schema(
    opts: &IntrospectOptions,
    tables: &[TableInfo],
    sequences: &[SequenceInfo],
    format: SchemaFormat,
) -> Result<(), CliError> {
    let name = opts.schema.as_deref().unwrap_or_default();
    let schema = rebuild(name, tables, sequences);
    println!("{}", input::render_schema(&schema, format)?);
    Ok(())
}

fn verify(expected: &Schema, tables: &[TableInfo]) -> Result<(), CliError> {
    let mismatches = reverse::verify(expected, tables);
    for mismatch in &mismatches {
        println!("{} {}", output::status_error(), mismatch);
    }
    if mismatches.is_empty() {
        println!(
            "{} {} table(s) match the database",
            output::status_ok(),
            expected.tables.len()
        );
        Ok(())
    } else {
        Err(CliError::Other(format!(
            "{} difference(s) between the schema file and the database",
            mismatches.len()
        )))
    }
}

/// Human-readable listing of tables and sequences
pub fn summary(tables: &[TableInfo], sequences: &[SequenceInfo]) -> String {
    let mut out = String::new();
    for table in tables {
        let kind = if table.is_view { "view" } else { "table" };
        let name = match &table.schema {
            Some(schema) => format!("{schema}.{}", table.name),
            None => table.name.clone(),
        };
        out.push_str(&format!("{} {}\n", output::heading(&name), output::muted(kind)));

        for column in &table.columns {
            let mut flags = Vec::new();
            if table.primary_key().iter().any(|k| k.eq_ignore_ascii_case(&column.name)) {
                flags.push("PK");
            }
            if table
                .identity
                .as_deref()
                .is_some_and(|i| i.eq_ignore_ascii_case(&column.name))
            {
                flags.push("IDENTITY");
            }
            if column.not_null {
                flags.push("NOT NULL");
            }
            out.push_str(&format!(
                "  {:<24} {:<20} {:<16} {}\n",
                column.name,
                column.native_type,
                column.semantic_type().to_string(),
                flags.join(" ")
            ));
        }
        for constraint in &table.constraints {
            out.push_str(&format!(
                "  {} {} ({})\n",
                output::label(constraint_label(&constraint.kind)),
                constraint.name,
                constraint.columns.join(", ")
            ));
        }
        for index in &table.indexes {
            let label = if index.unique { "unique index" } else { "index" };
            out.push_str(&format!(
                "  {} {} ({})\n",
                output::label(label),
                index.name,
                index.columns.join(", ")
            ));
        }
    }
    for sequence in sequences {
        let position = match (sequence.current, sequence.start) {
            (Some(current), _) => format!("current {current}"),
            (None, Some(start)) => format!("start {start}"),
            (None, None) => String::from("unused"),
        };
        out.push_str(&format!(
            "{} {} {}\n",
            output::label("sequence"),
            sequence.name,
            output::muted(&format!("increment {}, {position}", sequence.increment))
        ));
    }
    out
}

fn constraint_label(kind: &polydb_introspect::ConstraintType) -> &'static str {
    use polydb_introspect::ConstraintType;
    match kind {
        ConstraintType::PrimaryKey => "primary key",
        ConstraintType::Unique => "unique",
        ConstraintType::ForeignKey { .. } => "foreign key",
        ConstraintType::Check(_) => "check",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polydb_introspect::{ConstraintInfo, ConstraintType};
    use polydb_types::ColumnInfo;

    fn notes() -> TableInfo {
        TableInfo {
            name: "notes".into(),
            columns: vec![
                ColumnInfo::new("id", "INTEGER").not_null(),
                ColumnInfo::new("body", "VARCHAR(200)"),
            ],
            constraints: vec![ConstraintInfo {
                name: "pk_notes".into(),
                kind: ConstraintType::PrimaryKey,
                columns: vec!["id".into()],
            }],
            identity: Some("id".into()),
            ..Default::default()
        }
    }

    #[test]
    fn summary_lists_columns_and_keys() {
        colored::control::set_override(false);
        let text = summary(
            &[notes()],
            &[SequenceInfo {
                schema: None,
                name: "order_numbers".into(),
                increment: 1,
                current: Some(1000),
                start: None,
            }],
        );
        assert!(text.contains("notes table"));
        assert!(text.contains("PK IDENTITY NOT NULL"));
        assert!(text.contains("primary key pk_notes (id)"));
        assert!(text.contains("sequence order_numbers increment 1, current 1000"));
    }

    #[test]
    fn rebuild_keeps_identity_and_sequences() {
        let schema = rebuild(
            "",
            &[notes()],
            &[SequenceInfo {
                schema: None,
                name: "s".into(),
                increment: 5,
                current: None,
                start: Some(21),
            }],
        );
        let id = schema.find_table("notes").unwrap().find_column("id").unwrap();
        assert!(id.primary_key && id.auto_increment);
        assert_eq!(schema.sequences[0].current, 16);
    }
}

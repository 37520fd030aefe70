//! DDL command implementation
//!
//! Generates a create, alter or drop script for a schema file.

use std::path::PathBuf;

use polydb_core::Schema;
use polydb_dialect::{DdlGenerator, DdlOp, DdlScript};
use polydb_types::DialectKind;

use crate::error::CliError;
use crate::input;
use crate::output;

#[derive(Debug, Clone)]
pub struct DdlOptions {
    pub schema_path: PathBuf,
    pub dialect: DialectKind,
    pub op: DdlOp,
    /// Replaces the namespace named in the schema file and qualifies every
    /// table that has none of its own
    pub namespace: Option<String>,
    /// Write the script to a file instead of stdout
    pub output_path: Option<PathBuf>,
}

/// Run the ddl command
pub fn run(opts: DdlOptions) -> Result<(), CliError> {
    let mut schema = input::load_schema(&opts.schema_path)?;
    if let Some(namespace) = opts.namespace {
        for table in schema.tables.iter_mut().filter(|t| t.schema.is_none()) {
            table.schema = Some(namespace.clone());
        }
        schema.name = namespace;
    }

    let script = generate(&schema, opts.dialect, opts.op)?;

    match opts.output_path {
        Some(path) => {
            std::fs::write(&path, script.to_text()).map_err(|e| {
                CliError::IoError(format!("Failed to write {}: {e}", path.display()))
            })?;
            println!(
                "{}",
                output::success(&format!(
                    "Wrote {} statement(s) for {} to {}",
                    script.len(),
                    opts.dialect,
                    path.display()
                ))
            );
        }
        None => print!("{}", script.to_text()),
    }
    Ok(())
}

/// Script for `schema` in `dialect`
pub fn generate(schema: &Schema, dialect: DialectKind, op: DdlOp) -> Result<DdlScript, CliError> {
    Ok(DdlGenerator::new(dialect).schema(op, schema)?)
}

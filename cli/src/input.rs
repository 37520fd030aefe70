//! Loading schema, connection and script files
//!
//! A path of `-` reads standard input.

use std::io::Read;
use std::path::Path;

use polydb_core::{ConnectionDescriptor, Schema};

use crate::error::CliError;

/// Serialization format of a schema file, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    Toml,
    Json,
}

impl SchemaFormat {
    /// `.json` files are JSON, everything else is TOML
    pub fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SchemaFormat::Json,
            _ => SchemaFormat::Toml,
        }
    }
}

/// Read a whole file, or standard input for `-`
pub fn read_text(path: &Path) -> Result<String, CliError> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| CliError::IoError(format!("Failed to read stdin: {e}")))?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .map_err(|e| CliError::IoError(format!("Failed to read {}: {e}", path.display())))
}

/// Parse schema text; display names left out of the file are filled in
pub fn parse_schema(text: &str, format: SchemaFormat) -> Result<Schema, String> {
    let mut schema: Schema = match format {
        SchemaFormat::Toml => toml::from_str(text).map_err(|e| e.message().to_string())?,
        SchemaFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string())?,
    };
    schema.fill_display_names();
    Ok(schema)
}

pub fn load_schema(path: &Path) -> Result<Schema, CliError> {
    let text = read_text(path)?;
    parse_schema(&text, SchemaFormat::of(path)).map_err(|message| CliError::InvalidFile {
        kind: "schema",
        path: path.display().to_string(),
        message,
    })
}

pub fn load_connection(path: &Path) -> Result<ConnectionDescriptor, CliError> {
    let text = read_text(path)?;
    let descriptor =
        ConnectionDescriptor::from_toml_str(&text).map_err(|e| CliError::InvalidFile {
            kind: "connection",
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    descriptor.validate()?;
    Ok(descriptor)
}

/// Serialize a schema in the given format
pub fn render_schema(schema: &Schema, format: SchemaFormat) -> Result<String, CliError> {
    match format {
        SchemaFormat::Toml => {
            toml::to_string_pretty(schema).map_err(|e| CliError::Other(e.to_string()))
        }
        SchemaFormat::Json => {
            serde_json::to_string_pretty(schema).map_err(|e| CliError::Other(e.to_string()))
        }
    }
}

//! Split command implementation
//!
//! Splits a script on the dialect's batch-separator lines.

use std::path::PathBuf;

use polydb_dialect::split_script;
use polydb_types::DialectKind;

use crate::error::CliError;
use crate::input;
use crate::output;

#[derive(Debug, Clone)]
pub struct SplitOptions {
    pub script_path: PathBuf,
    pub dialect: DialectKind,
    /// Print a JSON array of statements
    pub json: bool,
}

/// Run the split command
pub fn run(opts: SplitOptions) -> Result<(), CliError> {
    let text = input::read_text(&opts.script_path)?;
    let statements = split_script(&text, opts.dialect);

    if opts.json {
        let rendered =
            serde_json::to_string_pretty(&statements).map_err(|e| CliError::Other(e.to_string()))?;
        println!("{rendered}");
        return Ok(());
    }

    for (i, statement) in statements.iter().enumerate() {
        println!("{}", output::muted(&format!("-- statement {}", i + 1)));
        println!("{statement}");
    }
    Ok(())
}

//! Inspect-type command implementation
//!
//! Classifies native type text into the semantic type model and, for each
//! requested dialect, shows the native type it maps back to.

use polydb_dialect::DialectTableExt;
use polydb_types::{DialectKind, SemanticType, parse_native_type};

use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, Default)]
pub struct InspectTypeOptions {
    pub native_type: String,
    pub length: Option<i64>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    /// Dialects to format the classified type for; empty means all
    pub dialects: Vec<DialectKind>,
}

/// Run the inspect-type command
pub fn run(opts: InspectTypeOptions) -> Result<(), CliError> {
    let semantic = classify(&opts);
    println!("{}: {}", output::label("Semantic type"), semantic);
    println!("{}: {:?}", output::label("Family"), semantic.data_type.family());

    let dialects = if opts.dialects.is_empty() {
        DialectKind::ALL.to_vec()
    } else {
        opts.dialects
    };
    for dialect in dialects {
        match dialect.table().format_type(semantic) {
            Ok(native) => println!("  {:<10} {}", dialect.as_str(), native),
            Err(e) => println!("  {:<10} {}", dialect.as_str(), output::muted(&e.to_string())),
        }
    }
    Ok(())
}

pub fn classify(opts: &InspectTypeOptions) -> SemanticType {
    parse_native_type(&opts.native_type, opts.length, opts.precision, opts.scale)
}

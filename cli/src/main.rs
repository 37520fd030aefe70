//! polydb CLI - Main entry point

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use polydb_cli::commands::{ddl, inspect_type, introspect, split};
use polydb_cli::error::CliError;
use polydb_cli::input;
use polydb_core::ConnectionDescriptor;
use polydb_dialect::DdlOp;
use polydb_types::DialectKind;

/// polydb - Multi-dialect DDL generation and introspection
#[derive(Parser, Debug)]
#[command(name = "polydb")]
#[command(author, version, about = "Multi-dialect DDL generation and introspection", long_about = None)]
struct Cli {
    /// Log generated statements and introspection queries to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a DDL script from a schema file
    Ddl {
        /// Schema file (TOML, or JSON with a .json extension); `-` reads stdin
        schema: PathBuf,

        /// Target dialect (generic, postgresql, mssql, oracle, sqlite)
        #[arg(short, long, value_parser = parse_dialect, env = "POLYDB_DIALECT")]
        dialect: DialectKind,

        /// Operation to generate
        #[arg(long, value_enum, default_value_t = OpArg::Create)]
        op: OpArg,

        /// Namespace for every object, replacing the schema file's name
        #[arg(long)]
        namespace: Option<String>,

        /// Write the script to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Split a script into statements on the dialect's batch separator
    Split {
        /// Script file; `-` reads stdin
        script: PathBuf,

        /// Dialect whose batch separator to split on
        #[arg(short, long, value_parser = parse_dialect, env = "POLYDB_DIALECT")]
        dialect: DialectKind,

        /// Print the statements as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Read tables and sequences back from a database
    Introspect {
        /// SQLite database file
        #[arg(long, conflicts_with = "connection")]
        sqlite: Option<PathBuf>,

        /// Connection file (TOML connection descriptor)
        #[arg(short, long, env = "POLYDB_CONNECTION")]
        connection: Option<PathBuf>,

        /// Namespace to read
        #[arg(long)]
        schema: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: introspect::ReportFormat,

        /// Compare a schema file against the database instead of printing it
        #[arg(long, value_name = "SCHEMA_FILE")]
        verify: Option<PathBuf>,
    },

    /// Classify native type text into the semantic type model
    InspectType {
        /// Native type text, e.g. "NUMBER(10,0)" or "character varying"
        native_type: String,

        /// Length reported separately from the type text (-1 for MAX)
        #[arg(long, allow_hyphen_values = true)]
        length: Option<i64>,

        /// Precision reported separately from the type text
        #[arg(long)]
        precision: Option<u32>,

        /// Scale reported separately from the type text
        #[arg(long)]
        scale: Option<u32>,

        /// Dialects to show the mapped native type for (default: all)
        #[arg(short, long, value_parser = parse_dialect, value_delimiter = ',')]
        dialect: Vec<DialectKind>,
    },
}

/// DDL operation argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OpArg {
    Create,
    Alter,
    Drop,
}

impl From<OpArg> for DdlOp {
    fn from(op: OpArg) -> Self {
        match op {
            OpArg::Create => DdlOp::Create,
            OpArg::Alter => DdlOp::Alter,
            OpArg::Drop => DdlOp::Drop,
        }
    }
}

/// Parse dialect argument
fn parse_dialect(s: &str) -> Result<DialectKind, String> {
    s.parse().map_err(|e: polydb_types::DialectParseError| e.to_string())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg(feature = "tracing")]
    setup_logging(cli.verbose);
    #[cfg(not(feature = "tracing"))]
    let _ = cli.verbose;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "tracing")]
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Ddl {
            schema,
            dialect,
            op,
            namespace,
            out,
        } => ddl::run(ddl::DdlOptions {
            schema_path: schema,
            dialect,
            op: op.into(),
            namespace,
            output_path: out,
        }),
        Command::Split {
            script,
            dialect,
            json,
        } => split::run(split::SplitOptions {
            script_path: script,
            dialect,
            json,
        }),
        Command::Introspect {
            sqlite,
            connection,
            schema,
            format,
            verify,
        } => {
            let connection = match (sqlite, connection) {
                (Some(path), _) if !path.exists() => {
                    return Err(CliError::IoError(format!(
                        "{} does not exist",
                        path.display()
                    )));
                }
                (Some(path), _) => ConnectionDescriptor::sqlite(path),
                (None, Some(path)) => input::load_connection(&path)?,
                (None, None) => {
                    return Err(CliError::Other(
                        "introspect needs --sqlite <FILE> or --connection <FILE>".to_string(),
                    ));
                }
            };
            introspect::run(introspect::IntrospectOptions {
                connection,
                schema,
                format,
                verify,
            })
        }
        Command::InspectType {
            native_type,
            length,
            precision,
            scale,
            dialect,
        } => inspect_type::run(inspect_type::InspectTypeOptions {
            native_type,
            length,
            precision,
            scale,
            dialects: dialect,
        }),
    }
}

//! Connection descriptors
//!
//! A descriptor is loaded from TOML and handed to a driver opener. Which
//! fields apply depends on the engine: SQLite only reads `path`, network
//! engines read host/port/database/credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use polydb_types::DialectKind;
use serde::{Deserialize, Serialize};

use crate::{Fault, Result};

fn default_true() -> bool {
    true
}

// ============================================================================
// ConnectionDescriptor
// ============================================================================

/// Engine-independent connection settings
///
/// # Examples
///
/// ```
/// use polydb_core::ConnectionDescriptor;
/// use polydb_types::DialectKind;
///
/// let desc = ConnectionDescriptor::from_toml_str(r#"
///     dialect = "postgres"
///     host = "db.internal"
///     database = "ledger"
///     user = "app"
/// "#).unwrap();
///
/// assert_eq!(desc.dialect, DialectKind::PostgreSql);
/// assert_eq!(desc.port(), 5432);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionDescriptor {
    pub dialect: DialectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, rename = "port", skip_serializing_if = "Option::is_none")]
    pub port_number: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Authenticate with the operating-system identity instead of user/password
    #[serde(default)]
    pub integrated_security: bool,
    #[serde(default = "default_true")]
    pub pooling: bool,
    /// Connect timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub encrypt: bool,
    /// Default namespace for unqualified objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Database file for file-based engines; absent means in-memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ConnectionDescriptor {
    #[must_use]
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            host: None,
            port_number: None,
            database: None,
            user: None,
            password: None,
            integrated_security: false,
            pooling: true,
            timeout: None,
            encrypt: false,
            schema: None,
            path: None,
        }
    }

    /// SQLite database stored at `path`
    #[must_use]
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(DialectKind::Sqlite)
        }
    }

    /// In-memory SQLite database
    #[must_use]
    pub fn sqlite_memory() -> Self {
        Self::new(DialectKind::Sqlite)
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port_number = Some(port);
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// Parse and validate a TOML descriptor
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let desc: Self = toml::from_str(text).map_err(|e| Fault::Config(e.to_string()))?;
        desc.validate()?;
        Ok(desc)
    }

    /// Load and validate a TOML descriptor file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Fault::Config(format!("{}: {e}", path.display())))
    }

    /// Check that the fields the engine needs are present
    pub fn validate(&self) -> Result<()> {
        let missing = |field: &str| {
            Err(Fault::Config(format!(
                "{} connection requires '{field}'",
                self.dialect
            )))
        };

        match self.dialect {
            DialectKind::Sqlite => Ok(()),
            _ if self.host.is_none() => missing("host"),
            DialectKind::PostgreSql | DialectKind::MsSql if self.database.is_none() => {
                missing("database")
            }
            _ if !self.integrated_security && self.user.is_none() => missing("user"),
            _ => Ok(()),
        }
    }

    /// Port, falling back to the engine's default
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port_number.unwrap_or(match self.dialect {
            DialectKind::PostgreSql => 5432,
            DialectKind::MsSql => 1433,
            DialectKind::Oracle => 1521,
            DialectKind::Generic | DialectKind::Sqlite => 0,
        })
    }

    #[must_use]
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Returns `true` when no file is configured for a file-based engine
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.dialect.is_file_based() && self.path.is_none()
    }
}

//! Closed set of supported database dialects
//!
//! Every engine-specific decision in polydb is keyed by [`DialectKind`]. The
//! per-dialect rule tables themselves live in `polydb-dialect`; this crate only
//! names the dialects so that the type model and the reverse mapper can stay
//! engine-agnostic.

/// Database engine family
///
/// # Examples
///
/// ```
/// use polydb_types::DialectKind;
///
/// assert_eq!(DialectKind::parse("pg"), Some(DialectKind::PostgreSql));
/// assert_eq!(DialectKind::parse("sqlserver"), Some(DialectKind::MsSql));
/// assert!(DialectKind::Sqlite.is_file_based());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DialectKind {
    /// Generic ANSI-ish dialect, used when no engine-specific rule applies
    #[default]
    Generic,

    /// PostgreSQL - `:name` parameters, native sequences and large objects
    #[cfg_attr(feature = "serde", serde(alias = "postgres", alias = "pg"))]
    PostgreSql,

    /// Microsoft SQL Server - `@name` parameters, `GO` batches
    #[cfg_attr(feature = "serde", serde(alias = "sqlserver"))]
    MsSql,

    /// Oracle - `:name` parameters, `/` batches, no BIGINT keyword
    Oracle,

    /// SQLite - file based, no sequences, no transactional ALTER for constraints
    Sqlite,
}

impl DialectKind {
    /// All dialects, in declaration order
    pub const ALL: [DialectKind; 5] = [
        DialectKind::Generic,
        DialectKind::PostgreSql,
        DialectKind::MsSql,
        DialectKind::Oracle,
        DialectKind::Sqlite,
    ];

    /// Parse a dialect from a string (case-insensitive)
    ///
    /// Supports common aliases:
    /// - Generic: `"generic"`, `"default"`, `"ansi"`
    /// - PostgreSQL: `"postgresql"`, `"postgres"`, `"pg"`, `"npgsql"`
    /// - SQL Server: `"mssql"`, `"sqlserver"`, `"tsql"`
    /// - Oracle: `"oracle"`
    /// - SQLite: `"sqlite"`, `"sqlite3"`
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let is = |alias: &str| s.eq_ignore_ascii_case(alias);
        if is("generic") || is("default") || is("ansi") {
            Some(DialectKind::Generic)
        } else if is("postgresql") || is("postgres") || is("pg") || is("npgsql") {
            Some(DialectKind::PostgreSql)
        } else if is("mssql") || is("sqlserver") || is("tsql") {
            Some(DialectKind::MsSql)
        } else if is("oracle") {
            Some(DialectKind::Oracle)
        } else if is("sqlite") || is("sqlite3") {
            Some(DialectKind::Sqlite)
        } else {
            None
        }
    }

    /// Lowercase dialect name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DialectKind::Generic => "generic",
            DialectKind::PostgreSql => "postgresql",
            DialectKind::MsSql => "mssql",
            DialectKind::Oracle => "oracle",
            DialectKind::Sqlite => "sqlite",
        }
    }

    /// Returns `true` for engines whose database is a single local file
    #[inline]
    #[must_use]
    pub const fn is_file_based(&self) -> bool {
        matches!(self, DialectKind::Sqlite)
    }

    /// Returns `true` if introspection goes through ANSI `information_schema` views
    #[inline]
    #[must_use]
    pub const fn uses_information_schema(&self) -> bool {
        matches!(
            self,
            DialectKind::Generic | DialectKind::PostgreSql | DialectKind::MsSql
        )
    }
}

impl core::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for DialectKind {
    type Err = DialectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DialectKind::parse(s).ok_or_else(|| DialectParseError(s.to_string()))
    }
}

/// Error returned when parsing an unknown dialect string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectParseError(pub String);

impl core::fmt::Display for DialectParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown dialect '{}'", self.0)
    }
}

impl std::error::Error for DialectParseError {}

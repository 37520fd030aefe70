use polydb_types::{DataType, DialectKind, ValueKind};
use thiserror::Error;

/// Boxed engine error kept as the source of [`Fault::Engine`]
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Fault {
    /// The dialect has no native type template for a semantic type
    #[error("Missing type mapping: {dialect} has no native type for {data_type}")]
    MissingTypeMapping {
        dialect: DialectKind,
        data_type: DataType,
    },

    /// Update or delete requested for a table without a primary key
    #[error("Missing primary key: table {table} has no primary key column")]
    MissingPrimaryKey { table: String },

    /// The dialect cannot express the requested operation
    #[error("Unsupported: {operation} is not supported by {dialect}")]
    Unsupported {
        dialect: DialectKind,
        operation: String,
    },

    /// Invalid connection descriptor or schema-model input
    #[error("Configuration error: {0}")]
    Config(String),

    /// A native value has no conversion to the declared column type
    #[error("Invalid cast: cannot read {from} as {to} for column {column}")]
    InvalidCast {
        column: String,
        from: ValueKind,
        to: DataType,
    },

    /// Error raised by the database engine or its driver
    #[error("{message}")]
    Engine {
        message: String,
        #[source]
        source: Option<EngineError>,
    },

    /// Filesystem error (temporary large-object files, config files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Fault {
    /// Wrap a driver error, keeping it as the source
    pub fn engine<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Fault::Engine {
            message: crate::normalize::flatten(&error),
            source: Some(Box::new(error)),
        }
    }

    /// Engine error carrying only a message
    pub fn engine_message(message: impl Into<String>) -> Self {
        Fault::Engine {
            message: message.into(),
            source: None,
        }
    }

    /// Translate identifiers in an engine message to schema display names
    #[must_use]
    pub fn with_display_names(self, schema: &crate::schema::Schema) -> Self {
        match self {
            Fault::Engine { message, source } => Fault::Engine {
                message: crate::normalize::substitute_display_names(&message, schema),
                source,
            },
            other => other,
        }
    }

    /// Shorthand for [`Fault::Unsupported`]
    pub fn unsupported(dialect: DialectKind, operation: impl Into<String>) -> Self {
        Fault::Unsupported {
            dialect,
            operation: operation.into(),
        }
    }

    /// Configuration errors are fatal and surface immediately
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Fault::MissingTypeMapping { .. }
                | Fault::MissingPrimaryKey { .. }
                | Fault::Unsupported { .. }
                | Fault::Config(_)
        )
    }

    #[must_use]
    pub fn is_coercion(&self) -> bool {
        matches!(self, Fault::InvalidCast { .. })
    }

    #[must_use]
    pub fn is_engine(&self) -> bool {
        matches!(self, Fault::Engine { .. })
    }
}

/// Result type for polydb operations
pub type Result<T> = std::result::Result<T, Fault>;

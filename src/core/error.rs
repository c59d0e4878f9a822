//! Error types for the ORM layer
//!
//! This module defines all error types that can occur while declaring schemas,
//! assigning field values, compiling queries and talking to a backend.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Null assigned to a field that is not nullable
    #[error("Field '{field}' is required and cannot be null")]
    ValidationError { field: String },

    /// Value of the wrong kind assigned to a field
    #[error("Field '{field}' expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Column referenced by a record, filter, ordering or aggregate is not declared
    #[error("Field '{field}' does not exist on schema '{schema}'")]
    FieldNotFound { field: String, schema: String },

    /// Connection descriptor could not be resolved to a backend
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Connection error (connect failure or use of a closed backend)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// PostgreSQL error
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    PostgresError(#[from] tokio_postgres::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create a validation error for a required field
    pub fn validation(field: impl Into<String>) -> Self {
        DatabaseError::ValidationError {
            field: field.into(),
        }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(field: &str, expected: &str, actual: &str) -> Self {
        DatabaseError::TypeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a field not found error
    pub fn field_not_found(field: impl Into<String>, schema: impl Into<String>) -> Self {
        DatabaseError::FieldNotFound {
            field: field.into(),
            schema: schema.into(),
        }
    }

    /// Create an error for a connection scheme no backend handles
    pub fn unsupported_scheme(scheme: &str) -> Self {
        DatabaseError::ConfigurationError(format!("Unsupported database scheme: '{}'", scheme))
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConfigurationError(msg.into())
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConnectionError(msg.into())
    }

    /// Create the error returned when a closed backend is used
    pub fn not_connected() -> Self {
        DatabaseError::ConnectionError("Not connected to database".to_string())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }
}

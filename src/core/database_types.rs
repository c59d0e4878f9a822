//! SQL dialect definitions
//!
//! This module defines the dialects supported by the system together with the
//! dialect-specific pieces of SQL the rest of the crate needs: the positional
//! parameter token, column storage types and the unbounded LIMIT literal.

use super::error::DatabaseError;
use super::field::FieldKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported database dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    /// Embedded SQLite database (file or in-memory)
    Sqlite,
    /// PostgreSQL client-server database
    Postgres,
}

impl DatabaseType {
    /// Convert database type to string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Postgres => "postgres",
        }
    }

    /// Positional parameter token for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            DatabaseType::Sqlite => "?".to_string(),
            DatabaseType::Postgres => format!("${}", index),
        }
    }

    /// Column storage type used for a field kind
    pub fn column_type(&self, kind: FieldKind) -> &'static str {
        match (self, kind) {
            (DatabaseType::Sqlite, FieldKind::Integer) => "INTEGER",
            (DatabaseType::Sqlite, FieldKind::Text) => "TEXT",
            (DatabaseType::Sqlite, FieldKind::Real) => "REAL",
            (DatabaseType::Postgres, FieldKind::Integer) => "BIGINT",
            (DatabaseType::Postgres, FieldKind::Text) => "TEXT",
            (DatabaseType::Postgres, FieldKind::Real) => "DOUBLE PRECISION",
        }
    }

    /// LIMIT literal meaning "no limit", needed when only an OFFSET is set
    pub fn unbounded_limit(&self) -> &'static str {
        match self {
            DatabaseType::Sqlite => "-1",
            DatabaseType::Postgres => "ALL",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for DatabaseType {
    type Err = DatabaseError;

    /// Resolve a connection descriptor scheme
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            _ => Err(DatabaseError::unsupported_scheme(s)),
        }
    }
}

/// Quote an SQL identifier, doubling any embedded double quote
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

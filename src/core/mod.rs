//! Core ORM types and traits
//!
//! This module provides the fundamental building blocks of the ORM: values and
//! errors, field and schema declarations, the schema registry, records,
//! queries, the backend contract and the [`Database`] facade.

pub mod backend;
pub mod connection;
pub mod database;
pub mod database_types;
pub mod error;
pub mod expression;
pub mod field;
pub mod query;
pub mod record;
pub mod registry;
pub mod schema;
pub mod value;

// Re-export commonly used types
pub use backend::{Backend, Cursor};
pub use connection::{ConnectOptions, ConnectionBuilder, ConnectionDescriptor};
pub use database::Database;
pub use database_types::{quote_identifier, DatabaseType};
pub use error::{DatabaseError, Result};
pub use expression::{CompareOp, Comparison};
pub use field::{Field, FieldDefault, FieldKind};
pub use query::{OrderDirection, Query, Records};
pub use record::Record;
pub use schema::{Schema, SchemaBuilder};
pub use value::{DatabaseRow, DatabaseValue};

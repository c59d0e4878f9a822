//! Database facade
//!
//! [`Database`] owns exactly one connected [`Backend`] and is the entry point
//! for table creation, raw statements, transactions and query building.
//!
//! ```rust,no_run
//! use atomsql::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let user = Schema::builder("User")
//!         .field("name", Field::text())
//!         .field("age", Field::integer())
//!         .build();
//!
//!     let mut db = Database::connect("sqlite:///app.db")?;
//!     db.register(&user)?;
//!
//!     Record::with_values(&user, [("name", "Alice".into()), ("age", 25.into())])?
//!         .save(&mut db)?;
//!     db.commit()?;
//!
//!     let adults = db.query(&user).filter_expr(user.require_field("age")?.ge(18)).all()?;
//!     println!("{} adults", adults.len());
//!     db.close()
//! }
//! ```

use super::backend::{Backend, Cursor};
use super::connection::{ConnectOptions, ConnectionDescriptor};
use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use super::query::Query;
use super::registry;
use super::schema::Schema;
use super::value::DatabaseValue;
use std::sync::Arc;

/// Environment variable read by [`Database::from_env`]
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Facade over one backend connection
///
/// Every method takes `&mut self`, so use from several threads has to be
/// serialized by the caller.
pub struct Database {
    backend: Box<dyn Backend>,
}

impl Database {
    /// Connect using a descriptor such as `sqlite:///app.db` or `postgres://…`
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` if the scheme is not supported
    /// - `ConnectionError` if the backend cannot connect
    pub fn connect(uri: &str) -> Result<Self> {
        Self::connect_with(uri, &ConnectOptions::default())
    }

    /// Connect with explicit driver options
    pub fn connect_with(uri: &str, options: &ConnectOptions) -> Result<Self> {
        let descriptor = ConnectionDescriptor::parse(uri)?;
        let backend = backend_for(&descriptor)?;
        Self::with_backend(backend, options)
    }

    /// Connect using the descriptor stored in `DATABASE_URL`
    pub fn from_env() -> Result<Self> {
        let uri = std::env::var(DATABASE_URL_ENV).map_err(|_| {
            DatabaseError::configuration(format!("{} is not set", DATABASE_URL_ENV))
        })?;
        Self::connect(&uri)
    }

    /// Connect a caller-supplied backend and wrap it
    pub fn with_backend(mut backend: Box<dyn Backend>, options: &ConnectOptions) -> Result<Self> {
        backend.connect(options)?;
        tracing::info!("Connected to {} backend", backend.database_type());
        Ok(Self { backend })
    }

    /// Dialect of the underlying backend
    pub fn database_type(&self) -> DatabaseType {
        self.backend.database_type()
    }

    /// Check if the backend is connected
    pub fn is_connected(&self) -> bool {
        self.backend.is_connected()
    }

    /// Positional parameter token for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        self.backend.placeholder(index)
    }

    /// Create the table for `schema` if it does not exist, then commit
    pub fn register(&mut self, schema: &Schema) -> Result<()> {
        let sql = schema.create_table_sql(self.database_type());
        self.execute(&sql, &[])?;
        self.commit()?;
        tracing::info!(
            "Registered schema {} to table {}",
            schema.name(),
            schema.table_name()
        );
        Ok(())
    }

    /// Register every schema in the process-wide registry
    pub fn create_all(&mut self) -> Result<()> {
        for schema in registry::registered() {
            self.register(&schema)?;
        }
        Ok(())
    }

    /// Run a raw parameterized statement
    pub fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> Result<Cursor> {
        tracing::debug!("Executing {} with {} parameter(s)", sql, params.len());
        self.backend.execute(sql, params)
    }

    /// Commit everything executed since the last commit
    pub fn commit(&mut self) -> Result<()> {
        self.backend.commit()
    }

    /// Discard everything executed since the last commit
    pub fn rollback(&mut self) -> Result<()> {
        self.backend.rollback()
    }

    /// Close the connection
    pub fn close(&mut self) -> Result<()> {
        self.backend.close()?;
        tracing::info!("Closed {} backend", self.backend.database_type());
        Ok(())
    }

    /// Start a query over the table of `schema`
    pub fn query(&mut self, schema: &Arc<Schema>) -> Query<'_> {
        Query::new(Arc::clone(schema), self)
    }
}

fn backend_for(descriptor: &ConnectionDescriptor) -> Result<Box<dyn Backend>> {
    match descriptor.database_type() {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Ok(Box::new(crate::backends::SqliteBackend::new(
            descriptor.target(),
        ))),
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => Ok(Box::new(crate::backends::PostgresBackend::new(
            descriptor.target(),
        ))),
        #[allow(unreachable_patterns)]
        other => Err(DatabaseError::configuration(format!(
            "{} support is not enabled in this build",
            other
        ))),
    }
}

//! SQLite database backend implementation
//!
//! This module provides a SQLite implementation of the [`Backend`] trait on
//! top of `rusqlite`. The driver is synchronous, so every call maps directly
//! onto one driver call.

use crate::core::backend::{opens_transaction, Backend, Cursor};
use crate::core::connection::ConnectOptions;
use crate::core::database_types::DatabaseType;
use crate::core::error::{DatabaseError, Result};
use crate::core::value::{DatabaseRow, DatabaseValue};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Row};

/// SQLite backend over a file path or `:memory:`
pub struct SqliteBackend {
    path: String,
    connection: Option<Connection>,
}

impl SqliteBackend {
    /// Create a backend for `path`; nothing is opened until [`Backend::connect`]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            connection: None,
        }
    }

    /// Database file path handed to the driver
    pub fn path(&self) -> &str {
        &self.path
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(DatabaseError::not_connected)
    }

    /// Convert a rusqlite row to a DatabaseRow
    fn row_to_database_row(row: &Row, column_count: usize) -> rusqlite::Result<DatabaseRow> {
        (0..column_count)
            .map(|i| {
                Ok(match row.get_ref(i)? {
                    ValueRef::Null => DatabaseValue::Null,
                    ValueRef::Integer(v) => DatabaseValue::Integer(v),
                    ValueRef::Real(v) => DatabaseValue::Real(v),
                    ValueRef::Text(v) | ValueRef::Blob(v) => {
                        DatabaseValue::Text(String::from_utf8_lossy(v).into_owned())
                    }
                })
            })
            .collect()
    }

    /// Convert DatabaseValue to rusqlite parameter
    fn value_to_param(value: &DatabaseValue) -> Value {
        match value {
            DatabaseValue::Null => Value::Null,
            DatabaseValue::Integer(v) => Value::Integer(*v),
            DatabaseValue::Real(v) => Value::Real(*v),
            DatabaseValue::Text(v) => Value::Text(v.clone()),
        }
    }
}

impl Backend for SqliteBackend {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    fn connect(&mut self, options: &ConnectOptions) -> Result<()> {
        // Drop any previous connection first
        self.connection = None;

        let conn = Connection::open(&self.path).map_err(|e| {
            DatabaseError::connection(format!("Failed to open '{}': {}", self.path, e))
        })?;
        conn.busy_timeout(options.timeout)
            .map_err(|e| DatabaseError::connection(e.to_string()))?;

        tracing::debug!("Opened SQLite database {}", self.path);
        self.connection = Some(conn);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> Result<Cursor> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;

        if opens_transaction(sql) && conn.is_autocommit() {
            conn.execute_batch("BEGIN")?;
        }

        let values: Vec<Value> = params.iter().map(Self::value_to_param).collect();

        let column_count = stmt.column_count();
        if column_count == 0 {
            let affected = stmt.execute(params_from_iter(values.iter()))?;
            return Ok(Cursor::affected(affected as u64));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Self::row_to_database_row(row, column_count)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Cursor::from_rows(columns, rows))
    }

    fn commit(&mut self) -> Result<()> {
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.connection.take() {
            conn.close().map_err(|(_, e)| DatabaseError::from(e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> SqliteBackend {
        let mut backend = SqliteBackend::new(":memory:");
        backend.connect(&ConnectOptions::default()).unwrap();
        backend
    }

    #[test]
    fn test_sqlite_connect() {
        let mut backend = SqliteBackend::new(":memory:");
        assert!(!backend.is_connected());
        assert_eq!(backend.path(), ":memory:");

        backend.connect(&ConnectOptions::default()).unwrap();
        assert!(backend.is_connected());
        assert_eq!(backend.placeholder(3), "?");

        backend.close().unwrap();
        assert!(!backend.is_connected());
        // closing twice is harmless
        backend.close().unwrap();
    }

    #[test]
    fn test_sqlite_connect_failure() {
        let mut backend = SqliteBackend::new("/nonexistent-dir/for/sure/app.db");
        let err = backend.connect(&ConnectOptions::default()).unwrap_err();
        assert!(matches!(err, DatabaseError::ConnectionError(_)));
        assert!(!backend.is_connected());
    }

    #[test]
    fn test_sqlite_execute_and_query() -> Result<()> {
        let mut backend = connected();
        backend.execute("CREATE TABLE t (a INTEGER, b TEXT, c REAL)", &[])?;

        let cursor = backend.execute(
            "INSERT INTO t (a, b, c) VALUES (?, ?, ?)",
            &[1.into(), "one".into(), DatabaseValue::Null],
        )?;
        assert_eq!(cursor.rows_affected(), 1);

        let mut cursor = backend.execute("SELECT a, b, c FROM t WHERE a = ?", &[1.into()])?;
        assert_eq!(cursor.columns(), ["a", "b", "c"]);
        assert_eq!(
            cursor.fetch_one(),
            Some(vec![
                DatabaseValue::Integer(1),
                DatabaseValue::Text("one".into()),
                DatabaseValue::Null,
            ])
        );
        assert_eq!(cursor.fetch_one(), None);
        Ok(())
    }

    #[test]
    fn test_sqlite_implicit_transaction() -> Result<()> {
        let mut backend = connected();
        backend.execute("CREATE TABLE t (a INTEGER)", &[])?;
        // DDL leaves autocommit on
        assert!(backend.connection()?.is_autocommit());

        backend.execute("INSERT INTO t (a) VALUES (?)", &[1.into()])?;
        assert!(!backend.connection()?.is_autocommit());
        backend.commit()?;
        assert!(backend.connection()?.is_autocommit());

        backend.execute("INSERT INTO t (a) VALUES (?)", &[2.into()])?;
        backend.rollback()?;

        let mut cursor = backend.execute("SELECT COUNT(*) FROM t", &[])?;
        assert_eq!(cursor.fetch_one(), Some(vec![DatabaseValue::Integer(1)]));

        // nothing pending
        backend.commit()?;
        backend.rollback()?;
        Ok(())
    }

    #[test]
    fn test_sqlite_driver_error_propagates() {
        let mut backend = connected();
        let err = backend.execute("SELEC nonsense", &[]).unwrap_err();
        assert!(matches!(err, DatabaseError::SqliteError(_)));
        // a failed prepare does not open a transaction
        assert!(backend.connection().unwrap().is_autocommit());
    }

    #[test]
    fn test_sqlite_requires_connection() {
        let mut backend = SqliteBackend::new(":memory:");
        assert!(matches!(
            backend.execute("SELECT 1", &[]),
            Err(DatabaseError::ConnectionError(_))
        ));
        assert!(matches!(
            backend.commit(),
            Err(DatabaseError::ConnectionError(_))
        ));
    }
}

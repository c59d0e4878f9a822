//! Backend trait and result cursor
//!
//! This module defines the contract every database driver adapter implements.
//! All calls are blocking: they return once the underlying driver has finished.

use super::connection::ConnectOptions;
use super::database_types::DatabaseType;
use super::error::Result;
use super::value::{DatabaseRow, DatabaseValue};
use std::collections::VecDeque;

/// Uniform lifecycle over one database connection
///
/// Transactions are implicit: the first data-modifying statement opens one
/// (see [`opens_transaction`]), and [`commit`](Backend::commit) flushes
/// everything executed since the previous commit. Using a backend that is not connected fails with
/// `ConnectionError`.
pub trait Backend: Send {
    /// Dialect spoken by this backend
    fn database_type(&self) -> DatabaseType;

    /// Establish the connection
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` when the driver cannot connect.
    fn connect(&mut self, options: &ConnectOptions) -> Result<()>;

    /// Check if connected to the database
    fn is_connected(&self) -> bool;

    /// Run one parameterized statement
    ///
    /// Driver errors are propagated untranslated.
    fn execute(&mut self, sql: &str, params: &[DatabaseValue]) -> Result<Cursor>;

    /// Flush the pending implicit transaction, if any
    fn commit(&mut self) -> Result<()>;

    /// Discard the pending implicit transaction, if any
    fn rollback(&mut self) -> Result<()>;

    /// Release the connection; closing twice is a no-op
    fn close(&mut self) -> Result<()>;

    /// Positional parameter token for the 1-based parameter `index`
    fn placeholder(&self, index: usize) -> String {
        self.database_type().placeholder(index)
    }
}

/// Whether `sql` is a statement that implicitly opens a transaction
///
/// Only INSERT, UPDATE, DELETE and REPLACE do; DDL and queries run in
/// autocommit.
pub fn opens_transaction(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    ["INSERT", "UPDATE", "DELETE", "REPLACE"]
        .iter()
        .any(|dml| keyword.eq_ignore_ascii_case(dml))
}

/// Buffered result of one executed statement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    columns: Vec<String>,
    rows: VecDeque<DatabaseRow>,
    rows_affected: u64,
}

impl Cursor {
    /// Cursor over the rows of a query
    pub fn from_rows(columns: Vec<String>, rows: Vec<DatabaseRow>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            rows_affected: 0,
        }
    }

    /// Cursor for a statement that returned no rows
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    /// Result column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows changed by an INSERT/UPDATE/DELETE
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Fetch the next row, or `None` once exhausted
    pub fn fetch_one(&mut self) -> Option<DatabaseRow> {
        self.rows.pop_front()
    }

    /// Fetch every remaining row
    pub fn fetch_all(&mut self) -> Vec<DatabaseRow> {
        self.rows.drain(..).collect()
    }
}

impl Iterator for Cursor {
    type Item = DatabaseRow;

    fn next(&mut self) -> Option<Self::Item> {
        self.fetch_one()
    }
}

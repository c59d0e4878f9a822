//! Chainable SELECT query builder
//!
//! A [`Query`] accumulates filters, one ordering key, a limit and an offset,
//! then compiles them into a single parameterized SELECT when a terminal
//! operation runs. Builder methods never touch the backend.
//!
//! ```rust,no_run
//! # use atomsql::prelude::*;
//! # fn demo(db: &mut Database, user: &std::sync::Arc<Schema>) -> Result<()> {
//! let oldest_two = db.query(user).order_by("-age").limit(2).all()?;
//! let alice = db.query(user).filter("name", "Alice").first()?;
//! let total_age = db.query(user).sum("age")?;
//! # let _ = (oldest_two, alice, total_age);
//! # Ok(())
//! # }
//! ```

use super::backend::Cursor;
use super::database::Database;
use super::database_types::quote_identifier;
use super::error::Result;
use super::expression::{CompareOp, Comparison};
use super::record::Record;
use super::schema::Schema;
use super::value::DatabaseValue;
use std::sync::Arc;

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order
    Asc,
    /// Descending order
    Desc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// SELECT query over one schema's table
///
/// Terminal operations ([`all`](Query::all), [`iter`](Query::iter),
/// [`first`](Query::first) and the aggregates) consume the query.
pub struct Query<'db> {
    schema: Arc<Schema>,
    db: &'db mut Database,
    filters: Vec<Comparison>,
    order: Option<(String, OrderDirection)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'db> Query<'db> {
    pub(crate) fn new(schema: Arc<Schema>, db: &'db mut Database) -> Self {
        Self {
            schema,
            db,
            filters: Vec::new(),
            order: None,
            limit: None,
            offset: None,
        }
    }

    /// Keep rows whose `column` equals `value`
    ///
    /// Filtering the same column twice keeps the first position and the last value.
    #[must_use]
    pub fn filter(mut self, column: &str, value: impl Into<DatabaseValue>) -> Self {
        let comparison = Comparison::new(column, CompareOp::Eq, value.into());
        match self
            .filters
            .iter_mut()
            .find(|c| c.op() == CompareOp::Eq && c.column() == column)
        {
            Some(existing) => *existing = comparison,
            None => self.filters.push(comparison),
        }
        self
    }

    /// Keep rows matching a comparison built from a field, e.g. `age.gt(30)`
    #[must_use]
    pub fn filter_expr(mut self, comparison: Comparison) -> Self {
        self.filters.push(comparison);
        self
    }

    /// Order by a field; a leading `-` sorts descending
    ///
    /// Only one ordering key is kept; a later call replaces it.
    #[must_use]
    pub fn order_by(mut self, field: &str) -> Self {
        let direction = if field.starts_with('-') {
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        };
        self.order = Some((field.trim_start_matches('-').to_string(), direction));
        self
    }

    /// Return at most `limit` rows; `limit(0)` returns none
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip the first `offset` rows
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Compile the row-selecting statement without running it
    ///
    /// # Errors
    ///
    /// Returns `FieldNotFound` if a filter or the ordering names an undeclared column.
    pub fn to_sql(&self) -> Result<(String, Vec<DatabaseValue>)> {
        self.build_sql(None)
    }

    // `projection` replaces the column list and drops ORDER BY, which has no
    // meaning for a single aggregate row.
    fn build_sql(&self, projection: Option<&str>) -> Result<(String, Vec<DatabaseValue>)> {
        let dialect = self.db.database_type();

        let columns = match projection {
            Some(expression) => expression.to_string(),
            None => self
                .schema
                .field_names()
                .map(quote_identifier)
                .collect::<Vec<_>>()
                .join(", "),
        };
        let mut sql = format!(
            "SELECT {} FROM {}",
            columns,
            quote_identifier(self.schema.table_name())
        );
        let mut params = Vec::with_capacity(self.filters.len());

        if !self.filters.is_empty() {
            let mut conditions = Vec::with_capacity(self.filters.len());
            for comparison in &self.filters {
                self.schema.require_field(comparison.column())?;
                let (fragment, values) = comparison.render(dialect, params.len() + 1);
                conditions.push(fragment);
                params.extend(values);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if let (Some((column, direction)), None) = (&self.order, projection) {
            self.schema.require_field(column)?;
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote_identifier(column),
                direction.as_sql()
            ));
        }

        match (self.limit, self.offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            (None, Some(_)) => sql.push_str(&format!(" LIMIT {}", dialect.unbounded_limit())),
            (None, None) => {}
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok((sql, params))
    }

    /// Run the query and yield one record per row
    ///
    /// The backend fetches every row up front; records are rebuilt from the
    /// buffered rows one at a time as the iterator advances.
    pub fn iter(self) -> Result<Records> {
        let (sql, params) = self.build_sql(None)?;
        let cursor = self.db.execute(&sql, &params)?;
        Ok(Records {
            schema: self.schema,
            cursor,
        })
    }

    /// Run the query and collect every record
    pub fn all(self) -> Result<Vec<Record>> {
        self.iter()?.collect()
    }

    /// First matching record, if any
    pub fn first(self) -> Result<Option<Record>> {
        self.limit(1).iter()?.next().transpose()
    }

    /// Number of matching rows
    pub fn count(self) -> Result<i64> {
        Ok(self.aggregate("COUNT(*)".to_string())?.as_long().unwrap_or(0))
    }

    /// `SUM` of a field over matching rows; null when there are none
    pub fn sum(self, field: &str) -> Result<DatabaseValue> {
        self.aggregate_field("SUM", field)
    }

    /// `AVG` of a field over matching rows; null when there are none
    pub fn avg(self, field: &str) -> Result<DatabaseValue> {
        self.aggregate_field("AVG", field)
    }

    /// `MIN` of a field over matching rows; null when there are none
    pub fn min(self, field: &str) -> Result<DatabaseValue> {
        self.aggregate_field("MIN", field)
    }

    /// `MAX` of a field over matching rows; null when there are none
    pub fn max(self, field: &str) -> Result<DatabaseValue> {
        self.aggregate_field("MAX", field)
    }

    fn aggregate_field(self, function: &str, field: &str) -> Result<DatabaseValue> {
        self.schema.require_field(field)?;
        let expression = format!("{}({})", function, quote_identifier(field));
        self.aggregate(expression)
    }

    fn aggregate(self, expression: String) -> Result<DatabaseValue> {
        let (sql, params) = self.build_sql(Some(&expression))?;
        let mut cursor = self.db.execute(&sql, &params)?;
        Ok(cursor
            .fetch_one()
            .and_then(|row| row.into_iter().next())
            .unwrap_or(DatabaseValue::Null))
    }
}

/// Records produced row by row from a query's cursor
pub struct Records {
    schema: Arc<Schema>,
    cursor: Cursor,
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor
            .fetch_one()
            .map(|row| Record::from_row(&self.schema, row))
    }
}

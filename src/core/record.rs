//! Schema-bound records
//!
//! A [`Record`] holds one value per field of its [`Schema`]. Values enter only
//! through [`Field::validate`](super::Field::validate), so a record always
//! satisfies its schema's kind and nullability rules.

use super::database::Database;
use super::database_types::{quote_identifier, DatabaseType};
use super::error::{DatabaseError, Result};
use super::schema::Schema;
use super::value::{DatabaseRow, DatabaseValue};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// One instance of a schema
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<DatabaseValue>,
}

impl Record {
    /// Create a record holding only defaults
    ///
    /// Fields without a default read as null until set.
    pub fn new(schema: &Arc<Schema>) -> Result<Self> {
        Self::with_values(schema, std::iter::empty::<(&str, DatabaseValue)>())
    }

    /// Create a record from `(field, value)` pairs, applying defaults to the rest
    ///
    /// Default producers run only for fields that were not supplied.
    ///
    /// # Errors
    ///
    /// - `FieldNotFound` for a name the schema does not declare; unknown names
    ///   are rejected rather than silently skipped
    /// - `ValidationError` / `TypeMismatch` for values the field rejects
    pub fn with_values<I, K>(schema: &Arc<Schema>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, DatabaseValue)>,
        K: AsRef<str>,
    {
        let mut supplied: Vec<Option<DatabaseValue>> = vec![None; schema.fields().len()];
        for (name, value) in values {
            let name = name.as_ref();
            let index = schema
                .index_of(name)
                .ok_or_else(|| DatabaseError::field_not_found(name, schema.name()))?;
            supplied[index] = Some(schema.fields()[index].validate(value)?);
        }

        let values = schema
            .fields()
            .iter()
            .zip(supplied)
            .map(|(field, value)| match value {
                Some(value) => Ok(value),
                None if field.declared_default().is_some() => field.validate(field.default_value()),
                None => Ok(DatabaseValue::Null),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            schema: Arc::clone(schema),
            values,
        })
    }

    // Rows come back in declared field order, see `Query::build_sql`.
    pub(crate) fn from_row(schema: &Arc<Schema>, row: DatabaseRow) -> Result<Self> {
        if row.len() != schema.fields().len() {
            return Err(DatabaseError::other(format!(
                "Row for table '{}' has {} column(s), schema '{}' declares {}",
                schema.table_name(),
                row.len(),
                schema.name(),
                schema.fields().len()
            )));
        }
        let names: Vec<&str> = schema.field_names().collect();
        Self::with_values(schema, names.into_iter().zip(row))
    }

    /// Schema of this record
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Stored value of a field; `None` when the schema has no such field
    pub fn get(&self, name: &str) -> Option<&DatabaseValue> {
        self.schema.index_of(name).map(|index| &self.values[index])
    }

    /// Validate and store a field value
    pub fn set(&mut self, name: &str, value: impl Into<DatabaseValue>) -> Result<()> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| DatabaseError::field_not_found(name, self.schema.name()))?;
        self.values[index] = self.schema.fields()[index].validate(value.into())?;
        Ok(())
    }

    /// Values in declared field order
    pub fn values(&self) -> &[DatabaseValue] {
        &self.values
    }

    /// `INSERT` statement and parameters for this record
    pub fn insert_sql(&self, dialect: DatabaseType) -> (String, Vec<DatabaseValue>) {
        let columns: Vec<String> = self.schema.field_names().map(quote_identifier).collect();
        let placeholders: Vec<String> = (1..=columns.len())
            .map(|index| dialect.placeholder(index))
            .collect();

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(self.schema.table_name()),
            columns.join(", "),
            placeholders.join(", ")
        );
        (sql, self.values.clone())
    }

    /// Insert this record; the caller commits
    ///
    /// Returns the number of rows written.
    pub fn save(&self, db: &mut Database) -> Result<u64> {
        let (sql, params) = self.insert_sql(db.database_type());
        let cursor = db.execute(&sql, &params)?;
        tracing::debug!(
            "Saved {} with values {:?}",
            self.schema.table_name(),
            self.values
        );
        Ok(cursor.rows_affected())
    }

    /// JSON object of the field values, in declared order
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.table_name() == other.schema.table_name() && self.values == other.values
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.schema.field_names().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

//! Record schemas
//!
//! A [`Schema`] is an ordered, named set of [`Field`]s plus the table it maps
//! to. Schemas are declared once through [`SchemaBuilder`], which binds each
//! field's name, derives the table name and registers the result in the
//! process-wide [`registry`](super::registry).
//!
//! ```
//! use atomsql::core::{Field, Schema};
//!
//! let user = Schema::builder("User")
//!     .field("name", Field::text())
//!     .field("age", Field::integer())
//!     .build();
//!
//! assert_eq!(user.table_name(), "user");
//! assert_eq!(user.field_names().collect::<Vec<_>>(), vec!["name", "age"]);
//! ```

use super::database_types::{quote_identifier, DatabaseType};
use super::error::{DatabaseError, Result};
use super::field::Field;
use super::registry;
use std::sync::Arc;

/// Immutable description of a record type and its table
#[derive(Debug)]
pub struct Schema {
    name: String,
    table_name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Start declaring a schema
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Declared schema name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name, the lower-cased schema name
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::name)
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Position of a field in declaration order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Look up a field, failing with `FieldNotFound` when it is not declared
    pub fn require_field(&self, name: &str) -> Result<&Field> {
        self.field(name)
            .ok_or_else(|| DatabaseError::field_not_found(name, &self.name))
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this schema
    pub fn create_table_sql(&self, dialect: DatabaseType) -> String {
        let columns: Vec<String> = self
            .fields
            .iter()
            .map(|field| {
                let mut definition = format!(
                    "{} {}",
                    quote_identifier(field.name()),
                    dialect.column_type(field.kind())
                );
                if !field.is_nullable() {
                    definition.push_str(" NOT NULL");
                }
                if field.is_unique() {
                    definition.push_str(" UNIQUE");
                }
                definition
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_identifier(&self.table_name),
            columns.join(", ")
        )
    }
}

/// Collects field declarations for a [`Schema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Create a builder for the schema `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a field; declaring the same name twice replaces the first declaration in place
    #[must_use]
    pub fn field(mut self, name: &str, field: Field) -> Self {
        let field = field.bind(name);
        match self.fields.iter().position(|f| f.name() == name) {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Finish the declaration and register the schema
    pub fn build(self) -> Arc<Schema> {
        let schema = Arc::new(Schema {
            table_name: self.name.to_lowercase(),
            name: self.name,
            fields: self.fields,
        });
        registry::register(Arc::clone(&schema));
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(name: &str) -> Arc<Schema> {
        Schema::builder(name)
            .field("name", Field::text().unique())
            .field("age", Field::integer().nullable())
            .build()
    }

    #[test]
    fn test_fields_keep_declaration_order() {
        let schema = Schema::builder("Ordered")
            .field("b", Field::text())
            .field("a", Field::integer())
            .field("c", Field::real())
            .build();

        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(schema.index_of("a"), Some(1));
        assert_eq!(schema.field("c").map(Field::name), Some("c"));
    }

    #[test]
    fn test_redeclared_field_replaces_in_place() {
        let schema = Schema::builder("Redeclared")
            .field("name", Field::text())
            .field("age", Field::integer())
            .field("name", Field::text().nullable())
            .build();

        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.index_of("name"), Some(0));
        assert!(schema.require_field("name").unwrap().is_nullable());
    }

    #[test]
    fn test_table_name_is_lowercased() {
        let schema = Schema::builder("BlogPost")
            .field("title", Field::text())
            .build();
        assert_eq!(schema.name(), "BlogPost");
        assert_eq!(schema.table_name(), "blogpost");
    }

    #[test]
    fn test_require_field_reports_schema() {
        let schema = person("PersonLookup");
        let err = schema.require_field("height").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Field 'height' does not exist on schema 'PersonLookup'"
        );
    }

    #[test]
    fn test_create_table_sql() {
        let schema = person("Person");
        assert_eq!(
            schema.create_table_sql(DatabaseType::Sqlite),
            "CREATE TABLE IF NOT EXISTS \"person\" (\"name\" TEXT NOT NULL UNIQUE, \"age\" INTEGER)"
        );
        assert_eq!(
            schema.create_table_sql(DatabaseType::Postgres),
            "CREATE TABLE IF NOT EXISTS \"person\" (\"name\" TEXT NOT NULL UNIQUE, \"age\" BIGINT)"
        );
    }

    #[test]
    fn test_identical_declarations_differ_only_by_table_name() {
        let first = person("Human").create_table_sql(DatabaseType::Sqlite);
        let second = person("Citizen").create_table_sql(DatabaseType::Sqlite);
        assert_ne!(first, second);
        assert_eq!(first.replace("\"human\"", "\"citizen\""), second);
    }
}

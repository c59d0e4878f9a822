//! Typed, validating field descriptors
//!
//! A [`Field`] describes one column of a schema: its storage kind, nullability,
//! uniqueness and default. Every value written into a record passes through
//! [`Field::validate`] first, so a record can never hold a value its schema
//! does not allow.
//!
//! ```
//! use atomsql::core::Field;
//!
//! let age = Field::integer().nullable();
//! let name = Field::text().unique();
//! let score = Field::real().default(0.0);
//! # let _ = (age, name, score);
//! ```

use super::error::{DatabaseError, Result};
use super::expression::{CompareOp, Comparison};
use super::value::DatabaseValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Storage kind of a field, deciding both its SQL type and validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Integral values
    Integer,
    /// Text values
    Text,
    /// Floating point values (integers are accepted and widened)
    Real,
}

impl FieldKind {
    /// Name used in type mismatch messages
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Text => "text",
            FieldKind::Real => "real",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default applied to a field that was not given a value
#[derive(Clone)]
pub enum FieldDefault {
    /// A literal value
    Value(DatabaseValue),
    /// A producer evaluated each time a record is constructed
    Producer(Arc<dyn Fn() -> DatabaseValue + Send + Sync>),
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDefault::Value(v) => f.debug_tuple("Value").field(v).finish(),
            FieldDefault::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}

/// A typed column slot of a schema
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    nullable: bool,
    unique: bool,
    default: Option<FieldDefault>,
}

impl Field {
    /// Create a required field of the given kind
    pub fn new(kind: FieldKind) -> Self {
        Self {
            name: String::new(),
            kind,
            nullable: false,
            unique: false,
            default: None,
        }
    }

    /// Create a required integer field
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer)
    }

    /// Create a required text field
    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    /// Create a required floating point field
    pub fn real() -> Self {
        Self::new(FieldKind::Real)
    }

    /// Allow null values
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Add a UNIQUE constraint
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Use a literal default for records that omit this field
    #[must_use]
    pub fn default(mut self, value: impl Into<DatabaseValue>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    /// Use a producer, evaluated per record, for records that omit this field
    #[must_use]
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> DatabaseValue + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Producer(Arc::new(producer)));
        self
    }

    // Called once by the schema builder.
    pub(crate) fn bind(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Column name, bound when the field is added to a schema
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage kind
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether null is accepted
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the column carries a UNIQUE constraint
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Declared default, if any
    pub fn declared_default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    /// Value a record takes when this field is omitted, null when there is no default
    pub fn default_value(&self) -> DatabaseValue {
        match &self.default {
            Some(FieldDefault::Value(v)) => v.clone(),
            Some(FieldDefault::Producer(produce)) => produce(),
            None => DatabaseValue::Null,
        }
    }

    /// Check a value against nullability and kind, returning the value to store
    ///
    /// # Errors
    ///
    /// - `ValidationError` when null is given to a non-nullable field
    /// - `TypeMismatch` when the value's kind does not match the field
    pub fn validate(&self, value: DatabaseValue) -> Result<DatabaseValue> {
        match (self.kind, value) {
            (_, DatabaseValue::Null) if self.nullable => Ok(DatabaseValue::Null),
            (_, DatabaseValue::Null) => Err(DatabaseError::validation(&self.name)),
            (FieldKind::Integer, v @ DatabaseValue::Integer(_)) => Ok(v),
            (FieldKind::Text, v @ DatabaseValue::Text(_)) => Ok(v),
            (FieldKind::Real, v @ DatabaseValue::Real(_)) => Ok(v),
            (FieldKind::Real, DatabaseValue::Integer(v)) => Ok(DatabaseValue::Real(v as f64)),
            (kind, other) => Err(DatabaseError::type_mismatch(
                &self.name,
                kind.as_str(),
                other.type_name(),
            )),
        }
    }

    fn compare(&self, op: CompareOp, value: impl Into<DatabaseValue>) -> Comparison {
        Comparison::new(&self.name, op, value.into())
    }

    /// `field = value`
    pub fn eq(&self, value: impl Into<DatabaseValue>) -> Comparison {
        self.compare(CompareOp::Eq, value)
    }

    /// `field != value`
    pub fn ne(&self, value: impl Into<DatabaseValue>) -> Comparison {
        self.compare(CompareOp::Ne, value)
    }

    /// `field < value`
    pub fn lt(&self, value: impl Into<DatabaseValue>) -> Comparison {
        self.compare(CompareOp::Lt, value)
    }

    /// `field <= value`
    pub fn le(&self, value: impl Into<DatabaseValue>) -> Comparison {
        self.compare(CompareOp::Le, value)
    }

    /// `field > value`
    pub fn gt(&self, value: impl Into<DatabaseValue>) -> Comparison {
        self.compare(CompareOp::Gt, value)
    }

    /// `field >= value`
    pub fn ge(&self, value: impl Into<DatabaseValue>) -> Comparison {
        self.compare(CompareOp::Ge, value)
    }
}

//! Comparison predicates
//!
//! A [`Comparison`] is produced by comparing a [`Field`](super::Field) to a
//! value and renders to a parameterized SQL fragment. The value is never
//! inlined into the SQL text.

use super::database_types::{quote_identifier, DatabaseType};
use super::value::DatabaseValue;

/// SQL comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal to (=)
    Eq,
    /// Not equal to (!=)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
}

impl CompareOp {
    /// SQL symbol of the operator
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Immutable `column <op> value` predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    column: String,
    op: CompareOp,
    value: DatabaseValue,
}

impl Comparison {
    pub(crate) fn new(column: &str, op: CompareOp, value: DatabaseValue) -> Self {
        Self {
            column: column.to_string(),
            op,
            value,
        }
    }

    /// Compared column
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Operator
    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Bound value
    pub fn value(&self) -> &DatabaseValue {
        &self.value
    }

    /// Render as `"<column>" <op> <placeholder>` plus its single parameter
    ///
    /// `index` is the 1-based position of the parameter in the full statement,
    /// which dialects with numbered placeholders need.
    pub fn render(&self, dialect: DatabaseType, index: usize) -> (String, Vec<DatabaseValue>) {
        let fragment = format!(
            "{} {} {}",
            quote_identifier(&self.column),
            self.op.as_sql(),
            dialect.placeholder(index)
        );
        (fragment, vec![self.value.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_sqlite() {
        let cmp = Comparison::new("age", CompareOp::Gt, 30.into());
        let (sql, params) = cmp.render(DatabaseType::Sqlite, 1);
        assert_eq!(sql, "\"age\" > ?");
        assert_eq!(params, vec![DatabaseValue::Integer(30)]);
    }

    #[test]
    fn test_render_postgres_numbers_placeholder() {
        let cmp = Comparison::new("name", CompareOp::Ne, "Bob".into());
        let (sql, params) = cmp.render(DatabaseType::Postgres, 2);
        assert_eq!(sql, "\"name\" != $2");
        assert_eq!(params, vec![DatabaseValue::Text("Bob".to_string())]);
    }

    #[test]
    fn test_value_is_never_inlined() {
        let cmp = Comparison::new("name", CompareOp::Eq, "x'; DROP TABLE user; --".into());
        let (sql, _) = cmp.render(DatabaseType::Sqlite, 1);
        assert_eq!(sql, "\"name\" = ?");
    }

    #[test]
    fn test_operator_symbols() {
        let symbols: Vec<&str> = [
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::Gt,
            CompareOp::Ge,
        ]
        .iter()
        .map(CompareOp::as_sql)
        .collect();
        assert_eq!(symbols, vec!["=", "!=", "<", "<=", ">", ">="]);
    }
}

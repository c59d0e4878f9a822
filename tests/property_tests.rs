//! Property-based tests using proptest

use atomsql::core::quote_identifier;
use atomsql::prelude::*;
use proptest::prelude::*;

// ============================================================================
// Field Validation Properties
// ============================================================================

proptest! {
    /// Integer fields accept every integer unchanged
    #[test]
    fn test_integer_field_accepts_integers(value in any::<i64>()) {
        let field = Field::integer();
        prop_assert_eq!(field.validate(value.into()).unwrap(), DatabaseValue::Integer(value));
    }

    /// Integer fields reject text whatever its content
    #[test]
    fn test_integer_field_rejects_text(value in ".*") {
        let err = Field::integer().validate(value.into()).unwrap_err();
        let is_type_mismatch = matches!(err, DatabaseError::TypeMismatch { .. });
        prop_assert!(is_type_mismatch);
    }

    /// Real fields widen integers without changing their value
    #[test]
    fn test_real_field_widens_integers(value in -(1i64 << 53)..(1i64 << 53)) {
        let validated = Field::real().validate(value.into()).unwrap();
        prop_assert_eq!(validated, DatabaseValue::Real(value as f64));
    }

    /// Null is accepted exactly when the field is nullable
    #[test]
    fn test_null_follows_nullability(nullable in any::<bool>()) {
        let field = if nullable { Field::text().nullable() } else { Field::text() };
        prop_assert_eq!(field.validate(DatabaseValue::Null).is_ok(), nullable);
    }
}

// ============================================================================
// Identifier Quoting Properties
// ============================================================================

proptest! {
    /// Quoted identifiers are wrapped and never contain a lone inner quote
    #[test]
    fn test_quote_identifier_escapes(name in ".*") {
        let quoted = quote_identifier(&name);
        prop_assert!(quoted.starts_with('"') && quoted.ends_with('"'));

        let inner = &quoted[1..quoted.len() - 1];
        prop_assert_eq!(inner.replace("\"\"", "\""), name.clone());
        prop_assert_eq!(inner.matches('"').count(), name.matches('"').count() * 2);
    }
}

// ============================================================================
// Query Properties
// ============================================================================

#[cfg(feature = "sqlite")]
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Ordered results are monotone and limit/offset slice them
    #[test]
    fn test_ordering_and_paging(
        ages in prop::collection::vec(0i64..120, 0..20),
        descending in any::<bool>(),
        limit in 0u64..25,
        offset in 0u64..25,
    ) {
        let schema = Schema::builder("PropertyPerson")
            .field("age", Field::integer())
            .build();
        let mut db = Database::connect("sqlite:///:memory:").unwrap();
        db.register(&schema).unwrap();
        for age in &ages {
            Record::with_values(&schema, [("age", DatabaseValue::from(*age))])
                .and_then(|record| record.save(&mut db))
                .unwrap();
        }
        db.commit().unwrap();

        let key = if descending { "-age" } else { "age" };
        let fetched: Vec<i64> = db
            .query(&schema)
            .order_by(key)
            .all()
            .unwrap()
            .iter()
            .filter_map(|r| r.get("age").and_then(DatabaseValue::as_long))
            .collect();

        let mut expected = ages.clone();
        expected.sort_unstable();
        if descending {
            expected.reverse();
        }
        prop_assert_eq!(&fetched, &expected);

        let page: Vec<i64> = db
            .query(&schema)
            .order_by(key)
            .limit(limit)
            .offset(offset)
            .all()
            .unwrap()
            .iter()
            .filter_map(|r| r.get("age").and_then(DatabaseValue::as_long))
            .collect();
        let expected_page: Vec<i64> = expected
            .iter()
            .copied()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        prop_assert_eq!(page, expected_page);

        prop_assert_eq!(db.query(&schema).count().unwrap(), ages.len() as i64);
    }
}

//! Table Tests
//!
//! Tests for the column store and row store:
//! - Column add/remove and ordinal packing
//! - Row commit validation (type, null, uniqueness, width)
//! - Atomic single-value updates
//! - Defaults, factories and read-only columns
//! - Bulk loading, including the async adapter

mod common;

use common::{create_people_table, create_seeded_people, init_tracing, table_column};
use serde_json::json;
use tablekit::{Column, DataType, EngineConfig, Record, Table, TableError, Value};

#[test]
fn test_valid_row_grows_table_by_one() {
    init_tracing();
    let mut people = create_seeded_people();
    let before = people.row_count();

    let index = people
        .add_row(Record::new().with("id", 6).with("name", "Finn").with("age", 41))
        .unwrap();

    assert_eq!(index, before);
    assert_eq!(people.row_count(), before + 1);
    let finn = people.row(index).unwrap();
    assert_eq!(finn.get("dept").unwrap(), &Value::Null);
    assert_eq!(finn.item("name").unwrap(), finn.get("name").unwrap());
}

#[test]
fn test_invalid_rows_leave_table_unchanged() {
    let mut people = create_seeded_people();
    let before = people.row_count();

    let err = people
        .add_row(Record::new().with("id", 7).with("age", "old"))
        .unwrap_err();
    assert!(matches!(err, TableError::TypeMismatch { .. }));

    let err = people.add_row(Record::new().with("name", "NoId")).unwrap_err();
    assert!(matches!(err, TableError::NullViolation(ref c) if c == "id"));

    let err = people.add_row(Record::new().with("id", 1)).unwrap_err();
    assert!(matches!(err, TableError::UniquenessViolation { .. }));

    let err = people
        .add_row(Record::new().with("id", 8).with("height", 180))
        .unwrap_err();
    assert!(matches!(err, TableError::UnknownColumn(_)));

    let err = people
        .add_row(vec![
            Value::from(9),
            Value::from("Too"),
            Value::from(1),
            Value::from("x"),
            Value::Null,
            Value::from("many"),
        ])
        .unwrap_err();
    assert!(matches!(err, TableError::TooManyValues { expected: 5, found: 6 }));

    assert_eq!(people.row_count(), before);
}

#[test]
fn test_positional_rows_fill_trailing_defaults() {
    let mut table = Table::new("t");
    table.add_column("a", DataType::Number).unwrap();
    table
        .add_column_def(Column::new("b", DataType::String).with_default("dflt"))
        .unwrap();

    table.add_row(vec![Value::from(1)]).unwrap();
    assert_eq!(table.row(0).unwrap().get("b").unwrap(), &Value::from("dflt"));
}

#[test]
fn test_unspecified_column_accepts_anything() {
    let mut table = Table::new("t");
    table.add_column("any", DataType::Unspecified).unwrap();
    table.add_row(vec![Value::from(1)]).unwrap();
    table.add_row(vec![Value::from("one")]).unwrap();
    table.add_row(vec![Value::from(true)]).unwrap();
    assert_eq!(table.row_count(), 3);
}

#[test]
fn test_date_column_accepts_date_strings() {
    let mut people = create_people_table();
    people
        .add_row(Record::new().with("id", 1).with("joined", "2024-02-29 13:45:00"))
        .unwrap();
    assert!(people.row(0).unwrap().get("joined").unwrap().as_date().is_some());

    let err = people
        .add_row(Record::new().with("id", 2).with("joined", "last tuesday"))
        .unwrap_err();
    assert!(matches!(err, TableError::TypeMismatch { .. }));
}

#[test]
fn test_set_is_atomic() {
    let mut people = create_seeded_people();

    {
        let mut row = people.row_mut(1).unwrap();
        assert!(row.set("id", 1).is_err());
        assert!(row.set("age", "twenty").is_err());
        assert!(row.set("id", Value::Null).is_err());
        row.set("age", 26).unwrap();
    }

    let bob = people.row(1).unwrap();
    assert_eq!(bob.get("id").unwrap(), &Value::from(2));
    assert_eq!(bob.get("age").unwrap(), &Value::from(26));
}

#[test]
fn test_remove_row_shifts_positions() {
    let mut people = create_seeded_people();
    let removed = people.remove_row(1).unwrap();
    assert_eq!(removed.get("name").unwrap(), &Value::from("Bob"));
    assert_eq!(people.row(1).unwrap().get("name").unwrap(), &Value::from("Charlie"));

    let err = people.remove_row(10).unwrap_err();
    assert!(matches!(err, TableError::IndexOutOfRange { index: 10, len: 4 }));
    assert!(matches!(people.row(4), Err(TableError::IndexOutOfRange { .. })));
}

#[test]
fn test_clear_keeps_columns() {
    let mut people = create_seeded_people();
    people.clear();
    assert!(people.is_empty());
    assert_eq!(people.column_count(), 5);
}

#[test]
fn test_column_lifecycle() {
    let mut people = create_seeded_people();

    assert!(people.column_exists("NAME"));
    let err = people.add_column("Name", DataType::String).unwrap_err();
    assert!(matches!(err, TableError::DuplicateColumn(_)));

    let removed = people.remove_column("age").unwrap();
    assert_eq!(removed.name(), "age");
    let ordinals: Vec<usize> = people.columns().iter().map(|c| c.ordinal()).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3]);
    assert!(people.rows().all(|r| r.values().len() == 4));
    assert_eq!(people.row(0).unwrap().get("dept").unwrap(), &Value::from("eng"));

    assert!(matches!(
        people.remove_column("age"),
        Err(TableError::UnknownColumn(_))
    ));
}

#[test]
fn test_case_sensitive_table() {
    let config = EngineConfig::default().with_case_sensitive(true);
    let mut table = Table::with_config("t", &config);
    table.add_column("Name", DataType::String).unwrap();
    table.add_column("name", DataType::String).unwrap();
    assert_eq!(table.column_count(), 2);
    assert!(!table.column_exists("NAME"));
}

#[test]
fn test_unique_column_allows_multiple_nulls() {
    let mut table = Table::new("t");
    table
        .add_column_def(Column::new("email", DataType::String).with_unique())
        .unwrap();
    table.add_row(vec![Value::Null]).unwrap();
    table.add_row(vec![Value::Null]).unwrap();
    table.add_row(vec![Value::from("a@x")]).unwrap();

    // Case-insensitive by default.
    let err = table.add_row(vec![Value::from("A@X")]).unwrap_err();
    assert!(matches!(err, TableError::UniquenessViolation { .. }));
}

#[test]
fn test_composite_primary_key() {
    let mut table = Table::new("enrolment");
    table
        .add_column_def(Column::new("student", DataType::Number).with_primary_key())
        .unwrap();
    table
        .add_column_def(Column::new("course", DataType::String).with_primary_key())
        .unwrap();

    table.add_row(vec![Value::from(1), Value::from("math")]).unwrap();
    table.add_row(vec![Value::from(1), Value::from("art")]).unwrap();
    table.add_row(vec![Value::from(2), Value::from("math")]).unwrap();

    let err = table
        .add_row(vec![Value::from(1), Value::from("math")])
        .unwrap_err();
    match err {
        TableError::UniquenessViolation { column, .. } => assert_eq!(column, "student, course"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(table.primary_key(), vec!["student", "course"]);
}

#[test]
fn test_read_only_column() {
    let mut table = Table::new("t");
    table
        .add_column_def(Column::new("created", DataType::String).with_read_only())
        .unwrap();

    let mut row = table.new_row();
    row.set("created", "yesterday").unwrap();
    table.add_row(row).unwrap();

    let err = table.row_mut(0).unwrap().set("created", "today").unwrap_err();
    assert!(matches!(err, TableError::ReadOnlyViolation(_)));
}

#[test]
fn test_factory_default_runs_at_commit() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let counter = Arc::new(AtomicUsize::new(0));
    let seq = Arc::clone(&counter);

    let mut table = Table::new("t");
    table
        .add_column_def(Column::new("seq", DataType::Number).with_factory("seq", move || {
            Value::from(seq.fetch_add(1, Ordering::SeqCst) as f64)
        }))
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    let pending = table.new_row();
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    table.add_row(pending).unwrap();
    table.add_row(Vec::<Value>::new()).unwrap();

    assert_eq!(table_column(&table, "seq"), vec![Value::from(0), Value::from(1)]);
}

#[test]
fn test_bulk_load_from_json() {
    let mut table = Table::new("imported");
    let loaded = table
        .load_from_json(&[
            json!({"sku": "A-1", "price": 9.5, "launched": "2024-01-01T00:00:00Z"}),
            json!({"sku": "B-2", "price": 12}),
        ])
        .unwrap();

    assert_eq!(loaded, 2);
    assert_eq!(table.column("price").unwrap().data_type(), DataType::Number);
    assert_eq!(table.column("launched").unwrap().data_type(), DataType::String);
}

#[test]
fn test_async_load_adapter() {
    let mut people = create_people_table();
    let records = vec![
        Record::new().with("id", 1).with("name", "Ann"),
        Record::new().with("id", 2).with("name", "Ben"),
    ];

    let loaded = tokio_test::block_on(
        people.load_from_future(async move { Ok::<_, std::io::Error>(records) }),
    )
    .unwrap();
    assert_eq!(loaded, 2);

    let err = tokio_test::block_on(people.load_from_future(async {
        Err::<Vec<Record>, _>(std::io::Error::other("driver went away"))
    }))
    .unwrap_err();
    assert!(matches!(err, TableError::Source(_)));
    assert_eq!(people.row_count(), 2);
}

#[test]
fn test_config_from_toml() {
    let config = EngineConfig::from_toml_str("case_sensitive = true\ninfer_columns = false").unwrap();
    assert!(config.case_sensitive);
    assert!(!config.infer_columns);
    assert_eq!(config.max_pattern_len, 1000);

    let mut table = Table::with_config("t", &config);
    assert!(table.load_from_json(&[json!({"a": 1})]).is_err());
    assert_eq!(table.column_count(), 0);

    assert!(matches!(
        EngineConfig::from_toml_str("case_sensitive = \"yes\""),
        Err(TableError::Config(_))
    ));
}

#[test]
fn test_load_after_removing_last_column_keeps_rows_consistent() {
    let mut table = Table::new("t");
    table.add_column("x", DataType::Number).unwrap();
    table.add_row(vec![Value::from(1)]).unwrap();
    table.remove_column("x").unwrap();

    assert!(matches!(
        table.load_from_json(&[json!({"a": 1})]),
        Err(TableError::UnknownColumn(_))
    ));
    table.add_column("a", DataType::Number).unwrap();
    table.load_from_json(&[json!({"a": 1})]).unwrap();

    let rows = table
        .find_rows(&tablekit::Criteria::new().eq("a", 1))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].index(), 1);
}

#[test]
fn test_inferred_columns_keep_record_order() {
    let mut table = Table::new("t");
    table
        .load_from_json(&[json!({"name": "Ann", "age": 30, "admin": true})])
        .unwrap();
    let names: Vec<&str> = table.columns().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["name", "age", "admin"]);

    table
        .add_row(vec![Value::from("Bo"), Value::from(25), Value::from(false)])
        .unwrap();
    assert_eq!(table.row(1).unwrap().get("age").unwrap(), &Value::from(25));

    assert!(matches!(
        Table::new("t").load_from_json(&[json!({"id": 1, "ID": 2})]),
        Err(TableError::DuplicateColumn(_))
    ));
}

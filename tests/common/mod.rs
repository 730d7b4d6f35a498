//! Common test utilities for tablekit tests
//!
//! Provides shared helper functions for:
//! - Installing a tracing subscriber
//! - Building seeded tables and datasets
//! - Pulling column values out of query results

#![allow(dead_code)]

use tablekit::{Column, DataSet, DataType, RowRef, Table, Value};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `people`: id (primary key), name, age, dept, joined.
pub fn create_people_table() -> Table {
    let mut people = Table::new("people");
    people
        .add_column_def(Column::new("id", DataType::Number).with_primary_key())
        .unwrap();
    people.add_column("name", DataType::String).unwrap();
    people.add_column("age", DataType::Number).unwrap();
    people.add_column("dept", DataType::String).unwrap();
    people.add_column("joined", DataType::Date).unwrap();
    people
}

pub fn create_seeded_people() -> Table {
    let mut people = create_people_table();
    for (id, name, age, dept, joined) in [
        (1, "Alice", 30, "eng", "2021-03-01"),
        (2, "Bob", 25, "eng", "2022-07-15"),
        (3, "Charlie", 35, "sales", "2019-11-30"),
        (4, "Diana", 28, "marketing", "2023-01-09"),
        (5, "Eve", 30, "sales", "2020-05-20"),
    ] {
        people
            .add_row(vec![
                Value::from(id),
                Value::from(name),
                Value::from(age),
                Value::from(dept),
                Value::from(joined),
            ])
            .unwrap();
    }
    people
}

/// `customers` and `orders` joined by `customer_orders`, with one orphan
/// order (customer 9) and one customer without orders (Cara).
pub fn create_shop_dataset() -> DataSet {
    let mut shop = DataSet::new("shop");

    let customers = shop.add_table("customers").unwrap();
    customers
        .add_column_def(Column::new("id", DataType::Number).with_primary_key())
        .unwrap();
    customers.add_column("name", DataType::String).unwrap();
    for (id, name) in [(1, "Ann"), (2, "Ben"), (3, "Cara")] {
        customers.add_row(vec![Value::from(id), Value::from(name)]).unwrap();
    }

    let orders = shop.add_table("orders").unwrap();
    orders
        .add_column_def(Column::new("id", DataType::Number).with_primary_key())
        .unwrap();
    orders.add_column("customer_id", DataType::Number).unwrap();
    orders.add_column("total", DataType::Number).unwrap();
    for (id, customer, total) in [(100, 1, 20), (101, 2, 35), (102, 1, 12), (103, 9, 50)] {
        orders
            .add_row(vec![Value::from(id), Value::from(customer), Value::from(total)])
            .unwrap();
    }

    shop.add_relation("customer_orders", "customers", "orders", "id", "customer_id")
        .unwrap();
    shop
}

pub fn column_values(rows: &[RowRef<'_>], column: &str) -> Vec<Value> {
    rows.iter().map(|r| r.get(column).unwrap().clone()).collect()
}

pub fn table_column(table: &Table, column: &str) -> Vec<Value> {
    table.rows().map(|r| r.get(column).unwrap().clone()).collect()
}

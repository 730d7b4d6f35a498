//! Tablekit - an embedded, in-memory relational data engine.
//!
//! Typed tables with constraints, criteria-based filtering, stable sorting,
//! parent/child relations across tables, live views and portable schemas.
//! Everything lives in process memory; there is no persistence layer.
//!
//! # Main Components
//!
//! - **Types**: the closed [`Value`] model, [`DataType`] and [`Column`] definitions
//! - **Table**: column store plus row store with constraint enforcement
//! - **Query**: [`Criteria`] predicates and multi-key sorting
//! - **DataSet**: named tables and [`Relation`] navigation
//! - **View**: live filtered and sorted projections
//! - **Schema**: export, import, comparison and reconciliation
//!
//! # Example
//!
//! ```rust
//! use tablekit::{Column, Criteria, DataType, Operators, SortOrder, Table, Value};
//!
//! let mut users = Table::new("users");
//! users.add_column_def(Column::new("id", DataType::Number).with_primary_key()).unwrap();
//! users.add_column("name", DataType::String).unwrap();
//! users.add_column("age", DataType::Number).unwrap();
//!
//! users.add_row(vec![Value::from(1), Value::from("Alice"), Value::from(30)]).unwrap();
//! users.add_row(vec![Value::from(2), Value::from("Bob"), Value::from(25)]).unwrap();
//! users.add_row(vec![Value::from(3), Value::from("Cara"), Value::from(35)]).unwrap();
//!
//! // Duplicate primary keys are rejected.
//! assert!(users.add_row(vec![Value::from(1), Value::from("Eve")]).is_err());
//!
//! users.sort("age", SortOrder::Desc).unwrap();
//! let older = users
//!     .find_rows(&Criteria::new().field("age", Operators::new().gt(26)))
//!     .unwrap();
//! let names: Vec<&Value> = older.iter().map(|r| r.get("name").unwrap()).collect();
//! assert_eq!(names, vec![&Value::from("Cara"), &Value::from("Alice")]);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod query;
pub mod schema;
pub mod table;
pub mod types;
pub mod view;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use dataset::{DataSet, Relation};
pub use error::{TableError, TableResult};
pub use query::{Criteria, Matcher, Operator, Operators, RowPredicate, SortKey, SortOrder, Term};
pub use schema::{
    ChangeKind, ColumnChange, ColumnDescriptor, NullabilityDifference, SchemaDescriptor, SchemaDiff,
    SchemaUpdateReport, TypeDifference, UpdateMode,
};
pub use table::{DataRow, Record, RowMut, RowRef, RowSource, SharedTable, Table};
pub use types::{Column, DataType, DefaultValue, FactoryFn, FactoryRegistry, Value};
pub use view::View;

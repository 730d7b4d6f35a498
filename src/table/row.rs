//! Row accessors.
//!
//! Committed rows live inside their table; [`RowRef`] and [`RowMut`] are
//! positional handles onto that storage. [`DataRow`] is a detached row built
//! by [`Table::new_row`], removed from a table, or snapshotted by a view.

use std::fmt;
use std::sync::Arc;

use crate::error::{TableError, TableResult};
use crate::types::{Column, DefaultValue, Value};

use super::{check_value, find_ordinal, Record, Table};

/// Read-only handle to a committed row.
#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub(crate) fn new(table: &'a Table, index: usize) -> Self {
        Self { table, index }
    }

    /// Positional index in the owning table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Value of the named column.
    pub fn get(&self, name: &str) -> TableResult<&'a Value> {
        let ordinal = self.table.ordinal(name)?;
        Ok(&self.values()[ordinal])
    }

    /// Same as [`RowRef::get`].
    pub fn item(&self, name: &str) -> TableResult<&'a Value> {
        self.get(name)
    }

    pub fn value(&self, ordinal: usize) -> Option<&'a Value> {
        self.values().get(ordinal)
    }

    pub fn values(&self) -> &'a [Value] {
        self.table.row_values(self.index)
    }

    /// Plain structured record keyed by column name.
    pub fn to_record(&self) -> Record {
        self.table
            .columns()
            .iter()
            .zip(self.values())
            .map(|(column, value)| (column.name.clone(), value.clone()))
            .collect()
    }

    /// Detached copy of this row.
    pub fn to_data_row(&self) -> DataRow {
        DataRow::detached(
            Arc::clone(&self.table.columns),
            self.values().to_vec(),
            self.table.case_sensitive(),
        )
    }
}

impl PartialEq for RowRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.table, other.table) && self.index == other.index
    }
}

impl fmt::Debug for RowRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowRef")
            .field("table", &self.table.name())
            .field("index", &self.index)
            .field("values", &self.values())
            .finish()
    }
}

/// Mutable handle to a committed row.
pub struct RowMut<'a> {
    table: &'a mut Table,
    index: usize,
}

impl<'a> RowMut<'a> {
    pub(crate) fn new(table: &'a mut Table, index: usize) -> Self {
        Self { table, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, name: &str) -> TableResult<&Value> {
        let ordinal = self.table.ordinal(name)?;
        Ok(&self.table.row_values(self.index)[ordinal])
    }

    pub fn item(&self, name: &str) -> TableResult<&Value> {
        self.get(name)
    }

    /// Validate and store a value. On error the row is unchanged.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> TableResult<()> {
        self.table.set_value(self.index, name, value.into())
    }
}

/// A row with no table membership.
///
/// `set` still enforces column type and nullability; uniqueness and
/// read-only rules apply once the row is added to a table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub(crate) columns: Arc<Vec<Column>>,
    pub(crate) values: Vec<Value>,
    /// Cells whose factory default has not run yet.
    pub(crate) pending: Vec<bool>,
    case_sensitive: bool,
}

impl DataRow {
    pub(crate) fn for_columns(columns: Arc<Vec<Column>>, case_sensitive: bool) -> Self {
        let mut values = Vec::with_capacity(columns.len());
        let mut pending = Vec::with_capacity(columns.len());
        for column in columns.iter() {
            match &column.default_value {
                Some(DefaultValue::Static(v)) => {
                    values.push(v.clone());
                    pending.push(false);
                }
                Some(DefaultValue::Factory { .. }) => {
                    values.push(Value::Null);
                    pending.push(true);
                }
                None => {
                    values.push(Value::Null);
                    pending.push(false);
                }
            }
        }
        Self {
            columns,
            values,
            pending,
            case_sensitive,
        }
    }

    pub(crate) fn detached(columns: Arc<Vec<Column>>, values: Vec<Value>, case_sensitive: bool) -> Self {
        let pending = vec![false; values.len()];
        Self {
            columns,
            values,
            pending,
            case_sensitive,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> TableResult<&Value> {
        let ordinal = self.ordinal(name)?;
        Ok(&self.values[ordinal])
    }

    pub fn item(&self, name: &str) -> TableResult<&Value> {
        self.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> TableResult<()> {
        let ordinal = self.ordinal(name)?;
        let value = check_value(&self.columns[ordinal], value.into())?;
        self.values[ordinal] = value;
        self.pending[ordinal] = false;
        Ok(())
    }

    pub fn to_record(&self) -> Record {
        self.columns
            .iter()
            .zip(&self.values)
            .map(|(column, value)| (column.name.clone(), value.clone()))
            .collect()
    }

    fn ordinal(&self, name: &str) -> TableResult<usize> {
        find_ordinal(&self.columns, name, self.case_sensitive)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }
}

/// Anything that can be committed as a row.
#[derive(Debug, Clone)]
pub enum RowSource {
    /// Name-keyed; missing keys take the column default.
    Record(Record),
    /// Ordinal-ordered; missing trailing values take the column default.
    Positional(Vec<Value>),
    Detached(DataRow),
}

impl From<Record> for RowSource {
    fn from(record: Record) -> Self {
        RowSource::Record(record)
    }
}

impl From<Vec<Value>> for RowSource {
    fn from(values: Vec<Value>) -> Self {
        RowSource::Positional(values)
    }
}

impl From<DataRow> for RowSource {
    fn from(row: DataRow) -> Self {
        RowSource::Detached(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;
    use chrono::Utc;

    fn table() -> Table {
        let mut table = Table::new("events");
        table
            .add_column_def(Column::new("id", DataType::Number).with_primary_key())
            .unwrap();
        table
            .add_column_def(Column::new("kind", DataType::String).with_default("click"))
            .unwrap();
        table
            .add_column_def(
                Column::new("at", DataType::Date).with_factory("now", || Value::Date(Utc::now())),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_new_row_is_presized_with_defaults() {
        let table = table();
        let row = table.new_row();
        assert_eq!(row.values().len(), 3);
        assert_eq!(row.get("kind").unwrap(), &Value::from("click"));
        assert_eq!(row.get("at").unwrap(), &Value::Null);
    }

    #[test]
    fn test_detached_set_validates_type_and_null() {
        let table = table();
        let mut row = table.new_row();
        assert!(matches!(row.set("id", "x"), Err(TableError::TypeMismatch { .. })));
        assert!(matches!(row.set("id", Value::Null), Err(TableError::NullViolation(_))));
        row.set("id", 7).unwrap();
        assert_eq!(row.item("ID").unwrap(), &Value::from(7));
    }

    #[test]
    fn test_factory_default_runs_at_commit() {
        let mut table = table();
        let mut row = table.new_row();
        row.set("id", 1).unwrap();
        let index = table.add_row(row).unwrap();

        let committed = table.row(index).unwrap();
        assert!(matches!(committed.get("at").unwrap(), Value::Date(_)));
        assert_eq!(committed.get("kind").unwrap(), &Value::from("click"));
    }

    #[test]
    fn test_row_ref_identity() {
        let mut table = table();
        table.add_row(vec![Value::from(1)]).unwrap();
        table.add_row(vec![Value::from(2)]).unwrap();

        assert_eq!(table.row(0).unwrap(), table.row(0).unwrap());
        assert_ne!(table.row(0).unwrap(), table.row(1).unwrap());
        assert_eq!(table.row(1).unwrap().to_record()["id"], Value::from(2));
    }
}

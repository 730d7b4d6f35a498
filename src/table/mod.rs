//! Tables: an ordered column store plus an ordered row store.
//!
//! Insertion order is the canonical iteration and positional-index order.
//! Every value entering the store goes through [`check_value`] and the
//! uniqueness check, so committed rows always satisfy their columns.

mod load;
mod record;
mod row;

pub use record::Record;
pub use row::{DataRow, RowMut, RowRef, RowSource};

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value as JsonValue;

use crate::config::EngineConfig;
use crate::error::{TableError, TableResult};
use crate::query::helpers::{str_eq, unique_key, values_equal};
use crate::types::{Column, DataType, DefaultValue, Value};

/// A table shared between its owner and live views.
pub type SharedTable = Arc<RwLock<Table>>;

/// A named, typed, in-memory table.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    config: EngineConfig,
    columns: Arc<Vec<Column>>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &EngineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: &EngineConfig) -> Self {
        Self {
            name: name.into(),
            config: config.clone(),
            columns: Arc::new(Vec::new()),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn case_sensitive(&self) -> bool {
        self.config.case_sensitive
    }

    /// Change the case-sensitivity rule. Fails without changing anything if
    /// column names or unique values would collide under the new rule.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) -> TableResult<()> {
        if case_sensitive == self.config.case_sensitive {
            return Ok(());
        }
        for (i, a) in self.columns.iter().enumerate() {
            if self.columns[..i]
                .iter()
                .any(|b| str_eq(&a.name, &b.name, case_sensitive))
            {
                return Err(TableError::DuplicateColumn(a.name.clone()));
            }
        }
        validate_uniqueness(&self.columns, &self.rows, case_sensitive)?;
        self.config.case_sensitive = case_sensitive;
        Ok(())
    }

    /// Wrap the table for sharing with views.
    pub fn into_shared(self) -> SharedTable {
        Arc::new(RwLock::new(self))
    }

    // ==================== Columns ====================

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_exists(&self, name: &str) -> bool {
        self.find_ordinal(name).is_some()
    }

    pub fn column(&self, name: &str) -> TableResult<&Column> {
        let ordinal = self.ordinal(name)?;
        Ok(&self.columns[ordinal])
    }

    /// Ordinal of a column, honouring the case-sensitivity rule.
    pub fn ordinal(&self, name: &str) -> TableResult<usize> {
        self.find_ordinal(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub(crate) fn find_ordinal(&self, name: &str) -> Option<usize> {
        find_ordinal(&self.columns, name, self.config.case_sensitive)
    }

    /// Primary key column names, in ordinal order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Add a nullable column with no default.
    pub fn add_column(&mut self, name: impl Into<String>, data_type: DataType) -> TableResult<&Column> {
        self.add_column_def(Column::new(name, data_type))
    }

    /// Add a fully specified column. Existing rows receive the column's
    /// default (or null); the call fails if that would break a constraint.
    pub fn add_column_def(&mut self, column: Column) -> TableResult<&Column> {
        if self.column_exists(&column.name) {
            return Err(TableError::DuplicateColumn(column.name));
        }

        let mut column = column;
        if let Some(DefaultValue::Static(value)) = &column.default_value {
            let coerced = value
                .clone()
                .coerce(column.data_type)
                .map_err(|found| TableError::type_mismatch(&column.name, column.data_type, found))?;
            column.default_value = Some(DefaultValue::Static(coerced));
        }
        column.ordinal = self.columns.len();

        let mut fills = Vec::with_capacity(self.rows.len());
        for _ in &self.rows {
            fills.push(check_value(&column, column.initial_value())?);
        }

        let mut staged_columns = self.columns.as_ref().clone();
        staged_columns.push(column);
        if !self.rows.is_empty() && staged_columns.last().is_some_and(|c| c.unique || c.primary_key) {
            let staged_rows: Vec<Vec<Value>> = self
                .rows
                .iter()
                .zip(&fills)
                .map(|(row, fill)| {
                    let mut row = row.clone();
                    row.push(fill.clone());
                    row
                })
                .collect();
            validate_uniqueness(&staged_columns, &staged_rows, self.config.case_sensitive)?;
        }

        for (row, fill) in self.rows.iter_mut().zip(fills) {
            row.push(fill);
        }
        self.columns = Arc::new(staged_columns);

        let added = &self.columns[self.columns.len() - 1];
        tracing::debug!(table = %self.name, column = %added.name, data_type = %added.data_type, "column added");
        Ok(added)
    }

    /// Remove a column, dropping its value from every row and re-packing the
    /// remaining ordinals.
    pub fn remove_column(&mut self, name: &str) -> TableResult<Column> {
        let ordinal = self.ordinal(name)?;
        let columns = Arc::make_mut(&mut self.columns);
        let removed = columns.remove(ordinal);
        for (i, column) in columns.iter_mut().enumerate() {
            column.ordinal = i;
        }
        for row in &mut self.rows {
            row.remove(ordinal);
        }
        tracing::debug!(table = %self.name, column = %removed.name, "column removed");
        Ok(removed)
    }

    /// Change a column's nullability. Returns whether anything changed.
    /// Disallowing null fails if a committed row holds null in the column.
    pub fn set_allow_null(&mut self, name: &str, allow_null: bool) -> TableResult<bool> {
        let ordinal = self.ordinal(name)?;
        if self.columns[ordinal].allow_null == allow_null {
            return Ok(false);
        }
        if !allow_null && self.rows.iter().any(|row| row[ordinal].is_null()) {
            return Err(TableError::NullViolation(self.columns[ordinal].name.clone()));
        }
        Arc::make_mut(&mut self.columns)[ordinal].allow_null = allow_null;
        Ok(true)
    }

    /// A table with the same name, config and columns but no rows.
    pub fn clone_schema(&self) -> Table {
        Self {
            name: self.name.clone(),
            config: self.config.clone(),
            columns: Arc::clone(&self.columns),
            rows: Vec::new(),
        }
    }

    // ==================== Rows ====================

    /// A detached row sized to the current columns, holding each column's
    /// static default. Factory defaults run when the row is added.
    pub fn new_row(&self) -> DataRow {
        DataRow::for_columns(Arc::clone(&self.columns), self.config.case_sensitive)
    }

    /// Validate and commit a row. Returns its positional index.
    pub fn add_row(&mut self, source: impl Into<RowSource>) -> TableResult<usize> {
        let values = self.prepare_row(source.into())?;
        self.rows.push(values);
        Ok(self.rows.len() - 1)
    }

    /// Add a row from a JSON object or array.
    pub fn add_json_row(&mut self, json: &JsonValue) -> TableResult<usize> {
        let source = match json {
            JsonValue::Array(items) => RowSource::Positional(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        Value::from_json(item).ok_or_else(|| {
                            TableError::type_mismatch(format!("#{}", i), "scalar", json_kind(item))
                        })
                    })
                    .collect::<TableResult<Vec<_>>>()?,
            ),
            other => RowSource::Record(Record::from_json(other)?),
        };
        self.add_row(source)
    }

    pub fn row(&self, index: usize) -> TableResult<RowRef<'_>> {
        self.check_index(index)?;
        Ok(RowRef::new(self, index))
    }

    pub fn row_mut(&mut self, index: usize) -> TableResult<RowMut<'_>> {
        self.check_index(index)?;
        Ok(RowMut::new(self, index))
    }

    /// Remove the row at `index`, shifting later rows down. The removed row
    /// is returned detached.
    pub fn remove_row(&mut self, index: usize) -> TableResult<DataRow> {
        self.check_index(index)?;
        let values = self.rows.remove(index);
        Ok(DataRow::detached(Arc::clone(&self.columns), values, self.config.case_sensitive))
    }

    /// Remove all rows, keeping the columns.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in positional order.
    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        (0..self.rows.len()).map(move |i| RowRef::new(self, i))
    }

    /// All rows as plain records.
    pub fn to_records(&self) -> Vec<Record> {
        self.rows().map(|row| row.to_record()).collect()
    }

    /// Set one value on a committed row. The row is unchanged on error.
    pub(crate) fn set_value(&mut self, index: usize, name: &str, value: Value) -> TableResult<()> {
        self.check_index(index)?;
        let ordinal = self.ordinal(name)?;
        let column = &self.columns[ordinal];
        if column.read_only {
            return Err(TableError::ReadOnlyViolation(column.name.clone()));
        }
        let value = check_value(column, value)?;

        let mut candidate = self.rows[index].clone();
        candidate[ordinal] = value;
        self.check_unique(&candidate, Some(index))?;
        self.rows[index] = candidate;
        Ok(())
    }

    /// Append values already known to satisfy this table's columns.
    pub(crate) fn push_unchecked(&mut self, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.columns.len());
        self.rows.push(values);
    }

    pub(crate) fn row_values(&self, index: usize) -> &[Value] {
        &self.rows[index]
    }

    pub(crate) fn detached_row(&self, index: usize) -> DataRow {
        DataRow::detached(Arc::clone(&self.columns), self.rows[index].clone(), self.config.case_sensitive)
    }

    /// Rearrange rows so that position `i` holds the row previously at
    /// `order[i]`. `order` must be a permutation of the row positions.
    pub(crate) fn reorder(&mut self, order: &[usize]) {
        let mut old: Vec<Option<Vec<Value>>> = std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        self.rows = order.iter().filter_map(|&i| old[i].take()).collect();
    }

    fn check_index(&self, index: usize) -> TableResult<()> {
        if index >= self.rows.len() {
            return Err(TableError::IndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    /// Turn a row source into a full, validated value vector.
    fn prepare_row(&self, source: RowSource) -> TableResult<Vec<Value>> {
        let width = self.columns.len();
        let provided: Vec<Option<Value>> = match source {
            RowSource::Positional(values) => {
                if values.len() > width {
                    return Err(TableError::TooManyValues {
                        expected: width,
                        found: values.len(),
                    });
                }
                let mut provided: Vec<Option<Value>> = values.into_iter().map(Some).collect();
                provided.resize(width, None);
                provided
            }
            RowSource::Record(record) => {
                let mut provided = vec![None; width];
                for (key, value) in record {
                    let ordinal = self.ordinal(&key)?;
                    provided[ordinal] = Some(value);
                }
                provided
            }
            RowSource::Detached(row) => {
                let mut provided = vec![None; width];
                for ((column, value), pending) in row.columns.iter().zip(row.values).zip(row.pending) {
                    let ordinal = self.ordinal(&column.name)?;
                    if !pending {
                        provided[ordinal] = Some(value);
                    }
                }
                provided
            }
        };

        let mut values = Vec::with_capacity(width);
        for (column, value) in self.columns.iter().zip(provided) {
            let value = value.unwrap_or_else(|| column.initial_value());
            values.push(check_value(column, value)?);
        }
        self.check_unique(&values, None)?;
        Ok(values)
    }

    /// Check a candidate row against every committed row except `exclude`.
    fn check_unique(&self, values: &[Value], exclude: Option<usize>) -> TableResult<()> {
        let case_sensitive = self.config.case_sensitive;
        for group in unique_groups(&self.columns) {
            if group.iter().any(|&o| values[o].is_null()) {
                continue;
            }
            let clash = self.rows.iter().enumerate().any(|(i, row)| {
                Some(i) != exclude
                    && group
                        .iter()
                        .all(|&o| values_equal(&row[o], &values[o], case_sensitive))
            });
            if clash {
                return Err(uniqueness_error(&self.columns, &group, values));
            }
        }
        Ok(())
    }
}

/// Coerce a value to its column's type and enforce nullability.
pub(crate) fn check_value(column: &Column, value: Value) -> TableResult<Value> {
    if value.is_null() {
        if !column.allow_null() {
            return Err(TableError::NullViolation(column.name.clone()));
        }
        return Ok(Value::Null);
    }
    value
        .coerce(column.data_type)
        .map_err(|found| TableError::type_mismatch(&column.name, column.data_type, found))
}

pub(crate) fn find_ordinal(columns: &[Column], name: &str, case_sensitive: bool) -> Option<usize> {
    columns
        .iter()
        .position(|c| str_eq(&c.name, name, case_sensitive))
}

/// Column groups that must hold distinct values: each unique column on its
/// own, and the primary key as a whole (composite when it spans several
/// columns).
fn unique_groups(columns: &[Column]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = columns
        .iter()
        .filter(|c| c.unique)
        .map(|c| vec![c.ordinal])
        .collect();
    let key: Vec<usize> = columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.ordinal)
        .collect();
    if !key.is_empty() && !groups.contains(&key) {
        groups.push(key);
    }
    groups
}

fn uniqueness_error(columns: &[Column], group: &[usize], values: &[Value]) -> TableError {
    let column = group
        .iter()
        .map(|&o| columns[o].name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let value = group
        .iter()
        .map(|&o| values[o].to_string())
        .collect::<Vec<_>>()
        .join(", ");
    TableError::UniquenessViolation { column, value }
}

/// Verify every unique group over a full set of rows.
fn validate_uniqueness(columns: &[Column], rows: &[Vec<Value>], case_sensitive: bool) -> TableResult<()> {
    for group in unique_groups(columns) {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in rows {
            if group.iter().any(|&o| row[o].is_null()) {
                continue;
            }
            let key: Vec<String> = group
                .iter()
                .map(|&o| unique_key(&row[o], case_sensitive))
                .collect();
            if !seen.insert(key) {
                return Err(uniqueness_error(columns, &group, row));
            }
        }
    }
    Ok(())
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

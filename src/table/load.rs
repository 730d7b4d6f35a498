//! Bulk loading of already-fetched records.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::{TableError, TableResult};
use crate::types::{Column, DataType};

use super::{Record, RowSource, Table};

impl Table {
    /// Load records in one all-or-nothing step. Returns the number of rows
    /// added.
    ///
    /// A table with no columns gets its columns inferred from the first
    /// record when the config allows it.
    pub fn load_from_query<I>(&mut self, records: I) -> TableResult<usize>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut records = records.into_iter().peekable();
        let previous_columns = Arc::clone(&self.columns);
        let inferred = match records.peek() {
            Some(first) if self.columns.is_empty() && self.rows.is_empty() && self.config.infer_columns => {
                if let Err(e) = self.infer_columns(first) {
                    self.columns = previous_columns;
                    return Err(e);
                }
                true
            }
            _ => false,
        };

        let start = self.rows.len();
        for record in records {
            let values = match self.prepare_row(RowSource::Record(record)) {
                Ok(values) => values,
                Err(e) => {
                    self.rows.truncate(start);
                    if inferred {
                        self.columns = previous_columns;
                    }
                    return Err(e);
                }
            };
            self.rows.push(values);
        }

        let loaded = self.rows.len() - start;
        tracing::debug!(table = %self.name, rows = loaded, inferred, "bulk load complete");
        Ok(loaded)
    }

    /// One nullable column per field of `first`, in field order. Names
    /// colliding under the table's case rule fail with `DuplicateColumn`.
    fn infer_columns(&mut self, first: &Record) -> TableResult<()> {
        for (name, value) in first.iter() {
            self.add_column_def(Column::new(name, DataType::infer(value)))?;
        }
        Ok(())
    }

    /// Load raw JSON objects. Every record is parsed before anything is
    /// committed.
    pub fn load_from_json(&mut self, records: &[JsonValue]) -> TableResult<usize> {
        let records = records
            .iter()
            .map(Record::from_json)
            .collect::<TableResult<Vec<_>>>()?;
        self.load_from_query(records)
    }

    /// Await a pending source of records, then load them synchronously.
    pub async fn load_from_future<F, I, E>(&mut self, source: F) -> TableResult<usize>
    where
        F: Future<Output = Result<I, E>>,
        I: IntoIterator<Item = Record>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let records = source.await.map_err(|e| TableError::Source(e.into()))?;
        self.load_from_query(records)
    }
}

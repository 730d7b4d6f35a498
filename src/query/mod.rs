//! Predicate and sort engines.
//!
//! Two entry points filter a table's rows: [`Table::select`] hands each row
//! to a closure as a plain [`Record`], and [`Table::find_rows`] evaluates
//! [`Criteria`] against row accessors. Neither mutates the table and both
//! keep positional order.

mod criteria;
pub mod helpers;
mod sort;

pub use criteria::{Criteria, Matcher, Operator, Operators, RowPredicate, Term};
pub use sort::{SortKey, SortOrder};

use crate::error::TableResult;
use crate::table::{Record, RowRef, Table};

impl Table {
    /// Rows, as plain records, for which `predicate` holds.
    pub fn select<F>(&self, predicate: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        self.rows()
            .map(|row| row.to_record())
            .filter(|record| predicate(record))
            .collect()
    }

    /// Rows matching `criteria`, in positional order.
    pub fn find_rows(&self, criteria: &Criteria) -> TableResult<Vec<RowRef<'_>>> {
        let compiled = criteria.compile(self)?;
        let mut found = Vec::new();
        for row in self.rows() {
            if compiled.matches(&row)? {
                found.push(row);
            }
        }
        Ok(found)
    }

    /// First row matching `criteria`, or `None`.
    pub fn find_one(&self, criteria: &Criteria) -> TableResult<Option<RowRef<'_>>> {
        let compiled = criteria.compile(self)?;
        for row in self.rows() {
            if compiled.matches(&row)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    /// Positions of rows matching `criteria`.
    pub(crate) fn matching_indices(&self, criteria: &Criteria) -> TableResult<Vec<usize>> {
        Ok(self
            .find_rows(criteria)?
            .into_iter()
            .map(|row| row.index())
            .collect())
    }
}

//! Stable single-key, multi-key and custom-key sorting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};
use crate::table::{RowRef, Table};

use super::helpers::compare_values;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[inline]
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        })
    }
}

impl FromStr for SortOrder {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(TableError::InvalidCriteria(format!("unknown sort order '{}'", other))),
        }
    }
}

/// One criterion of a composite sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Desc)
    }
}

impl Table {
    /// Stable sort by one column, in place.
    pub fn sort(&mut self, column: &str, order: SortOrder) -> TableResult<&mut Self> {
        self.sort_multiple(&[SortKey::new(column, order)])
    }

    /// Stable sort by several keys, in place. The first key dominates; later
    /// keys break ties; remaining ties keep their prior order.
    pub fn sort_multiple(&mut self, keys: &[SortKey]) -> TableResult<&mut Self> {
        let order = self.sorted_order((0..self.row_count()).collect(), keys)?;
        self.reorder(&order);
        tracing::debug!(table = %self.name(), keys = keys.len(), "rows sorted");
        Ok(self)
    }

    /// Stable sort ascending by a key derived from each row. Wrap the key
    /// in [`std::cmp::Reverse`] to sort descending.
    pub fn sort_by<K, F>(&mut self, mut key_fn: F) -> &mut Self
    where
        K: Ord,
        F: FnMut(&RowRef<'_>) -> K,
    {
        let keys: Vec<K> = self.rows().map(|row| key_fn(&row)).collect();
        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        self.reorder(&order);
        self
    }

    /// Stable ordering of `indices` by `keys`, without touching the rows.
    pub(crate) fn sorted_order(&self, mut indices: Vec<usize>, keys: &[SortKey]) -> TableResult<Vec<usize>> {
        let resolved = keys
            .iter()
            .map(|key| Ok((self.ordinal(&key.column)?, key.order)))
            .collect::<TableResult<Vec<_>>>()?;
        let case_sensitive = self.case_sensitive();

        indices.sort_by(|&a, &b| {
            let (row_a, row_b) = (self.row_values(a), self.row_values(b));
            for &(ordinal, order) in &resolved {
                let ordering = compare_values(&row_a[ordinal], &row_b[ordinal], case_sensitive);
                if ordering != Ordering::Equal {
                    return order.apply(ordering);
                }
            }
            Ordering::Equal
        });
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Value};
    use std::cmp::Reverse;

    fn people() -> Table {
        let mut table = Table::new("people");
        table.add_column("age", DataType::Number).unwrap();
        table.add_column("name", DataType::String).unwrap();
        for (age, name) in [(30, "B"), (30, "A"), (25, "Z")] {
            table.add_row(vec![Value::from(age), Value::from(name)]).unwrap();
        }
        table
    }

    fn names(table: &Table) -> Vec<String> {
        table
            .rows()
            .map(|r| r.get("name").unwrap().to_display_string())
            .collect()
    }

    #[test]
    fn test_sort_is_stable() {
        let mut table = people();
        table.sort("age", SortOrder::Desc).unwrap();
        assert_eq!(names(&table), vec!["B", "A", "Z"]);
    }

    #[test]
    fn test_sort_multiple() {
        let mut table = people();
        table
            .sort_multiple(&[SortKey::desc("age"), SortKey::asc("name")])
            .unwrap();
        assert_eq!(names(&table), vec!["A", "B", "Z"]);
    }

    #[test]
    fn test_sort_by_derived_key() {
        let mut table = people();
        table.sort_by(|row| Reverse(row.get("name").unwrap().to_display_string()));
        assert_eq!(names(&table), vec!["Z", "B", "A"]);
    }

    #[test]
    fn test_sort_unknown_column() {
        let mut table = people();
        assert!(matches!(
            table.sort("height", SortOrder::Asc),
            Err(TableError::UnknownColumn(_))
        ));
        assert_eq!(names(&table), vec!["B", "A", "Z"]);
    }

    #[test]
    fn test_sort_chains() {
        let mut table = people();
        let count = table.sort("name", SortOrder::Asc).unwrap().row_count();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_sort_order_from_str() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("up".parse::<SortOrder>().is_err());
    }
}

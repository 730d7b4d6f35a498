//! Live, filtered and sorted projections over a shared table.
//!
//! A view owns only its filter and sort. Every access re-runs both against
//! the base table's current contents, so rows added to or removed from the
//! base show up without rebuilding the view.

use crate::error::TableResult;
use crate::query::{Criteria, SortKey, SortOrder};
use crate::table::{DataRow, Record, SharedTable, Table};

#[derive(Debug, Clone)]
pub struct View {
    base: SharedTable,
    filter: Option<Criteria>,
    sort: Vec<SortKey>,
}

impl View {
    /// A view over `base`, optionally filtered and sorted by one column.
    pub fn new(base: SharedTable, filter: Option<Criteria>, sort: Option<(String, SortOrder)>) -> Self {
        Self {
            base,
            filter,
            sort: sort
                .map(|(column, order)| vec![SortKey::new(column, order)])
                .unwrap_or_default(),
        }
    }

    /// A view sorted by several keys.
    pub fn with_sort_keys(base: SharedTable, filter: Option<Criteria>, sort: Vec<SortKey>) -> Self {
        Self { base, filter, sort }
    }

    pub fn base(&self) -> &SharedTable {
        &self.base
    }

    pub fn filter(&self) -> Option<&Criteria> {
        self.filter.as_ref()
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort
    }

    /// Number of base rows currently passing the filter.
    pub fn count(&self) -> TableResult<usize> {
        let table = self.base.read();
        match &self.filter {
            Some(criteria) => Ok(table.matching_indices(criteria)?.len()),
            None => Ok(table.row_count()),
        }
    }

    /// First row of the current projection, detached.
    pub fn first_row(&self) -> TableResult<Option<DataRow>> {
        let table = self.base.read();
        let order = self.project(&table)?;
        Ok(order.first().map(|&i| table.detached_row(i)))
    }

    /// Current projection as detached rows, in view order.
    pub fn rows(&self) -> TableResult<Vec<DataRow>> {
        let table = self.base.read();
        let order = self.project(&table)?;
        Ok(order
            .into_iter()
            .map(|i| table.detached_row(i))
            .collect())
    }

    /// Snapshot of the current projection as an independent table.
    pub fn to_table(&self) -> TableResult<Table> {
        let table = self.base.read();
        let order = self.project(&table)?;
        let mut snapshot = table.clone_schema();
        for i in order {
            snapshot.push_unchecked(table.row_values(i).to_vec());
        }
        Ok(snapshot)
    }

    /// Current projection as plain records.
    pub fn to_array(&self) -> TableResult<Vec<Record>> {
        let table = self.base.read();
        let order = self.project(&table)?;
        order
            .into_iter()
            .map(|i| table.row(i).map(|row| row.to_record()))
            .collect()
    }

    fn project(&self, table: &Table) -> TableResult<Vec<usize>> {
        let indices = match &self.filter {
            Some(criteria) => table.matching_indices(criteria)?,
            None => (0..table.row_count()).collect(),
        };
        if self.sort.is_empty() {
            return Ok(indices);
        }
        table.sorted_order(indices, &self.sort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Operators;
    use crate::types::{DataType, Value};

    fn shared() -> SharedTable {
        let mut table = Table::new("scores");
        table.add_column("player", DataType::String).unwrap();
        table.add_column("score", DataType::Number).unwrap();
        for (player, score) in [("ann", 40), ("bo", 75), ("cy", 90), ("di", 60)] {
            table.add_row(vec![Value::from(player), Value::from(score)]).unwrap();
        }
        table.into_shared()
    }

    fn high_scores(base: &SharedTable) -> View {
        View::new(
            base.clone(),
            Some(Criteria::new().field("score", Operators::new().gte(60))),
            Some(("score".to_string(), SortOrder::Desc)),
        )
    }

    #[test]
    fn test_projection_filters_and_sorts() {
        let base = shared();
        let view = high_scores(&base);
        let players: Vec<Value> = view
            .to_array()
            .unwrap()
            .into_iter()
            .map(|r| r["player"].clone())
            .collect();
        assert_eq!(players, vec![Value::from("cy"), Value::from("bo"), Value::from("di")]);
        assert_eq!(
            view.first_row().unwrap().unwrap().get("player").unwrap(),
            &Value::from("cy")
        );
    }

    #[test]
    fn test_view_is_live() {
        let base = shared();
        let view = high_scores(&base);
        assert_eq!(view.count().unwrap(), 3);

        base.write()
            .add_row(vec![Value::from("ed"), Value::from(99)])
            .unwrap();
        assert_eq!(view.count().unwrap(), 4);
        assert_eq!(
            view.first_row().unwrap().unwrap().get("player").unwrap(),
            &Value::from("ed")
        );

        base.write().clear();
        assert_eq!(view.count().unwrap(), 0);
        assert!(view.first_row().unwrap().is_none());
    }

    #[test]
    fn test_to_table_is_independent() {
        let base = shared();
        let view = high_scores(&base);
        let mut snapshot = view.to_table().unwrap();
        assert_eq!(snapshot.row_count(), 3);

        snapshot.add_row(vec![Value::from("zz"), Value::from(1)]).unwrap();
        base.write().remove_row(0).unwrap();
        assert_eq!(snapshot.row_count(), 4);
        assert_eq!(base.read().row_count(), 3);
    }

    #[test]
    fn test_unfiltered_view() {
        let base = shared();
        let view = View::new(base, None, None);
        assert_eq!(view.count().unwrap(), 4);
        assert_eq!(view.rows().unwrap().len(), 4);
    }
}

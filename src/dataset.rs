//! Datasets: named tables plus named parent/child relations.
//!
//! Relations are advisory. Nothing checks parent-key uniqueness or child
//! existence when a relation is declared or when rows change; navigation
//! scans the related table on every lookup.

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::{TableError, TableResult};
use crate::query::helpers::{str_eq, values_equal};
use crate::table::{RowRef, Table};

/// Named key linkage between a parent and a child table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    name: String,
    parent_table: String,
    child_table: String,
    parent_key_column: String,
    child_key_column: String,
}

impl Relation {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_table(&self) -> &str {
        &self.parent_table
    }

    pub fn child_table(&self) -> &str {
        &self.child_table
    }

    pub fn parent_key_column(&self) -> &str {
        &self.parent_key_column
    }

    pub fn child_key_column(&self) -> &str {
        &self.child_key_column
    }

    fn references(&self, table: &str, case_sensitive: bool) -> bool {
        str_eq(&self.parent_table, table, case_sensitive) || str_eq(&self.child_table, table, case_sensitive)
    }
}

/// A named collection of tables and relations.
#[derive(Debug, Clone)]
pub struct DataSet {
    name: String,
    config: EngineConfig,
    tables: Vec<Table>,
    relations: Vec<Relation>,
}

impl DataSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, EngineConfig::default())
    }

    /// Tables created through this dataset inherit `config`; its
    /// case-sensitivity rule also governs table and relation names.
    pub fn with_config(name: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            name: name.into(),
            config,
            tables: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ==================== Tables ====================

    /// Create an empty table.
    pub fn add_table(&mut self, name: impl Into<String>) -> TableResult<&mut Table> {
        let table = Table::with_config(name, &self.config);
        self.insert_table(table)
    }

    /// Add an existing table.
    pub fn insert_table(&mut self, table: Table) -> TableResult<&mut Table> {
        if self.position(table.name()).is_some() {
            return Err(TableError::DuplicateTable(table.name().to_string()));
        }
        tracing::debug!(dataset = %self.name, table = %table.name(), "table added");
        self.tables.push(table);
        let last = self.tables.len() - 1;
        Ok(&mut self.tables[last])
    }

    pub fn table(&self, name: &str) -> TableResult<&Table> {
        self.position(name)
            .map(|i| &self.tables[i])
            .ok_or_else(|| TableError::UnknownTable(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> TableResult<&mut Table> {
        match self.position(name) {
            Some(i) => Ok(&mut self.tables[i]),
            None => Err(TableError::UnknownTable(name.to_string())),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter()
    }

    /// Remove a table together with every relation that references it.
    pub fn remove_table(&mut self, name: &str) -> TableResult<Table> {
        let index = self
            .position(name)
            .ok_or_else(|| TableError::UnknownTable(name.to_string()))?;
        let table = self.tables.remove(index);
        let case_sensitive = self.config.case_sensitive;
        self.relations
            .retain(|r| !r.references(table.name(), case_sensitive));
        Ok(table)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| str_eq(t.name(), name, self.config.case_sensitive))
    }

    // ==================== Relations ====================

    /// Declare a relation. Key columns are resolved lazily at lookup time.
    pub fn add_relation(
        &mut self,
        name: impl Into<String>,
        parent_table: &str,
        child_table: &str,
        parent_key_column: &str,
        child_key_column: &str,
    ) -> TableResult<&Relation> {
        let name = name.into();
        if self.find_relation(&name).is_some() {
            return Err(TableError::DuplicateRelation(name));
        }
        let parent_table = self.table(parent_table)?.name().to_string();
        let child_table = self.table(child_table)?.name().to_string();

        tracing::debug!(
            dataset = %self.name,
            relation = %name,
            parent = %parent_table,
            child = %child_table,
            "relation added"
        );
        self.relations.push(Relation {
            name,
            parent_table,
            child_table,
            parent_key_column: parent_key_column.to_string(),
            child_key_column: child_key_column.to_string(),
        });
        Ok(&self.relations[self.relations.len() - 1])
    }

    pub fn relation(&self, name: &str) -> TableResult<&Relation> {
        self.find_relation(name)
            .ok_or_else(|| TableError::UnknownRelation(name.to_string()))
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    fn find_relation(&self, name: &str) -> Option<&Relation> {
        self.relations
            .iter()
            .find(|r| str_eq(&r.name, name, self.config.case_sensitive))
    }

    /// Child rows whose child key equals the parent row's parent key, in
    /// positional order. A null parent key has no children.
    pub fn get_child_rows(&self, parent_row: &RowRef<'_>, relation: &str) -> TableResult<Vec<RowRef<'_>>> {
        let relation = self.relation(relation)?;
        let key = parent_row.get(&relation.parent_key_column)?;
        let child = self.table(&relation.child_table)?;
        let ordinal = child.ordinal(&relation.child_key_column)?;
        if key.is_null() {
            return Ok(Vec::new());
        }
        Ok(child
            .rows()
            .filter(|row| values_equal(&row.values()[ordinal], key, child.case_sensitive()))
            .collect())
    }

    /// The parent row whose parent key equals the child row's child key, or
    /// `None` for an orphan.
    pub fn get_parent_row(&self, child_row: &RowRef<'_>, relation: &str) -> TableResult<Option<RowRef<'_>>> {
        let relation = self.relation(relation)?;
        let key = child_row.get(&relation.child_key_column)?;
        let parent = self.table(&relation.parent_table)?;
        let ordinal = parent.ordinal(&relation.parent_key_column)?;
        if key.is_null() {
            return Ok(None);
        }
        Ok(parent
            .rows()
            .find(|row| values_equal(&row.values()[ordinal], key, parent.case_sensitive())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DataType, Value};

    fn shop() -> DataSet {
        let mut ds = DataSet::new("shop");
        let customers = ds.add_table("customers").unwrap();
        customers
            .add_column_def(Column::new("id", DataType::Number).with_primary_key())
            .unwrap();
        customers.add_column("name", DataType::String).unwrap();
        customers.add_row(vec![Value::from(1), Value::from("Ann")]).unwrap();
        customers.add_row(vec![Value::from(2), Value::from("Bo")]).unwrap();

        let orders = ds.add_table("orders").unwrap();
        orders.add_column("id", DataType::Number).unwrap();
        orders.add_column("customer_id", DataType::Number).unwrap();
        for (id, customer) in [(10, 1), (11, 1), (12, 3)] {
            orders.add_row(vec![Value::from(id), Value::from(customer)]).unwrap();
        }

        ds.add_relation("customer_orders", "customers", "orders", "id", "customer_id")
            .unwrap();
        ds
    }

    #[test]
    fn test_child_rows() {
        let ds = shop();
        let ann = ds.table("customers").unwrap().row(0).unwrap();
        let children = ds.get_child_rows(&ann, "customer_orders").unwrap();
        let ids: Vec<&Value> = children.iter().map(|r| r.get("id").unwrap()).collect();
        assert_eq!(ids, vec![&Value::from(10), &Value::from(11)]);

        let bo = ds.table("customers").unwrap().row(1).unwrap();
        assert!(ds.get_child_rows(&bo, "customer_orders").unwrap().is_empty());
    }

    #[test]
    fn test_parent_row_and_orphans() {
        let ds = shop();
        let orders = ds.table("orders").unwrap();
        let parent = ds
            .get_parent_row(&orders.row(0).unwrap(), "customer_orders")
            .unwrap()
            .unwrap();
        assert_eq!(parent.get("name").unwrap(), &Value::from("Ann"));

        let orphan = ds.get_parent_row(&orders.row(2).unwrap(), "customer_orders").unwrap();
        assert!(orphan.is_none());
    }

    #[test]
    fn test_relation_errors() {
        let mut ds = shop();
        assert!(matches!(
            ds.add_relation("customer_orders", "customers", "orders", "id", "customer_id"),
            Err(TableError::DuplicateRelation(_))
        ));
        assert!(matches!(
            ds.add_relation("r2", "customers", "invoices", "id", "customer_id"),
            Err(TableError::UnknownTable(_))
        ));

        let row = ds.table("customers").unwrap().row(0).unwrap();
        assert!(matches!(
            ds.get_child_rows(&row, "nope"),
            Err(TableError::UnknownRelation(_))
        ));
    }

    #[test]
    fn test_duplicate_table() {
        let mut ds = shop();
        assert!(matches!(ds.add_table("Orders"), Err(TableError::DuplicateTable(_))));
    }

    #[test]
    fn test_remove_table_drops_relations() {
        let mut ds = shop();
        let removed = ds.remove_table("orders").unwrap();
        assert_eq!(removed.row_count(), 3);
        assert!(ds.relations().is_empty());
        assert!(matches!(ds.table("orders"), Err(TableError::UnknownTable(_))));
    }
}

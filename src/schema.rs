//! Schema descriptors.
//!
//! A descriptor is the portable form of a table's column store. Tables can
//! export one, be rebuilt from one, and be compared against or reconciled
//! with another table's schema.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use crate::config::EngineConfig;
use crate::error::{TableError, TableResult};
use crate::query::helpers::str_eq;
use crate::table::Table;
use crate::types::{Column, DataType, DefaultValue, FactoryRegistry, Value};

/// JSON key marking a factory default in a descriptor.
const FACTORY_KEY: &str = "$factory";

fn default_true() -> bool {
    true
}

/// Portable description of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(default)]
    pub data_type: DataType,
    #[serde(default = "default_true")]
    pub allow_null: bool,
    /// Static default as JSON, or `{"$factory": "<name>"}`.
    #[serde(default)]
    pub default_value: Option<JsonValue>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub ordinal: usize,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub is_primary_key: bool,
}

/// Portable description of a table's structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescriptor {
    pub table_name: String,
    #[serde(default)]
    pub case_sensitive: bool,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub unique_constraints: Vec<String>,
}

impl SchemaDescriptor {
    pub fn to_json_string(&self) -> TableResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(s: &str) -> TableResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Column whose type differs between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDifference {
    pub column: String,
    pub self_type: DataType,
    pub other_type: DataType,
}

/// Column whose nullability differs between two schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NullabilityDifference {
    pub column: String,
    pub self_allow_null: bool,
    pub other_allow_null: bool,
}

/// Result of comparing this table's schema with another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDiff {
    /// In the other schema but not in this one.
    pub missing_columns: Vec<String>,
    /// In this schema but not in the other.
    pub extra_columns: Vec<String>,
    pub type_mismatches: Vec<TypeDifference>,
    pub nullability_differences: Vec<NullabilityDifference>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.missing_columns.is_empty()
            && self.extra_columns.is_empty()
            && self.type_mismatches.is_empty()
            && self.nullability_differences.is_empty()
    }
}

/// Whether a schema update may remove columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Add missing columns and sync nullability; never remove.
    #[default]
    Additive,
    /// Additionally remove columns absent from the other schema.
    Destructive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    AllowNull,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChange {
    pub column: String,
    pub change: ChangeKind,
    pub from: JsonValue,
    pub to: JsonValue,
}

/// What a schema update changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaUpdateReport {
    pub added_columns: Vec<String>,
    pub removed_columns: Vec<String>,
    pub modified_columns: Vec<ColumnChange>,
    /// Requested changes that were not applied, e.g. making a primary-key
    /// column nullable.
    pub skipped_columns: Vec<ColumnChange>,
}

impl SchemaUpdateReport {
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty() && self.removed_columns.is_empty() && self.modified_columns.is_empty()
    }
}

fn export_default(table: &str, column: &Column) -> Option<JsonValue> {
    match column.default_value()? {
        DefaultValue::Static(Value::Null) => None,
        DefaultValue::Static(v) => Some(v.to_json()),
        DefaultValue::Factory { name, .. } if name.is_empty() => {
            tracing::warn!(table, column = %column.name(), "unnamed default factory dropped from schema export");
            None
        }
        DefaultValue::Factory { name, .. } => Some(json!({ FACTORY_KEY: name })),
    }
}

fn import_default(
    descriptor: &ColumnDescriptor,
    registry: &FactoryRegistry,
) -> TableResult<Option<DefaultValue>> {
    let Some(json) = &descriptor.default_value else {
        return Ok(None);
    };
    if let Some(name) = json.get(FACTORY_KEY).and_then(JsonValue::as_str) {
        return registry
            .resolve(name)
            .map(Some)
            .ok_or_else(|| TableError::UnknownFactory(name.to_string()));
    }
    match Value::from_json(json) {
        Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(DefaultValue::Static(value))),
        None => Err(TableError::type_mismatch(&descriptor.name, descriptor.data_type, "object")),
    }
}

fn column_from_descriptor(
    schema: &SchemaDescriptor,
    descriptor: &ColumnDescriptor,
    registry: &FactoryRegistry,
) -> TableResult<Column> {
    let listed = |names: &[String]| {
        names
            .iter()
            .any(|n| str_eq(n, &descriptor.name, schema.case_sensitive))
    };

    let mut column = Column::new(descriptor.name.clone(), descriptor.data_type)
        .with_allow_null(descriptor.allow_null)
        .with_default_value(import_default(descriptor, registry)?);
    if descriptor.is_primary_key || listed(&schema.primary_key) {
        column = column.with_primary_key();
    }
    if descriptor.unique || listed(&schema.unique_constraints) {
        column = column.with_unique();
    }
    if descriptor.read_only {
        column = column.with_read_only();
    }
    if let Some(expression) = &descriptor.expression {
        column = column.with_expression(expression.clone());
    }
    if !descriptor.caption.is_empty() && descriptor.caption != descriptor.name {
        column = column.with_caption(descriptor.caption.clone());
    }
    Ok(column)
}

fn columns_from_descriptor(schema: &SchemaDescriptor, registry: &FactoryRegistry) -> TableResult<Vec<Column>> {
    let mut descriptors: Vec<&ColumnDescriptor> = schema.columns.iter().collect();
    descriptors.sort_by_key(|d| d.ordinal);
    descriptors
        .into_iter()
        .map(|d| column_from_descriptor(schema, d, registry))
        .collect()
}

impl Table {
    /// Describe this table's columns and constraints.
    pub fn export_schema(&self) -> SchemaDescriptor {
        let columns = self
            .columns()
            .iter()
            .map(|c| ColumnDescriptor {
                name: c.name().to_string(),
                data_type: c.data_type(),
                allow_null: c.allow_null(),
                default_value: export_default(self.name(), c),
                expression: c.expression().map(str::to_string),
                read_only: c.is_read_only(),
                unique: c.is_unique(),
                ordinal: c.ordinal(),
                caption: c.caption().to_string(),
                is_primary_key: c.is_primary_key(),
            })
            .collect();

        SchemaDescriptor {
            table_name: self.name().to_string(),
            case_sensitive: self.case_sensitive(),
            columns,
            primary_key: self.primary_key().into_iter().map(str::to_string).collect(),
            unique_constraints: self
                .columns()
                .iter()
                .filter(|c| c.is_unique())
                .map(|c| c.name().to_string())
                .collect(),
        }
    }

    pub fn serialize_schema(&self) -> TableResult<String> {
        self.export_schema().to_json_string()
    }

    pub fn deserialize_schema(s: &str) -> TableResult<SchemaDescriptor> {
        SchemaDescriptor::from_json_str(s)
    }

    /// Build an empty table matching `schema`, resolving factory defaults
    /// through the built-in registry.
    pub fn import_schema(schema: &SchemaDescriptor) -> TableResult<Table> {
        Self::import_schema_with(schema, &FactoryRegistry::default())
    }

    pub fn import_schema_with(schema: &SchemaDescriptor, registry: &FactoryRegistry) -> TableResult<Table> {
        let config = EngineConfig::default().with_case_sensitive(schema.case_sensitive);
        let mut table = Table::with_config(schema.table_name.clone(), &config);
        for column in columns_from_descriptor(schema, registry)? {
            table.add_column_def(column)?;
        }
        Ok(table)
    }

    /// Compare with another table's schema, by column name under this
    /// table's case rule.
    pub fn compare_schema(&self, other: &Table) -> SchemaDiff {
        self.compare_descriptor(&other.export_schema())
    }

    pub fn compare_descriptor(&self, other: &SchemaDescriptor) -> SchemaDiff {
        let case_sensitive = self.case_sensitive();
        let mut diff = SchemaDiff::default();

        for theirs in &other.columns {
            let Some(ordinal) = self.find_ordinal(&theirs.name) else {
                diff.missing_columns.push(theirs.name.clone());
                continue;
            };
            let ours = &self.columns()[ordinal];
            if ours.data_type() != theirs.data_type {
                diff.type_mismatches.push(TypeDifference {
                    column: ours.name().to_string(),
                    self_type: ours.data_type(),
                    other_type: theirs.data_type,
                });
            }
            if ours.allow_null() != theirs.allow_null {
                diff.nullability_differences.push(NullabilityDifference {
                    column: ours.name().to_string(),
                    self_allow_null: ours.allow_null(),
                    other_allow_null: theirs.allow_null,
                });
            }
        }

        for ours in self.columns() {
            if !other
                .columns
                .iter()
                .any(|c| str_eq(&c.name, ours.name(), case_sensitive))
            {
                diff.extra_columns.push(ours.name().to_string());
            }
        }
        diff
    }

    /// Reconcile this table's columns with another table's.
    ///
    /// Adds missing columns using the other definition and syncs
    /// nullability; `UpdateMode::Destructive` also removes extra columns.
    /// On error nothing is changed.
    pub fn update_schema(&mut self, other: &Table, mode: UpdateMode) -> TableResult<SchemaUpdateReport> {
        self.apply_columns(other.columns(), mode)
    }

    pub fn update_from_descriptor(
        &mut self,
        other: &SchemaDescriptor,
        mode: UpdateMode,
        registry: &FactoryRegistry,
    ) -> TableResult<SchemaUpdateReport> {
        let columns = columns_from_descriptor(other, registry)?;
        self.apply_columns(&columns, mode)
    }

    fn apply_columns(&mut self, other: &[Column], mode: UpdateMode) -> TableResult<SchemaUpdateReport> {
        let mut staged = self.clone();
        let mut report = SchemaUpdateReport::default();

        for column in other {
            let Some(ordinal) = staged.find_ordinal(column.name()) else {
                staged.add_column_def(column.clone())?;
                report.added_columns.push(column.name().to_string());
                continue;
            };
            let current = &staged.columns()[ordinal];
            let (from, to) = (current.allow_null(), column.allow_null());
            if from == to {
                continue;
            }
            let change = ColumnChange {
                column: current.name().to_string(),
                change: ChangeKind::AllowNull,
                from: JsonValue::Bool(from),
                to: JsonValue::Bool(to),
            };
            if to && current.is_primary_key() {
                tracing::warn!(
                    table = %self.name(),
                    column = %change.column,
                    "primary key column cannot allow null; nullability left unchanged"
                );
                report.skipped_columns.push(change);
                continue;
            }
            staged.set_allow_null(&change.column, to)?;
            report.modified_columns.push(change);
        }

        if mode == UpdateMode::Destructive {
            let case_sensitive = staged.case_sensitive();
            let extra: Vec<String> = staged
                .columns()
                .iter()
                .filter(|ours| !other.iter().any(|c| str_eq(c.name(), ours.name(), case_sensitive)))
                .map(|c| c.name().to_string())
                .collect();
            for name in extra {
                staged.remove_column(&name)?;
                report.removed_columns.push(name);
            }
        }

        tracing::debug!(
            table = %self.name(),
            added = report.added_columns.len(),
            removed = report.removed_columns.len(),
            modified = report.modified_columns.len(),
            "schema updated"
        );
        *self = staged;
        Ok(report)
    }
}

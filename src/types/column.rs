//! Column definitions and default values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use super::{DataType, Value};

/// Zero-argument value producer used by factory defaults.
pub type FactoryFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default value of a column.
///
/// A factory runs once per row, when the row is committed.
#[derive(Clone)]
pub enum DefaultValue {
    Static(Value),
    Factory { name: String, produce: FactoryFn },
}

impl DefaultValue {
    pub fn factory<F>(name: impl Into<String>, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        DefaultValue::Factory {
            name: name.into(),
            produce: Arc::new(produce),
        }
    }

    /// Produce the value for a new row.
    pub fn evaluate(&self) -> Value {
        match self {
            DefaultValue::Static(v) => v.clone(),
            DefaultValue::Factory { produce, .. } => produce(),
        }
    }

    pub fn is_factory(&self) -> bool {
        matches!(self, DefaultValue::Factory { .. })
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(v) => f.debug_tuple("Static").field(v).finish(),
            DefaultValue::Factory { name, .. } => {
                f.debug_struct("Factory").field("name", name).finish_non_exhaustive()
            }
        }
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DefaultValue::Static(a), DefaultValue::Static(b)) => a == b,
            (DefaultValue::Factory { name: a, .. }, DefaultValue::Factory { name: b, .. }) => {
                a == b
            }
            _ => false,
        }
    }
}

/// Named default factories, resolved when a schema is imported.
#[derive(Clone)]
pub struct FactoryRegistry {
    factories: HashMap<String, FactoryFn>,
}

impl FactoryRegistry {
    /// A registry with no factories at all.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, produce: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(produce));
    }

    pub fn resolve(&self, name: &str) -> Option<DefaultValue> {
        self.factories
            .get(name)
            .map(|produce| DefaultValue::Factory {
                name: name.to_string(),
                produce: Arc::clone(produce),
            })
    }
}

impl Default for FactoryRegistry {
    /// Registry with the built-in `now` factory (current UTC instant).
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("now", || Value::Date(Utc::now()));
        registry
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("FactoryRegistry").field("factories", &names).finish()
    }
}

/// A typed, constrained column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub(crate) name: String,
    pub(crate) data_type: DataType,
    pub(crate) allow_null: bool,
    pub(crate) default_value: Option<DefaultValue>,
    pub(crate) primary_key: bool,
    pub(crate) unique: bool,
    pub(crate) read_only: bool,
    pub(crate) expression: Option<String>,
    pub(crate) ordinal: usize,
    pub(crate) caption: Option<String>,
}

impl Column {
    /// A nullable column with no default. The ordinal is assigned when the
    /// column is added to a table.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            allow_null: true,
            default_value: None,
            primary_key: false,
            unique: false,
            read_only: false,
            expression: None,
            ordinal: 0,
            caption: None,
        }
    }

    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// Mark as primary key. Primary key columns never accept null.
    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.allow_null = false;
        self
    }

    pub fn with_unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(DefaultValue::Static(value.into()));
        self
    }

    pub fn with_factory<F>(mut self, name: impl Into<String>, produce: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_value = Some(DefaultValue::factory(name, produce));
        self
    }

    pub fn with_default_value(mut self, default_value: Option<DefaultValue>) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Effective nullability: primary key columns never allow null.
    pub fn allow_null(&self) -> bool {
        self.allow_null && !self.primary_key
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default_value.as_ref()
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Display label, defaulting to the column name.
    pub fn caption(&self) -> &str {
        self.caption.as_deref().unwrap_or(&self.name)
    }

    /// Value a new row receives when none is supplied.
    pub(crate) fn initial_value(&self) -> Value {
        self.default_value
            .as_ref()
            .map(DefaultValue::evaluate)
            .unwrap_or(Value::Null)
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

use super::Value;

/// Declared kind of a column.
///
/// `Unspecified` accepts any value without coercion or validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
    Boolean,
    #[default]
    Unspecified,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
            DataType::Unspecified => "unspecified",
        }
    }

    /// Infer a column type from a sample value. Null carries no type
    /// information and yields `Unspecified`.
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Null => DataType::Unspecified,
            Value::Boolean(_) => DataType::Boolean,
            Value::Number(_) => DataType::Number,
            Value::String(_) => DataType::String,
            Value::Date(_) => DataType::Date,
        }
    }

    /// Whether `$gt`/`$gte`/`$lt`/`$lte` are meaningful for this type.
    pub fn is_ordered(&self) -> bool {
        !matches!(self, DataType::Boolean)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" => Ok(DataType::String),
            "number" => Ok(DataType::Number),
            "date" => Ok(DataType::Date),
            "boolean" => Ok(DataType::Boolean),
            "unspecified" | "" => Ok(DataType::Unspecified),
            other => Err(TableError::Config(format!("unknown data type '{}'", other))),
        }
    }
}

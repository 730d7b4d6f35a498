//! Type system: cell values, column kinds and column definitions.

mod column;
mod data_type;
mod value;

pub use column::{Column, DefaultValue, FactoryFn, FactoryRegistry};
pub use data_type::DataType;
pub use value::{parse_datetime, Value};

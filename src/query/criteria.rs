//! Criteria AST.
//!
//! Criteria are parsed eagerly into terms before evaluation. A term is
//! either a per-column matcher (literal, regex, or operator set) or a
//! functional predicate over the row accessor. All terms are ANDed, as are
//! all operators inside one operator set.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};

use crate::config::EngineConfig;
use crate::error::{TableError, TableResult};
use crate::table::{RowRef, Table};
use crate::types::{DataType, Value};

use super::helpers::{compare_ordered, contains_str, safe_regex, values_equal};

/// Functional predicate over a row accessor.
pub type RowPredicate = Arc<dyn Fn(&RowRef<'_>) -> bool + Send + Sync>;

/// One comparison operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Ne(Value),
    In(Vec<Value>),
    Contains(String),
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Gt(_) => "$gt",
            Operator::Gte(_) => "$gte",
            Operator::Lt(_) => "$lt",
            Operator::Lte(_) => "$lte",
            Operator::Ne(_) => "$ne",
            Operator::In(_) => "$in",
            Operator::Contains(_) => "$contains",
        }
    }

    fn is_range(&self) -> bool {
        matches!(
            self,
            Operator::Gt(_) | Operator::Gte(_) | Operator::Lt(_) | Operator::Lte(_)
        )
    }

    /// Parse one `"$op": operand` pair.
    pub fn parse(name: &str, operand: &JsonValue) -> TableResult<Self> {
        let scalar = |json: &JsonValue| {
            Value::from_json(json).ok_or_else(|| {
                TableError::InvalidCriteria(format!("{} expects a scalar operand", name))
            })
        };
        match name {
            "$gt" => Ok(Operator::Gt(scalar(operand)?)),
            "$gte" => Ok(Operator::Gte(scalar(operand)?)),
            "$lt" => Ok(Operator::Lt(scalar(operand)?)),
            "$lte" => Ok(Operator::Lte(scalar(operand)?)),
            "$ne" => Ok(Operator::Ne(scalar(operand)?)),
            "$in" => match operand {
                JsonValue::Array(items) => Ok(Operator::In(
                    items.iter().map(scalar).collect::<TableResult<Vec<_>>>()?,
                )),
                _ => Err(TableError::InvalidCriteria(
                    "$in expects an array operand".to_string(),
                )),
            },
            "$contains" => Ok(Operator::Contains(scalar(operand)?.to_display_string())),
            other => Err(TableError::UnknownOperator(other.to_string())),
        }
    }

    fn coerced(&self, data_type: DataType) -> Operator {
        match self {
            Operator::Gt(v) => Operator::Gt(coerce_operand(v, data_type)),
            Operator::Gte(v) => Operator::Gte(coerce_operand(v, data_type)),
            Operator::Lt(v) => Operator::Lt(coerce_operand(v, data_type)),
            Operator::Lte(v) => Operator::Lte(coerce_operand(v, data_type)),
            Operator::Ne(v) => Operator::Ne(coerce_operand(v, data_type)),
            Operator::In(vs) => Operator::In(vs.iter().map(|v| coerce_operand(v, data_type)).collect()),
            Operator::Contains(s) => Operator::Contains(s.clone()),
        }
    }

    fn matches(&self, column: &str, actual: &Value, case_sensitive: bool) -> TableResult<bool> {
        use std::cmp::Ordering::*;

        let result = match self {
            Operator::Gt(v) => matches!(compare_ordered(column, actual, v, case_sensitive)?, Some(Greater)),
            Operator::Gte(v) => matches!(
                compare_ordered(column, actual, v, case_sensitive)?,
                Some(Greater | Equal)
            ),
            Operator::Lt(v) => matches!(compare_ordered(column, actual, v, case_sensitive)?, Some(Less)),
            Operator::Lte(v) => matches!(
                compare_ordered(column, actual, v, case_sensitive)?,
                Some(Less | Equal)
            ),
            Operator::Ne(v) => !values_equal(actual, v, case_sensitive),
            Operator::In(vs) => vs.iter().any(|v| values_equal(actual, v, case_sensitive)),
            Operator::Contains(needle) => {
                !actual.is_null() && contains_str(&actual.to_display_string(), needle, case_sensitive)
            }
        };
        Ok(result)
    }
}

/// A set of operators applied to one column, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operators {
    ops: Vec<Operator>,
}

impl Operators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(self, v: impl Into<Value>) -> Self {
        self.with(Operator::Gt(v.into()))
    }

    pub fn gte(self, v: impl Into<Value>) -> Self {
        self.with(Operator::Gte(v.into()))
    }

    pub fn lt(self, v: impl Into<Value>) -> Self {
        self.with(Operator::Lt(v.into()))
    }

    pub fn lte(self, v: impl Into<Value>) -> Self {
        self.with(Operator::Lte(v.into()))
    }

    pub fn ne(self, v: impl Into<Value>) -> Self {
        self.with(Operator::Ne(v.into()))
    }

    pub fn any_of<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with(Operator::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn contains(self, needle: impl Into<String>) -> Self {
        self.with(Operator::Contains(needle.into()))
    }

    pub fn with(mut self, op: Operator) -> Self {
        self.ops.push(op);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.ops.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// How one column's value is tested.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exact, type-aware equality.
    Literal(Value),
    /// Applied to the string form of the value.
    Regex(Regex),
    OperatorSet(Operators),
}

impl Matcher {
    fn matches(&self, column: &str, actual: &Value, case_sensitive: bool) -> TableResult<bool> {
        match self {
            Matcher::Literal(expected) => Ok(values_equal(actual, expected, case_sensitive)),
            Matcher::Regex(re) => Ok(!actual.is_null() && re.is_match(&actual.to_display_string())),
            Matcher::OperatorSet(ops) => {
                for op in ops.iter() {
                    if !op.matches(column, actual, case_sensitive)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Resolve operands against the column type, e.g. date strings to dates.
    fn bind(&self, column: &str, data_type: DataType) -> TableResult<Matcher> {
        match self {
            Matcher::Literal(v) => Ok(Matcher::Literal(coerce_operand(v, data_type))),
            Matcher::Regex(re) => Ok(Matcher::Regex(re.clone())),
            Matcher::OperatorSet(ops) => {
                let mut bound = Operators::new();
                for op in ops.iter() {
                    if op.is_range() && !data_type.is_ordered() {
                        return Err(TableError::type_mismatch(column, "an ordered type", data_type));
                    }
                    bound = bound.with(op.coerced(data_type));
                }
                Ok(Matcher::OperatorSet(bound))
            }
        }
    }
}

fn coerce_operand(value: &Value, data_type: DataType) -> Value {
    value.clone().coerce(data_type).unwrap_or_else(|_| value.clone())
}

impl From<Value> for Matcher {
    fn from(v: Value) -> Self {
        Matcher::Literal(v)
    }
}

impl From<&str> for Matcher {
    fn from(v: &str) -> Self {
        Matcher::Literal(v.into())
    }
}

impl From<String> for Matcher {
    fn from(v: String) -> Self {
        Matcher::Literal(v.into())
    }
}

impl From<i32> for Matcher {
    fn from(v: i32) -> Self {
        Matcher::Literal(v.into())
    }
}

impl From<f64> for Matcher {
    fn from(v: f64) -> Self {
        Matcher::Literal(v.into())
    }
}

impl From<bool> for Matcher {
    fn from(v: bool) -> Self {
        Matcher::Literal(v.into())
    }
}

impl From<Regex> for Matcher {
    fn from(re: Regex) -> Self {
        Matcher::Regex(re)
    }
}

impl From<Operators> for Matcher {
    fn from(ops: Operators) -> Self {
        Matcher::OperatorSet(ops)
    }
}

#[derive(Clone)]
pub enum Term {
    Field { column: String, matcher: Matcher },
    Functional(RowPredicate),
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Field { column, matcher } => f
                .debug_struct("Field")
                .field("column", column)
                .field("matcher", matcher)
                .finish(),
            Term::Functional(_) => f.write_str("Functional(..)"),
        }
    }
}

/// Row-selection criteria. Empty criteria match every row.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    terms: Vec<Term>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria made of a single functional predicate.
    pub fn func<F>(predicate: F) -> Self
    where
        F: Fn(&RowRef<'_>) -> bool + Send + Sync + 'static,
    {
        Self::new().and_func(predicate)
    }

    pub fn and_func<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RowRef<'_>) -> bool + Send + Sync + 'static,
    {
        self.terms.push(Term::Functional(Arc::new(predicate)));
        self
    }

    pub fn field(mut self, column: impl Into<String>, matcher: impl Into<Matcher>) -> Self {
        self.terms.push(Term::Field {
            column: column.into(),
            matcher: matcher.into(),
        });
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.field(column, Matcher::Literal(value.into()))
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Parse a JSON criteria object with the default pattern limits.
    pub fn from_json(json: &JsonValue) -> TableResult<Self> {
        Self::from_json_with(json, &EngineConfig::default())
    }

    /// Parse a JSON criteria object.
    ///
    /// - scalar: literal equality
    /// - `{"$regex": "...", "$options": "i"}`: regex on the string form
    /// - `{"$gt": .., "$lt": ..}`: operator set
    pub fn from_json_with(json: &JsonValue, config: &EngineConfig) -> TableResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| TableError::InvalidCriteria("criteria must be an object".to_string()))?;

        let mut criteria = Criteria::new();
        for (column, spec) in obj {
            let matcher = match spec {
                JsonValue::Object(ops) if ops.contains_key("$regex") => parse_regex(column, ops, config)?,
                JsonValue::Object(ops) => {
                    if ops.is_empty() {
                        return Err(TableError::InvalidCriteria(format!(
                            "empty operator set for '{}'",
                            column
                        )));
                    }
                    let mut operators = Operators::new();
                    for (name, operand) in ops {
                        operators = operators.with(Operator::parse(name, operand)?);
                    }
                    Matcher::OperatorSet(operators)
                }
                JsonValue::Array(_) => {
                    return Err(TableError::InvalidCriteria(format!(
                        "array given for '{}'; use $in",
                        column
                    )))
                }
                scalar => Matcher::Literal(Value::from_json(scalar).unwrap_or_default()),
            };
            criteria = criteria.field(column.clone(), matcher);
        }
        Ok(criteria)
    }

    /// Resolve column names against a table.
    pub(crate) fn compile<'c>(&'c self, table: &Table) -> TableResult<CompiledCriteria<'c>> {
        let mut terms = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            terms.push(match term {
                Term::Field { column, matcher } => {
                    let ordinal = table.ordinal(column)?;
                    let data_type = table.columns()[ordinal].data_type();
                    CompiledTerm::Field {
                        ordinal,
                        column: column.as_str(),
                        matcher: matcher.bind(column, data_type)?,
                    }
                }
                Term::Functional(predicate) => CompiledTerm::Functional(predicate),
            });
        }
        Ok(CompiledCriteria {
            terms,
            case_sensitive: table.case_sensitive(),
        })
    }
}

fn parse_regex(column: &str, ops: &Map<String, JsonValue>, config: &EngineConfig) -> TableResult<Matcher> {
    if let Some(extra) = ops.keys().find(|k| *k != "$regex" && *k != "$options") {
        return Err(TableError::InvalidCriteria(format!(
            "'{}' cannot be combined with $regex on '{}'",
            extra, column
        )));
    }
    let pattern = ops
        .get("$regex")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| TableError::InvalidCriteria("$regex expects a string".to_string()))?;
    let options = ops.get("$options").and_then(JsonValue::as_str).unwrap_or("");
    let re = safe_regex(pattern, options.contains('i'), config.max_pattern_len)?;
    Ok(Matcher::Regex(re))
}

enum CompiledTerm<'c> {
    Field {
        ordinal: usize,
        column: &'c str,
        matcher: Matcher,
    },
    Functional(&'c RowPredicate),
}

pub(crate) struct CompiledCriteria<'c> {
    terms: Vec<CompiledTerm<'c>>,
    case_sensitive: bool,
}

impl CompiledCriteria<'_> {
    pub(crate) fn matches(&self, row: &RowRef<'_>) -> TableResult<bool> {
        for term in &self.terms {
            let ok = match term {
                CompiledTerm::Field {
                    ordinal,
                    column,
                    matcher,
                } => matcher.matches(column, &row.values()[*ordinal], self.case_sensitive)?,
                CompiledTerm::Functional(predicate) => predicate(row),
            };
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

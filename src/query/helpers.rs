//! Core comparison helpers shared by the predicate and sort engines.
//!
//! - values_equal: type-aware equality
//! - compare_values: total ordering used by sorting
//! - compare_ordered: ordering for `$gt`/`$gte`/`$lt`/`$lte`, rejecting
//!   booleans and mixed kinds
//! - safe_regex: length-capped regex compilation

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};

use crate::error::{TableError, TableResult};
use crate::types::Value;

/// Compare two names or strings under a case rule.
#[inline]
pub fn str_eq(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a == b || a.to_lowercase() == b.to_lowercase()
    }
}

/// Type-aware equality. Dates compare by instant; strings honour the case
/// rule; values of different kinds are never equal.
#[inline]
pub fn values_equal(left: &Value, right: &Value, case_sensitive: bool) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => str_eq(a, b, case_sensitive),
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => left == right,
    }
}

/// Key identifying a value for uniqueness checks.
pub(crate) fn unique_key(value: &Value, case_sensitive: bool) -> String {
    match value {
        Value::String(s) if !case_sensitive => format!("string:{}", s.to_lowercase()),
        Value::Date(d) => format!("date:{}", d.timestamp_nanos_opt().unwrap_or(d.timestamp())),
        other => format!("{}:{}", other.kind(), other.to_display_string()),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Boolean(_) => 1,
        Value::Number(_) => 2,
        Value::Date(_) => 3,
        Value::String(_) => 4,
    }
}

fn compare_str(a: &str, b: &str, case_sensitive: bool) -> Ordering {
    if case_sensitive {
        a.cmp(b)
    } else {
        a.to_lowercase().cmp(&b.to_lowercase())
    }
}

/// Total ordering of values for sorting.
///
/// Null < Boolean < Number < Date < String
#[inline]
pub fn compare_values(a: &Value, b: &Value, case_sensitive: bool) -> Ordering {
    match (a, b) {
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => compare_str(a, b, case_sensitive),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// Ordering for range operators. Numbers and dates use natural order,
/// strings lexicographic order. Null on either side yields `None` (no
/// match); booleans and mixed kinds are a type mismatch.
pub fn compare_ordered(
    column: &str,
    actual: &Value,
    operand: &Value,
    case_sensitive: bool,
) -> TableResult<Option<Ordering>> {
    match (actual, operand) {
        (Value::Null, _) | (_, Value::Null) => Ok(None),
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::Date(a), Value::Date(b)) => Ok(Some(a.cmp(b))),
        (Value::String(a), Value::String(b)) => Ok(Some(compare_str(a, b, case_sensitive))),
        (Value::Boolean(_), _) | (_, Value::Boolean(_)) => {
            Err(TableError::type_mismatch(column, "an ordered type", "boolean"))
        }
        (a, b) => Err(TableError::type_mismatch(column, a.kind(), b.kind())),
    }
}

/// Substring containment on string forms.
#[inline]
pub fn contains_str(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        haystack.contains(needle)
    } else {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Compile a regex, refusing patterns longer than `max_len`.
pub fn safe_regex(pattern: &str, case_insensitive: bool, max_len: usize) -> TableResult<Regex> {
    if pattern.len() > max_len {
        return Err(TableError::InvalidPattern(format!(
            "pattern too long (max {} chars)",
            max_len
        )));
    }
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| TableError::InvalidPattern(e.to_string()))
}

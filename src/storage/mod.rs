// Storage module - holds the in-memory tables of a mock session
// Records are schema-less: every table is just an ordered list of JSON objects

pub mod store;
pub mod table;

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A single schema-less record: field name -> JSON value
/// Field order follows insertion order (serde_json's `preserve_order`)
pub type Record = Map<String, Value>;

/// Strict equality between two field values
/// Numbers compare by magnitude so `5` and `5.0` are equal; everything else
/// compares structurally
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_scalars(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Compare two values for the range operators (gt/gte/lt/lte)
/// Only like-typed scalars are comparable; anything else yields None and the
/// predicate is treated as false
pub fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting
/// Like-typed scalars use their natural order; otherwise values are ranked
/// by type with null and missing fields last, the way the hosted backend puts
/// NULLs last in ascending order
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match compare_scalars(x, y) {
            Some(ordering) => ordering,
            None => type_rank(a).cmp(&type_rank(b)),
        },
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        Some(Value::Bool(_)) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Array(_)) => 3,
        Some(Value::Object(_)) => 4,
        Some(Value::Null) => 5,
        None => 6,
    }
}

/// Render a value the way the pattern-match operator sees it
/// Null and nested values have no text form and never match a pattern
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Render a value for table output
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(Value::Null) => "NULL".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers_equal_across_representations() {
        assert!(values_equal(&json!(5), &json!(5.0)));
        assert!(!values_equal(&json!(5), &json!("5")));
        assert!(values_equal(&json!({"a": [1, 2]}), &json!({"a": [1, 2]})));
    }

    #[test]
    fn test_mismatched_types_are_not_comparable() {
        assert_eq!(compare_scalars(&json!(1), &json!("1")), None);
        assert_eq!(compare_scalars(&json!(null), &json!(null)), None);
        assert_eq!(compare_scalars(&json!("a"), &json!("b")), Some(Ordering::Less));
        assert_eq!(compare_scalars(&json!(2.5), &json!(2)), Some(Ordering::Greater));
    }

    #[test]
    fn test_sort_order_puts_nulls_and_missing_last() {
        let null = json!(null);
        let one = json!(1);
        assert_eq!(sort_order(Some(&one), Some(&null)), Ordering::Less);
        assert_eq!(sort_order(Some(&null), None), Ordering::Less);
        assert_eq!(sort_order(None, None), Ordering::Equal);
    }

    #[test]
    fn test_value_as_text() {
        assert_eq!(value_as_text(&json!("x")), Some("x".to_string()));
        assert_eq!(value_as_text(&json!(42)), Some("42".to_string()));
        assert_eq!(value_as_text(&json!(true)), Some("true".to_string()));
        assert_eq!(value_as_text(&json!(null)), None);
    }
}

// Filter predicates
// Each predicate names a field and an operator; a record passes a query only
// if it passes every predicate

use crate::storage::{compare_scalars, value_as_text, values_equal, Record};
use serde_json::Value;
use std::cmp::Ordering;

/// The supported comparison operators, each carrying its operand
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// `%` is a wildcard; matching strips it and checks substring containment
    Like(String),
    In(Vec<Value>),
}

/// One filter condition: operator + field + operand
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: FilterOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    /// Check whether a record satisfies this predicate
    ///
    /// A missing field is "absent": it satisfies only `Neq`. Range operators on
    /// mismatched types are undefined in the hosted backend; here they are false
    pub fn matches(&self, record: &Record) -> bool {
        let value = match record.get(&self.field) {
            Some(value) => value,
            None => return matches!(self.op, FilterOp::Neq(_)),
        };

        match &self.op {
            FilterOp::Eq(operand) => values_equal(value, operand),
            FilterOp::Neq(operand) => !values_equal(value, operand),
            FilterOp::Gt(operand) => compare_scalars(value, operand) == Some(Ordering::Greater),
            FilterOp::Gte(operand) => matches!(
                compare_scalars(value, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOp::Lt(operand) => compare_scalars(value, operand) == Some(Ordering::Less),
            FilterOp::Lte(operand) => matches!(
                compare_scalars(value, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOp::Like(pattern) => {
                let needle = pattern.replace('%', "");
                value_as_text(value).map_or(false, |text| text.contains(&needle))
            }
            FilterOp::In(candidates) => candidates.iter().any(|c| values_equal(value, c)),
        }
    }
}

/// Logical AND of all predicates, evaluated left to right
pub fn matches_all(filters: &[Filter], record: &Record) -> bool {
    filters.iter().all(|filter| filter.matches(record))
}

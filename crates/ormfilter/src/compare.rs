//! Comparison units: scalar predicates compiled from a criteria fragment.
//!
//! A [`Comparison`] holds its right-hand operand and, for string operators,
//! the insensitivity flag. Evaluation never fails: a type mismatch is simply
//! "does not match" (or "matches" for the negated string operators).

use std::cmp::Ordering;

use regex::Regex;

use crate::date::Timestamp;
use crate::op::Op;
use crate::value::{Number, Value};

/// A scalar predicate over one field value.
#[derive(Debug, Clone)]
pub(crate) enum Comparison {
    /// `equals`
    Equals { operand: Value, insensitive: bool },
    /// `not` with a scalar operand.
    NotEquals { operand: Value, insensitive: bool },
    /// `in`
    In { values: Vec<Value>, insensitive: bool },
    /// `notIn`
    NotIn { values: Vec<Value>, insensitive: bool },
    /// `lt`, `lte`, `gt`, `gte`
    Order { op: Op, operand: Value },
    /// `before`
    Before(Timestamp),
    /// `after`
    After(Timestamp),
    /// `between`, inclusive on both ends.
    Between(Timestamp, Timestamp),
    /// `contains`, `startsWith`, `endsWith` and their negations.
    ///
    /// A non-string needle is kept as `None`: it never matches, so the
    /// negated forms always do.
    Text {
        op: TextOp,
        needle: Option<String>,
        negated: bool,
        insensitive: bool,
    },
    /// `regex`
    Regex(Regex),
    /// `isNull`
    IsNull(bool),
    /// `length`: every bound must hold.
    Length(Vec<(Op, Number)>),
}

/// Substring test used by [`Comparison::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

impl TextOp {
    fn test(self, haystack: &str, needle: &str) -> bool {
        match self {
            TextOp::Contains => haystack.contains(needle),
            TextOp::StartsWith => haystack.starts_with(needle),
            TextOp::EndsWith => haystack.ends_with(needle),
        }
    }
}

impl Comparison {
    /// Evaluates this unit against a field value.
    pub(crate) fn evaluate(&self, value: &Value) -> bool {
        match self {
            Comparison::Equals {
                operand,
                insensitive,
            } => equals(value, operand, *insensitive),
            Comparison::NotEquals {
                operand,
                insensitive,
            } => !equals(value, operand, *insensitive),
            Comparison::In {
                values,
                insensitive,
            } => values
                .iter()
                .any(|candidate| same_value_zero(value, candidate, *insensitive)),
            Comparison::NotIn {
                values,
                insensitive,
            } => !values
                .iter()
                .any(|candidate| same_value_zero(value, candidate, *insensitive)),
            Comparison::Order { op, operand } => {
                compare_ordered(value, operand).is_some_and(|ordering| op.eval_ordering(ordering))
            }
            Comparison::Before(reference) => value.as_instant().is_some_and(|ts| ts < *reference),
            Comparison::After(reference) => value.as_instant().is_some_and(|ts| ts > *reference),
            Comparison::Between(start, end) => value
                .as_instant()
                .is_some_and(|ts| *start <= ts && ts <= *end),
            Comparison::Text {
                op,
                needle,
                negated,
                insensitive,
            } => match (needle, value) {
                (Some(needle), Value::String(haystack)) => {
                    let hit = if *insensitive {
                        op.test(&haystack.to_lowercase(), &needle.to_lowercase())
                    } else {
                        op.test(haystack, needle)
                    };
                    hit != *negated
                }
                _ => *negated,
            },
            Comparison::Regex(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
            Comparison::IsNull(expected) => value.is_nullish() == *expected,
            Comparison::Length(bounds) => {
                let len = match value {
                    Value::Array(items) => items.len(),
                    Value::String(s) => s.chars().count(),
                    _ => return false,
                };
                bounds.iter().all(|(op, bound)| {
                    Number::from(len)
                        .compare(*bound)
                        .is_some_and(|ordering| op.eval_ordering(ordering))
                })
            }
        }
    }
}

/// Equality as `equals` sees it.
///
/// Null-ish values only equal the same null-ish kind, NaN equals nothing, a
/// `Date` equals any value denoting the same instant, strings follow the
/// case rule and compound values compare by reference.
pub(crate) fn equals(value: &Value, operand: &Value, insensitive: bool) -> bool {
    match (value, operand) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (a, b) if a.is_nullish() || b.is_nullish() => false,
        (a, b) if a.is_nan() || b.is_nan() => false,
        (Value::Date(ts), other) | (other, Value::Date(ts)) => other.as_instant() == Some(*ts),
        (Value::String(a), Value::String(b)) => text_eq(a, b, insensitive),
        (Value::Number(a), Value::Number(b)) => a.compare(*b) == Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (a, b) => a.same_ref(b),
    }
}

/// Membership equality used by `in`, `notIn` and `has`.
///
/// Unlike [`equals`], NaN is a member of a list holding NaN and dates only
/// match dates.
pub(crate) fn same_value_zero(value: &Value, candidate: &Value, insensitive: bool) -> bool {
    match (value, candidate) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a.same_value(*b),
        (Value::String(a), Value::String(b)) => text_eq(a, b, insensitive),
        (Value::Date(a), Value::Date(b)) => a == b,
        (a, b) => a.same_ref(b),
    }
}

fn text_eq(a: &str, b: &str, insensitive: bool) -> bool {
    if insensitive {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// Orders a field value against an operand for `lt`/`lte`/`gt`/`gte`.
///
/// Returns `None` when the pair is not comparable.
pub(crate) fn compare_ordered(value: &Value, operand: &Value) -> Option<Ordering> {
    if value.is_nullish() || operand.is_nullish() || value.is_nan() || operand.is_nan() {
        return None;
    }

    // A date on one side only never falls back to string comparison.
    match (value.as_instant(), operand.as_instant()) {
        (Some(a), Some(b)) => return Some(a.cmp(&b)),
        (Some(_), None) | (None, Some(_)) => return None,
        (None, None) => {}
    }

    match (value, operand) {
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::String(s), Value::Number(n)) => match parse_number(s) {
            Some(parsed) => parsed.compare(*n),
            None => Some(s.as_str().cmp(n.to_string().as_str())),
        },
        (Value::Number(n), Value::String(s)) => match parse_number(s) {
            Some(parsed) => n.compare(parsed),
            None => Some(n.to_string().as_str().cmp(s.as_str())),
        },
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Number> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().map(Number::F64)
}

//! Ordering types for result sorting.
//!
//! Provides [`Dir`] for sort direction and [`OrderBy`] for field-based ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Applies this direction to an ordering.
    ///
    /// For `Asc`, returns the ordering unchanged.
    /// For `Desc`, reverses the ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// The wire name, `"asc"` or `"desc"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single sort key: a field (dotted paths reach into nested objects) and
/// a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field name or dotted path.
    pub field: String,
    pub dir: Dir,
}

impl OrderBy {
    /// Ascending on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        OrderBy::new(field, Dir::Asc)
    }

    /// Descending on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        OrderBy::new(field, Dir::Desc)
    }

    /// Sorts on `field` in the given direction.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        OrderBy {
            field: field.into(),
            dir,
        }
    }

    /// Compares two items on this key.
    ///
    /// Returns `None` if the field values cannot be compared.
    pub fn compare(&self, a: &Value, b: &Value) -> Option<Ordering> {
        let base = compare_values(a.path(&self.field), b.path(&self.field))?;
        Some(self.dir.apply(base))
    }
}

/// Compares two field values for sorting.
///
/// Values of the same kind use their natural order. Null and missing values
/// sort after everything else (before the direction is applied). Anything
/// else, including NaN, is incomparable.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => a.compare(*b),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),

        (a, b) if a.is_nullish() && b.is_nullish() => Some(Ordering::Equal),
        (a, _) if a.is_nullish() => Some(Ordering::Greater),
        (_, b) if b.is_nullish() => Some(Ordering::Less),

        _ => None,
    }
}

/// Compares two items using a list of sort keys.
///
/// The first key is the primary sort key, later keys break ties. Incomparable
/// values count as a tie.
pub fn compare_by_orderings(a: &Value, b: &Value, orderings: &[OrderBy]) -> Ordering {
    for order_by in orderings {
        if let Some(ordering) = order_by.compare(a, b) {
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
    }
    Ordering::Equal
}

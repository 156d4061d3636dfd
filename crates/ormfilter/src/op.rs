//! Operator keys recognised in `where` fragments.
//!
//! The [`Op`] enum names every operator key a criteria fragment may contain,
//! organized by the units they compile to.

use std::cmp::Ordering;

/// Operator key of a criteria fragment.
///
/// Operators are grouped by the unit they compile to:
/// - **Equality**: `Equals`, `Not`, `In`, `NotIn`
/// - **Ordering**: `Lt`, `Lte`, `Gt`, `Gte`
/// - **String**: `Contains`, `StartsWith`, `EndsWith` and their negations, `Regex`
/// - **Date range**: `Before`, `After`, `Between`
/// - **Null gate**: `IsNull`
/// - **Array**: `Some`, `None`, `Every`, `Has`, `HasEvery`, `HasSome`, `Length`
/// - **Modifier**: `Mode` (compiles to no unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Value equality.
    Equals,
    /// Negation: inequality for scalars, negated criteria for fragments.
    Not,
    /// Value is one of the given list.
    In,
    /// Value is none of the given list.
    NotIn,

    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,

    /// String contains substring.
    Contains,
    /// String does not contain substring.
    NotContains,
    /// String starts with prefix.
    StartsWith,
    /// String does not start with prefix.
    NotStartsWith,
    /// String ends with suffix.
    EndsWith,
    /// String does not end with suffix.
    NotEndsWith,
    /// String matches regular expression.
    Regex,

    /// Instant strictly before the reference.
    Before,
    /// Instant strictly after the reference.
    After,
    /// Instant within `[start, end]`.
    Between,

    /// Null-ish gate.
    IsNull,

    /// At least one element matches.
    Some,
    /// No element matches.
    None,
    /// All elements match.
    Every,
    /// Array contains the value.
    Has,
    /// Array contains every value.
    HasEvery,
    /// Array contains at least one of the values.
    HasSome,
    /// Length of an array or string.
    Length,

    /// Case-sensitivity modifier.
    Mode,
}

impl Op {
    /// Every operator, in declaration order.
    pub const ALL: [Op; 27] = [
        Op::Equals,
        Op::Not,
        Op::In,
        Op::NotIn,
        Op::Lt,
        Op::Lte,
        Op::Gt,
        Op::Gte,
        Op::Contains,
        Op::NotContains,
        Op::StartsWith,
        Op::NotStartsWith,
        Op::EndsWith,
        Op::NotEndsWith,
        Op::Regex,
        Op::Before,
        Op::After,
        Op::Between,
        Op::IsNull,
        Op::Some,
        Op::None,
        Op::Every,
        Op::Has,
        Op::HasEvery,
        Op::HasSome,
        Op::Length,
        Op::Mode,
    ];

    /// Looks up an operator by its key.
    pub fn from_key(key: &str) -> Option<Op> {
        let op = match key {
            "equals" => Op::Equals,
            "not" => Op::Not,
            "in" => Op::In,
            "notIn" => Op::NotIn,
            "lt" => Op::Lt,
            "lte" => Op::Lte,
            "gt" => Op::Gt,
            "gte" => Op::Gte,
            "contains" => Op::Contains,
            "notContains" => Op::NotContains,
            "startsWith" => Op::StartsWith,
            "notStartsWith" => Op::NotStartsWith,
            "endsWith" => Op::EndsWith,
            "notEndsWith" => Op::NotEndsWith,
            "regex" => Op::Regex,
            "before" => Op::Before,
            "after" => Op::After,
            "between" => Op::Between,
            "isNull" => Op::IsNull,
            "some" => Op::Some,
            "none" => Op::None,
            "every" => Op::Every,
            "has" => Op::Has,
            "hasEvery" => Op::HasEvery,
            "hasSome" => Op::HasSome,
            "length" => Op::Length,
            "mode" => Op::Mode,
            _ => return None,
        };
        Some(op)
    }

    /// Returns `true` if `key` names an operator.
    pub fn is_key(key: &str) -> bool {
        Op::from_key(key).is_some()
    }

    /// Returns `true` if `mode: 'insensitive'` affects this operator.
    pub fn is_string_op(self) -> bool {
        matches!(
            self,
            Op::Equals
                | Op::Not
                | Op::In
                | Op::NotIn
                | Op::Contains
                | Op::NotContains
                | Op::StartsWith
                | Op::NotStartsWith
                | Op::EndsWith
                | Op::NotEndsWith
                | Op::Regex
        )
    }

    /// Returns `true` for the array-level operators.
    pub fn is_array_op(self) -> bool {
        matches!(
            self,
            Op::Some | Op::None | Op::Every | Op::Has | Op::HasEvery | Op::HasSome | Op::Length
        )
    }

    /// Evaluates an ordering operator given an ordering result.
    ///
    /// `Equals` is accepted too, for `length: { equals: n }`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Equals => ordering == Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            _ => false, // Not an ordering-based operator
        }
    }

    /// Returns the key of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Equals => "equals",
            Op::Not => "not",
            Op::In => "in",
            Op::NotIn => "notIn",
            Op::Lt => "lt",
            Op::Lte => "lte",
            Op::Gt => "gt",
            Op::Gte => "gte",
            Op::Contains => "contains",
            Op::NotContains => "notContains",
            Op::StartsWith => "startsWith",
            Op::NotStartsWith => "notStartsWith",
            Op::EndsWith => "endsWith",
            Op::NotEndsWith => "notEndsWith",
            Op::Regex => "regex",
            Op::Before => "before",
            Op::After => "after",
            Op::Between => "between",
            Op::IsNull => "isNull",
            Op::Some => "some",
            Op::None => "none",
            Op::Every => "every",
            Op::Has => "has",
            Op::HasEvery => "hasEvery",
            Op::HasSome => "hasSome",
            Op::Length => "length",
            Op::Mode => "mode",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for op in Op::ALL {
            assert_eq!(Op::from_key(op.as_str()), Some(op));
        }
        assert_eq!(Op::from_key("like"), None);
        assert_eq!(Op::from_key("Equals"), None);
        assert!(Op::is_key("hasEvery"));
        assert!(!Op::is_key("AND"));
    }

    #[test]
    fn op_type_checks() {
        assert!(Op::Equals.is_string_op());
        assert!(Op::NotEndsWith.is_string_op());
        assert!(Op::Regex.is_string_op());
        assert!(!Op::Gt.is_string_op());
        assert!(!Op::Has.is_string_op());

        assert!(Op::Some.is_array_op());
        assert!(Op::Length.is_array_op());
        assert!(!Op::In.is_array_op());
    }

    #[test]
    fn op_eval_ordering() {
        assert!(Op::Equals.eval_ordering(Ordering::Equal));
        assert!(!Op::Equals.eval_ordering(Ordering::Less));

        assert!(!Op::Gt.eval_ordering(Ordering::Equal));
        assert!(Op::Gt.eval_ordering(Ordering::Greater));

        assert!(Op::Gte.eval_ordering(Ordering::Equal));
        assert!(!Op::Gte.eval_ordering(Ordering::Less));

        assert!(Op::Lt.eval_ordering(Ordering::Less));
        assert!(!Op::Lt.eval_ordering(Ordering::Equal));

        assert!(Op::Lte.eval_ordering(Ordering::Equal));
        assert!(!Op::Lte.eval_ordering(Ordering::Greater));

        assert!(!Op::Contains.eval_ordering(Ordering::Equal));
    }

    #[test]
    fn op_display() {
        assert_eq!(Op::NotIn.to_string(), "notIn");
        assert_eq!(Op::HasSome.to_string(), "hasSome");
    }
}

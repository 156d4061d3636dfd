//! Logical combinators for the reserved `AND`, `OR` and `NOT` keys.

use crate::predicate::Predicate;
use crate::value::Value;

/// A logical group of nested fragments.
///
/// ```text
/// AND: every fragment matches          (empty = trivially satisfied)
/// OR:  at least one fragment matches   (empty = never satisfied)
/// NOT: no fragment matches             (empty = trivially satisfied)
/// ```
#[derive(Debug, Clone)]
pub(crate) enum Logical {
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Vec<Predicate>),
}

impl Logical {
    /// Evaluates the group against an item.
    pub(crate) fn evaluate(&self, item: &Value) -> bool {
        match self {
            Logical::And(fragments) => fragments.iter().all(|f| f.matches(item)),
            Logical::Or(fragments) => fragments.iter().any(|f| f.matches(item)),
            Logical::Not(fragments) => !fragments.iter().any(|f| f.matches(item)),
        }
    }

    pub(crate) fn fragments(&self) -> &[Predicate] {
        match self {
            Logical::And(fragments) | Logical::Or(fragments) | Logical::Not(fragments) => fragments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Compiler;
    use serde_json::json;

    fn fragments(list: serde_json::Value) -> Vec<Predicate> {
        let mut compiler = Compiler::default();
        let list = Value::from(list);
        list.as_array()
            .unwrap()
            .iter()
            .map(|f| compiler.compile_where(f.as_object().unwrap()))
            .collect()
    }

    #[test]
    fn and_requires_all() {
        let and = Logical::And(fragments(json!([{"a": 1}, {"b": 2}])));
        assert!(and.evaluate(&Value::from(json!({"a": 1, "b": 2}))));
        assert!(!and.evaluate(&Value::from(json!({"a": 1, "b": 3}))));
        assert!(Logical::And(vec![]).evaluate(&Value::from(json!({}))));
    }

    #[test]
    fn or_requires_any() {
        let or = Logical::Or(fragments(json!([{"a": 1}, {"b": 2}])));
        assert!(or.evaluate(&Value::from(json!({"a": 0, "b": 2}))));
        assert!(!or.evaluate(&Value::from(json!({"a": 0, "b": 0}))));
        assert!(!Logical::Or(vec![]).evaluate(&Value::from(json!({}))));
    }

    #[test]
    fn not_is_nor() {
        let not = Logical::Not(fragments(json!([{"a": 1}, {"b": 2}])));
        assert!(not.evaluate(&Value::from(json!({"a": 0, "b": 0}))));
        assert!(!not.evaluate(&Value::from(json!({"a": 0, "b": 2}))));
        assert!(!not.evaluate(&Value::from(json!({"a": 1, "b": 0}))));
    }
}

//! Quantifier units: array-level operators lifting an element predicate to
//! the whole array.
//!
//! Every quantifier returns `false` for a field that is not an array, with
//! one exception: `none` also holds for a null or missing field. On an empty
//! array `every` and `none` hold vacuously while `some`, `has` and a
//! non-empty `hasSome` do not.

use crate::compare::same_value_zero;
use crate::predicate::Criteria;
use crate::value::Value;

/// An array predicate.
#[derive(Debug, Clone)]
pub(crate) enum Quantifier {
    /// At least one non-null element matches.
    Some(Box<Criteria>),
    /// No non-null element matches.
    None(Box<Criteria>),
    /// All elements match.
    Every(Box<Criteria>),
    /// Some element fails; the negation of `every`, false on empty arrays.
    ExistsFailing(Box<Criteria>),
    /// Some element is identical to the operand.
    Has(Value),
    /// Every member is found in the array.
    HasEvery(Vec<Member>),
    /// At least one member is found in the array.
    HasSome(Vec<Member>),
}

/// One operand of `hasEvery` / `hasSome`.
#[derive(Debug, Clone)]
pub(crate) enum Member {
    /// A plain value, matched by identity.
    Value(Value),
    /// A fragment, matched against non-null elements.
    Fragment(Criteria),
}

impl Member {
    fn matches(&self, element: &Value) -> bool {
        match self {
            Member::Value(value) => same_value_zero(element, value, false),
            Member::Fragment(test) => !element.is_nullish() && test.matches(element),
        }
    }
}

impl Quantifier {
    /// Evaluates this unit against a field value.
    pub(crate) fn evaluate(&self, value: &Value) -> bool {
        let elements = match value {
            Value::Array(elements) => elements.as_slice(),
            Value::Null | Value::Undefined => return matches!(self, Quantifier::None(_)),
            _ => return false,
        };

        match self {
            Quantifier::Some(test) => elements.iter().any(|e| some_holds(test, e)),
            Quantifier::None(test) => !elements.iter().any(|e| some_holds(test, e)),
            Quantifier::Every(test) => elements.iter().all(|e| every_holds(test, e)),
            Quantifier::ExistsFailing(test) => elements.iter().any(|e| !every_holds(test, e)),
            Quantifier::Has(operand) => elements.iter().any(|e| same_value_zero(e, operand, false)),
            Quantifier::HasEvery(members) => has_every(elements, members),
            Quantifier::HasSome(members) => {
                members.is_empty()
                    || elements
                        .iter()
                        .any(|e| members.iter().any(|member| member.matches(e)))
            }
        }
    }
}

fn some_holds(test: &Criteria, element: &Value) -> bool {
    !element.is_nullish() && test.matches(element)
}

// A null element only satisfies the literally empty fragment.
fn every_holds(test: &Criteria, element: &Value) -> bool {
    if element.is_nullish() {
        test.is_empty()
    } else {
        test.matches(element)
    }
}

// Each member must be found somewhere in the array. A lone fragment is also
// satisfied when every element matches it.
fn has_every(elements: &[Value], members: &[Member]) -> bool {
    let all_found = members
        .iter()
        .all(|member| elements.iter().any(|e| member.matches(e)));
    if all_found {
        return true;
    }
    match members {
        [Member::Fragment(test)] => elements.iter().all(|e| every_holds(test, e)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Compiler;
    use serde_json::json;

    fn criteria(fragment: serde_json::Value) -> Box<Criteria> {
        Box::new(Compiler::default().compile_operand(&Value::from(fragment), Default::default()))
    }

    fn array(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn some_needs_a_matching_element() {
        let some = Quantifier::Some(criteria(json!({"equals": "a"})));
        assert!(some.evaluate(&array(json!(["b", "a"]))));
        assert!(!some.evaluate(&array(json!(["b"]))));
        assert!(!some.evaluate(&array(json!([]))));
        assert!(!some.evaluate(&Value::Null));
        assert!(!some.evaluate(&Value::from("a")));
    }

    #[test]
    fn some_skips_null_elements() {
        let some = Quantifier::Some(criteria(json!({"equals": null})));
        assert!(!some.evaluate(&array(json!([null, "a"]))));
    }

    #[test]
    fn none_is_true_on_empty_and_null() {
        let none = Quantifier::None(criteria(json!({"equals": "a"})));
        assert!(none.evaluate(&array(json!([]))));
        assert!(none.evaluate(&Value::Null));
        assert!(none.evaluate(&Value::Undefined));
        assert!(none.evaluate(&array(json!(["b", "c"]))));
        assert!(!none.evaluate(&array(json!(["a", "b"]))));
        assert!(!none.evaluate(&Value::from("b")));
    }

    #[test]
    fn every_is_vacuous_on_empty() {
        let every = Quantifier::Every(criteria(json!({"gt": 1})));
        assert!(every.evaluate(&array(json!([]))));
        assert!(every.evaluate(&array(json!([2, 3]))));
        assert!(!every.evaluate(&array(json!([2, 1]))));
        assert!(!every.evaluate(&Value::Null));
    }

    #[test]
    fn every_null_element_fails_unless_fragment_empty() {
        let strict = Quantifier::Every(criteria(json!({"isNull": true})));
        assert!(!strict.evaluate(&array(json!([null]))));

        let empty = Quantifier::Every(criteria(json!({})));
        assert!(empty.evaluate(&array(json!([null, 1]))));
    }

    #[test]
    fn exists_failing_is_false_on_empty() {
        let failing = Quantifier::ExistsFailing(criteria(json!({"gt": 1})));
        assert!(!failing.evaluate(&array(json!([]))));
        assert!(!failing.evaluate(&Value::Null));
        assert!(!failing.evaluate(&array(json!([2, 3]))));
        assert!(failing.evaluate(&array(json!([2, 1]))));
        assert!(failing.evaluate(&array(json!([2, null]))));
    }

    #[test]
    fn relation_fragments_apply_to_object_elements() {
        let some = Quantifier::Some(criteria(json!({"role": "admin", "active": true})));
        assert!(some.evaluate(&array(json!([
            {"role": "user", "active": true},
            {"role": "admin", "active": true}
        ]))));
        assert!(!some.evaluate(&array(json!([{"role": "admin", "active": false}, "admin"]))));
    }

    #[test]
    fn has_uses_identity() {
        let shared = array(json!({"id": 1}));
        let items = Value::array([Value::from(f64::NAN), shared.clone(), Value::from("x")]);

        assert!(Quantifier::Has(Value::from(f64::NAN)).evaluate(&items));
        assert!(Quantifier::Has(shared).evaluate(&items));
        assert!(!Quantifier::Has(array(json!({"id": 1}))).evaluate(&items));
        assert!(!Quantifier::Has(Value::from("X")).evaluate(&items));
        assert!(!Quantifier::Has(Value::from("x")).evaluate(&array(json!([]))));
    }

    #[test]
    fn has_every_primitives() {
        let members = vec![Member::Value(Value::from("a")), Member::Value(Value::from("b"))];
        let has_every = Quantifier::HasEvery(members);
        assert!(has_every.evaluate(&array(json!(["b", "c", "a"]))));
        assert!(has_every.evaluate(&array(json!(["a", "a", "b"]))));
        assert!(!has_every.evaluate(&array(json!(["a"]))));
        assert!(!has_every.evaluate(&Value::Null));
    }

    #[test]
    fn has_every_empty_operand() {
        let has_every = Quantifier::HasEvery(vec![]);
        assert!(has_every.evaluate(&array(json!([]))));
        assert!(has_every.evaluate(&array(json!([1]))));
        assert!(!has_every.evaluate(&Value::from("not an array")));
    }

    #[test]
    fn has_every_fragments() {
        let two = Quantifier::HasEvery(vec![
            Member::Fragment(*criteria(json!({"gt": 5}))),
            Member::Fragment(*criteria(json!({"lt": 0}))),
        ]);
        assert!(two.evaluate(&array(json!([-1, 10]))));
        assert!(!two.evaluate(&array(json!([1, 10]))));

        // a single fragment is also satisfied when every element matches it
        let one = Quantifier::HasEvery(vec![Member::Fragment(*criteria(json!({"gt": 5})))]);
        assert!(one.evaluate(&array(json!([1, 10]))));
        assert!(one.evaluate(&array(json!([]))));
        assert!(!one.evaluate(&array(json!([1, 2]))));
    }

    #[test]
    fn has_some_members() {
        let has_some = Quantifier::HasSome(vec![
            Member::Value(Value::from("x")),
            Member::Fragment(*criteria(json!({"startsWith": "pre"}))),
        ]);
        assert!(has_some.evaluate(&array(json!(["a", "x"]))));
        assert!(has_some.evaluate(&array(json!(["prefix"]))));
        assert!(!has_some.evaluate(&array(json!(["a", "b"]))));
        assert!(!has_some.evaluate(&array(json!([]))));
    }

    #[test]
    fn has_some_empty_operand_is_vacuous() {
        let has_some = Quantifier::HasSome(vec![]);
        assert!(has_some.evaluate(&array(json!([]))));
        assert!(has_some.evaluate(&array(json!(["a"]))));
        assert!(!has_some.evaluate(&Value::Null));
    }
}

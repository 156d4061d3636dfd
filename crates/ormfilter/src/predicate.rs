//! Composite evaluator: compiles a `where` fragment into a predicate tree.
//!
//! A fragment is compiled once per query into [`Where`], then evaluated
//! against each item by structural recursion. The tree has three layers:
//!
//! - a [`Predicate`] is a list of clauses that must all hold for one object:
//!   one per field key plus one per `AND`/`OR`/`NOT` key,
//! - a [`Criteria`] is the set of units compiled from one field's operand,
//!   all of which must hold for the field value,
//! - a [`Unit`] is a single operator, a nested relation fragment, or a
//!   negation of those.
//!
//! Recursion depth follows the nesting depth of the query itself; nothing
//! bounds it.

use std::collections::BTreeSet;

use tracing::warn;

use crate::compare::Comparison;
use crate::error::Diagnostic;
use crate::logical::Logical;
use crate::op::Op;
use crate::quantifier::Quantifier;
use crate::value::{Map, Value};

/// A compiled `where` clause.
///
/// # Example
///
/// ```
/// use ormfilter::{Value, Where};
/// use serde_json::json;
///
/// let filter = Where::compile(&Value::from(json!({
///     "name": {"startsWith": "a", "mode": "insensitive"},
///     "OR": [{"age": {"gte": 18}}, {"guardian": {"isNull": false}}],
/// })));
///
/// assert!(filter.matches(&Value::from(json!({"name": "Ann", "age": 30}))));
/// assert!(!filter.matches(&Value::from(json!({"name": "Ann", "age": 12}))));
/// assert!(filter.diagnostics().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Where {
    root: Predicate,
    diagnostics: Vec<Diagnostic>,
}

impl Where {
    /// Compiles a `where` fragment.
    ///
    /// A null or missing fragment matches every item. Problems in the
    /// fragment never fail compilation; see [`Where::diagnostics`].
    pub fn compile(fragment: &Value) -> Self {
        let mut compiler = Compiler::default();
        let root = match fragment {
            Value::Object(map) => compiler.compile_where(map),
            Value::Null | Value::Undefined => Predicate::default(),
            other => {
                compiler.report(Diagnostic::invalid_operand(
                    "where",
                    format!("expected an object, got {}", other.kind()),
                ));
                Predicate::never()
            }
        };
        Where {
            root,
            diagnostics: compiler.diagnostics,
        }
    }

    /// Tests if a single item matches.
    pub fn matches(&self, item: &Value) -> bool {
        self.root.matches(item)
    }

    /// Returns references to the matching items, in input order.
    pub fn filter<'a>(&self, items: &'a [Value]) -> Vec<&'a Value> {
        items.iter().filter(|item| self.matches(item)).collect()
    }

    /// Counts the matching items.
    pub fn count(&self, items: &[Value]) -> usize {
        items.iter().filter(|item| self.matches(item)).count()
    }

    /// Non-fatal problems found while compiling.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Reports every field whose relation fragment meets a value that is
    /// neither an object nor null-ish in some item.
    ///
    /// A fragment without operator keys is a relation filter, so a
    /// misspelled operator such as `{like: "%a%"}` shows up here.
    pub fn check_shapes(&self, items: &[Value]) -> Vec<Diagnostic> {
        let mut fields = BTreeSet::new();
        for item in items {
            self.root.relation_mismatches(item, &mut fields);
        }
        fields
            .into_iter()
            .map(|field| {
                let diagnostic = Diagnostic::NotARelation { field };
                warn!(%diagnostic, "relation filter met a non-object value");
                diagnostic
            })
            .collect()
    }

    /// Returns `true` if this clause has no conditions (matches everything).
    pub fn is_empty(&self) -> bool {
        self.root.clauses.is_empty()
    }
}

/// Compiled fragment matched against one object.
#[derive(Debug, Clone, Default)]
pub(crate) struct Predicate {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    Field { name: String, criteria: Criteria },
    Logical(Logical),
    Never,
}

impl Predicate {
    fn never() -> Self {
        Predicate {
            clauses: vec![Clause::Never],
        }
    }

    /// All clauses must hold. Non-objects see every field as `Undefined`.
    pub(crate) fn matches(&self, item: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Field { name, criteria } => criteria.matches(item.get(name)),
            Clause::Logical(logical) => logical.evaluate(item),
            Clause::Never => false,
        })
    }

    fn relation_mismatches(&self, item: &Value, fields: &mut BTreeSet<String>) {
        for clause in &self.clauses {
            match clause {
                Clause::Field { name, criteria } => {
                    criteria.relation_mismatches(name, item.get(name), fields)
                }
                Clause::Logical(logical) => {
                    for fragment in logical.fragments() {
                        fragment.relation_mismatches(item, fields);
                    }
                }
                Clause::Never => {}
            }
        }
    }
}

/// Units compiled from one operand; all must hold.
#[derive(Debug, Clone, Default)]
pub(crate) struct Criteria {
    units: Vec<Unit>,
}

impl Criteria {
    fn single(unit: Unit) -> Self {
        Criteria { units: vec![unit] }
    }

    pub(crate) fn matches(&self, value: &Value) -> bool {
        self.units.iter().all(|unit| unit.evaluate(value))
    }

    /// `true` for a literally empty fragment such as `every: {}`.
    pub(crate) fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    fn relation_mismatches(&self, name: &str, value: &Value, fields: &mut BTreeSet<String>) {
        for unit in &self.units {
            if let Unit::Fragment(nested) = unit {
                match value {
                    Value::Object(_) => nested.relation_mismatches(value, fields),
                    other if other.is_nullish() => {}
                    _ => {
                        fields.insert(name.to_string());
                    }
                }
            }
        }
    }

    /// Negates the conjunction: `¬(a ∧ b)` becomes `¬a ∨ ¬b`.
    fn negate(self) -> Unit {
        let mut units = self.units;
        match units.len() {
            0 => Unit::Never,
            1 => units.remove(0).negate(),
            _ => Unit::AnyOf(units.into_iter().map(Unit::negate).collect()),
        }
    }
}

/// One evaluation unit.
#[derive(Debug, Clone)]
pub(crate) enum Unit {
    Compare(Comparison),
    Quantify(Quantifier),
    /// Nested relation fragment; the value must be an object.
    Fragment(Predicate),
    Not(Box<Unit>),
    AnyOf(Vec<Unit>),
    /// Unknown operator or unusable operand.
    Never,
}

impl Unit {
    pub(crate) fn evaluate(&self, value: &Value) -> bool {
        match self {
            Unit::Compare(comparison) => comparison.evaluate(value),
            Unit::Quantify(quantifier) => quantifier.evaluate(value),
            Unit::Fragment(predicate) => value.is_object() && predicate.matches(value),
            Unit::Not(unit) => !unit.evaluate(value),
            Unit::AnyOf(units) => units.iter().any(|unit| unit.evaluate(value)),
            Unit::Never => false,
        }
    }

    /// Builds the unit for `not: { <this unit> }`.
    ///
    /// Quantifiers swap for their duals so that the vacuous cases come out
    /// right: `not: {some}` is `none`, `not: {none}` is `some`, and
    /// `not: {every}` is "some element fails", which is false on an empty
    /// array.
    fn negate(self) -> Unit {
        match self {
            Unit::Quantify(Quantifier::Some(test)) => Unit::Quantify(Quantifier::None(test)),
            Unit::Quantify(Quantifier::None(test)) => Unit::Quantify(Quantifier::Some(test)),
            Unit::Quantify(Quantifier::Every(test)) => {
                Unit::Quantify(Quantifier::ExistsFailing(test))
            }
            Unit::Quantify(Quantifier::ExistsFailing(test)) => {
                Unit::Quantify(Quantifier::Every(test))
            }
            Unit::Compare(Comparison::Equals {
                operand,
                insensitive,
            }) => Unit::Compare(Comparison::NotEquals {
                operand,
                insensitive,
            }),
            Unit::Compare(Comparison::NotEquals {
                operand,
                insensitive,
            }) => Unit::Compare(Comparison::Equals {
                operand,
                insensitive,
            }),
            Unit::Compare(Comparison::In {
                values,
                insensitive,
            }) => Unit::Compare(Comparison::NotIn {
                values,
                insensitive,
            }),
            Unit::Compare(Comparison::NotIn {
                values,
                insensitive,
            }) => Unit::Compare(Comparison::In {
                values,
                insensitive,
            }),
            Unit::Not(unit) => *unit,
            other => Unit::Not(Box::new(other)),
        }
    }
}

/// Compile-time settings inherited by a fragment.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Context {
    /// `mode: 'insensitive'` is in effect.
    pub(crate) insensitive: bool,
}

/// Builds predicate trees, collecting diagnostics along the way.
#[derive(Debug, Default)]
pub(crate) struct Compiler {
    diagnostics: Vec<Diagnostic>,
}

impl Compiler {
    /// Records a non-fatal problem.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        warn!(%diagnostic, "where clause degraded to no-match");
        self.diagnostics.push(diagnostic);
    }

    /// Problems recorded so far.
    pub(crate) fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Compiles a fragment whose keys are fields or `AND`/`OR`/`NOT`.
    pub(crate) fn compile_where(&mut self, fragment: &Map) -> Predicate {
        let clauses = fragment
            .iter()
            .map(|(key, operand)| match key.as_str() {
                "AND" => Clause::Logical(Logical::And(self.compile_group("AND", operand))),
                "OR" => Clause::Logical(Logical::Or(self.compile_group("OR", operand))),
                "NOT" => Clause::Logical(Logical::Not(self.compile_group("NOT", operand))),
                field => Clause::Field {
                    name: field.to_string(),
                    criteria: self.compile_operand(operand, Context::default()),
                },
            })
            .collect();
        Predicate { clauses }
    }

    fn compile_group(&mut self, group: &'static str, operand: &Value) -> Vec<Predicate> {
        let fragments = match operand {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        fragments
            .iter()
            .map(|fragment| match fragment {
                Value::Object(map) => self.compile_where(map),
                _ => {
                    self.report(Diagnostic::InvalidGroup { group });
                    Predicate::never()
                }
            })
            .collect()
    }

    /// Compiles the operand of a field, a quantifier or `not`.
    ///
    /// - an empty object, or one with at least one operator key, is a
    ///   criteria fragment: one unit per key,
    /// - any other object is a relation fragment,
    /// - anything else is shorthand for `equals`.
    pub(crate) fn compile_operand(&mut self, operand: &Value, inherited: Context) -> Criteria {
        match operand {
            Value::Object(map) if map.is_empty() || map.keys().any(|key| Op::is_key(key)) => {
                self.compile_criteria(map, inherited)
            }
            Value::Object(map) => Criteria::single(Unit::Fragment(self.compile_where(map))),
            other => Criteria::single(Unit::Compare(Comparison::Equals {
                operand: other.clone(),
                insensitive: inherited.insensitive,
            })),
        }
    }

    fn compile_criteria(&mut self, fragment: &Map, inherited: Context) -> Criteria {
        let ctx = match fragment.get(Op::Mode.as_str()) {
            Some(mode) => Context {
                insensitive: self.mode(mode),
            },
            None => inherited,
        };
        let units = fragment
            .iter()
            .filter_map(|(key, operand)| self.resolve(key, operand, ctx))
            .collect();
        Criteria { units }
    }

    fn mode(&mut self, mode: &Value) -> bool {
        match mode.as_str() {
            Some("insensitive") => true,
            Some("default") => false,
            _ => {
                let shown = match mode {
                    Value::String(s) => s.clone(),
                    other => other.kind().to_string(),
                };
                self.report(Diagnostic::UnknownMode(shown));
                false
            }
        }
    }

    /// Builds the unit for `not`. Object operands negate the compiled
    /// fragment, inheriting the surrounding mode; anything else is
    /// inequality.
    pub(crate) fn negation(&mut self, operand: &Value, ctx: Context) -> Unit {
        match operand {
            Value::Object(_) => self.compile_operand(operand, ctx).negate(),
            other => Unit::Compare(Comparison::NotEquals {
                operand: other.clone(),
                insensitive: ctx.insensitive,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(fragment: serde_json::Value) -> Where {
        Where::compile(&Value::from(fragment))
    }

    fn item(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn empty_where_matches_everything() {
        let filter = compile(json!({}));
        assert!(filter.is_empty());
        assert!(filter.matches(&item(json!({"a": 1}))));
        assert!(filter.matches(&Value::Null));
        assert!(Where::compile(&Value::Null).matches(&item(json!({"a": 1}))));
    }

    #[test]
    fn non_object_where_never_matches() {
        let filter = compile(json!("name"));
        assert!(!filter.matches(&item(json!({"name": "x"}))));
        assert_eq!(filter.diagnostics().len(), 1);
    }

    #[test]
    fn fields_combine_with_and() {
        let filter = compile(json!({"a": {"gt": 1, "lt": 5}, "b": "x"}));
        assert!(filter.matches(&item(json!({"a": 3, "b": "x"}))));
        assert!(!filter.matches(&item(json!({"a": 5, "b": "x"}))));
        assert!(!filter.matches(&item(json!({"a": 3, "b": "y"}))));
    }

    #[test]
    fn scalar_operand_is_equality() {
        let filter = compile(json!({"active": true, "deleted": null}));
        assert!(filter.matches(&item(json!({"active": true, "deleted": null}))));
        assert!(!filter.matches(&item(json!({"active": true}))));
    }

    #[test]
    fn relation_fragments_nest() {
        let filter = compile(json!({"author": {"profile": {"city": {"equals": "Oslo"}}}}));
        assert!(filter.matches(&item(json!({"author": {"profile": {"city": "Oslo"}}}))));
        assert!(!filter.matches(&item(json!({"author": {"profile": {"city": "Rome"}}}))));
        assert!(!filter.matches(&item(json!({"author": null}))));
        assert!(!filter.matches(&item(json!({}))));
    }

    #[test]
    fn empty_field_operand_matches_anything() {
        let filter = compile(json!({"profile": {}}));
        assert!(filter.matches(&item(json!({"profile": null}))));
        assert!(filter.matches(&item(json!({}))));
    }

    #[test]
    fn mode_applies_to_every_string_operator_in_fragment() {
        let filter = compile(json!({
            "name": {"startsWith": "AL", "endsWith": "CE", "mode": "insensitive"}
        }));
        assert!(filter.matches(&item(json!({"name": "Alice"}))));
        assert!(!filter.matches(&item(json!({"name": "Alina"}))));
    }

    #[test]
    fn mode_does_not_leak_into_sibling_fields() {
        let filter = compile(json!({
            "first": {"equals": "ann", "mode": "insensitive"},
            "last": {"equals": "lee"}
        }));
        assert!(filter.matches(&item(json!({"first": "ANN", "last": "lee"}))));
        assert!(!filter.matches(&item(json!({"first": "ANN", "last": "LEE"}))));
    }

    #[test]
    fn mode_propagates_into_not() {
        let filter = compile(json!({
            "name": {"not": {"equals": "bob"}, "mode": "insensitive"}
        }));
        assert!(!filter.matches(&item(json!({"name": "BOB"}))));
        assert!(filter.matches(&item(json!({"name": "Alice"}))));

        let own_mode = compile(json!({
            "name": {"not": {"equals": "bob", "mode": "default"}, "mode": "insensitive"}
        }));
        assert!(own_mode.matches(&item(json!({"name": "BOB"}))));
    }

    #[test]
    fn mode_propagates_into_scalar_not() {
        let filter = compile(json!({"name": {"not": "bob", "mode": "insensitive"}}));
        assert!(!filter.matches(&item(json!({"name": "Bob"}))));
    }

    #[test]
    fn mode_does_not_enter_quantifiers() {
        let filter = compile(json!({
            "tags": {"some": {"equals": "rust"}, "mode": "insensitive"}
        }));
        assert!(!filter.matches(&item(json!({"tags": ["RUST"]}))));
    }

    #[test]
    fn unknown_mode_is_reported() {
        let filter = compile(json!({"name": {"equals": "A", "mode": "loud"}}));
        assert!(!filter.matches(&item(json!({"name": "a"}))));
        assert_eq!(
            filter.diagnostics(),
            &[Diagnostic::UnknownMode("loud".to_string())]
        );
    }

    #[test]
    fn unknown_operator_never_matches() {
        let filter = compile(json!({"name": {"equals": "a", "like": "%a%"}}));
        assert!(!filter.matches(&item(json!({"name": "a"}))));
        assert_eq!(
            filter.diagnostics(),
            &[Diagnostic::UnknownOperator {
                key: "like".to_string()
            }]
        );
    }

    #[test]
    fn negated_criteria_uses_de_morgan() {
        let filter = compile(json!({"n": {"not": {"gt": 1, "lt": 5}}}));
        assert!(filter.matches(&item(json!({"n": 0}))));
        assert!(filter.matches(&item(json!({"n": 7}))));
        assert!(!filter.matches(&item(json!({"n": 3}))));
    }

    #[test]
    fn double_negation_cancels() {
        let plain = compile(json!({"n": {"contains": "ab"}}));
        let double = compile(json!({"n": {"not": {"not": {"contains": "ab"}}}}));
        for value in [json!("xaby"), json!("xy"), json!(5), json!(null)] {
            let row = item(json!({ "n": value }));
            assert_eq!(plain.matches(&row), double.matches(&row));
        }
    }

    #[test]
    fn double_negation_restores_every() {
        let every = compile(json!({"tags": {"every": {"equals": "a"}}}));
        let double = compile(json!({"tags": {"not": {"not": {"every": {"equals": "a"}}}}}));
        for value in [json!(null), json!("a"), json!([]), json!(["a"]), json!(["a", "b"])] {
            let row = item(json!({ "tags": value }));
            assert_eq!(every.matches(&row), double.matches(&row), "{row:?}");
        }
        assert!(!double.matches(&item(json!({}))));
    }

    #[test]
    fn misspelled_operator_is_caught_by_shape_check() {
        let filter = compile(json!({"name": {"like": "%a%"}}));
        assert!(filter.diagnostics().is_empty());

        let items = [
            item(json!({"name": "alice"})),
            item(json!({"name": null})),
            item(json!({"name": "bob"})),
        ];
        assert!(!filter.matches(&items[0]));
        assert_eq!(
            filter.check_shapes(&items),
            vec![Diagnostic::NotARelation {
                field: "name".to_string()
            }]
        );
    }

    #[test]
    fn shape_check_walks_nested_relations_and_groups() {
        let filter = compile(json!({
            "author": {"profile": {"city": "Oslo"}},
            "OR": [{"tag": {"name": "x"}}]
        }));
        let items = [
            item(json!({"author": {"profile": "none"}, "tag": {"name": "x"}})),
            item(json!({"author": null, "tag": 3})),
        ];
        assert_eq!(
            filter.check_shapes(&items),
            vec![
                Diagnostic::NotARelation {
                    field: "profile".to_string()
                },
                Diagnostic::NotARelation {
                    field: "tag".to_string()
                },
            ]
        );
        assert!(compile(json!({"a": {"gt": 1}})).check_shapes(&items).is_empty());
    }

    #[test]
    fn negated_empty_criteria_never_matches() {
        let filter = compile(json!({"n": {"not": {}}}));
        assert!(!filter.matches(&item(json!({"n": 1}))));
    }

    #[test]
    fn negated_relation_fragment() {
        let filter = compile(json!({"author": {"not": {"name": "Ann"}}}));
        assert!(filter.matches(&item(json!({"author": {"name": "Bob"}}))));
        assert!(filter.matches(&item(json!({"author": null}))));
        assert!(!filter.matches(&item(json!({"author": {"name": "Ann"}}))));
    }

    #[test]
    fn logical_groups_accept_single_fragments() {
        let filter = compile(json!({"NOT": {"status": "archived"}}));
        assert!(filter.matches(&item(json!({"status": "open"}))));
        assert!(!filter.matches(&item(json!({"status": "archived"}))));
    }

    #[test]
    fn invalid_group_entries_are_reported() {
        let filter = compile(json!({"OR": [{"a": 1}, 5]}));
        assert!(filter.matches(&item(json!({"a": 1}))));
        assert!(!filter.matches(&item(json!({"a": 2}))));
        assert_eq!(
            filter.diagnostics(),
            &[Diagnostic::InvalidGroup { group: "OR" }]
        );
    }

    #[test]
    fn filter_and_count_keep_order() {
        let items = vec![
            item(json!({"age": 25})),
            item(json!({"age": 30})),
            item(json!({"age": 35})),
        ];
        let filter = compile(json!({"age": {"gte": 30}}));
        let found = filter.filter(&items);
        assert_eq!(found, vec![&items[1], &items[2]]);
        assert_eq!(filter.count(&items), 2);
    }
}

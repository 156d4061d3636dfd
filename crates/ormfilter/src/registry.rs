//! Operator registry: resolves one operator key and operand into a unit.

use regex::RegexBuilder;

use crate::compare::{Comparison, TextOp};
use crate::error::Diagnostic;
use crate::op::Op;
use crate::predicate::{Compiler, Context, Unit};
use crate::quantifier::{Member, Quantifier};
use crate::value::{Number, Value};

impl Compiler {
    /// Resolves `key: operand` into exactly one unit.
    ///
    /// `mode` yields no unit. Unknown keys and unusable operands yield
    /// [`Unit::Never`] and a diagnostic; resolution itself never fails.
    pub(crate) fn resolve(&mut self, key: &str, operand: &Value, ctx: Context) -> Option<Unit> {
        let Some(op) = Op::from_key(key) else {
            self.report(Diagnostic::UnknownOperator {
                key: key.to_string(),
            });
            return Some(Unit::Never);
        };
        let insensitive = ctx.insensitive && op.is_string_op();

        let unit = match op {
            Op::Mode => return None,
            Op::Equals => Unit::Compare(Comparison::Equals {
                operand: operand.clone(),
                insensitive,
            }),
            Op::Not => self.negation(operand, ctx),
            Op::In | Op::NotIn => match operand.as_array() {
                Some(values) if op == Op::In => Unit::Compare(Comparison::In {
                    values: values.to_vec(),
                    insensitive,
                }),
                Some(values) => Unit::Compare(Comparison::NotIn {
                    values: values.to_vec(),
                    insensitive,
                }),
                None => self.reject(op, format!("expected a list, got {}", operand.kind())),
            },
            Op::Lt | Op::Lte | Op::Gt | Op::Gte => Unit::Compare(Comparison::Order {
                op,
                operand: operand.clone(),
            }),
            Op::Contains => text(TextOp::Contains, operand, false, insensitive),
            Op::NotContains => text(TextOp::Contains, operand, true, insensitive),
            Op::StartsWith => text(TextOp::StartsWith, operand, false, insensitive),
            Op::NotStartsWith => text(TextOp::StartsWith, operand, true, insensitive),
            Op::EndsWith => text(TextOp::EndsWith, operand, false, insensitive),
            Op::NotEndsWith => text(TextOp::EndsWith, operand, true, insensitive),
            Op::Regex => self.regex(operand, insensitive),
            Op::Before | Op::After => match operand.as_instant() {
                Some(reference) if op == Op::Before => {
                    Unit::Compare(Comparison::Before(reference))
                }
                Some(reference) => Unit::Compare(Comparison::After(reference)),
                None => self.reject(op, format!("expected a date, got {}", operand.kind())),
            },
            Op::Between => self.between(operand),
            Op::IsNull => match operand {
                Value::Bool(expected) => Unit::Compare(Comparison::IsNull(*expected)),
                other => self.reject(op, format!("expected a bool, got {}", other.kind())),
            },
            Op::Some | Op::None | Op::Every => {
                let test = Box::new(self.compile_operand(operand, Context::default()));
                Unit::Quantify(match op {
                    Op::Some => Quantifier::Some(test),
                    Op::None => Quantifier::None(test),
                    _ => Quantifier::Every(test),
                })
            }
            Op::Has => Unit::Quantify(Quantifier::Has(operand.clone())),
            Op::HasEvery | Op::HasSome => match operand.as_array() {
                Some(values) => {
                    let members = self.members(values);
                    Unit::Quantify(if op == Op::HasEvery {
                        Quantifier::HasEvery(members)
                    } else {
                        Quantifier::HasSome(members)
                    })
                }
                None => self.reject(op, format!("expected a list, got {}", operand.kind())),
            },
            Op::Length => self.length(operand),
        };
        Some(unit)
    }

    fn reject(&mut self, op: Op, reason: String) -> Unit {
        self.report(Diagnostic::invalid_operand(op.as_str(), reason));
        Unit::Never
    }

    fn members(&mut self, values: &[Value]) -> Vec<Member> {
        values
            .iter()
            .map(|value| match value {
                Value::Object(_) => {
                    Member::Fragment(self.compile_operand(value, Context::default()))
                }
                other => Member::Value(other.clone()),
            })
            .collect()
    }

    fn between(&mut self, operand: &Value) -> Unit {
        match operand.as_array() {
            Some([start, end]) => match (start.as_instant(), end.as_instant()) {
                (Some(start), Some(end)) => Unit::Compare(Comparison::Between(start, end)),
                _ => self.reject(Op::Between, "both bounds must be dates".to_string()),
            },
            _ => self.reject(Op::Between, "expected [start, end]".to_string()),
        }
    }

    // `length: 3` or `length: { gte: 1, lt: 10 }`
    fn length(&mut self, operand: &Value) -> Unit {
        match operand {
            Value::Number(n) if is_count(*n) => {
                Unit::Compare(Comparison::Length(vec![(Op::Equals, *n)]))
            }
            Value::Object(bounds) if !bounds.is_empty() => {
                let mut checks = Vec::with_capacity(bounds.len());
                for (key, bound) in bounds.iter() {
                    match (Op::from_key(key), bound) {
                        (
                            Some(op @ (Op::Equals | Op::Lt | Op::Lte | Op::Gt | Op::Gte)),
                            Value::Number(n),
                        ) => checks.push((op, *n)),
                        _ => {
                            return self.reject(
                                Op::Length,
                                format!("unsupported bound '{key}'"),
                            )
                        }
                    }
                }
                Unit::Compare(Comparison::Length(checks))
            }
            other => self.reject(
                Op::Length,
                format!("expected a count or bounds, got {}", other.kind()),
            ),
        }
    }

    fn regex(&mut self, operand: &Value, insensitive: bool) -> Unit {
        let (pattern, flags) = match operand {
            Value::String(pattern) => (pattern.as_str(), ""),
            Value::Object(options) => match (options.get("pattern"), options.get("flags")) {
                (Some(Value::String(pattern)), None | Some(Value::Null)) => (pattern.as_str(), ""),
                (Some(Value::String(pattern)), Some(Value::String(flags))) => {
                    (pattern.as_str(), flags.as_str())
                }
                _ => {
                    return self.reject(
                        Op::Regex,
                        "expected a pattern or {pattern, flags}".to_string(),
                    )
                }
            },
            other => {
                return self.reject(
                    Op::Regex,
                    format!("expected a pattern, got {}", other.kind()),
                )
            }
        };

        let mut builder = RegexBuilder::new(pattern);
        builder.case_insensitive(insensitive);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                // no effect on a yes/no match
                'g' | 'u' | 'y' | 'd' => {}
                other => {
                    self.report(Diagnostic::InvalidRegex {
                        pattern: pattern.to_string(),
                        message: format!("unsupported flag '{other}'"),
                    });
                    return Unit::Never;
                }
            }
        }

        match builder.build() {
            Ok(regex) => Unit::Compare(Comparison::Regex(regex)),
            Err(err) => {
                self.report(Diagnostic::InvalidRegex {
                    pattern: pattern.to_string(),
                    message: err.to_string(),
                });
                Unit::Never
            }
        }
    }
}

fn text(op: TextOp, operand: &Value, negated: bool, insensitive: bool) -> Unit {
    Unit::Compare(Comparison::Text {
        op,
        needle: operand.as_str().map(str::to_string),
        negated,
        insensitive,
    })
}

fn is_count(n: Number) -> bool {
    match n {
        Number::I64(i) => i >= 0,
        Number::U64(_) => true,
        Number::F64(f) => f >= 0.0 && f.fract() == 0.0,
    }
}

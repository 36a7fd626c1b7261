//! Builtin node evaluation
//!
//! Builtins are pure functions over bound token variables: comparisons and
//! string tests guard the firing, arithmetic and length ops may bind their
//! final argument. A builtin that receives incomparable literal types reports
//! a type error and the firing is dropped silently, analogous to error
//! semantics inside query filters.

use std::cmp::Ordering;

use fnv::FnvHashMap;
use regex::Regex;

use crate::rete::production::{BuiltinOp, Slot};
use crate::term::{TermId, TermStore};
use crate::vocab;

/// Result of evaluating one builtin call against a token
#[derive(Debug, Clone)]
pub enum BuiltinOutcome {
    /// Guard passed, nothing new bound
    Pass,
    /// Computation succeeded and binds a variable
    Bind(u8, TermId),
    /// Guard failed; drop the tuple
    Fail,
    /// Operands outside the builtin's value space; drop and diagnose
    TypeError(String),
}

/// Evaluate a builtin call
///
/// `bindings` is the token's variable frame; compiled rules guarantee every
/// argument except a computing builtin's final one is bound. `regexes` caches
/// compiled patterns across firings.
pub fn evaluate(
    op: BuiltinOp,
    args: &[Slot],
    bindings: &[Option<TermId>],
    terms: &mut TermStore,
    regexes: &mut FnvHashMap<String, Regex>,
) -> BuiltinOutcome {
    let arity = match op {
        BuiltinOp::Add | BuiltinOp::Subtract | BuiltinOp::Multiply | BuiltinOp::Divide => 3,
        _ => 2,
    };
    if args.len() != arity {
        return BuiltinOutcome::TypeError(format!(
            "{}: expected {} arguments, got {}",
            op,
            arity,
            args.len()
        ));
    }

    let resolve = |slot: &Slot| -> Option<TermId> {
        match slot {
            Slot::Const(id) => Some(*id),
            Slot::Var(v) => bindings[*v as usize],
        }
    };

    match op {
        BuiltinOp::Equal | BuiltinOp::NotEqual => {
            let (Some(a), Some(b)) = (resolve(&args[0]), resolve(&args[1])) else {
                return BuiltinOutcome::TypeError(format!("{}: unbound operand", op));
            };
            let equal = if terms.is_literal(a) && terms.is_literal(b) {
                match terms.cmp_literal(a, b) {
                    Some(ordering) => ordering == Ordering::Equal,
                    None => return type_error(op, terms, a, b),
                }
            } else {
                a == b
            };
            let pass = if op == BuiltinOp::Equal { equal } else { !equal };
            if pass {
                BuiltinOutcome::Pass
            } else {
                BuiltinOutcome::Fail
            }
        }

        BuiltinOp::LessThan
        | BuiltinOp::LessThanOrEqual
        | BuiltinOp::GreaterThan
        | BuiltinOp::GreaterThanOrEqual => {
            let (Some(a), Some(b)) = (resolve(&args[0]), resolve(&args[1])) else {
                return BuiltinOutcome::TypeError(format!("{}: unbound operand", op));
            };
            let Some(ordering) = terms.cmp_literal(a, b) else {
                return type_error(op, terms, a, b);
            };
            let pass = match op {
                BuiltinOp::LessThan => ordering == Ordering::Less,
                BuiltinOp::LessThanOrEqual => ordering != Ordering::Greater,
                BuiltinOp::GreaterThan => ordering == Ordering::Greater,
                BuiltinOp::GreaterThanOrEqual => ordering != Ordering::Less,
                _ => unreachable!(),
            };
            if pass {
                BuiltinOutcome::Pass
            } else {
                BuiltinOutcome::Fail
            }
        }

        BuiltinOp::Add | BuiltinOp::Subtract | BuiltinOp::Multiply | BuiltinOp::Divide => {
            let (Some(a), Some(b)) = (resolve(&args[0]), resolve(&args[1])) else {
                return BuiltinOutcome::TypeError(format!("{}: unbound operand", op));
            };
            let (Some(la), Some(lb)) = (terms.literal(a), terms.literal(b)) else {
                return type_error(op, terms, a, b);
            };
            let (Some(xa), Some(xb)) = (la.as_number(), lb.as_number()) else {
                return type_error(op, terms, a, b);
            };
            let exact = la.as_integer().zip(lb.as_integer());

            let result = match (op, exact) {
                (BuiltinOp::Add, Some((ia, ib))) => int_literal(terms, ia.wrapping_add(ib)),
                (BuiltinOp::Subtract, Some((ia, ib))) => int_literal(terms, ia.wrapping_sub(ib)),
                (BuiltinOp::Multiply, Some((ia, ib))) => int_literal(terms, ia.wrapping_mul(ib)),
                (BuiltinOp::Divide, _) => {
                    if xb == 0.0 {
                        return BuiltinOutcome::Fail;
                    }
                    num_literal(terms, xa / xb)
                }
                (BuiltinOp::Add, None) => num_literal(terms, xa + xb),
                (BuiltinOp::Subtract, None) => num_literal(terms, xa - xb),
                (BuiltinOp::Multiply, None) => num_literal(terms, xa * xb),
                _ => unreachable!(),
            };
            bind_or_check(&args[2], resolve(&args[2]), result, terms)
        }

        BuiltinOp::StringLength => {
            let Some(a) = resolve(&args[0]) else {
                return BuiltinOutcome::TypeError(format!("{}: unbound operand", op));
            };
            let Some(text) = terms.literal(a).and_then(|l| l.as_text().map(str::to_string))
            else {
                return BuiltinOutcome::TypeError(format!(
                    "{}: {} is not a string",
                    op,
                    terms.display(a)
                ));
            };
            let result = int_literal(terms, text.chars().count() as i64);
            bind_or_check(&args[1], resolve(&args[1]), result, terms)
        }

        BuiltinOp::Contains | BuiltinOp::StartsWith => {
            let (Some(a), Some(b)) = (resolve(&args[0]), resolve(&args[1])) else {
                return BuiltinOutcome::TypeError(format!("{}: unbound operand", op));
            };
            let texts = terms
                .literal(a)
                .and_then(|l| l.as_text())
                .zip(terms.literal(b).and_then(|l| l.as_text()));
            let Some((haystack, needle)) = texts else {
                return type_error(op, terms, a, b);
            };
            let pass = match op {
                BuiltinOp::Contains => haystack.contains(needle),
                BuiltinOp::StartsWith => haystack.starts_with(needle),
                _ => unreachable!(),
            };
            if pass {
                BuiltinOutcome::Pass
            } else {
                BuiltinOutcome::Fail
            }
        }

        BuiltinOp::Matches => {
            let (Some(a), Some(b)) = (resolve(&args[0]), resolve(&args[1])) else {
                return BuiltinOutcome::TypeError(format!("{}: unbound operand", op));
            };
            let texts = terms
                .literal(a)
                .and_then(|l| l.as_text().map(str::to_string))
                .zip(terms.literal(b).and_then(|l| l.as_text().map(str::to_string)));
            let Some((text, pattern)) = texts else {
                return type_error(op, terms, a, b);
            };
            if !regexes.contains_key(&pattern) {
                match Regex::new(&pattern) {
                    Ok(re) => {
                        regexes.insert(pattern.clone(), re);
                    }
                    Err(e) => {
                        return BuiltinOutcome::TypeError(format!(
                            "{}: invalid pattern: {}",
                            op, e
                        ))
                    }
                }
            }
            if regexes[&pattern].is_match(&text) {
                BuiltinOutcome::Pass
            } else {
                BuiltinOutcome::Fail
            }
        }
    }
}

fn bind_or_check(
    slot: &Slot,
    current: Option<TermId>,
    result: TermId,
    terms: &TermStore,
) -> BuiltinOutcome {
    match current {
        Some(existing) => {
            let equal = terms.cmp_literal(existing, result) == Some(Ordering::Equal);
            if equal {
                BuiltinOutcome::Pass
            } else {
                BuiltinOutcome::Fail
            }
        }
        None => match slot {
            Slot::Var(v) => BuiltinOutcome::Bind(*v, result),
            Slot::Const(_) => BuiltinOutcome::Fail,
        },
    }
}

fn int_literal(terms: &mut TermStore, n: i64) -> TermId {
    terms.intern_literal(&n.to_string(), vocab::XSD_INTEGER)
}

fn num_literal(terms: &mut TermStore, x: f64) -> TermId {
    terms.intern_literal(&x.to_string(), vocab::XSD_DOUBLE)
}

fn type_error(op: BuiltinOp, terms: &TermStore, a: TermId, b: TermId) -> BuiltinOutcome {
    BuiltinOutcome::TypeError(format!(
        "{}: incomparable operands {} and {}",
        op,
        terms.display(a),
        terms.display(b)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rete::production::Slot;

    fn ctx() -> (TermStore, FnvHashMap<String, Regex>) {
        (TermStore::new(), FnvHashMap::default())
    }

    #[test]
    fn test_ge_guard() {
        let (mut terms, mut regexes) = ctx();
        let age = terms.intern_literal("18", vocab::XSD_INTEGER);
        let threshold = terms.intern_literal("18", vocab::XSD_INTEGER);
        let out = evaluate(
            BuiltinOp::GreaterThanOrEqual,
            &[Slot::Var(0), Slot::Const(threshold)],
            &[Some(age)],
            &mut terms,
            &mut regexes,
        );
        assert!(matches!(out, BuiltinOutcome::Pass));
    }

    #[test]
    fn test_comparison_fails_below_threshold() {
        let (mut terms, mut regexes) = ctx();
        let age = terms.intern_literal("17", vocab::XSD_INTEGER);
        let threshold = terms.intern_literal("18", vocab::XSD_INTEGER);
        let out = evaluate(
            BuiltinOp::GreaterThanOrEqual,
            &[Slot::Var(0), Slot::Const(threshold)],
            &[Some(age)],
            &mut terms,
            &mut regexes,
        );
        assert!(matches!(out, BuiltinOutcome::Fail));
    }

    #[test]
    fn test_incomparable_types_report_error() {
        let (mut terms, mut regexes) = ctx();
        let n = terms.intern_literal("5", vocab::XSD_INTEGER);
        let s = terms.intern_literal("five", vocab::XSD_STRING);
        let out = evaluate(
            BuiltinOp::LessThan,
            &[Slot::Const(n), Slot::Const(s)],
            &[],
            &mut terms,
            &mut regexes,
        );
        assert!(matches!(out, BuiltinOutcome::TypeError(_)));
    }

    #[test]
    fn test_add_binds_result() {
        let (mut terms, mut regexes) = ctx();
        let two = terms.intern_literal("2", vocab::XSD_INTEGER);
        let three = terms.intern_literal("3", vocab::XSD_INTEGER);
        let out = evaluate(
            BuiltinOp::Add,
            &[Slot::Const(two), Slot::Const(three), Slot::Var(0)],
            &[None],
            &mut terms,
            &mut regexes,
        );
        match out {
            BuiltinOutcome::Bind(0, id) => {
                assert_eq!(terms.literal(id).unwrap().as_integer(), Some(5));
            }
            other => panic!("expected bind, got {:?}", other),
        }
    }

    #[test]
    fn test_divide_by_zero_drops_firing() {
        let (mut terms, mut regexes) = ctx();
        let one = terms.intern_literal("1", vocab::XSD_INTEGER);
        let zero = terms.intern_literal("0", vocab::XSD_INTEGER);
        let out = evaluate(
            BuiltinOp::Divide,
            &[Slot::Const(one), Slot::Const(zero), Slot::Var(0)],
            &[None],
            &mut terms,
            &mut regexes,
        );
        assert!(matches!(out, BuiltinOutcome::Fail));
    }

    #[test]
    fn test_matches_uses_regex() {
        let (mut terms, mut regexes) = ctx();
        let text = terms.intern_literal("parse_query", vocab::XSD_STRING);
        let pattern = terms.intern_literal("^parse_", vocab::XSD_STRING);
        let out = evaluate(
            BuiltinOp::Matches,
            &[Slot::Const(text), Slot::Const(pattern)],
            &[],
            &mut terms,
            &mut regexes,
        );
        assert!(matches!(out, BuiltinOutcome::Pass));
        assert_eq!(regexes.len(), 1);
    }
}

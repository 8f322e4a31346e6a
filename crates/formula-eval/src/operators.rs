//! Operator rules.
//!
//! Every operator is one entry in a table: the operand requirements it
//! reports on failure and a function that either produces the result or
//! declines the operands. Declining always becomes an `ArgumentType` error
//! carrying the operator symbol, the expected set and the actual types.

use crate::value::{arithmetic, concatenate, repeat, NumOp, Value};
use formula_types::ast::{BinOp, UnaryOp};
use formula_types::{EvalError, EvalResult, Expected};
use std::cmp::Ordering;

/// `None` means the operand types are not accepted.
type BinaryApply = fn(BinOp, &Value, &Value) -> Option<EvalResult<Value>>;

struct BinaryRule {
    expected: &'static [Expected],
    apply: BinaryApply,
}

const NUMBERS: &[Expected] = &[Expected::NUMBER, Expected::NUMBER];
const BOOLS: &[Expected] = &[Expected::BOOL, Expected::BOOL];
const EQ: &[Expected] = &[Expected::Eq, Expected::Eq];
const ORD: &[Expected] = &[Expected::Ord, Expected::Ord];

fn binary_rule(op: BinOp) -> BinaryRule {
    match op {
        BinOp::Add => BinaryRule {
            expected: NUMBERS,
            apply: add,
        },
        BinOp::Mul => BinaryRule {
            expected: NUMBERS,
            apply: mul,
        },
        BinOp::Sub | BinOp::Div | BinOp::Mod | BinOp::Pow => BinaryRule {
            expected: NUMBERS,
            apply: numeric,
        },
        BinOp::And | BinOp::Or => BinaryRule {
            expected: BOOLS,
            apply: logical,
        },
        BinOp::Eq | BinOp::NotEq => BinaryRule {
            expected: EQ,
            apply: equality,
        },
        BinOp::Less | BinOp::LessEq | BinOp::Greater | BinOp::GreaterEq => BinaryRule {
            expected: ORD,
            apply: ordering,
        },
    }
}

/// Apply a binary operator to already evaluated operands.
pub(crate) fn apply_binary(op: BinOp, left: &Value, right: &Value) -> EvalResult<Value> {
    let rule = binary_rule(op);
    match (rule.apply)(op, left, right) {
        Some(result) => result,
        None => Err(EvalError::argument_type(
            op.as_str(),
            rule.expected.to_vec(),
            vec![left.value_type(), right.value_type()],
        )),
    }
}

/// Apply a unary operator to an already evaluated operand.
pub(crate) fn apply_unary(op: UnaryOp, operand: &Value) -> EvalResult<Value> {
    match (op, operand) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, other) => Err(EvalError::argument_type(
            op.as_str(),
            vec![Expected::BOOL],
            vec![other.value_type()],
        )),
    }
}

fn num_op(op: BinOp) -> NumOp {
    match op {
        BinOp::Add => NumOp::Add,
        BinOp::Sub => NumOp::Sub,
        BinOp::Mul => NumOp::Mul,
        BinOp::Div => NumOp::Div,
        BinOp::Mod => NumOp::Mod,
        _ => NumOp::Pow,
    }
}

// ── Rules ─────────────────────────────────────────────────────────────────────

fn add(op: BinOp, l: &Value, r: &Value) -> Option<EvalResult<Value>> {
    match (l, r) {
        (Value::Text(_), _) | (_, Value::Text(_)) => Some(Ok(concatenate(l, r))),
        _ => numeric(op, l, r),
    }
}

fn mul(op: BinOp, l: &Value, r: &Value) -> Option<EvalResult<Value>> {
    match (l, r) {
        (Value::Text(text), Value::Number(count)) | (Value::Number(count), Value::Text(text)) => {
            Some(repeat(text, *count))
        }
        _ => numeric(op, l, r),
    }
}

fn numeric(op: BinOp, l: &Value, r: &Value) -> Option<EvalResult<Value>> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Some(arithmetic(num_op(op), *a, *b)),
        _ => None,
    }
}

fn logical(op: BinOp, l: &Value, r: &Value) -> Option<EvalResult<Value>> {
    match (l, r) {
        (Value::Bool(a), Value::Bool(b)) => Some(Ok(Value::Bool(match op {
            BinOp::And => *a && *b,
            _ => *a || *b,
        }))),
        _ => None,
    }
}

fn equality(op: BinOp, l: &Value, r: &Value) -> Option<EvalResult<Value>> {
    let equal = l.equals(r)?;
    Some(Ok(Value::Bool(match op {
        BinOp::NotEq => !equal,
        _ => equal,
    })))
}

fn ordering(op: BinOp, l: &Value, r: &Value) -> Option<EvalResult<Value>> {
    if l.value_type() != r.value_type() || !l.value_type().supports_ord() {
        return None;
    }
    // Unordered numbers (NaN) compare false under every operator.
    let result = l.compare(r).is_some_and(|ord| match op {
        BinOp::Less => ord == Ordering::Less,
        BinOp::LessEq => ord != Ordering::Greater,
        BinOp::Greater => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
    });
    Some(Ok(Value::Bool(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formula_types::ValueType;

    #[test]
    fn test_add_text_with_anything() {
        assert_eq!(
            apply_binary(BinOp::Add, &Value::text("a"), &Value::Bool(true)),
            Ok(Value::text("atrue"))
        );
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Number(2.0), &Value::text("b")),
            Ok(Value::text("2b"))
        );
    }

    #[test]
    fn test_add_rejects_bools() {
        assert_eq!(
            apply_binary(BinOp::Add, &Value::Bool(true), &Value::Number(1.0)),
            Err(EvalError::argument_type(
                "+",
                vec![Expected::NUMBER, Expected::NUMBER],
                vec![ValueType::Bool, ValueType::Number],
            ))
        );
    }

    #[test]
    fn test_mul_rejects_text_pair() {
        let err = apply_binary(BinOp::Mul, &Value::text("a"), &Value::text("b")).unwrap_err();
        assert!(matches!(err, EvalError::ArgumentType { ref operator, .. } if operator == "*"));
    }

    #[test]
    fn test_numeric_only_operators() {
        for op in [BinOp::Sub, BinOp::Div, BinOp::Mod, BinOp::Pow] {
            let err = apply_binary(op, &Value::text("6"), &Value::Number(2.0)).unwrap_err();
            assert_eq!(
                err,
                EvalError::argument_type(
                    op.as_str(),
                    vec![Expected::NUMBER, Expected::NUMBER],
                    vec![ValueType::Text, ValueType::Number],
                )
            );
        }
        assert_eq!(
            apply_binary(BinOp::Div, &Value::Number(6.0), &Value::Number(4.0)),
            Ok(Value::Number(1.5))
        );
    }

    #[test]
    fn test_logical() {
        let t = Value::Bool(true);
        let f = Value::Bool(false);
        assert_eq!(apply_binary(BinOp::And, &t, &f), Ok(Value::Bool(false)));
        assert_eq!(apply_binary(BinOp::Or, &t, &f), Ok(Value::Bool(true)));
        let err = apply_binary(BinOp::Or, &t, &Value::Number(0.0)).unwrap_err();
        assert_eq!(
            err,
            EvalError::argument_type(
                "||",
                vec![Expected::BOOL, Expected::BOOL],
                vec![ValueType::Bool, ValueType::Number],
            )
        );
    }

    #[test]
    fn test_equality_on_functions_is_rejected() {
        let f = Value::Function(crate::value::Function::new("f", |_, _| Ok(Value::Bool(true))));
        let err = apply_binary(BinOp::Eq, &f, &f).unwrap_err();
        assert_eq!(
            err,
            EvalError::argument_type(
                "==",
                vec![Expected::Eq, Expected::Eq],
                vec![ValueType::Function, ValueType::Function],
            )
        );
    }

    #[test]
    fn test_ordering_operators() {
        let one = Value::Number(1.0);
        let two = Value::Number(2.0);
        let cases = [
            (BinOp::Less, true, false),
            (BinOp::LessEq, true, true),
            (BinOp::Greater, false, false),
            (BinOp::GreaterEq, false, true),
        ];
        for (op, one_two, two_two) in cases {
            assert_eq!(apply_binary(op, &one, &two), Ok(Value::Bool(one_two)), "{op:?}");
            assert_eq!(apply_binary(op, &two, &two), Ok(Value::Bool(two_two)), "{op:?}");
        }
    }

    #[test]
    fn test_ordering_rejects_bools() {
        let err = apply_binary(BinOp::Less, &Value::Bool(false), &Value::Bool(true)).unwrap_err();
        assert_eq!(
            err,
            EvalError::argument_type(
                "<",
                vec![Expected::Ord, Expected::Ord],
                vec![ValueType::Bool, ValueType::Bool],
            )
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(apply_unary(UnaryOp::Not, &Value::Bool(true)), Ok(Value::Bool(false)));
        assert_eq!(
            apply_unary(UnaryOp::Not, &Value::text("x")),
            Err(EvalError::argument_type(
                "!",
                vec![Expected::BOOL],
                vec![ValueType::Text],
            ))
        );
    }
}

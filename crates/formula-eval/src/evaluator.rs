//! Core expression evaluator.
//!
//! A pure recursive walk: children are evaluated first (left before right,
//! callee before arguments), then the node applies its own rule. Errors are
//! returned as raised; nothing here catches, retries or logs.

use crate::env::Environment;
use crate::operators::{apply_binary, apply_unary};
use crate::value::Value;
use formula_types::ast::{string_contents, Expr, ExprKind, Ident, UnresolvedName};
use formula_types::{EvalError, EvalResult, ValueType};

/// Something that can be evaluated against an [`Environment`].
pub trait Evaluate {
    type Output;

    fn evaluate(&self, env: &mut Environment) -> EvalResult<Self::Output>;
}

impl Evaluate for Expr {
    type Output = Value;

    fn evaluate(&self, env: &mut Environment) -> EvalResult<Value> {
        match &self.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(raw) => Ok(Value::text(string_contents(raw))),

            ExprKind::Unary { op, operand } => {
                let value = operand.evaluate(env)?;
                apply_unary(*op, &value)
            }
            ExprKind::Binary { left, op, right } => {
                let lv = left.evaluate(env)?;
                let rv = right.evaluate(env)?;
                apply_binary(*op, &lv, &rv)
            }

            ExprKind::Name(ident) => eval_name(ident, env),
            ExprKind::Resolve { rest, name } => eval_resolve(rest, name, env),
            ExprKind::Unresolved(name) => {
                let items = name.evaluate(env)?.into_iter().map(Value::Text).collect();
                Ok(Value::array(ValueType::Text, items))
            }

            ExprKind::Call { callee, args } => eval_call(callee, args, env),
            ExprKind::Assign { targets, value } => eval_assign(targets, value, env),
        }
    }
}

/// Evaluating an assignment target yields its segments in source order.
impl Evaluate for UnresolvedName {
    type Output = Vec<String>;

    fn evaluate(&self, _env: &mut Environment) -> EvalResult<Vec<String>> {
        Ok(self.path())
    }
}

// ── Names ─────────────────────────────────────────────────────────────────────

fn eval_name(ident: &Ident, env: &Environment) -> EvalResult<Value> {
    env.lookup(&ident.name, None)
        .ok_or_else(|| EvalError::name_resolution(ident))
}

/// `rest:name` — look `name` up inside whatever `rest` evaluates to.
///
/// A method found this way comes back bound to the scope value.
fn eval_resolve(rest: &Expr, name: &Ident, env: &mut Environment) -> EvalResult<Value> {
    let scope = rest.evaluate(env)?;
    match env.lookup(&name.name, Some(&scope)) {
        None => Err(EvalError::name_resolution(name)),
        Some(Value::Function(f)) if f.is_method() => Ok(Value::Function(f.bind(scope))),
        Some(value) => Ok(value),
    }
}

// ── Calls & Assignment ───────────────────────────────────────────────────────

fn eval_call(callee: &Expr, args: &[Expr], env: &mut Environment) -> EvalResult<Value> {
    let target = callee.evaluate(env)?;
    let mut arg_vals = Vec::with_capacity(args.len());
    for arg in args {
        arg_vals.push(arg.evaluate(env)?);
    }
    match target {
        Value::Function(f) => f.call(env, arg_vals),
        other => Err(EvalError::not_callable(callee, other.value_type())),
    }
}

/// The value is computed once and written to each target in order.
///
/// Not transactional: if a later target is rejected, earlier ones stay written.
fn eval_assign(
    targets: &[UnresolvedName],
    value: &Expr,
    env: &mut Environment,
) -> EvalResult<Value> {
    let value = value.evaluate(env)?;
    for target in targets {
        let path = target.evaluate(env)?;
        if let Err(source) = env.assign(&path, value.clone()) {
            return Err(EvalError::Assignment {
                target: path,
                source,
            });
        }
    }
    Ok(value)
}

/// Evaluate each formula in order against the same environment and return
/// the last result. `Ok(None)` for an empty sequence.
pub fn evaluate_all(formulas: &[Expr], env: &mut Environment) -> EvalResult<Option<Value>> {
    let mut last = None;
    for formula in formulas {
        last = Some(formula.evaluate(env)?);
    }
    Ok(last)
}

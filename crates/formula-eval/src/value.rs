//! Runtime values.
//!
//! Values are created fresh by every evaluation. Nothing here is mutated in
//! place once handed out: binding a method to a receiver produces a new
//! [`Function`], and namespace writes go through copy-on-write.

use crate::env::Environment;
use formula_types::{EvalError, EvalResult, ValueType};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ══════════════════════════════════════════════════════════════════════════════
// Value
// ══════════════════════════════════════════════════════════════════════════════

/// A typed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Homogeneous array; `elem` is kept so empty arrays still have a type.
    Array { elem: ValueType, items: Vec<Value> },
    Function(Function),
    /// Degrees north.
    Latitude(f64),
    /// Degrees east.
    Longitude(f64),
    /// Seconds since the Unix epoch.
    Timestamp(i64),
    Namespace(Namespace),
}

impl Value {
    /// The type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::Text(_) => ValueType::Text,
            Value::Bool(_) => ValueType::Bool,
            Value::Array { elem, .. } => ValueType::array_of(elem.clone()),
            Value::Function(_) => ValueType::Function,
            Value::Latitude(_) => ValueType::Latitude,
            Value::Longitude(_) => ValueType::Longitude,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Namespace(_) => ValueType::Namespace,
        }
    }

    pub fn array(elem: ValueType, items: Vec<Value>) -> Self {
        Value::Array { elem, items }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// The "nothing" value of a type, used when type-checking formulas
    /// against synthetic inputs. Functions have no such value.
    pub fn placeholder(ty: &ValueType) -> Option<Self> {
        Some(match ty {
            ValueType::Number => Value::Number(0.0),
            ValueType::Text => Value::Text(String::new()),
            ValueType::Bool => Value::Bool(false),
            ValueType::Array(elem) => Value::array((**elem).clone(), Vec::new()),
            ValueType::Latitude => Value::Latitude(0.0),
            ValueType::Longitude => Value::Longitude(0.0),
            ValueType::Timestamp => Value::Timestamp(0),
            ValueType::Namespace => Value::Namespace(Namespace::default()),
            ValueType::Function => return None,
        })
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Capability-checked equality.
    ///
    /// Returns `None` when the operands have different type tags or the type
    /// has no equality capability.
    pub fn equals(&self, other: &Value) -> Option<bool> {
        let ty = self.value_type();
        if ty != other.value_type() || !ty.supports_eq() {
            return None;
        }
        Some(match (self, other) {
            (Value::Number(a), Value::Number(b))
            | (Value::Latitude(a), Value::Latitude(b))
            | (Value::Longitude(a), Value::Longitude(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array { items: a, .. }, Value::Array { items: b, .. }) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| x.equals(y).unwrap_or(false))
            }
            _ => false,
        })
    }

    /// Capability-checked ordering.
    ///
    /// Returns `None` when the operands have different type tags, the type
    /// has no ordering capability, or the numbers are unordered (NaN).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        let ty = self.value_type();
        if ty != other.value_type() || !ty.supports_ord() {
            return None;
        }
        match (self, other) {
            (Value::Number(a), Value::Number(b))
            | (Value::Latitude(a), Value::Latitude(b))
            | (Value::Longitude(a), Value::Longitude(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) | Value::Latitude(n) | Value::Longitude(n) => {
                write!(f, "{}", format_number(*n))
            }
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Array { items, .. } => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "<function {}>", func.name()),
            Value::Timestamp(t) => write!(f, "{t}"),
            Value::Namespace(_) => write!(f, "<namespace>"),
        }
    }
}

/// Integral numbers render without a fractional part.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

// ── Number operations ─────────────────────────────────────────────────────────

/// Arithmetic performed by the number type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl NumOp {
    fn as_str(&self) -> &'static str {
        match self {
            NumOp::Add => "addition",
            NumOp::Sub => "subtraction",
            NumOp::Mul => "multiplication",
            NumOp::Div => "division",
            NumOp::Mod => "modulo",
            NumOp::Pow => "exponentiation",
        }
    }
}

/// Apply `op` to two numbers.
///
/// A zero divisor and any NaN/infinite result trap. Modulo is floored, so
/// the result takes the sign of the divisor.
pub fn arithmetic(op: NumOp, a: f64, b: f64) -> EvalResult<Value> {
    let result = match op {
        NumOp::Add => a + b,
        NumOp::Sub => a - b,
        NumOp::Mul => a * b,
        NumOp::Div | NumOp::Mod if b == 0.0 => {
            return Err(EvalError::ArithmeticTrap(format!("{} by zero", op.as_str())));
        }
        NumOp::Div => a / b,
        NumOp::Mod => a - b * (a / b).floor(),
        NumOp::Pow => a.powf(b),
    };
    if result.is_nan() || result.is_infinite() {
        Err(EvalError::ArithmeticTrap(format!(
            "{} produced NaN/Infinity",
            op.as_str()
        )))
    } else {
        Ok(Value::Number(result))
    }
}

// ── Text operations ───────────────────────────────────────────────────────────

/// Concatenate the textual forms of two values.
pub fn concatenate(left: &Value, right: &Value) -> Value {
    Value::Text(format!("{left}{right}"))
}

/// Largest text, in bytes, that repetition may produce.
pub const MAX_REPEAT_BYTES: usize = 1 << 24;

/// Repeat `text` `count` times. `count` must be a non-negative integer and
/// the result at most [`MAX_REPEAT_BYTES`] long.
pub fn repeat(text: &str, count: f64) -> EvalResult<Value> {
    if count < 0.0 || count.fract() != 0.0 || !count.is_finite() {
        return Err(EvalError::ArithmeticTrap(format!(
            "cannot repeat text {} times",
            format_number(count)
        )));
    }
    let too_long = || {
        EvalError::ArithmeticTrap(format!(
            "repeating text {} times exceeds {MAX_REPEAT_BYTES} bytes",
            format_number(count)
        ))
    };
    if count > MAX_REPEAT_BYTES as f64 {
        return Err(too_long());
    }
    let times = count as usize;
    match text.len().checked_mul(times) {
        Some(len) if len <= MAX_REPEAT_BYTES => Ok(Value::Text(text.repeat(times))),
        _ => Err(too_long()),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Function
// ══════════════════════════════════════════════════════════════════════════════

/// Native callable signature.
pub type NativeFn = dyn Fn(&mut Environment, Vec<Value>) -> EvalResult<Value> + Send + Sync;

/// A callable value.
///
/// Plain functions receive exactly the call's arguments. Methods are bound
/// to a receiver when reached through `receiver:method`; the receiver is
/// then passed as the first argument.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    callable: Arc<NativeFn>,
    method: bool,
    receiver: Option<Box<Value>>,
}

impl Function {
    pub fn new<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut Environment, Vec<Value>) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            callable: Arc::new(f),
            method: false,
            receiver: None,
        }
    }

    pub fn method<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut Environment, Vec<Value>) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            method: true,
            ..Self::new(name, f)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_method(&self) -> bool {
        self.method
    }

    pub fn receiver(&self) -> Option<&Value> {
        self.receiver.as_deref()
    }

    /// A copy of this function bound to `receiver`. `self` is untouched.
    pub fn bind(&self, receiver: Value) -> Function {
        Function {
            receiver: Some(Box::new(receiver)),
            ..self.clone()
        }
    }

    /// Invoke with the given arguments, prepending the bound receiver if any.
    pub fn call(&self, env: &mut Environment, args: Vec<Value>) -> EvalResult<Value> {
        let args = match &self.receiver {
            Some(receiver) => {
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push((**receiver).clone());
                all.extend(args);
                all
            }
            None => args,
        };
        (self.callable)(env, args)
    }

    /// Arity guard for native bodies.
    pub fn expect_arity(&self, args: &[Value], expected: usize) -> EvalResult<()> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(EvalError::Arity {
                function: self.name.to_string(),
                expected,
                actual: args.len(),
            })
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("receiver", &self.receiver)
            .finish()
    }
}

/// Identity comparison: same native body, same receiver.
impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable) && self.receiver == other.receiver
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Namespace
// ══════════════════════════════════════════════════════════════════════════════

/// A named group of bindings reached through qualified lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    members: Arc<BTreeMap<String, Value>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        Arc::make_mut(&mut self.members).insert(name.into(), value);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Write `value` at `path` below this namespace, creating missing
    /// namespaces along the way.
    pub(crate) fn insert_path(
        &mut self,
        path: &[String],
        value: Value,
    ) -> Result<(), formula_types::AssignError> {
        let Some((first, rest)) = path.split_first() else {
            return Err(formula_types::AssignError::EmptyTarget);
        };
        let members = Arc::make_mut(&mut self.members);
        if rest.is_empty() {
            members.insert(first.clone(), value);
            return Ok(());
        }
        let slot = members
            .entry(first.clone())
            .or_insert_with(|| Value::Namespace(Namespace::new()));
        match slot {
            Value::Namespace(inner) => inner.insert_path(rest, value),
            other => Err(formula_types::AssignError::NotANamespace {
                segment: first.clone(),
                actual: other.value_type(),
            }),
        }
    }
}

impl FromIterator<(String, Value)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            members: Arc::new(iter.into_iter().collect()),
        }
    }
}

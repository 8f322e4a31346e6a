//! Evaluation error types.
//!
//! The evaluator never catches these; they reach the caller exactly as the
//! failing node raised them.

use crate::ast::{Expr, Ident};
use crate::ty::{join, Expected, ValueType};
use thiserror::Error;

/// Why an environment refused an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// The innermost scope is read-only.
    #[error("scope is read-only")]
    ReadOnly,
    /// An intermediate segment of a qualified target is bound to a non-namespace.
    #[error("'{segment}' is a {actual}, not a namespace")]
    NotANamespace { segment: String, actual: ValueType },
    /// A target with no segments.
    #[error("empty assignment target")]
    EmptyTarget,
}

/// Evaluation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Operand types or capabilities do not match what the operator accepts.
    #[error("argument type error: '{operator}' expects ({}), got ({})", join(.expected), join(.actual))]
    ArgumentType {
        operator: String,
        expected: Vec<Expected>,
        actual: Vec<ValueType>,
    },
    /// Qualified or unqualified lookup found no binding.
    #[error("name resolution error: '{}' is not defined (at {})", .name.name, .name.span)]
    NameResolution { name: Ident },
    /// The callee of a call evaluated to something other than a function.
    #[error("not callable: '{callee}' is a {actual}")]
    NotCallable { callee: Box<Expr>, actual: ValueType },
    /// Division by zero, non-finite results, bad repeat counts.
    #[error("arithmetic trap: {0}")]
    ArithmeticTrap(String),
    /// The environment rejected an assignment target.
    #[error("cannot assign to '{}': {source}", .target.join(":"))]
    Assignment {
        target: Vec<String>,
        source: AssignError,
    },
    /// A builtin function was called with the wrong number of arguments.
    #[error("'{function}' takes {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },
}

impl EvalError {
    pub fn argument_type(
        operator: impl Into<String>,
        expected: Vec<Expected>,
        actual: Vec<ValueType>,
    ) -> Self {
        EvalError::ArgumentType {
            operator: operator.into(),
            expected,
            actual,
        }
    }

    pub fn name_resolution(name: &Ident) -> Self {
        EvalError::NameResolution { name: name.clone() }
    }

    pub fn not_callable(callee: &Expr, actual: ValueType) -> Self {
        EvalError::NotCallable {
            callee: Box::new(callee.clone()),
            actual,
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;

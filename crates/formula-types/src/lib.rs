//! Shared types for formula evaluation.
//!
//! This crate defines the AST node types, source spans, runtime type tags
//! and the error taxonomy used by the evaluator and its callers.

mod error;
mod span;
mod ty;
pub mod ast;

pub use error::{AssignError, EvalError, EvalResult};
pub use span::Span;
pub use ty::{Expected, ValueType};

//! Formula tree-walking evaluator.
//!
//! Evaluates formula ASTs from `formula-types` against an [`Environment`],
//! applying each operator's fixed type rule and raising structured errors.
//! Also hosts the offline [`check`] utility used to type-check formulas
//! against synthetic inputs.

pub mod check;
mod env;
mod evaluator;
mod operators;
mod value;

pub use env::Environment;
pub use evaluator::{evaluate_all, Evaluate};
pub use formula_types::{EvalError, EvalResult};
pub use value::{arithmetic, concatenate, repeat, Function, Namespace, NativeFn, NumOp, Value};

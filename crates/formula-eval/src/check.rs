//! Offline formula type checking.
//!
//! Builds a synthetic environment from a map of field requirements, runs a
//! sequence of formulas against it and compares the final result's type with
//! what the caller expects. Any evaluation error is reported as its message.

use crate::env::Environment;
use crate::evaluator::Evaluate;
use crate::value::{Namespace, Value};
use formula_types::ast::Expr;
use formula_types::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field types that get a placeholder of their own type.
const PLACEHOLDER_TYPES: [ValueType; 5] = [
    ValueType::Number,
    ValueType::Text,
    ValueType::Latitude,
    ValueType::Longitude,
    ValueType::Timestamp,
];

/// The declared type of one input field.
///
/// JSON form: `"number"` for a scalar, `["text"]` for an array of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    Scalar(String),
    List(Vec<String>),
}

/// Field name → requirement, in name order.
pub type Requirements = BTreeMap<String, Requirement>;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("invalid requirements: {0}")]
    Requirements(#[from] serde_json::Error),
}

/// Parse a JSON object of requirements.
pub fn parse_requirements(json: &str) -> Result<Requirements, CheckError> {
    Ok(serde_json::from_str(json)?)
}

impl Requirement {
    /// The synthetic value bound for this field.
    ///
    /// Unknown or unsupported types fall back to the text `"a"`.
    pub fn placeholder(&self) -> Value {
        let fallback = || Value::text("a");
        match self {
            Requirement::Scalar(name) => ValueType::from_name(name)
                .filter(|ty| PLACEHOLDER_TYPES.contains(ty))
                .and_then(|ty| Value::placeholder(&ty))
                .unwrap_or_else(fallback),
            Requirement::List(elems) => match elems.as_slice() {
                [elem] => ValueType::from_name(elem)
                    .map(|ty| Value::array(ty, Vec::new()))
                    .unwrap_or_else(fallback),
                _ => fallback(),
            },
        }
    }
}

/// Build an environment holding a placeholder for every requirement.
///
/// With `ns = None` each field is bound at the top level; otherwise all
/// fields live in one namespace bound to `ns`.
pub fn dummy_environment(
    parent: Option<Environment>,
    read_only: bool,
    ns: Option<&str>,
    reqs: &Requirements,
) -> Environment {
    let mut env = Environment::with_parent(parent, read_only);
    match ns {
        None => {
            for (name, req) in reqs {
                env.add_ns(name.clone(), req.placeholder());
            }
        }
        Some(ns) => {
            let members: Namespace = reqs
                .iter()
                .map(|(name, req)| (name.clone(), req.placeholder()))
                .collect();
            env.add_ns(ns, Value::Namespace(members));
        }
    }
    env
}

/// Result of checking one formula sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Mismatch {
        expected: ValueType,
        actual: ValueType,
    },
    /// Evaluation raised an error; holds its message.
    Failed { message: String },
    /// No formulas were given.
    Empty,
}

impl CheckOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }

    pub fn to_json(&self) -> Result<String, CheckError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Evaluate `formulas` in order and compare the last result's type with `expected`.
pub fn check(formulas: &[Expr], env: &mut Environment, expected: &ValueType) -> CheckOutcome {
    let mut last = None;
    for formula in formulas {
        match formula.evaluate(env) {
            Ok(value) => last = Some(value),
            Err(e) => {
                return CheckOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }
    let Some(value) = last else {
        return CheckOutcome::Empty;
    };
    let actual = value.value_type();
    if actual == *expected {
        CheckOutcome::Passed
    } else {
        if let Some(formula) = formulas.last() {
            tracing::warn!(%formula, %expected, %actual, "formula result has unexpected type");
        }
        CheckOutcome::Mismatch {
            expected: expected.clone(),
            actual,
        }
    }
}

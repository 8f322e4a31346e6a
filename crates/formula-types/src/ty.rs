//! Runtime type tags.
//!
//! [`ValueType`] is the tag every runtime value carries. [`Expected`] is what
//! an operator asked for when it rejects its operands: either a concrete
//! type or one of the capability pseudo-types (`eq`, `ord`).

use serde::{Deserialize, Serialize};
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// ValueType
// ══════════════════════════════════════════════════════════════════════════════

/// The type tag of a runtime value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Text,
    Bool,
    /// `array<T>` — the element type is part of the tag.
    Array(Box<ValueType>),
    Function,
    Latitude,
    Longitude,
    Timestamp,
    /// A scope value that qualified lookups search.
    Namespace,
}

impl ValueType {
    pub fn array_of(elem: ValueType) -> Self {
        ValueType::Array(Box::new(elem))
    }

    /// Whether values of this type can be compared with `==` / `!=`.
    pub fn supports_eq(&self) -> bool {
        match self {
            ValueType::Number
            | ValueType::Text
            | ValueType::Bool
            | ValueType::Latitude
            | ValueType::Longitude
            | ValueType::Timestamp => true,
            ValueType::Array(elem) => elem.supports_eq(),
            ValueType::Function | ValueType::Namespace => false,
        }
    }

    /// Whether values of this type can be compared with `<`, `<=`, `>`, `>=`.
    pub fn supports_ord(&self) -> bool {
        match self {
            ValueType::Number
            | ValueType::Text
            | ValueType::Latitude
            | ValueType::Longitude
            | ValueType::Timestamp => true,
            ValueType::Bool | ValueType::Array(_) | ValueType::Function | ValueType::Namespace => {
                false
            }
        }
    }

    /// Parse a scalar type name (`"number"`, `"text"`, ...).
    ///
    /// Array types are not accepted here; callers spell them structurally.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "number" => ValueType::Number,
            "text" => ValueType::Text,
            "bool" => ValueType::Bool,
            "function" => ValueType::Function,
            "latitude" => ValueType::Latitude,
            "longitude" => ValueType::Longitude,
            "timestamp" => ValueType::Timestamp,
            "namespace" => ValueType::Namespace,
            _ => return None,
        })
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Number => write!(f, "number"),
            ValueType::Text => write!(f, "text"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Array(elem) => write!(f, "array<{elem}>"),
            ValueType::Function => write!(f, "function"),
            ValueType::Latitude => write!(f, "latitude"),
            ValueType::Longitude => write!(f, "longitude"),
            ValueType::Timestamp => write!(f, "timestamp"),
            ValueType::Namespace => write!(f, "namespace"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Expected
// ══════════════════════════════════════════════════════════════════════════════

/// An operand requirement reported by `ArgumentType` errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Expected {
    Type(ValueType),
    /// Any type with the equality capability.
    Eq,
    /// Any type with the ordering capability.
    Ord,
}

impl Expected {
    pub const NUMBER: Expected = Expected::Type(ValueType::Number);
    pub const BOOL: Expected = Expected::Type(ValueType::Bool);
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Type(ty) => write!(f, "{ty}"),
            Expected::Eq => write!(f, "eq"),
            Expected::Ord => write!(f, "ord"),
        }
    }
}

/// Join a list of displayable items as `a, b, c`.
pub(crate) fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

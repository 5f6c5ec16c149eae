//! Dynamic property values
//!
//! Property values are plain JSON values. `Value::Null` stands for "absent":
//! a property holding null has no stored entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use serde_json::{Map, Value};

use crate::error::PropertyError;

/// Coarse kind of a [`Value`], used by kind accepters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Bool,
    /// Whole numbers only
    Integer,
    /// Any number, integers included
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// The most specific kind of `value`
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    pub fn matches(self, value: &Value) -> bool {
        match (self, ValueKind::of(value)) {
            (Self::Number, Self::Integer) => true,
            (expected, actual) => expected == actual,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "null" => Ok(Self::Null),
            "bool" | "boolean" => Ok(Self::Bool),
            "integer" | "int" => Ok(Self::Integer),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            _ => Err(PropertyError::parse(format!("Unknown value kind: {}", s))),
        }
    }
}

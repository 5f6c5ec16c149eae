//! Error types for declaration, construction and assignment
//!
//! Construction problems are batched into one [`InitializationError`];
//! post-construction setter failures surface immediately as a single
//! [`AssignmentError`]. Everything else (unknown classes, bad arguments,
//! sealed registries) is reported through [`PropertyError`].

use serde_json::Value;
use thiserror::Error;

use crate::ids::ClassId;

/// Unified error type for registry and instance operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    /// Construction failed, carrying every property violation
    #[error(transparent)]
    Initialization(#[from] InitializationError),

    /// A single post-construction assignment failed
    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    /// Class id not present in the registry
    #[error("Unknown class: {0}")]
    UnknownClass(ClassId),

    /// Class name not present in the registry
    #[error("Unknown class name: {0}")]
    UnknownClassName(String),

    /// A class with this name is already defined
    #[error("Class '{0}' is already defined")]
    DuplicateClass(String),

    /// Property name not in the class's effective collection
    #[error("Class '{class}' has no property named '{property}'")]
    UnknownProperty { class: String, property: String },

    /// Neither the class nor any ancestor declares properties
    #[error("Class '{0}' does not declare any properties")]
    NotParticipating(String),

    /// Late declaration rejected by the registry settings
    #[error("Cannot declare property '{property}' on '{class}': instances already exist")]
    DeclarationsSealed { class: String, property: String },

    /// Positional arguments with no base constructor to receive them
    #[error("Class '{class}' takes no positional arguments, got {count}")]
    UnexpectedArguments { class: String, count: usize },

    /// Keyword arguments that match no property and could not be forwarded
    #[error("Unknown keyword arguments for '{class}': {}", .names.join(", "))]
    UnknownKeywords { class: String, names: Vec<String> },

    /// The base constructor refused its arguments
    #[error("Base constructor of '{class}' failed: {message}")]
    BaseConstruction { class: String, message: String },

    /// Accepter pattern does not compile
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Parse error (settings values, policy names)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Schema document could not be read
    #[error("Schema error: {0}")]
    Schema(String),
}

impl PropertyError {
    /// Create an unknown property error
    pub fn unknown_property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            class: class.into(),
            property: property.into(),
        }
    }

    /// Create a base construction error.
    ///
    /// Intended for [`BaseConstructor`](crate::BaseConstructor) implementations
    /// that refuse their arguments.
    pub fn base_construction(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BaseConstruction {
            class: class.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a schema error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }
}

/// A value could not be stored in a property.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssignmentError {
    /// The converted value failed every acceptance rule
    #[error("{class}: property '{property}' only accepts {expected}, but got {value}")]
    Rejected {
        class: String,
        property: String,
        value: Value,
        expected: String,
    },

    /// Null written to a property that is currently required
    #[error("{class}: property '{property}' is required and cannot be set to null")]
    Missing { class: String, property: String },

    /// Setter called on a read-only property
    #[error("{class}: property '{property}' is read-only, cannot assign {value}")]
    ReadOnly {
        class: String,
        property: String,
        value: Value,
    },
}

impl AssignmentError {
    /// Name of the property the assignment targeted
    pub fn property(&self) -> &str {
        match self {
            Self::Rejected { property, .. }
            | Self::Missing { property, .. }
            | Self::ReadOnly { property, .. } => property,
        }
    }

    /// The offending value, if there was one
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Rejected { value, .. } | Self::ReadOnly { value, .. } => Some(value),
            Self::Missing { .. } => None,
        }
    }
}

/// A required property ended construction without a value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{class}: required property '{property}' has no value")]
pub struct MissingValueError {
    pub class: String,
    pub property: String,
}

/// One entry of an [`InitializationError`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyViolation {
    #[error(transparent)]
    Missing(#[from] MissingValueError),

    #[error(transparent)]
    Invalid(#[from] AssignmentError),
}

impl PropertyViolation {
    pub fn property(&self) -> &str {
        match self {
            Self::Missing(err) => &err.property,
            Self::Invalid(err) => err.property(),
        }
    }
}

/// Aggregate construction failure, violations in property-processing order.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{class} could not be initialized: {}", describe_violations(.violations))]
pub struct InitializationError {
    pub class: String,
    pub violations: Vec<PropertyViolation>,
}

impl InitializationError {
    /// Names of the failing properties, in processing order
    pub fn properties(&self) -> Vec<&str> {
        self.violations.iter().map(PropertyViolation::property).collect()
    }
}

fn describe_violations(violations: &[PropertyViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

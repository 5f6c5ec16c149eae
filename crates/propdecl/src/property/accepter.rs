//! Acceptance rules
//!
//! A property holds an ordered list of accepters; a value is accepted when
//! the list is empty or at least one accepter matches it.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::PropertyError;
use crate::value::{Value, ValueKind};

pub type AcceptFn = dyn Fn(&Value) -> bool + Send + Sync;

#[derive(Clone)]
pub enum Accepter {
    /// Equal to this value
    Exact(Value),
    /// Equal to one of these values
    OneOf(Vec<Value>),
    /// Of this kind
    Kind(ValueKind),
    /// Numeric, within inclusive bounds
    Range { min: Option<f64>, max: Option<f64> },
    /// String matching the expression
    Pattern(Regex),
    /// Arbitrary predicate
    Predicate(Arc<AcceptFn>),
}

impl Accepter {
    pub fn exact(value: impl Into<Value>) -> Self {
        Self::Exact(value.into())
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn kind(kind: ValueKind) -> Self {
        Self::Kind(kind)
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range { min, max }
    }

    /// Compile `pattern` into a string accepter.
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::InvalidPattern` if the expression does not compile.
    pub fn pattern(pattern: &str) -> Result<Self, PropertyError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|e| PropertyError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Single entry point for every rule shape.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Exact(expected) => expected == value,
            Self::OneOf(allowed) => allowed.contains(value),
            Self::Kind(kind) => kind.matches(value),
            Self::Range { min, max } => match value.as_f64() {
                Some(n) => min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi),
                None => false,
            },
            Self::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
            Self::Predicate(f) => f(value),
        }
    }
}

impl fmt::Display for Accepter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => write!(f, "{}", value),
            Self::OneOf(values) => {
                let listed: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "one of [{}]", listed.join(", "))
            }
            Self::Kind(kind) => write!(f, "a value of kind {}", kind),
            Self::Range { min, max } => match (min, max) {
                (Some(lo), Some(hi)) => write!(f, "a number in {}..={}", lo, hi),
                (Some(lo), None) => write!(f, "a number >= {}", lo),
                (None, Some(hi)) => write!(f, "a number <= {}", hi),
                (None, None) => write!(f, "a number"),
            },
            Self::Pattern(regex) => write!(f, "a string matching /{}/", regex.as_str()),
            Self::Predicate(_) => write!(f, "values satisfying a predicate"),
        }
    }
}

impl fmt::Debug for Accepter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(value) => f.debug_tuple("Exact").field(value).finish(),
            Self::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Self::Kind(kind) => f.debug_tuple("Kind").field(kind).finish(),
            Self::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Pattern(regex) => f.debug_tuple("Pattern").field(&regex.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exact_and_one_of() {
        assert!(Accepter::exact("a").matches(&json!("a")));
        assert!(!Accepter::exact("a").matches(&json!("b")));

        let sizes = Accepter::one_of(["small", "large"]);
        assert!(sizes.matches(&json!("large")));
        assert!(!sizes.matches(&json!("medium")));
    }

    #[test]
    fn range_requires_numbers() {
        let percent = Accepter::range(Some(0.0), Some(100.0));
        assert!(percent.matches(&json!(0)));
        assert!(percent.matches(&json!(100)));
        assert!(!percent.matches(&json!(101)));
        assert!(!percent.matches(&json!("50")));

        let positive = Accepter::range(Some(1.0), None);
        assert!(positive.matches(&json!(1_000_000)));
    }

    #[test]
    fn pattern_matches_strings_only() {
        let slug = Accepter::pattern("^[a-z-]+$").unwrap();
        assert!(slug.matches(&json!("some-title")));
        assert!(!slug.matches(&json!("Some Title")));
        assert!(!slug.matches(&json!(7)));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = Accepter::pattern("(").unwrap_err();
        assert!(matches!(err, PropertyError::InvalidPattern { .. }));
    }

    #[test]
    fn predicate_is_called() {
        let even = Accepter::predicate(|v| v.as_i64().is_some_and(|n| n % 2 == 0));
        assert!(even.matches(&json!(4)));
        assert!(!even.matches(&json!(5)));
    }

    #[test]
    fn display_describes_rule() {
        assert_eq!(Accepter::one_of([1, 2]).to_string(), "one of [1, 2]");
        assert_eq!(
            Accepter::kind(ValueKind::String).to_string(),
            "a value of kind string"
        );
        assert_eq!(
            Accepter::range(Some(1.0), Some(5.0)).to_string(),
            "a number in 1..=5"
        );
    }
}

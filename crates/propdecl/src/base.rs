//! Base constructors for non-participating ancestors
//!
//! A class that declares no properties can still take constructor
//! arguments. Its [`BaseConstructor`] receives the positional arguments plus
//! any forwarded keywords and returns the attributes it keeps.

use crate::error::PropertyError;
use crate::value::{Map, Value};

#[cfg_attr(test, mockall::automock)]
pub trait BaseConstructor: Send + Sync {
    /// Build the base attributes of a new instance.
    fn construct(
        &self,
        positional: Vec<Value>,
        keywords: Map<String, Value>,
    ) -> Result<Map<String, Value>, PropertyError>;
}

/// Maps positional arguments onto named attributes.
///
/// Parameters past the supplied arguments are left absent; surplus
/// arguments or keywords are an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalBase {
    class: String,
    parameters: Vec<String>,
}

impl PositionalBase {
    pub fn new<I, S>(class: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class: class.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }
}

impl BaseConstructor for PositionalBase {
    fn construct(
        &self,
        positional: Vec<Value>,
        keywords: Map<String, Value>,
    ) -> Result<Map<String, Value>, PropertyError> {
        if positional.len() > self.parameters.len() {
            return Err(PropertyError::base_construction(
                &self.class,
                format!(
                    "expected at most {} arguments, got {}",
                    self.parameters.len(),
                    positional.len()
                ),
            ));
        }
        if !keywords.is_empty() {
            let names: Vec<&str> = keywords.keys().map(String::as_str).collect();
            return Err(PropertyError::base_construction(
                &self.class,
                format!("unexpected keywords: {}", names.join(", ")),
            ));
        }

        Ok(self
            .parameters
            .iter()
            .cloned()
            .zip(positional)
            .filter(|(_, value)| !value.is_null())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_positional_arguments() {
        let base = PositionalBase::new("Base", ["content", "footer"]);
        let attributes = base.construct(vec![json!("some content")], Map::new()).unwrap();
        assert_eq!(attributes.get("content"), Some(&json!("some content")));
        assert!(!attributes.contains_key("footer"));
    }

    #[test]
    fn rejects_surplus_arguments() {
        let base = PositionalBase::new("Base", ["content"]);
        let err = base
            .construct(vec![json!(1), json!(2)], Map::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Base constructor of 'Base' failed: expected at most 1 arguments, got 2"
        );
    }

    #[test]
    fn rejects_keywords() {
        let base = PositionalBase::new("Base", ["content"]);
        let mut keywords = Map::new();
        keywords.insert("colour".to_string(), json!("red"));
        let err = base.construct(Vec::new(), keywords).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }
}

//! Registry settings
//!
//! Settings can be built in code, deserialized, or read from the environment:
//!
//! - `PROPDECL_UNKNOWN_KEYWORDS` = `forward` | `reject` | `ignore`
//! - `PROPDECL_LATE_DECLARATIONS` = `allow` | `reject`

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PropertyError;

/// What to do with keyword arguments that match no property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeywordPolicy {
    /// Hand them to the base constructor; an error if there is none
    #[default]
    Forward,
    Reject,
    Ignore,
}

impl FromStr for UnknownKeywordPolicy {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            _ => Err(PropertyError::parse(format!(
                "Unknown keyword policy: {}",
                s
            ))),
        }
    }
}

/// Whether properties may be declared once instances exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LateDeclarationPolicy {
    #[default]
    Allow,
    /// Declaring on a class after it or a descendant was instantiated fails
    Reject,
}

impl FromStr for LateDeclarationPolicy {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            _ => Err(PropertyError::parse(format!(
                "Unknown late declaration policy: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrySettings {
    #[serde(default)]
    pub unknown_keywords: UnknownKeywordPolicy,
    #[serde(default)]
    pub late_declarations: LateDeclarationPolicy,
}

impl RegistrySettings {
    /// Load from environment variables, using defaults for missing values
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            unknown_keywords: env_or("PROPDECL_UNKNOWN_KEYWORDS", defaults.unknown_keywords),
            late_declarations: env_or("PROPDECL_LATE_DECLARATIONS", defaults.late_declarations),
        }
    }

    pub fn with_unknown_keywords(mut self, policy: UnknownKeywordPolicy) -> Self {
        self.unknown_keywords = policy;
        self
    }

    pub fn with_late_declarations(mut self, policy: LateDeclarationPolicy) -> Self {
        self.late_declarations = policy;
        self
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_forward_and_allow() {
        let settings = RegistrySettings::default();
        assert_eq!(settings.unknown_keywords, UnknownKeywordPolicy::Forward);
        assert_eq!(settings.late_declarations, LateDeclarationPolicy::Allow);
    }

    #[test]
    fn parse_policies() {
        assert_eq!(
            " Reject ".parse::<UnknownKeywordPolicy>().ok(),
            Some(UnknownKeywordPolicy::Reject)
        );
        assert_eq!(
            "reject".parse::<LateDeclarationPolicy>().ok(),
            Some(LateDeclarationPolicy::Reject)
        );
        assert!("sometimes".parse::<LateDeclarationPolicy>().is_err());
    }

    #[test]
    fn deserialize_partial_settings() {
        let settings: RegistrySettings =
            serde_json::from_str(r#"{"unknown_keywords": "ignore"}"#).unwrap();
        assert_eq!(settings.unknown_keywords, UnknownKeywordPolicy::Ignore);
        assert_eq!(settings.late_declarations, LateDeclarationPolicy::Allow);
    }

    #[test]
    fn from_env_reads_policies() {
        std::env::set_var("PROPDECL_UNKNOWN_KEYWORDS", "ignore");
        std::env::set_var("PROPDECL_LATE_DECLARATIONS", "Reject");
        let settings = RegistrySettings::from_env();
        std::env::remove_var("PROPDECL_UNKNOWN_KEYWORDS");
        std::env::remove_var("PROPDECL_LATE_DECLARATIONS");

        assert_eq!(settings.unknown_keywords, UnknownKeywordPolicy::Ignore);
        assert_eq!(settings.late_declarations, LateDeclarationPolicy::Reject);
    }

    #[test]
    fn env_or_falls_back_on_missing_or_invalid() {
        assert_eq!(
            env_or("PROPDECL_TEST_UNSET_VARIABLE", UnknownKeywordPolicy::Reject),
            UnknownKeywordPolicy::Reject
        );
    }
}

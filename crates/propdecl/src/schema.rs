//! Declarative class schemas
//!
//! A [`SchemaDocument`] describes classes and their properties as data, so
//! declarations can ship as JSON alongside the code that uses them.
//!
//! ```json
//! {
//!   "classes": [
//!     { "name": "Base", "baseAttributes": ["content"], "properties": [] },
//!     {
//!       "name": "Section",
//!       "parent": "Base",
//!       "properties": [
//!         { "name": "title", "required": true,
//!           "accepts": [{ "type": "kind", "kind": "string" }] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Converters and predicates are code, not data; declare those through
//! [`Registry::declare`] after installing the document.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::PositionalBase;
use crate::error::PropertyError;
use crate::ids::ClassId;
use crate::property::{Accepter, PropertyOptions};
use crate::registry::Registry;
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    /// Classes in definition order; parents come first
    pub classes: Vec<ClassSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSchema {
    pub name: String,
    /// Parent class name
    #[serde(default)]
    pub parent: Option<String>,
    /// Positional constructor parameters of a non-participating base
    #[serde(default)]
    pub base_attributes: Vec<String>,
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default = "default_true")]
    pub writable: bool,
    #[serde(default)]
    pub accepts: Vec<AcceptRule>,
}

fn default_true() -> bool {
    true
}

/// Data form of an [`Accepter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AcceptRule {
    Exact {
        value: Value,
    },
    OneOf {
        values: Vec<Value>,
    },
    Kind {
        kind: ValueKind,
    },
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    Pattern {
        pattern: String,
    },
}

impl AcceptRule {
    pub fn to_accepter(&self) -> Result<Accepter, PropertyError> {
        Ok(match self {
            Self::Exact { value } => Accepter::Exact(value.clone()),
            Self::OneOf { values } => Accepter::OneOf(values.clone()),
            Self::Kind { kind } => Accepter::Kind(*kind),
            Self::Range { min, max } => Accepter::range(*min, *max),
            Self::Pattern { pattern } => Accepter::pattern(pattern)?,
        })
    }
}

impl PropertySchema {
    pub fn to_options(&self) -> Result<PropertyOptions, PropertyError> {
        let mut options = PropertyOptions::new().required(self.required);
        if let Some(default) = &self.default {
            options = options.default(default.clone());
        }
        if !self.writable {
            options = options.read_only();
        }
        for rule in &self.accepts {
            options = options.accepts(rule.to_accepter()?);
        }
        Ok(options)
    }
}

impl SchemaDocument {
    pub fn from_json(json: &str) -> Result<Self, PropertyError> {
        serde_json::from_str(json).map_err(|e| PropertyError::schema(e.to_string()))
    }

    /// Define every class and declare its properties, in document order.
    ///
    /// Parents may be classes earlier in the document or classes the
    /// registry already knows. The whole document is validated first; on
    /// error the registry is left untouched.
    pub fn install(&self, registry: &Registry) -> Result<HashMap<String, ClassId>, PropertyError> {
        let plans = self.validate(registry)?;
        let mut installed: HashMap<String, ClassId> = HashMap::new();

        for plan in plans {
            let parent = match plan.parent {
                Some(ParentRef::Existing(id)) => Some(id),
                Some(ParentRef::InDocument(name)) => Some(
                    installed
                        .get(&name)
                        .copied()
                        .ok_or(PropertyError::UnknownClassName(name))?,
                ),
                None => None,
            };

            let class = plan.schema;
            let id = registry.define_class(&class.name, parent)?;
            if !class.base_attributes.is_empty() {
                registry.set_base_constructor(
                    id,
                    PositionalBase::new(&class.name, class.base_attributes.iter().cloned()),
                )?;
            }
            for (name, options) in plan.properties {
                registry.declare(id, name, options)?;
            }

            debug!(
                class = %class.name,
                properties = class.properties.len(),
                "Installed class schema"
            );
            installed.insert(class.name.clone(), id);
        }

        Ok(installed)
    }

    fn validate<'a>(&'a self, registry: &Registry) -> Result<Vec<ClassPlan<'a>>, PropertyError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut plans = Vec::with_capacity(self.classes.len());

        for class in &self.classes {
            if seen.contains(class.name.as_str()) || registry.find_class(&class.name).is_some() {
                return Err(PropertyError::DuplicateClass(class.name.clone()));
            }

            let parent = match &class.parent {
                Some(name) if seen.contains(name.as_str()) => {
                    Some(ParentRef::InDocument(name.clone()))
                }
                Some(name) => Some(ParentRef::Existing(
                    registry
                        .find_class(name)
                        .ok_or_else(|| PropertyError::UnknownClassName(name.clone()))?,
                )),
                None => None,
            };

            let properties = class
                .properties
                .iter()
                .map(|property| Ok((property.name.clone(), property.to_options()?)))
                .collect::<Result<Vec<_>, PropertyError>>()?;

            seen.insert(&class.name);
            plans.push(ClassPlan {
                schema: class,
                parent,
                properties,
            });
        }

        Ok(plans)
    }
}

enum ParentRef {
    Existing(ClassId),
    InDocument(String),
}

struct ClassPlan<'a> {
    schema: &'a ClassSchema,
    parent: Option<ParentRef>,
    properties: Vec<(String, PropertyOptions)>,
}

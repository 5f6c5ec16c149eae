//! Instance initialization
//!
//! Properties are processed in effective-collection order, so a default can
//! observe every sibling declared before it. Each property takes its keyword
//! argument, or else its default, converted and checked; a property with
//! neither is checked for required-ness. Violations are collected and
//! reported together once the base constructor and the configuration
//! callback have run. Values are stored raw, never through overridden
//! setters.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::base::BaseConstructor;
use crate::collection::PropertyCollection;
use crate::error::{InitializationError, MissingValueError, PropertyError, PropertyViolation};
use crate::instance::Instance;
use crate::settings::UnknownKeywordPolicy;
use crate::value::{Map, Value};

/// Constructor arguments: positional ones for the base constructor, keyword
/// ones for properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    keywords: Map<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn keyword(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }

    pub fn from_keywords(keywords: Map<String, Value>) -> Self {
        Self {
            positional: Vec::new(),
            keywords,
        }
    }

    pub fn positional_args(&self) -> &[Value] {
        &self.positional
    }

    pub fn keywords(&self) -> &Map<String, Value> {
        &self.keywords
    }
}

/// Everything the initializer needs from the registry, captured up front so
/// no lock is held while user callbacks run.
pub(crate) struct InitPlan {
    pub class_name: String,
    pub properties: Arc<PropertyCollection>,
    pub base: Option<Arc<dyn BaseConstructor>>,
    pub unknown_keywords: UnknownKeywordPolicy,
}

pub(crate) fn initialize<F>(
    instance: &mut Instance,
    plan: InitPlan,
    arguments: Arguments,
    configure: F,
) -> Result<(), PropertyError>
where
    F: FnOnce(&mut Instance) -> Result<(), PropertyError>,
{
    let Arguments {
        positional,
        mut keywords,
    } = arguments;

    if !positional.is_empty() && plan.base.is_none() {
        return Err(PropertyError::UnexpectedArguments {
            class: plan.class_name,
            count: positional.len(),
        });
    }

    let mut violations = assign_properties(instance, &plan.properties, &mut keywords);
    let forwarded = leftover_keywords(&plan, keywords)?;

    if let Some(base) = &plan.base {
        let attributes = base.construct(positional, forwarded)?;
        instance.set_attributes(attributes);
    }

    match configure(instance) {
        Ok(()) => {}
        Err(PropertyError::Assignment(err)) => violations.push(err.into()),
        Err(err) => return Err(err),
    }

    if violations.is_empty() {
        return Ok(());
    }

    debug!(
        class = %plan.class_name,
        violations = violations.len(),
        "Initialization failed"
    );
    Err(InitializationError {
        class: plan.class_name,
        violations,
    }
    .into())
}

fn assign_properties(
    instance: &mut Instance,
    properties: &PropertyCollection,
    keywords: &mut Map<String, Value>,
) -> Vec<PropertyViolation> {
    let mut violations = Vec::new();

    for property in properties.values() {
        let supplied = keywords
            .remove(property.name())
            .filter(|value| !value.is_null());
        let candidate = match supplied {
            Some(value) => Some(value),
            None => property.default_for(instance),
        };

        let prepared = match candidate {
            Some(raw) => match property.prepare(raw, instance) {
                Ok(value) => Some(value).filter(|value| !value.is_null()),
                Err(err) => {
                    violations.push(err.into());
                    continue;
                }
            },
            None => None,
        };

        match prepared {
            Some(value) => instance.store(property.name(), value),
            None if property.required_for(instance) => {
                violations.push(
                    MissingValueError {
                        class: instance.class_name().to_string(),
                        property: property.name().to_string(),
                    }
                    .into(),
                );
            }
            None => trace!(property = property.name(), "Left unset"),
        }
    }

    violations
}

fn leftover_keywords(
    plan: &InitPlan,
    keywords: Map<String, Value>,
) -> Result<Map<String, Value>, PropertyError> {
    if keywords.is_empty() {
        return Ok(keywords);
    }

    match plan.unknown_keywords {
        UnknownKeywordPolicy::Forward if plan.base.is_some() => Ok(keywords),
        UnknownKeywordPolicy::Forward | UnknownKeywordPolicy::Reject => {
            Err(PropertyError::UnknownKeywords {
                class: plan.class_name.clone(),
                names: keywords.keys().cloned().collect(),
            })
        }
        UnknownKeywordPolicy::Ignore => {
            debug!(
                class = %plan.class_name,
                ignored = keywords.len(),
                "Ignoring unknown keyword arguments"
            );
            Ok(Map::new())
        }
    }
}

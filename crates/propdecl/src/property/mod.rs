//! Property descriptors
//!
//! A [`Property`] is immutable once built. Redeclaring a name replaces the
//! whole descriptor in its collection; nothing is ever patched in place.
//!
//! Rules that need context (deferred `required`, instance-aware defaults and
//! converters) receive the [`Instance`] being built or mutated, so they can
//! read sibling properties that were assigned before them.

mod accepter;

use std::fmt;
use std::sync::Arc;

pub use accepter::{AcceptFn, Accepter};

use crate::error::AssignmentError;
use crate::instance::Instance;
use crate::value::Value;

pub type RequiredFn = dyn Fn(&Instance) -> bool + Send + Sync;
pub type SupplierFn = dyn Fn() -> Value + Send + Sync;
pub type InstanceSupplierFn = dyn Fn(&Instance) -> Value + Send + Sync;
pub type ConvertFn = dyn Fn(Value) -> Value + Send + Sync;
pub type InstanceConvertFn = dyn Fn(Value, &Instance) -> Value + Send + Sync;

/// Whether a property must hold a value.
#[derive(Clone, Default)]
pub enum Required {
    #[default]
    Never,
    Always,
    /// Evaluated against the instance, e.g. "required unless `slug` is set"
    When(Arc<RequiredFn>),
}

impl fmt::Debug for Required {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Always => f.write_str("Always"),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Source of a property's value when the caller supplies none.
///
/// Each variant produces a fresh value per instance; `Value` defaults are
/// cloned, never shared.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Supplier(Arc<SupplierFn>),
    FromInstance(Arc<InstanceSupplierFn>),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Supplier(_) => f.write_str("Supplier(..)"),
            Self::FromInstance(_) => f.write_str("FromInstance(..)"),
        }
    }
}

#[derive(Clone)]
pub enum Converter {
    Plain(Arc<ConvertFn>),
    WithInstance(Arc<InstanceConvertFn>),
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Plain(..)"),
            Self::WithInstance(_) => f.write_str("WithInstance(..)"),
        }
    }
}

/// Declaration options, assembled builder-style.
///
/// # Example
///
/// ```
/// use propdecl::{Accepter, PropertyOptions};
///
/// let options = PropertyOptions::new()
///     .required(true)
///     .default("draft")
///     .accepts(Accepter::one_of(["draft", "published"]));
/// ```
#[derive(Debug, Clone)]
pub struct PropertyOptions {
    required: Required,
    default: Option<DefaultValue>,
    converter: Option<Converter>,
    accepters: Vec<Accepter>,
    writable: bool,
}

impl Default for PropertyOptions {
    fn default() -> Self {
        Self {
            required: Required::Never,
            default: None,
            converter: None,
            accepters: Vec::new(),
            writable: true,
        }
    }
}

impl PropertyOptions {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = if required {
            Required::Always
        } else {
            Required::Never
        };
        self
    }

    pub fn required_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        self.required = Required::When(Arc::new(predicate));
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn default_with<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Supplier(Arc::new(supplier)));
        self
    }

    pub fn default_from<F>(mut self, supplier: F) -> Self
    where
        F: Fn(&Instance) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::FromInstance(Arc::new(supplier)));
        self
    }

    pub fn converts<F>(mut self, converter: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.converter = Some(Converter::Plain(Arc::new(converter)));
        self
    }

    pub fn converts_with<F>(mut self, converter: F) -> Self
    where
        F: Fn(Value, &Instance) -> Value + Send + Sync + 'static,
    {
        self.converter = Some(Converter::WithInstance(Arc::new(converter)));
        self
    }

    /// Add an acceptance rule. Rules are alternatives, not conjunctions.
    pub fn accepts(mut self, accepter: Accepter) -> Self {
        self.accepters.push(accepter);
        self
    }

    /// Shorthand for `accepts(Accepter::one_of(values))`
    pub fn accepts_values<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.accepts(Accepter::one_of(values))
    }

    /// Assignable during initialization only.
    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }
}

/// An immutable, named property descriptor.
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    required: Required,
    default: Option<DefaultValue>,
    converter: Option<Converter>,
    accepters: Vec<Accepter>,
    writable: bool,
}

impl Property {
    pub fn new(name: impl Into<String>, options: PropertyOptions) -> Self {
        let PropertyOptions {
            required,
            default,
            converter,
            accepters,
            writable,
        } = options;
        Self {
            name: name.into(),
            required,
            default,
            converter,
            accepters,
            writable,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepters(&self) -> &[Accepter] {
        &self.accepters
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// True when no rule constrains the value or at least one rule matches.
    /// Absent values are never checked here; required-ness covers them.
    pub fn accepts(&self, value: &Value) -> bool {
        value.is_null()
            || self.accepters.is_empty()
            || self.accepters.iter().any(|a| a.matches(value))
    }

    /// Apply the converter. Absent values pass through untouched.
    pub fn convert(&self, value: Value, instance: &Instance) -> Value {
        if value.is_null() {
            return value;
        }
        match &self.converter {
            None => value,
            Some(Converter::Plain(f)) => f(value),
            Some(Converter::WithInstance(f)) => f(value, instance),
        }
    }

    /// Produce this property's default for `instance`, invoking the supplier once.
    pub fn default_for(&self, instance: &Instance) -> Option<Value> {
        let value = match self.default.as_ref()? {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Supplier(f) => f(),
            DefaultValue::FromInstance(f) => f(instance),
        };
        (!value.is_null()).then_some(value)
    }

    pub fn required_for(&self, instance: &Instance) -> bool {
        match &self.required {
            Required::Never => false,
            Required::Always => true,
            Required::When(f) => f(instance),
        }
    }

    /// Human-readable summary of the acceptance rules
    pub fn describe_accepters(&self) -> String {
        match self.accepters.as_slice() {
            [] => "any value".to_string(),
            [single] => single.to_string(),
            many => many
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }

    /// Convert then check acceptance.
    pub(crate) fn prepare(
        &self,
        value: Value,
        instance: &Instance,
    ) -> Result<Value, AssignmentError> {
        let converted = self.convert(value, instance);
        if self.accepts(&converted) {
            Ok(converted)
        } else {
            Err(AssignmentError::Rejected {
                class: instance.class_name().to_string(),
                property: self.name.clone(),
                value: converted,
                expected: self.describe_accepters(),
            })
        }
    }
}

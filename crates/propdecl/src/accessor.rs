//! Accessor chains
//!
//! Every declared property gets a generated getter (raw passthrough) and a
//! generated setter (convert, accept, store). Classes may layer overrides in
//! front of them. A chain runs nearest class first; each layer reaches the
//! one below through its `next` handle, and the generated accessor is always
//! the last layer, so an override any number of levels down the hierarchy
//! still reaches the stored value.

use std::sync::Arc;

use crate::error::PropertyError;
use crate::instance::Instance;
use crate::property::Property;
use crate::value::Value;

pub type GetterFn = dyn Fn(&Instance, GetterNext<'_>) -> Option<Value> + Send + Sync;
pub type SetterFn =
    dyn Fn(&mut Instance, Value, SetterNext<'_>) -> Result<(), PropertyError> + Send + Sync;

/// The remaining getter layers below an override.
pub struct GetterNext<'a> {
    name: &'a str,
    chain: &'a [Arc<GetterFn>],
}

impl<'a> GetterNext<'a> {
    pub(crate) fn new(name: &'a str, chain: &'a [Arc<GetterFn>]) -> Self {
        Self { name, chain }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Value produced by the next layer down
    pub fn get(self, instance: &Instance) -> Option<Value> {
        match self.chain.split_first() {
            Some((layer, rest)) => layer(instance, GetterNext::new(self.name, rest)),
            None => instance.raw(self.name).cloned(),
        }
    }
}

/// The remaining setter layers below an override.
pub struct SetterNext<'a> {
    property: &'a Property,
    chain: &'a [Arc<SetterFn>],
}

impl<'a> SetterNext<'a> {
    pub(crate) fn new(property: &'a Property, chain: &'a [Arc<SetterFn>]) -> Self {
        Self { property, chain }
    }

    pub fn property(&self) -> &Property {
        self.property
    }

    /// Hand `value` to the next layer down
    pub fn set(self, instance: &mut Instance, value: Value) -> Result<(), PropertyError> {
        match self.chain.split_first() {
            Some((layer, rest)) => layer(instance, value, SetterNext::new(self.property, rest)),
            None => instance.assign(self.property, value),
        }
    }
}

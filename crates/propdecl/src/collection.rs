//! Insertion-ordered property collections
//!
//! Replacing a name keeps its original slot; new names are appended. An
//! effective collection is the parent's effective collection with the
//! class's own declarations merged over it under the same rule.

use std::collections::HashMap;
use std::sync::Arc;

use crate::property::{Property, PropertyOptions};

#[derive(Debug, Clone, Default)]
pub struct PropertyCollection {
    entries: Vec<Arc<Property>>,
    index: HashMap<String, usize>,
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a property from `options` and insert it.
    pub fn declare(&mut self, name: impl Into<String>, options: PropertyOptions) -> Arc<Property> {
        let property = Arc::new(Property::new(name, options));
        self.insert(Arc::clone(&property));
        property
    }

    /// Insert or replace, returning the replaced descriptor.
    pub fn insert(&mut self, property: Arc<Property>) -> Option<Arc<Property>> {
        match self.index.get(property.name()) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot], property)),
            None => {
                self.index
                    .insert(property.name().to_string(), self.entries.len());
                self.entries.push(property);
                None
            }
        }
    }

    /// Copy of `parent`, to be extended independently.
    ///
    /// Descriptors are immutable, so sharing them is safe.
    pub fn merge_from(parent: &PropertyCollection) -> Self {
        parent.clone()
    }

    /// `self` with every entry of `own` merged over it, in `own`'s order.
    pub fn merged_with(&self, own: &PropertyCollection) -> Self {
        let mut merged = Self::merge_from(self);
        for property in own.values() {
            merged.insert(Arc::clone(property));
        }
        merged
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Property>> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|p| p.name())
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<Property>> + '_ {
        self.entries.iter()
    }

    /// Deterministic `(name, property)` iteration in collection order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Property>)> + '_ {
        self.entries.iter().map(|p| (p.name(), p))
    }
}

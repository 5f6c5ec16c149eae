//! Declared, validated, inheritable properties.
//!
//! Classes live in a [`Registry`]. Declaring a property on a class gives it
//! (and every subclass) a named, validated field with generated accessors,
//! and makes [`Registry::instantiate`] assign, default, convert and check
//! that field for every new [`Instance`].
//!
//! ```
//! use propdecl::{Arguments, PositionalBase, PropertyOptions, Registry};
//!
//! let registry = Registry::new();
//! let base = registry.define_class("Base", None).unwrap();
//! registry.set_base_constructor(base, PositionalBase::new("Base", ["content"])).unwrap();
//!
//! let section = registry.define_class("Section", Some(base)).unwrap();
//! registry.declare(section, "title", PropertyOptions::new()).unwrap();
//! let sub = registry.define_class("SubSection", Some(section)).unwrap();
//! registry.declare(sub, "subtitle", PropertyOptions::new()).unwrap();
//!
//! let keys: Vec<_> = registry.properties(sub).unwrap().keys().map(String::from).collect();
//! assert_eq!(keys, ["title", "subtitle"]);
//!
//! let instance = registry
//!     .instantiate(
//!         sub,
//!         Arguments::new()
//!             .positional("c")
//!             .keyword("title", "t")
//!             .keyword("subtitle", "s"),
//!     )
//!     .unwrap();
//! assert_eq!(instance.attribute("content"), Some(&"c".into()));
//! assert_eq!(instance.get("title"), Some("t".into()));
//! ```

pub mod accessor;
pub mod base;
pub mod collection;
pub mod error;
pub mod ids;
pub mod initializer;
pub mod instance;
pub mod property;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod value;

#[cfg(test)]
mod scenario_tests;

pub use accessor::{GetterFn, GetterNext, SetterFn, SetterNext};
pub use base::{BaseConstructor, PositionalBase};
pub use collection::PropertyCollection;
pub use error::{
    AssignmentError, InitializationError, MissingValueError, PropertyError, PropertyViolation,
};
pub use ids::{ClassId, InstanceId};
pub use initializer::Arguments;
pub use instance::Instance;
pub use property::{Accepter, Converter, DefaultValue, Property, PropertyOptions, Required};
pub use registry::Registry;
pub use schema::{AcceptRule, ClassSchema, PropertySchema, SchemaDocument};
pub use settings::{LateDeclarationPolicy, RegistrySettings, UnknownKeywordPolicy};
pub use value::{Map, Value, ValueKind};

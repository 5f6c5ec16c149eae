use serde_json::json;

use crate::base::PositionalBase;
use crate::error::PropertyError;
use crate::ids::ClassId;
use crate::initializer::Arguments;
use crate::instance::Instance;
use crate::property::PropertyOptions;
use crate::registry::Registry;
use crate::value::Value;

pub struct Document {
    pub registry: Registry,
    pub base: ClassId,
    pub section: ClassId,
    pub sub_section: ClassId,
}

impl Document {
    pub fn new() -> Self {
        let registry = Registry::new();
        let base = registry.define_class("Base", None).unwrap();
        registry
            .set_base_constructor(base, PositionalBase::new("Base", ["content"]))
            .unwrap();

        let section = registry.define_class("Section", Some(base)).unwrap();
        registry
            .declare(section, "title", PropertyOptions::new())
            .unwrap();

        let sub_section = registry.define_class("SubSection", Some(section)).unwrap();
        registry
            .declare(sub_section, "subtitle", PropertyOptions::new())
            .unwrap();

        Self {
            registry,
            base,
            section,
            sub_section,
        }
    }

    pub fn keys(&self, class: ClassId) -> Vec<String> {
        self.registry
            .properties(class)
            .map(|collection| collection.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn sub_section(&self, content: &str, title: &str, subtitle: &str) -> Instance {
        self.registry
            .instantiate(
                self.sub_section,
                Arguments::new()
                    .positional(content)
                    .keyword("title", title)
                    .keyword("subtitle", subtitle),
            )
            .unwrap()
    }

    /// Same as [`Document::sub_section`], assigning through the
    /// configuration callback instead of keywords.
    pub fn configured_sub_section(&self, content: &str, title: &str, subtitle: &str) -> Instance {
        let (title, subtitle) = (title.to_string(), subtitle.to_string());
        self.registry
            .instantiate_with(
                self.sub_section,
                Arguments::new().positional(content),
                move |obj| {
                    obj.set("title", title)?;
                    obj.set("subtitle", subtitle)
                },
            )
            .unwrap()
    }

    /// Getter on `Section` that upper-cases the stored title
    pub fn upcase_title(&self) -> Result<(), PropertyError> {
        self.registry
            .override_getter(self.section, "title", |obj, next| {
                next.get(obj).map(|value| match value {
                    Value::String(s) => Value::String(s.to_uppercase()),
                    other => other,
                })
            })
    }
}

pub fn assert_content(instance: &Instance, content: &str) {
    assert_eq!(instance.attribute("content"), Some(&json!(content)));
}

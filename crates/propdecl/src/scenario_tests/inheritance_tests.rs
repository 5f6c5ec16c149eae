use serde_json::json;

use super::{assert_content, Document};
use crate::initializer::Arguments;
use crate::property::PropertyOptions;

#[test]
fn test_sub_section_collects_inherited_properties() {
    let doc = Document::new();
    assert_eq!(doc.keys(doc.section), vec!["title"]);
    assert_eq!(doc.keys(doc.sub_section), vec!["title", "subtitle"]);
}

#[test]
fn test_base_does_not_participate() {
    let doc = Document::new();
    assert!(!doc.registry.participates(doc.base));
    assert!(doc.registry.properties(doc.base).is_none());
    assert!(doc.registry.participates(doc.section));
}

#[test]
fn test_construct_with_keywords() {
    let doc = Document::new();
    let instance = doc.sub_section("c", "t", "s");

    assert_content(&instance, "c");
    assert_eq!(instance.get("title"), Some(json!("t")));
    assert_eq!(instance.get("subtitle"), Some(json!("s")));
}

#[test]
fn test_construct_with_configuration_callback() {
    let doc = Document::new();
    let instance = doc.configured_sub_section("c", "t", "s");

    assert_content(&instance, "c");
    assert_eq!(instance.get("title"), Some(json!("t")));
    assert_eq!(instance.get("subtitle"), Some(json!("s")));
}

#[test]
fn test_late_declaration_reaches_existing_subclass() {
    let doc = Document::new();
    doc.sub_section("c", "t", "s");

    doc.registry
        .declare(doc.section, "type", PropertyOptions::new())
        .unwrap();

    assert_eq!(doc.keys(doc.sub_section), vec!["title", "type", "subtitle"]);
    let instance = doc
        .registry
        .instantiate(
            doc.sub_section,
            Arguments::new()
                .positional("c")
                .keyword("title", "t")
                .keyword("type", "chapter")
                .keyword("subtitle", "s"),
        )
        .unwrap();
    assert_eq!(instance.get("type"), Some(json!("chapter")));
}

#[test]
fn test_late_declaration_assigned_in_configuration_callback() {
    let doc = Document::new();
    doc.registry
        .declare(doc.section, "type", PropertyOptions::new())
        .unwrap();

    let instance = doc
        .registry
        .instantiate_with(doc.sub_section, Arguments::new().positional("c"), |obj| {
            obj.set("title", "t")?;
            obj.set("type", "chapter")
        })
        .unwrap();

    assert_content(&instance, "c");
    assert_eq!(instance.get("title"), Some(json!("t")));
    assert_eq!(instance.get("type"), Some(json!("chapter")));
    assert_eq!(instance.get("subtitle"), None);
}

#[test]
fn test_late_declaration_is_visible_on_existing_instances() {
    let doc = Document::new();
    let mut instance = doc.sub_section("c", "t", "s");
    assert!(!instance.has_property("type"));

    doc.registry
        .declare(doc.section, "type", PropertyOptions::new())
        .unwrap();

    assert!(instance.has_property("type"));
    assert_eq!(instance.get("type"), None);
    instance.set("type", "appendix").unwrap();
    assert_eq!(instance.get("type"), Some(json!("appendix")));
}

#[test]
fn test_unregistered_subclass_registers_on_lookup() {
    let doc = Document::new();
    let plain = doc
        .registry
        .define_class("PlainSection", Some(doc.section))
        .unwrap();

    assert_eq!(doc.keys(plain), vec!["title"]);
    let instance = doc
        .registry
        .instantiate(plain, Arguments::new().positional("c").keyword("title", "t"))
        .unwrap();
    assert_content(&instance, "c");
    assert_eq!(instance.get("title"), Some(json!("t")));
}

#[test]
fn test_properties_left_unset_read_as_absent() {
    let doc = Document::new();
    let instance = doc
        .registry
        .instantiate(doc.sub_section, Arguments::new().positional("c"))
        .unwrap();
    assert_eq!(instance.get("title"), None);
    assert_eq!(instance.get("subtitle"), None);
}

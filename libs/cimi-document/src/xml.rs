// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Metadata-driven XML serialization of generic document trees
//!
//! Rendering rules, applied recursively from the root element:
//!
//! - an object renders as one element; keys named by the element's
//!   attribute hints become XML attributes, every other key renders as a
//!   child, sequence-hinted keys first,
//! - a list renders no wrapper element: each item renders directly under
//!   the parent, named by the plural hint for the list's key,
//! - a scalar renders as an element holding one text node.
//!
//! The `xmlns` attribute appears on the outermost element only. Parsing is
//! the loose inverse used for request bodies: the root element name becomes
//! a wrapping key, attributes become plain keys (namespace declarations are
//! dropped), repeated sibling elements collapse into a list, and text-only
//! elements become strings.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::metadata::EntityMetadata;
use crate::DocumentError;

pub(crate) fn render_xml(
    root: &str,
    body: &Value,
    metadata: &EntityMetadata,
    namespace: &str,
) -> Result<String, DocumentError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|e| DocumentError::Xml(e.to_string()))?;
    write_node(&mut writer, metadata, root, body, Some(namespace))?;
    String::from_utf8(writer.into_inner()).map_err(|e| DocumentError::Xml(e.to_string()))
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    metadata: &EntityMetadata,
    name: &str,
    value: &Value,
    xmlns: Option<&str>,
) -> Result<(), DocumentError> {
    match value {
        Value::Array(items) => {
            let singular = metadata.singular_for(name);
            for item in items {
                write_node(writer, metadata, &singular, item, None)?;
            }
        }
        Value::Object(map) => {
            let attr_keys = metadata.attribute_keys(name);
            let keys = ordered_keys(metadata, name, map);
            let mut attrs: Vec<(String, String)> = Vec::new();
            let mut children: Vec<&String> = Vec::new();
            for key in &keys {
                if attr_keys.iter().any(|a| a == key) {
                    if let Some(text) = attribute_text(&map[key.as_str()]) {
                        attrs.push((key.clone(), text));
                    }
                } else {
                    children.push(key);
                }
            }
            let mut start = BytesStart::new(name);
            if let Some(ns) = xmlns {
                start.push_attribute(("xmlns", ns));
            }
            for (key, text) in &attrs {
                start.push_attribute((key.as_str(), text.as_str()));
            }
            if children.is_empty() {
                writer
                    .write_event(Event::Empty(start))
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
            } else {
                writer
                    .write_event(Event::Start(start))
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
                for key in children {
                    write_node(writer, metadata, key, &map[key.as_str()], None)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
            }
        }
        scalar => {
            let mut start = BytesStart::new(name);
            if let Some(ns) = xmlns {
                start.push_attribute(("xmlns", ns));
            }
            let text = scalar_text(scalar);
            if text.is_empty() {
                writer
                    .write_event(Event::Empty(start))
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
            } else {
                writer
                    .write_event(Event::Start(start))
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
                writer
                    .write_event(Event::Text(BytesText::new(&text)))
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
                writer
                    .write_event(Event::End(BytesEnd::new(name)))
                    .map_err(|e| DocumentError::Xml(e.to_string()))?;
            }
        }
    }
    Ok(())
}

/// Sequence-hinted keys present in the map come first, the rest keep their
/// document order.
fn ordered_keys(metadata: &EntityMetadata, element: &str, map: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(map.len());
    for key in metadata.sequence_for(element) {
        if map.contains_key(key) && !keys.iter().any(|seen| seen == key) {
            keys.push(key.clone());
        }
    }
    for key in map.keys() {
        if !keys.iter().any(|seen| seen == key) {
            keys.push(key.clone());
        }
    }
    keys
}

/// Attribute values must be scalars; structured values stay child elements
/// even when hinted as attributes.
fn attribute_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn parse_xml(input: &str) -> Result<Value, DocumentError> {
    let mut reader = Reader::from_str(input);
    loop {
        match reader.read_event().map_err(|e| DocumentError::Xml(e.to_string()))? {
            Event::Start(start) => {
                let name = element_name(&start);
                let value = read_element(&mut reader, &start)?;
                let mut wrapped = Map::new();
                wrapped.insert(name, value);
                return Ok(Value::Object(wrapped));
            }
            Event::Empty(start) => {
                let name = element_name(&start);
                let value = empty_element_value(&start)?;
                let mut wrapped = Map::new();
                wrapped.insert(name, value);
                return Ok(Value::Object(wrapped));
            }
            Event::Text(text) => {
                let unescaped = text.unescape().map_err(|e| DocumentError::Xml(e.to_string()))?;
                if !unescaped.trim().is_empty() {
                    return Err(DocumentError::Xml("text outside of root element".to_string()));
                }
            }
            Event::Eof => return Err(DocumentError::Xml("missing root element".to_string())),
            _ => {}
        }
    }
}

fn read_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Value, DocumentError> {
    let mut fields = attribute_map(start)?;
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(|e| DocumentError::Xml(e.to_string()))? {
            Event::Start(child) => {
                let name = element_name(&child);
                let value = read_element(reader, &child)?;
                insert_child(&mut fields, name, value);
            }
            Event::Empty(child) => {
                let name = element_name(&child);
                let value = empty_element_value(&child)?;
                insert_child(&mut fields, name, value);
            }
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|e| DocumentError::Xml(e.to_string()))?;
                let trimmed = unescaped.trim();
                if !trimmed.is_empty() {
                    text.push_str(trimmed);
                }
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(DocumentError::Xml("unexpected end of document".to_string()));
            }
            _ => {}
        }
    }
    if fields.is_empty() {
        Ok(Value::String(text))
    } else {
        Ok(Value::Object(fields))
    }
}

/// An empty element with attributes is an object, without them an empty
/// string.
fn empty_element_value(start: &BytesStart<'_>) -> Result<Value, DocumentError> {
    let fields = attribute_map(start)?;
    if fields.is_empty() {
        Ok(Value::String(String::new()))
    } else {
        Ok(Value::Object(fields))
    }
}

fn attribute_map(start: &BytesStart<'_>) -> Result<Map<String, Value>, DocumentError> {
    let mut fields = Map::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocumentError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| DocumentError::Xml(e.to_string()))?
            .into_owned();
        fields.insert(key, Value::String(value));
    }
    Ok(fields)
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// A repeated sibling name turns the existing entry into a list.
fn insert_child(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::CIMI_NAMESPACE;

    fn machine_metadata() -> EntityMetadata {
        EntityMetadata::new()
            .attribute("Machine", &["resourceURI"])
            .plural("disks", "disk")
            .sequence("Machine", &["id", "name", "disks", "state"])
    }

    #[test]
    fn renders_sequence_attributes_and_plurals() {
        let body = json!({
            "state": "STARTED",
            "name": "vm1",
            "id": "demo/machine/1",
            "resourceURI": "http://schemas.dmtf.org/cimi/1/Machine",
            "disks": [{"capacity": 5000000, "format": ""}],
        });
        let rendered =
            render_xml("Machine", &body, &machine_metadata(), CIMI_NAMESPACE).unwrap();
        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
            <Machine xmlns=\"http://schemas.dmtf.org/cimi/1\" resourceURI=\"http://schemas.dmtf.org/cimi/1/Machine\">\n  \
            <id>demo/machine/1</id>\n  \
            <name>vm1</name>\n  \
            <disk>\n    \
            <capacity>5000000</capacity>\n    \
            <format/>\n  \
            </disk>\n  \
            <state>STARTED</state>\n\
            </Machine>";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn undeclared_keys_follow_the_sequence() {
        let metadata = EntityMetadata::new().sequence("Machine", &["id", "name"]);
        let body = json!({"created": "2026-08-01", "name": "vm1", "id": "demo/machine/1"});
        let rendered = render_xml("Machine", &body, &metadata, CIMI_NAMESPACE).unwrap();
        let id_at = rendered.find("<id>").unwrap();
        let name_at = rendered.find("<name>").unwrap();
        let created_at = rendered.find("<created>").unwrap();
        assert!(id_at < name_at && name_at < created_at);
    }

    #[test]
    fn rendering_is_deterministic() {
        let body = json!({
            "id": "demo/machine/1",
            "disks": [{"capacity": 5000000}],
            "state": "STARTED",
        });
        let first = render_xml("Machine", &body, &machine_metadata(), CIMI_NAMESPACE).unwrap();
        let second = render_xml("Machine", &body, &machine_metadata(), CIMI_NAMESPACE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn lists_render_without_a_wrapper_element() {
        let metadata = EntityMetadata::new().plural("entries", "Entry");
        let body = json!({"entries": [{"id": "a"}, {"id": "b"}]});
        let rendered = render_xml("Collection", &body, &metadata, CIMI_NAMESPACE).unwrap();
        assert!(!rendered.contains("<entries>"));
        assert_eq!(rendered.matches("<Entry>").count(), 2);
    }

    #[test]
    fn xmlns_appears_only_on_the_root() {
        let metadata = EntityMetadata::new();
        let body = json!({"volume": {"href": "demo/volume/1"}});
        let rendered = render_xml("MachineVolume", &body, &metadata, CIMI_NAMESPACE).unwrap();
        assert_eq!(rendered.matches("xmlns=").count(), 1);
        assert!(rendered.starts_with(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<MachineVolume xmlns=\"http://schemas.dmtf.org/cimi/1\">"
        ));
    }

    #[test]
    fn undeclared_list_strips_trailing_s() {
        let metadata = EntityMetadata::new();
        let body = json!({"machines": [{"id": "x"}]});
        let rendered = render_xml("Collection", &body, &metadata, CIMI_NAMESPACE).unwrap();
        assert!(rendered.contains("<machine>"));
    }

    #[test]
    fn text_content_is_escaped() {
        let metadata = EntityMetadata::new();
        let body = json!({"description": "a <b> & c"});
        let rendered = render_xml("Machine", &body, &metadata, CIMI_NAMESPACE).unwrap();
        assert!(rendered.contains("a &lt;b&gt; &amp; c"));
    }

    #[test]
    fn structured_values_never_become_attributes() {
        let metadata = EntityMetadata::new().attribute("Machine", &["operations"]);
        let body = json!({"operations": [{"rel": "edit"}], "name": "vm"});
        let rendered = render_xml("Machine", &body, &metadata, CIMI_NAMESPACE).unwrap();
        assert!(!rendered.contains("operations="));
        assert!(rendered.contains("<name>vm</name>"));
    }

    #[test]
    fn parses_wrapped_root_and_attributes() {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
            <MachineCreate xmlns=\"http://schemas.dmtf.org/cimi/1\" resourceURI=\"http://schemas.dmtf.org/cimi/1/MachineCreate\">\n\
              <name>vm1</name>\n\
              <machineTemplate>\n\
                <machineImage href=\"demo/machineimage/7\"/>\n\
              </machineTemplate>\n\
            </MachineCreate>";
        let parsed = parse_xml(input).unwrap();
        assert_eq!(
            parsed,
            json!({
                "MachineCreate": {
                    "resourceURI": "http://schemas.dmtf.org/cimi/1/MachineCreate",
                    "name": "vm1",
                    "machineTemplate": {
                        "machineImage": {"href": "demo/machineimage/7"},
                    },
                }
            })
        );
    }

    #[test]
    fn repeated_siblings_collapse_into_a_list() {
        let input = "<Collection><Entry><id>a</id></Entry><Entry><id>b</id></Entry></Collection>";
        let parsed = parse_xml(input).unwrap();
        assert_eq!(
            parsed,
            json!({"Collection": {"Entry": [{"id": "a"}, {"id": "b"}]}})
        );
    }

    #[test]
    fn text_entities_are_unescaped() {
        let parsed = parse_xml("<Action><force>true &amp; more</force></Action>").unwrap();
        assert_eq!(parsed, json!({"Action": {"force": "true & more"}}));
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        assert!(parse_xml("<Machine><name>vm</other></Machine>").is_err());
    }

    #[test]
    fn non_xml_input_is_rejected() {
        assert!(parse_xml("{\"name\": \"vm\"}").is_err());
        assert!(parse_xml("").is_err());
    }
}

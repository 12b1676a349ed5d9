// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Wire format selection for CIMI payloads

use serde_json::Value;

use crate::metadata::EntityMetadata;
use crate::xml;
use crate::DocumentError;

/// The two representations CIMI resources are served and accepted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Xml,
}

impl DocumentFormat {
    /// Media type for the `Content-Type` response header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Json => "application/json",
            DocumentFormat::Xml => "application/xml",
        }
    }
}

/// Serialize a document body.
///
/// JSON bodies render pretty-printed and ignore the XML hints; XML bodies
/// render `body` under a `root` element carrying the CIMI namespace.
pub fn render(
    root: &str,
    body: &Value,
    format: DocumentFormat,
    metadata: &EntityMetadata,
    namespace: &str,
) -> Result<String, DocumentError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::to_string_pretty(body)?),
        DocumentFormat::Xml => xml::render_xml(root, body, metadata, namespace),
    }
}

/// Parse a request body into the generic document representation.
///
/// XML bodies come back wrapped in their root element name, so callers
/// accept both `{"MachineCreate": {...}}` and the bare JSON form.
pub fn deserialize(body: &[u8], format: DocumentFormat) -> Result<Value, DocumentError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_slice(body)?),
        DocumentFormat::Xml => {
            let text =
                std::str::from_utf8(body).map_err(|e| DocumentError::Xml(e.to_string()))?;
            xml::parse_xml(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::CIMI_NAMESPACE;

    #[test]
    fn json_rendering_is_pretty_printed_and_ordered() {
        let body = json!({"id": "demo/machine/1", "name": "vm1"});
        let rendered = render(
            "Machine",
            &body,
            DocumentFormat::Json,
            &EntityMetadata::new(),
            CIMI_NAMESPACE,
        )
        .unwrap();
        assert_eq!(rendered, "{\n  \"id\": \"demo/machine/1\",\n  \"name\": \"vm1\"\n}");
    }

    #[test]
    fn json_deserialize_keeps_key_order() {
        let parsed = deserialize(
            b"{\"zeta\": 1, \"alpha\": 2}",
            DocumentFormat::Json,
        )
        .unwrap();
        let keys: Vec<&String> = parsed.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn malformed_bodies_error_in_both_formats() {
        assert!(deserialize(b"{not json", DocumentFormat::Json).is_err());
        assert!(deserialize(b"<open><no-close>", DocumentFormat::Xml).is_err());
    }

    #[test]
    fn xml_deserialize_wraps_the_root_element() {
        let parsed = deserialize(
            b"<Action xmlns=\"http://schemas.dmtf.org/cimi/1\"><action>http://schemas.dmtf.org/cimi/1/action/stop</action></Action>",
            DocumentFormat::Xml,
        )
        .unwrap();
        assert_eq!(
            parsed,
            json!({"Action": {"action": "http://schemas.dmtf.org/cimi/1/action/stop"}})
        );
    }

    #[test]
    fn mime_types_match_the_negotiated_format() {
        assert_eq!(DocumentFormat::Json.mime_type(), "application/json");
        assert_eq!(DocumentFormat::Xml.mime_type(), "application/xml");
    }
}

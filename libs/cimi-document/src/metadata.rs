// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Per-resource XML rendering descriptors
//!
//! JSON rendering is structural, but the CIMI XML shapes need three hints
//! that the document tree alone cannot carry:
//!
//! - which keys of an element render as XML attributes instead of children,
//! - what element name the items of a list render under (lists themselves
//!   never produce a wrapper element),
//! - which keys of an element must render first, and in what order.
//!
//! Each controller builds one [`EntityMetadata`] per resource shape and
//! hands it to [`crate::render::render`]. Descriptors are keyed by the XML
//! element name an entry applies to, not by the JSON key that led there.

use indexmap::IndexMap;

/// XML shape hints for one CIMI resource representation
#[derive(Debug, Clone, Default)]
pub struct EntityMetadata {
    attributes: IndexMap<String, Vec<String>>,
    plurals: IndexMap<String, String>,
    sequence: IndexMap<String, Vec<String>>,
}

impl EntityMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the named keys of `element` as XML attributes.
    pub fn attribute(mut self, element: &str, keys: &[&str]) -> Self {
        self.attributes
            .insert(element.to_string(), keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Render items of the list stored under `list_key` as `singular`
    /// elements.
    pub fn plural(mut self, list_key: &str, singular: &str) -> Self {
        self.plurals.insert(list_key.to_string(), singular.to_string());
        self
    }

    /// Render the listed keys of `element` first, in the given order. Keys
    /// not listed follow in document order.
    pub fn sequence(mut self, element: &str, keys: &[&str]) -> Self {
        self.sequence
            .insert(element.to_string(), keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Keys of `element` that render as XML attributes.
    pub fn attribute_keys(&self, element: &str) -> &[String] {
        self.attributes.get(element).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Element name for items of the list stored under `list_key`.
    ///
    /// Falls back to stripping a trailing `s`, then to `item`.
    pub fn singular_for(&self, list_key: &str) -> String {
        if let Some(singular) = self.plurals.get(list_key) {
            return singular.clone();
        }
        match list_key.strip_suffix('s') {
            Some(stripped) if !stripped.is_empty() => stripped.to_string(),
            _ => "item".to_string(),
        }
    }

    /// Preferred key order for `element`, if one was declared.
    pub fn sequence_for(&self, element: &str) -> &[String] {
        self.sequence.get(element).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test]
    fn declared_plural_wins() {
        let metadata = EntityMetadata::new().plural("entries", "Entry");
        assert_eq!(metadata.singular_for("entries"), "Entry");
    }

    #[test_case("machines", "machine" ; "trailing s stripped")]
    #[test_case("disks", "disk" ; "short plural stripped")]
    #[test_case("data", "item" ; "no trailing s falls back to item")]
    #[test_case("s", "item" ; "bare s falls back to item")]
    fn singular_fallbacks(list_key: &str, expected: &str) {
        let metadata = EntityMetadata::new();
        assert_eq!(metadata.singular_for(list_key), expected);
    }

    #[test]
    fn undeclared_elements_have_no_hints() {
        let metadata = EntityMetadata::new()
            .attribute("Machine", &["resourceURI"])
            .sequence("Machine", &["id", "name"]);
        assert_eq!(metadata.attribute_keys("Machine"), &["resourceURI"]);
        assert!(metadata.attribute_keys("Volume").is_empty());
        assert!(metadata.sequence_for("Volume").is_empty());
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Small helpers for moving values between document trees
//!
//! Controllers translate backend payloads field by field. These helpers keep
//! that code declarative: slash-separated paths address nested keys the same
//! way on both sides of a copy.

use serde_json::{Map, Value};

/// Walk a slash-separated key path. Empty segments are ignored.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = doc;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        node = node.get(segment)?;
    }
    Some(node)
}

/// Copy `source[from_path]` into `target[to_path]`.
///
/// The target's parent object must already exist; intermediate objects are
/// never created. A missing source value leaves the target untouched.
/// Returns whether a value was copied.
pub fn match_up(target: &mut Value, source: &Value, to_path: &str, from_path: &str) -> bool {
    let Some(found) = lookup(source, from_path) else {
        return false;
    };
    let found = found.clone();
    let mut segments: Vec<&str> = to_path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(last) = segments.pop() else {
        return false;
    };
    let mut node = target;
    for segment in segments {
        match node.get_mut(segment) {
            Some(next) => node = next,
            None => return false,
        }
    }
    match node.as_object_mut() {
        Some(map) => {
            map.insert(last.to_string(), found);
            true
        }
        None => false,
    }
}

/// Last path segment, ignoring trailing slashes and spaces.
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches(['/', ' ']).rsplit('/').next().unwrap_or("")
}

/// `doc[member]["href"]` as a string, the reference shape CIMI uses for
/// nested resources.
pub fn get_href<'a>(doc: &'a Value, member: &str) -> Option<&'a str> {
    doc.get(member)?.get("href")?.as_str()
}

/// First key of `map` not present in `allowed`, used to reject documents
/// with members the operation does not accept.
pub fn first_unknown_key<'a>(map: &'a Map<String, Value>, allowed: &[&str]) -> Option<&'a str> {
    map.keys().map(String::as_str).find(|key| !allowed.contains(key))
}

/// Boolean coercion for fields that arrive as JSON booleans or as XML text.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test]
    fn lookup_walks_nested_objects() {
        let doc = json!({"server": {"flavor": {"id": "42"}}});
        assert_eq!(lookup(&doc, "server/flavor/id"), Some(&json!("42")));
        assert_eq!(lookup(&doc, "server/image/id"), None);
    }

    #[test]
    fn match_up_copies_into_an_existing_parent() {
        let source = json!({"server": {"created": "2012-06-01T00:00:00Z"}});
        let mut target = json!({"id": "demo/machine/1"});
        assert!(match_up(&mut target, &source, "created", "server/created"));
        assert_eq!(target["created"], "2012-06-01T00:00:00Z");
    }

    #[test]
    fn match_up_skips_missing_sources() {
        let source = json!({"server": {}});
        let mut target = json!({"id": "demo/machine/1"});
        assert!(!match_up(&mut target, &source, "created", "server/created"));
        assert_eq!(target, json!({"id": "demo/machine/1"}));
    }

    #[test]
    fn match_up_never_creates_intermediate_objects() {
        let source = json!({"device": "/dev/vdb"});
        let mut target = json!({"id": "x"});
        assert!(!match_up(&mut target, &source, "volume/initialLocation", "device"));
        assert_eq!(target, json!({"id": "x"}));
    }

    #[test_case("demo/machine/42", "42")]
    #[test_case("demo/machine/42/", "42" ; "trailing slash ignored")]
    #[test_case("demo/machine/42 ", "42" ; "trailing space ignored")]
    #[test_case("42", "42" ; "no separator")]
    fn last_segment_cases(path: &str, expected: &str) {
        assert_eq!(last_segment(path), expected);
    }

    #[test]
    fn get_href_reads_reference_members() {
        let doc = json!({"volume": {"href": "demo/volume/9"}});
        assert_eq!(get_href(&doc, "volume"), Some("demo/volume/9"));
        assert_eq!(get_href(&doc, "machine"), None);
    }

    #[test]
    fn first_unknown_key_flags_extra_members() {
        let doc = json!({"name": "v", "capacity": 1, "bogus": true});
        let map = doc.as_object().unwrap();
        assert_eq!(first_unknown_key(map, &["name", "capacity"]), Some("bogus"));
        assert_eq!(first_unknown_key(map, &["name", "capacity", "bogus"]), None);
    }

    #[test_case(&json!(true), true ; "bool true")]
    #[test_case(&json!(false), false ; "bool false")]
    #[test_case(&json!("true"), true ; "string true")]
    #[test_case(&json!("True"), true ; "string true mixed case")]
    #[test_case(&json!("false"), false ; "string false")]
    #[test_case(&json!(1), false ; "number is not truthy")]
    fn truthy_cases(value: &Value, expected: bool) {
        assert_eq!(truthy(value), expected);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Content negotiation between the two CIMI representations
//!
//! `Accept` picks the response format, `Content-Type` the request format,
//! both through the same best-match rule. Anything the gateway cannot
//! serve, including an absent header, resolves to JSON.

use cimi_document::DocumentFormat;

const SUPPORTED: [(DocumentFormat, &str); 2] = [
    (DocumentFormat::Json, "application/json"),
    (DocumentFormat::Xml, "application/xml"),
];

/// Resolve an `Accept` or `Content-Type` header value to a document
/// format. Quality parameters are honored; on a quality tie the earlier
/// range in the header wins.
pub fn best_match(header: Option<&str>) -> DocumentFormat {
    let Some(header) = header else {
        return DocumentFormat::Json;
    };

    let mut best = DocumentFormat::Json;
    let mut best_quality = 0.0f32;
    for range in header.split(',') {
        let mut pieces = range.split(';');
        let Some(media) = pieces.next() else {
            continue;
        };
        let media = media.trim().to_ascii_lowercase();

        let mut quality = 1.0f32;
        for parameter in pieces {
            if let Some(value) = parameter.trim().strip_prefix("q=") {
                quality = value.parse().unwrap_or(0.0);
            }
        }
        if quality <= best_quality {
            continue;
        }

        let matched = SUPPORTED
            .iter()
            .find(|(_, name)| media_matches(&media, name));
        if let Some((format, _)) = matched {
            best = *format;
            best_quality = quality;
        }
    }

    if best_quality > 0.0 {
        best
    } else {
        DocumentFormat::Json
    }
}

fn media_matches(media: &str, supported: &str) -> bool {
    if media == supported || media == "*/*" {
        return true;
    }
    match (media.split_once('/'), supported.split_once('/')) {
        (Some((kind, subtype)), Some((supported_kind, supported_subtype))) => {
            (kind == supported_kind || kind == "*")
                && (subtype == supported_subtype || subtype == "*")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(Some("application/json"), DocumentFormat::Json; "json")]
    #[test_case(Some("application/xml"), DocumentFormat::Xml; "xml")]
    #[test_case(None, DocumentFormat::Json; "unset")]
    #[test_case(Some("text/html"), DocumentFormat::Json; "unsupported")]
    #[test_case(Some("*/*"), DocumentFormat::Json; "wildcard")]
    #[test_case(Some("application/*"), DocumentFormat::Json; "subtype wildcard")]
    #[test_case(Some("Application/XML"), DocumentFormat::Xml; "case insensitive")]
    #[test_case(Some("application/xml; charset=utf-8"), DocumentFormat::Xml; "with parameter")]
    fn resolves_supported_or_falls_back(header: Option<&str>, expected: DocumentFormat) {
        assert_eq!(best_match(header), expected);
    }

    #[test]
    fn quality_ordering_wins_over_listing_order() {
        let header = Some("application/json;q=0.1, application/xml;q=0.9");
        assert_eq!(best_match(header), DocumentFormat::Xml);
    }

    #[test]
    fn zero_quality_is_not_acceptable() {
        assert_eq!(best_match(Some("application/xml;q=0")), DocumentFormat::Json);
    }

    #[test]
    fn quality_tie_prefers_the_first_listed_range() {
        let header = Some("application/xml, application/json");
        assert_eq!(best_match(header), DocumentFormat::Xml);
    }
}

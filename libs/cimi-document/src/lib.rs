// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! CIMI document handling
//!
//! CIMI resources are rendered from a single generic representation: an
//! order-preserving [`serde_json::Value`] tree built by the gateway
//! controllers. The same tree serializes to pretty-printed JSON or, guided
//! by a per-resource [`EntityMetadata`] descriptor, to the element/attribute
//! XML shape the CIMI spec mandates. Inbound request bodies deserialize back
//! into the same representation so controllers never branch on the wire
//! format.
//!
//! The crate also carries the CIMI state vocabularies ([`status`]) and the
//! small document-tree helpers ([`mapping`]) shared by every controller.
//!
//! Key ordering matters here: XML child-element order is observable, so all
//! maps flow through `serde_json`'s `preserve_order` feature and
//! [`EntityMetadata`] sequences decide which keys render first.

pub mod mapping;
pub mod metadata;
pub mod render;
pub mod status;
mod xml;

use thiserror::Error;

pub use metadata::EntityMetadata;
pub use render::{deserialize, render, DocumentFormat};

/// XML namespace for every CIMI resource representation.
///
/// Kept without a trailing slash; `resourceURI` values and the root `xmlns`
/// attribute are both derived from it.
pub const CIMI_NAMESPACE: &str = "http://schemas.dmtf.org/cimi/1";

/// Errors raised while serializing or parsing CIMI documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// JSON body could not be parsed or rendered
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// XML body could not be parsed or rendered
    #[error("invalid XML document: {0}")]
    Xml(String),
}

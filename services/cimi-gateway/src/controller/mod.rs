// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Resource controllers
//!
//! One module per CIMI resource family. Controllers are plain async
//! functions over a request [`Scope`]: they read backend JSON, build the
//! generic document for their resource, and hand it to the serialization
//! layer. All of them share the same failure posture: backend non-2xx
//! responses pass through verbatim unless the controller deliberately
//! remaps them, and a backend lookup that merely enriches a document is
//! allowed to fail without failing the request.

pub mod address;
pub mod cloudentrypoint;
pub mod machine;
pub mod machineconfig;
pub mod machineimage;
pub mod machinevolume;
pub mod network;
pub mod volume;

use cimi_document::{render, DocumentFormat, EntityMetadata, CIMI_NAMESPACE};
use dropshot::{Body, HttpError};
use http::{Response, StatusCode};
use serde_json::{json, Value};
use url::Url;

use crate::backend::{BackendClient, BackendResponse};
use crate::config::{Config, EndpointCache};
use crate::error::CimiError;

/// Response header advertising the implemented CIMI revision.
pub const VERSION_HEADER: &str = "CIMI-Specification-Version";
pub const VERSION_VALUE: &str = "1.0.0";

// ============================================================================
// Request scope
// ============================================================================

/// Everything a controller needs to answer one request.
pub struct Scope<'a> {
    pub tenant: &'a str,
    /// Path segments after the resource kind.
    pub params: &'a [String],
    pub request_format: DocumentFormat,
    pub response_format: DocumentFormat,
    pub auth_token: Option<&'a str>,
    /// Inbound `Host` header, for self-referential URIs.
    pub host: Option<&'a str>,
    pub body: &'a [u8],
    pub config: &'a Config,
    pub backend: &'a BackendClient,
    pub endpoints: &'a EndpointCache,
}

impl Scope<'_> {
    /// Tenant-scoped CIMI identifier, e.g. `demo/machine/42`.
    pub fn cimi_id(&self, tail: &str) -> String {
        format!("{}/{}", self.tenant, tail)
    }

    /// Positional path parameter; absence means the path was too short
    /// for the operation.
    pub fn param(&self, index: usize) -> Result<&str, CimiError> {
        self.params
            .get(index)
            .map(String::as_str)
            .ok_or(CimiError::BadRequest)
    }

    /// Compute backend URL for a tenant-scoped resource path.
    pub fn compute_url(&self, tail: &str) -> Result<String, CimiError> {
        let endpoint = self
            .config
            .compute_endpoint
            .as_ref()
            .or_else(|| self.endpoints.compute())
            .ok_or_else(|| {
                tracing::warn!("no compute endpoint configured or resolved");
                CimiError::BackendUnavailable
            })?;
        Ok(backend_url(
            endpoint,
            &self.config.compute_version_path,
            self.tenant,
            tail,
        ))
    }

    /// Volume backend URL for a tenant-scoped resource path.
    pub fn volume_url(&self, tail: &str) -> Result<String, CimiError> {
        let endpoint = self
            .config
            .volume_endpoint
            .as_ref()
            .or_else(|| self.endpoints.volume())
            .ok_or_else(|| {
                tracing::warn!("no volume endpoint configured or resolved");
                CimiError::BackendUnavailable
            })?;
        Ok(backend_url(
            endpoint,
            &self.config.volume_version_path,
            self.tenant,
            tail,
        ))
    }

    /// Parse the request body in its negotiated format.
    pub fn document(&self) -> Result<Value, CimiError> {
        if self.body.is_empty() {
            return Err(CimiError::MalformedBody);
        }
        cimi_document::deserialize(self.body, self.request_format)
            .map_err(|_| CimiError::MalformedBody)
    }

    /// Render a completed translation in the negotiated response format.
    pub fn rendered(
        &self,
        status: StatusCode,
        root: &str,
        body: &Value,
        metadata: &EntityMetadata,
    ) -> Result<ResponseData, CimiError> {
        let text = render(root, body, self.response_format, metadata, CIMI_NAMESPACE)
            .map_err(|error| {
                tracing::warn!(%error, root, "response serialization failed");
                CimiError::Internal
            })?;
        Ok(ResponseData {
            status,
            content_type: Some(self.response_format.mime_type().to_string()),
            location: None,
            cimi_version: true,
            body: text,
        })
    }
}

fn backend_url(endpoint: &Url, version_path: &str, tenant: &str, tail: &str) -> String {
    format!(
        "{}{}/{}/{}",
        endpoint.as_str().trim_end_matches('/'),
        version_path,
        tenant,
        tail
    )
}

// ============================================================================
// Response carrier
// ============================================================================

/// A fully-determined HTTP response, independent of transport types.
#[derive(Debug, Clone)]
pub struct ResponseData {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub location: Option<String>,
    /// Whether to stamp the CIMI version header. True only for responses
    /// the gateway composed itself.
    pub cimi_version: bool,
    pub body: String,
}

impl ResponseData {
    /// Forward a backend response unchanged.
    pub fn passthrough(backend: BackendResponse) -> Self {
        ResponseData {
            status: backend.status,
            content_type: backend.content_type,
            location: None,
            cimi_version: false,
            body: backend.body,
        }
    }

    /// A bodiless CIMI success or deliberate remap.
    pub fn empty(status: StatusCode) -> Self {
        ResponseData {
            status,
            content_type: None,
            location: None,
            cimi_version: true,
            body: String::new(),
        }
    }

    pub fn with_location(mut self, location: String) -> Self {
        self.location = Some(location);
        self
    }

    /// Lower into the transport response.
    pub fn into_response(self) -> Result<Response<Body>, HttpError> {
        let mut builder = Response::builder().status(self.status);
        if let Some(content_type) = &self.content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }
        if self.cimi_version {
            builder = builder.header(VERSION_HEADER, VERSION_VALUE);
        }
        if let Some(location) = &self.location {
            builder = builder.header(http::header::LOCATION, location);
        }
        builder
            .body(self.body.into())
            .map_err(|error| HttpError::for_internal_error(error.to_string()))
    }
}

// ============================================================================
// Document helpers
// ============================================================================

/// Fully-qualified CIMI type URI for `resourceURI` fields.
pub fn resource_uri(type_name: &str) -> String {
    format!("{CIMI_NAMESPACE}/{type_name}")
}

/// An `operations` list member.
pub fn operation(rel: &str, href: &str) -> Value {
    json!({"rel": rel, "href": href})
}

/// Peel the root-element wrapper that XML parsing introduces, accepting
/// bare JSON documents unchanged.
pub fn unwrap_root(mut document: Value, root: &str) -> Value {
    if let Some(inner) = document.get_mut(root) {
        if inner.is_object() {
            return inner.take();
        }
    }
    document
}

/// Rewrite `body[key]` through a status vocabulary, when present.
pub fn translate_state(body: &mut Value, key: &str, vocabulary: fn(&str) -> &'static str) {
    if let Some(state) = body.get(key).and_then(Value::as_str) {
        body[key] = Value::String(vocabulary(state).to_string());
    }
}

/// Scalar as the string a backend path expects. Backend ids appear both
/// quoted and bare across deployments.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Numeric field that may arrive as a bare number or, through the XML
/// request path, as digit text.
pub fn value_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

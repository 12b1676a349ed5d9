// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Block Storage Backend API Trait Definition
//!
//! **IMPORTANT**: This trait defines a *subset* of an OpenStack-compatible
//! block storage API. It only includes the endpoints and body members the
//! CIMI gateway's volume resources translate to; the real implementation is
//! the deployment's volume service.
//!
//! The volume service is addressed separately from compute: the gateway
//! resolves its endpoint from configuration or the service catalog, so
//! these routes carry their own tenant scope.

use dropshot::{
    Body, HttpError, HttpResponseOk, Path, RequestContext, TypedBody,
};
use http::Response;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Path parameters for the volume list and create endpoints
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TenantPath {
    pub tenant_id: String,
}

/// Path parameters for single-volume endpoints
#[derive(Debug, Deserialize, JsonSchema)]
pub struct VolumePath {
    pub tenant_id: String,
    pub volume_id: String,
}

/// Volume details
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Volume {
    pub id: String,

    /// Human-readable name; this API generation calls it display_name
    pub display_name: Option<String>,

    pub display_description: Option<String>,

    /// Capacity in gigabytes
    pub size: u64,

    /// Backend status vocabulary (creating, available, deleting, ...)
    pub status: String,

    pub created_at: Option<String>,
}

/// Response from the volume list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeList {
    pub volumes: Vec<Volume>,
}

/// Response from volume show and create endpoints
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeEnvelope {
    pub volume: Volume,
}

/// Members of a volume create request
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeCreateParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_description: Option<String>,

    /// Requested capacity in gigabytes
    pub size: u64,
}

/// Request body for the volume create endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeCreateEnvelope {
    pub volume: VolumeCreateParams,
}

// ============================================================================
// API Trait
// ============================================================================

/// Block Storage Backend API (Subset)
#[dropshot::api_description]
pub trait VolumeApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    /// List volumes
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/volumes",
        tags = ["volumes"],
    }]
    async fn list_volumes(
        rqctx: RequestContext<Self::Context>,
        path: Path<TenantPath>,
    ) -> Result<HttpResponseOk<VolumeList>, HttpError>;

    /// Create a volume
    ///
    /// This endpoint family answers a successful create with 200.
    #[endpoint {
        method = POST,
        path = "/{tenant_id}/volumes",
        tags = ["volumes"],
    }]
    async fn create_volume(
        rqctx: RequestContext<Self::Context>,
        path: Path<TenantPath>,
        body: TypedBody<VolumeCreateEnvelope>,
    ) -> Result<HttpResponseOk<VolumeEnvelope>, HttpError>;

    /// Show one volume
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/volumes/{volume_id}",
        tags = ["volumes"],
    }]
    async fn get_volume(
        rqctx: RequestContext<Self::Context>,
        path: Path<VolumePath>,
    ) -> Result<HttpResponseOk<VolumeEnvelope>, HttpError>;

    /// Delete a volume
    ///
    /// Responds 202 with an empty body on success.
    #[endpoint {
        method = DELETE,
        path = "/{tenant_id}/volumes/{volume_id}",
        tags = ["volumes"],
    }]
    async fn delete_volume(
        rqctx: RequestContext<Self::Context>,
        path: Path<VolumePath>,
    ) -> Result<Response<Body>, HttpError>;
}

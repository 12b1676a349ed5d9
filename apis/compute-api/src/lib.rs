// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Compute Backend API Trait Definition
//!
//! **IMPORTANT**: This trait defines a *subset* of an OpenStack-compatible
//! compute API (servers, flavors, images, volume attachments). It is NOT a
//! complete compute API definition - it only includes the endpoints and
//! body members the CIMI gateway translates to.
//!
//! The actual implementation of these endpoints is the deployment's compute
//! service. This trait exists to:
//! 1. Document the exact backend surface the gateway depends on
//! 2. Enable the in-process stub backend used by gateway tests
//!
//! The gateway itself talks to the backend generically so unrecognized body
//! members pass through untouched; the types here are the contract, not the
//! transport.

use std::collections::HashMap;

use dropshot::{
    Body, HttpError, HttpResponseAccepted, HttpResponseDeleted, HttpResponseOk, Path,
    RequestContext, TypedBody,
};
use http::Response;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Path Parameters
// ============================================================================

/// Path parameters for tenant-scoped collection endpoints
#[derive(Debug, Deserialize, JsonSchema)]
pub struct TenantPath {
    pub tenant_id: String,
}

/// Path parameters for server endpoints
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ServerPath {
    pub tenant_id: String,
    pub server_id: String,
}

/// Path parameters for flavor endpoints
#[derive(Debug, Deserialize, JsonSchema)]
pub struct FlavorPath {
    pub tenant_id: String,
    pub flavor_id: String,
}

/// Path parameters for image endpoints
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImagePath {
    pub tenant_id: String,
    pub image_id: String,
}

/// Path parameters for volume attachment endpoints
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AttachmentPath {
    pub tenant_id: String,
    pub server_id: String,
    pub attachment_id: String,
}

// ============================================================================
// Servers
// ============================================================================

/// A reference to another resource by id, as embedded in server documents
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResourceRef {
    pub id: String,
}

/// One address entry inside a server's address group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerAddress {
    /// IP protocol version (4 or 6)
    pub version: u32,

    /// The address literal
    pub addr: String,
}

/// Server details as returned by show and detailed list endpoints
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Server {
    pub id: String,

    pub name: String,

    /// Backend status vocabulary (ACTIVE, SHUTOFF, PAUSED, ...)
    pub status: String,

    pub created: Option<String>,

    pub updated: Option<String>,

    /// Flavor the server was built from
    pub flavor: Option<ResourceRef>,

    /// Image the server was built from
    pub image: Option<ResourceRef>,

    /// Address groups, keyed by network label (e.g. "private", "public")
    #[serde(default)]
    pub addresses: HashMap<String, Vec<ServerAddress>>,
}

/// Response from server list endpoints
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerList {
    pub servers: Vec<Server>,
}

/// Response from the server show endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerEnvelope {
    pub server: Server,
}

/// Members of a server create request
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerCreateParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Image to build from, by id
    #[serde(rename = "imageRef")]
    pub image_ref: String,

    /// Flavor to build with, by id
    #[serde(rename = "flavorRef")]
    pub flavor_ref: String,

    /// Requested administrative password; generated when absent
    #[serde(rename = "adminPass", skip_serializing_if = "Option::is_none")]
    pub admin_pass: Option<String>,
}

/// Request body for the server create endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerCreateEnvelope {
    pub server: ServerCreateParams,
}

/// Link entry attached to freshly created resources
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

/// The abbreviated server document a create returns
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerCreated {
    pub id: String,

    /// Administrative password in effect for the new server
    #[serde(rename = "adminPass")]
    pub admin_pass: String,

    #[serde(default)]
    pub links: Vec<Link>,
}

/// Response from the server create endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServerCreatedEnvelope {
    pub server: ServerCreated,
}

/// Action requests are single-key objects: the key names the action
/// ("os-stop", "reboot", ...) and the value carries its arguments, null
/// when there are none.
pub type ServerActionRequest = HashMap<String, serde_json::Value>;

// ============================================================================
// Flavors
// ============================================================================

/// Flavor details as returned by show and detailed list endpoints
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Flavor {
    pub id: String,

    pub name: String,

    /// Virtual CPU count
    pub vcpus: u64,

    /// Memory in megabytes
    pub ram: u64,

    /// Root disk in gigabytes
    pub disk: u64,
}

/// Response from the detailed flavor list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlavorList {
    pub flavors: Vec<Flavor>,
}

/// Response from the flavor show endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FlavorEnvelope {
    pub flavor: Flavor,
}

// ============================================================================
// Images
// ============================================================================

/// Image details
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Image {
    pub id: String,

    pub name: String,

    /// Image service status vocabulary (active, queued, saving, ...)
    pub status: String,

    pub created: Option<String>,

    pub updated: Option<String>,
}

/// Response from the image list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageList {
    pub images: Vec<Image>,
}

/// Response from the image show endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ImageEnvelope {
    pub image: Image,
}

// ============================================================================
// Volume Attachments
// ============================================================================

/// A volume attached to a server
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeAttachment {
    /// Attachment id; equals the volume id on this backend family
    pub id: String,

    #[serde(rename = "serverId")]
    pub server_id: String,

    #[serde(rename = "volumeId")]
    pub volume_id: String,

    /// Device node the volume is exposed at
    pub device: String,
}

/// Response from the attachment list endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeAttachmentList {
    #[serde(rename = "volumeAttachments")]
    pub volume_attachments: Vec<VolumeAttachment>,
}

/// Response from attachment show and create endpoints
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeAttachmentEnvelope {
    #[serde(rename = "volumeAttachment")]
    pub volume_attachment: VolumeAttachment,
}

/// Members of an attachment create request
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeAttachmentCreateParams {
    #[serde(rename = "volumeId")]
    pub volume_id: String,

    pub device: String,
}

/// Request body for the attachment create endpoint
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VolumeAttachmentCreateEnvelope {
    #[serde(rename = "volumeAttachment")]
    pub volume_attachment: VolumeAttachmentCreateParams,
}

// ============================================================================
// API Trait
// ============================================================================

/// Compute Backend API (Subset)
///
/// Every route is tenant-scoped the way the deployment exposes it:
/// `/{tenant_id}/servers/...`. Version prefixes stay outside this trait;
/// the gateway composes them from its endpoint configuration.
#[dropshot::api_description]
pub trait ComputeApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    /// List servers with full details
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/servers/detail",
        tags = ["servers"],
    }]
    async fn list_servers(
        rqctx: RequestContext<Self::Context>,
        path: Path<TenantPath>,
    ) -> Result<HttpResponseOk<ServerList>, HttpError>;

    /// Create a server
    ///
    /// Returns 202 with an abbreviated server document carrying the id and
    /// the administrative password in effect.
    #[endpoint {
        method = POST,
        path = "/{tenant_id}/servers",
        tags = ["servers"],
    }]
    async fn create_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<TenantPath>,
        body: TypedBody<ServerCreateEnvelope>,
    ) -> Result<HttpResponseAccepted<ServerCreatedEnvelope>, HttpError>;

    /// Show one server
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/servers/{server_id}",
        tags = ["servers"],
    }]
    async fn get_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<HttpResponseOk<ServerEnvelope>, HttpError>;

    /// Delete a server
    #[endpoint {
        method = DELETE,
        path = "/{tenant_id}/servers/{server_id}",
        tags = ["servers"],
    }]
    async fn delete_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<HttpResponseDeleted, HttpError>;

    /// Run a server action
    ///
    /// Responds 202 with an empty body on success, which is all the gateway
    /// relies on.
    #[endpoint {
        method = POST,
        path = "/{tenant_id}/servers/{server_id}/action",
        tags = ["servers"],
    }]
    async fn server_action(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
        body: TypedBody<ServerActionRequest>,
    ) -> Result<Response<Body>, HttpError>;

    /// List flavors with full details
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/flavors/detail",
        tags = ["flavors"],
    }]
    async fn list_flavors(
        rqctx: RequestContext<Self::Context>,
        path: Path<TenantPath>,
    ) -> Result<HttpResponseOk<FlavorList>, HttpError>;

    /// Show one flavor
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/flavors/{flavor_id}",
        tags = ["flavors"],
    }]
    async fn get_flavor(
        rqctx: RequestContext<Self::Context>,
        path: Path<FlavorPath>,
    ) -> Result<HttpResponseOk<FlavorEnvelope>, HttpError>;

    /// List images
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/images",
        tags = ["images"],
    }]
    async fn list_images(
        rqctx: RequestContext<Self::Context>,
        path: Path<TenantPath>,
    ) -> Result<HttpResponseOk<ImageList>, HttpError>;

    /// Show one image
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/images/{image_id}",
        tags = ["images"],
    }]
    async fn get_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<ImagePath>,
    ) -> Result<HttpResponseOk<ImageEnvelope>, HttpError>;

    /// List a server's volume attachments
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/servers/{server_id}/os-volume_attachments",
        tags = ["volume-attachments"],
    }]
    async fn list_volume_attachments(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<HttpResponseOk<VolumeAttachmentList>, HttpError>;

    /// Attach a volume to a server
    ///
    /// This endpoint family answers a successful attach with 200, not 201.
    #[endpoint {
        method = POST,
        path = "/{tenant_id}/servers/{server_id}/os-volume_attachments",
        tags = ["volume-attachments"],
    }]
    async fn create_volume_attachment(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
        body: TypedBody<VolumeAttachmentCreateEnvelope>,
    ) -> Result<HttpResponseOk<VolumeAttachmentEnvelope>, HttpError>;

    /// Show one volume attachment
    #[endpoint {
        method = GET,
        path = "/{tenant_id}/servers/{server_id}/os-volume_attachments/{attachment_id}",
        tags = ["volume-attachments"],
    }]
    async fn get_volume_attachment(
        rqctx: RequestContext<Self::Context>,
        path: Path<AttachmentPath>,
    ) -> Result<HttpResponseOk<VolumeAttachmentEnvelope>, HttpError>;

    /// Detach a volume from a server
    ///
    /// Responds 202 with an empty body on success.
    #[endpoint {
        method = DELETE,
        path = "/{tenant_id}/servers/{server_id}/os-volume_attachments/{attachment_id}",
        tags = ["volume-attachments"],
    }]
    async fn delete_volume_attachment(
        rqctx: RequestContext<Self::Context>,
        path: Path<AttachmentPath>,
    ) -> Result<Response<Body>, HttpError>;
}

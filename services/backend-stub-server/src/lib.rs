// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Stub compute and volume backends for testing
//!
//! This crate provides Dropshot-based HTTP servers implementing the
//! [`compute_api::ComputeApi`] and [`volume_api::VolumeApi`] traits over
//! seeded in-memory fixtures. They exist for:
//!
//! - Integration testing of the CIMI gateway without a real cloud
//! - Local development and demos
//!
//! State is mutable the way the real backends are: creating servers and
//! volumes grows the fixtures, actions flip server status, attach and
//! detach edit the attachment list.

use std::sync::Arc;

use dropshot::{
    Body, HttpError, HttpResponseAccepted, HttpResponseDeleted, HttpResponseOk, Path,
    RequestContext, TypedBody,
};
use http::{Response, StatusCode};
use tokio::sync::Mutex;

use compute_api::{
    AttachmentPath, Flavor, FlavorEnvelope, FlavorList, Image, ImageEnvelope, ImageList,
    ImagePath, Link, ResourceRef, Server, ServerActionRequest, ServerAddress,
    ServerCreateEnvelope, ServerCreated, ServerCreatedEnvelope, ServerEnvelope, ServerList,
    ServerPath, TenantPath, VolumeAttachment, VolumeAttachmentCreateEnvelope,
    VolumeAttachmentEnvelope, VolumeAttachmentList,
};
use volume_api::{Volume, VolumeCreateEnvelope, VolumeEnvelope, VolumeList, VolumePath};

/// Id of the server every fixture set starts with.
pub const SEED_SERVER_ID: &str = "server-0001";

/// Id of the pre-attached, pre-created volume.
pub const SEED_VOLUME_ID: &str = "vol-0001";

/// Ids of the seeded images.
pub const SEED_IMAGE_IDS: [&str; 2] = ["image-0001", "image-0002"];

/// Ids of the seeded flavors.
pub const SEED_FLAVOR_IDS: [&str; 2] = ["1", "2"];

// ============================================================================
// Compute Stub
// ============================================================================

#[derive(Debug)]
struct ComputeState {
    servers: Vec<Server>,
    flavors: Vec<Flavor>,
    images: Vec<Image>,
    attachments: Vec<VolumeAttachment>,
}

/// Context for the stub compute backend
#[derive(Debug)]
pub struct ComputeStubContext {
    state: Mutex<ComputeState>,
}

impl ComputeStubContext {
    /// Build a context seeded with one running server, two flavors, two
    /// images, and one volume attachment.
    pub fn new() -> Self {
        let flavors = vec![
            Flavor {
                id: "1".to_string(),
                name: "m1.tiny".to_string(),
                vcpus: 1,
                ram: 512,
                disk: 1,
            },
            Flavor {
                id: "2".to_string(),
                name: "m1.small".to_string(),
                vcpus: 1,
                ram: 2048,
                disk: 20,
            },
        ];
        let images = vec![
            Image {
                id: "image-0001".to_string(),
                name: "cirros-0.6".to_string(),
                status: "active".to_string(),
                created: Some("2026-07-01T08:00:00Z".to_string()),
                updated: Some("2026-07-01T08:00:00Z".to_string()),
            },
            Image {
                id: "image-0002".to_string(),
                name: "ubuntu-24.04".to_string(),
                status: "saving".to_string(),
                created: Some("2026-08-20T16:45:00Z".to_string()),
                updated: Some("2026-08-20T16:45:00Z".to_string()),
            },
        ];
        let servers = vec![Server {
            id: SEED_SERVER_ID.to_string(),
            name: "demo-vm".to_string(),
            status: "ACTIVE".to_string(),
            created: Some("2026-08-01T10:00:00Z".to_string()),
            updated: Some("2026-08-02T11:30:00Z".to_string()),
            flavor: Some(ResourceRef { id: "1".to_string() }),
            image: Some(ResourceRef { id: "image-0001".to_string() }),
            addresses: [
                (
                    "private".to_string(),
                    vec![ServerAddress { version: 4, addr: "10.0.0.3".to_string() }],
                ),
                (
                    "public".to_string(),
                    vec![ServerAddress { version: 4, addr: "172.24.4.100".to_string() }],
                ),
            ]
            .into_iter()
            .collect(),
        }];
        let attachments = vec![VolumeAttachment {
            id: SEED_VOLUME_ID.to_string(),
            server_id: SEED_SERVER_ID.to_string(),
            volume_id: SEED_VOLUME_ID.to_string(),
            device: "/dev/vdb".to_string(),
        }];
        Self {
            state: Mutex::new(ComputeState { servers, flavors, images, attachments }),
        }
    }
}

impl Default for ComputeStubContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Status a server lands in after each accepted action.
fn action_status(action: &str) -> Option<&'static str> {
    match action {
        "os-stop" => Some("SHUTOFF"),
        "os-start" => Some("ACTIVE"),
        "pause" => Some("PAUSED"),
        "unpause" => Some("ACTIVE"),
        "suspend" => Some("SUSPENDED"),
        "resume" => Some("ACTIVE"),
        "reboot" => Some("ACTIVE"),
        _ => None,
    }
}

fn accepted_empty() -> Result<Response<Body>, HttpError> {
    Response::builder()
        .status(StatusCode::ACCEPTED)
        .body(Body::empty())
        .map_err(|e| HttpError::for_internal_error(e.to_string()))
}

/// Marker type for the stub compute implementation
pub enum StubComputeApi {}

impl compute_api::ComputeApi for StubComputeApi {
    type Context = Arc<ComputeStubContext>;

    async fn list_servers(
        rqctx: RequestContext<Self::Context>,
        _path: Path<TenantPath>,
    ) -> Result<HttpResponseOk<ServerList>, HttpError> {
        let state = rqctx.context().state.lock().await;
        Ok(HttpResponseOk(ServerList { servers: state.servers.clone() }))
    }

    async fn create_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<TenantPath>,
        body: TypedBody<ServerCreateEnvelope>,
    ) -> Result<HttpResponseAccepted<ServerCreatedEnvelope>, HttpError> {
        let path = path.into_inner();
        let params = body.into_inner().server;
        let mut state = rqctx.context().state.lock().await;

        if !state.images.iter().any(|i| i.id == params.image_ref) {
            return Err(HttpError::for_bad_request(
                None,
                format!("unknown imageRef: {}", params.image_ref),
            ));
        }
        if !state.flavors.iter().any(|f| f.id == params.flavor_ref) {
            return Err(HttpError::for_bad_request(
                None,
                format!("unknown flavorRef: {}", params.flavor_ref),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let admin_pass = params
            .admin_pass
            .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
        let name = params.name.unwrap_or_else(|| format!("server-{id}"));
        state.servers.push(Server {
            id: id.clone(),
            name,
            status: "ACTIVE".to_string(),
            created: Some("2026-08-21T00:00:00Z".to_string()),
            updated: Some("2026-08-21T00:00:00Z".to_string()),
            flavor: Some(ResourceRef { id: params.flavor_ref }),
            image: Some(ResourceRef { id: params.image_ref }),
            addresses: Default::default(),
        });

        Ok(HttpResponseAccepted(ServerCreatedEnvelope {
            server: ServerCreated {
                id: id.clone(),
                admin_pass,
                links: vec![Link {
                    href: format!("/{}/servers/{}", path.tenant_id, id),
                    rel: "self".to_string(),
                }],
            },
        }))
    }

    async fn get_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<HttpResponseOk<ServerEnvelope>, HttpError> {
        let path = path.into_inner();
        let state = rqctx.context().state.lock().await;
        let server = state
            .servers
            .iter()
            .find(|s| s.id == path.server_id)
            .ok_or_else(|| server_not_found(&path.server_id))?;
        Ok(HttpResponseOk(ServerEnvelope { server: server.clone() }))
    }

    async fn delete_server(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<HttpResponseDeleted, HttpError> {
        let path = path.into_inner();
        let mut state = rqctx.context().state.lock().await;
        let before = state.servers.len();
        state.servers.retain(|s| s.id != path.server_id);
        if state.servers.len() == before {
            return Err(server_not_found(&path.server_id));
        }
        state.attachments.retain(|a| a.server_id != path.server_id);
        Ok(HttpResponseDeleted())
    }

    async fn server_action(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
        body: TypedBody<ServerActionRequest>,
    ) -> Result<Response<Body>, HttpError> {
        let path = path.into_inner();
        let request = body.into_inner();
        let (action, args) = request
            .iter()
            .next()
            .ok_or_else(|| HttpError::for_bad_request(None, "empty action document".to_string()))?;

        if action == "reboot" {
            let reboot_type = args.get("type").and_then(|t| t.as_str());
            if !matches!(reboot_type, Some("SOFT") | Some("HARD")) {
                return Err(HttpError::for_bad_request(
                    None,
                    "reboot requires type SOFT or HARD".to_string(),
                ));
            }
        }
        let next_status = action_status(action).ok_or_else(|| {
            HttpError::for_bad_request(None, format!("unsupported action: {action}"))
        })?;

        let mut state = rqctx.context().state.lock().await;
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.id == path.server_id)
            .ok_or_else(|| server_not_found(&path.server_id))?;
        server.status = next_status.to_string();
        accepted_empty()
    }

    async fn list_flavors(
        rqctx: RequestContext<Self::Context>,
        _path: Path<TenantPath>,
    ) -> Result<HttpResponseOk<FlavorList>, HttpError> {
        let state = rqctx.context().state.lock().await;
        Ok(HttpResponseOk(FlavorList { flavors: state.flavors.clone() }))
    }

    async fn get_flavor(
        rqctx: RequestContext<Self::Context>,
        path: Path<compute_api::FlavorPath>,
    ) -> Result<HttpResponseOk<FlavorEnvelope>, HttpError> {
        let path = path.into_inner();
        let state = rqctx.context().state.lock().await;
        let flavor = state
            .flavors
            .iter()
            .find(|f| f.id == path.flavor_id)
            .ok_or_else(|| {
                HttpError::for_not_found(None, format!("flavor not found: {}", path.flavor_id))
            })?;
        Ok(HttpResponseOk(FlavorEnvelope { flavor: flavor.clone() }))
    }

    async fn list_images(
        rqctx: RequestContext<Self::Context>,
        _path: Path<TenantPath>,
    ) -> Result<HttpResponseOk<ImageList>, HttpError> {
        let state = rqctx.context().state.lock().await;
        Ok(HttpResponseOk(ImageList { images: state.images.clone() }))
    }

    async fn get_image(
        rqctx: RequestContext<Self::Context>,
        path: Path<ImagePath>,
    ) -> Result<HttpResponseOk<ImageEnvelope>, HttpError> {
        let path = path.into_inner();
        let state = rqctx.context().state.lock().await;
        let image = state
            .images
            .iter()
            .find(|i| i.id == path.image_id)
            .ok_or_else(|| {
                HttpError::for_not_found(None, format!("image not found: {}", path.image_id))
            })?;
        Ok(HttpResponseOk(ImageEnvelope { image: image.clone() }))
    }

    async fn list_volume_attachments(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
    ) -> Result<HttpResponseOk<VolumeAttachmentList>, HttpError> {
        let path = path.into_inner();
        let state = rqctx.context().state.lock().await;
        if !state.servers.iter().any(|s| s.id == path.server_id) {
            return Err(server_not_found(&path.server_id));
        }
        let volume_attachments = state
            .attachments
            .iter()
            .filter(|a| a.server_id == path.server_id)
            .cloned()
            .collect();
        Ok(HttpResponseOk(VolumeAttachmentList { volume_attachments }))
    }

    async fn create_volume_attachment(
        rqctx: RequestContext<Self::Context>,
        path: Path<ServerPath>,
        body: TypedBody<VolumeAttachmentCreateEnvelope>,
    ) -> Result<HttpResponseOk<VolumeAttachmentEnvelope>, HttpError> {
        let path = path.into_inner();
        let params = body.into_inner().volume_attachment;
        let mut state = rqctx.context().state.lock().await;
        if !state.servers.iter().any(|s| s.id == path.server_id) {
            return Err(server_not_found(&path.server_id));
        }
        let attachment = VolumeAttachment {
            id: params.volume_id.clone(),
            server_id: path.server_id,
            volume_id: params.volume_id,
            device: params.device,
        };
        state.attachments.push(attachment.clone());
        Ok(HttpResponseOk(VolumeAttachmentEnvelope { volume_attachment: attachment }))
    }

    async fn get_volume_attachment(
        rqctx: RequestContext<Self::Context>,
        path: Path<AttachmentPath>,
    ) -> Result<HttpResponseOk<VolumeAttachmentEnvelope>, HttpError> {
        let path = path.into_inner();
        let state = rqctx.context().state.lock().await;
        let attachment = state
            .attachments
            .iter()
            .find(|a| a.server_id == path.server_id && a.id == path.attachment_id)
            .ok_or_else(|| {
                HttpError::for_not_found(
                    None,
                    format!("attachment not found: {}", path.attachment_id),
                )
            })?;
        Ok(HttpResponseOk(VolumeAttachmentEnvelope { volume_attachment: attachment.clone() }))
    }

    async fn delete_volume_attachment(
        rqctx: RequestContext<Self::Context>,
        path: Path<AttachmentPath>,
    ) -> Result<Response<Body>, HttpError> {
        let path = path.into_inner();
        let mut state = rqctx.context().state.lock().await;
        let before = state.attachments.len();
        state
            .attachments
            .retain(|a| !(a.server_id == path.server_id && a.id == path.attachment_id));
        if state.attachments.len() == before {
            return Err(HttpError::for_not_found(
                None,
                format!("attachment not found: {}", path.attachment_id),
            ));
        }
        accepted_empty()
    }
}

fn server_not_found(server_id: &str) -> HttpError {
    HttpError::for_not_found(None, format!("server not found: {server_id}"))
}

// ============================================================================
// Volume Stub
// ============================================================================

/// Context for the stub volume backend
#[derive(Debug)]
pub struct VolumeStubContext {
    volumes: Mutex<Vec<Volume>>,
}

impl VolumeStubContext {
    /// Build a context seeded with one available volume, the one the compute
    /// stub starts attached.
    pub fn new() -> Self {
        Self {
            volumes: Mutex::new(vec![Volume {
                id: SEED_VOLUME_ID.to_string(),
                display_name: Some("demo-data".to_string()),
                display_description: Some("scratch space".to_string()),
                size: 2,
                status: "available".to_string(),
                created_at: Some("2026-08-01T09:00:00Z".to_string()),
            }]),
        }
    }
}

impl Default for VolumeStubContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Marker type for the stub volume implementation
pub enum StubVolumeApi {}

impl volume_api::VolumeApi for StubVolumeApi {
    type Context = Arc<VolumeStubContext>;

    async fn list_volumes(
        rqctx: RequestContext<Self::Context>,
        _path: Path<volume_api::TenantPath>,
    ) -> Result<HttpResponseOk<VolumeList>, HttpError> {
        let volumes = rqctx.context().volumes.lock().await;
        Ok(HttpResponseOk(VolumeList { volumes: volumes.clone() }))
    }

    async fn create_volume(
        rqctx: RequestContext<Self::Context>,
        _path: Path<volume_api::TenantPath>,
        body: TypedBody<VolumeCreateEnvelope>,
    ) -> Result<HttpResponseOk<VolumeEnvelope>, HttpError> {
        let params = body.into_inner().volume;
        if params.size == 0 {
            return Err(HttpError::for_bad_request(
                None,
                "volume size must be at least 1".to_string(),
            ));
        }
        let volume = Volume {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: params.display_name,
            display_description: params.display_description,
            size: params.size,
            status: "creating".to_string(),
            created_at: Some("2026-08-21T00:00:00Z".to_string()),
        };
        rqctx.context().volumes.lock().await.push(volume.clone());
        Ok(HttpResponseOk(VolumeEnvelope { volume }))
    }

    async fn get_volume(
        rqctx: RequestContext<Self::Context>,
        path: Path<VolumePath>,
    ) -> Result<HttpResponseOk<VolumeEnvelope>, HttpError> {
        let path = path.into_inner();
        let volumes = rqctx.context().volumes.lock().await;
        let volume = volumes
            .iter()
            .find(|v| v.id == path.volume_id)
            .ok_or_else(|| volume_not_found(&path.volume_id))?;
        Ok(HttpResponseOk(VolumeEnvelope { volume: volume.clone() }))
    }

    async fn delete_volume(
        rqctx: RequestContext<Self::Context>,
        path: Path<VolumePath>,
    ) -> Result<Response<Body>, HttpError> {
        let path = path.into_inner();
        let mut volumes = rqctx.context().volumes.lock().await;
        let before = volumes.len();
        volumes.retain(|v| v.id != path.volume_id);
        if volumes.len() == before {
            return Err(volume_not_found(&path.volume_id));
        }
        accepted_empty()
    }
}

fn volume_not_found(volume_id: &str) -> HttpError {
    HttpError::for_not_found(None, format!("volume not found: {volume_id}"))
}

// ============================================================================
// API Descriptions
// ============================================================================

/// Create the Dropshot API description for the stub compute backend
pub fn compute_api_description(
) -> Result<dropshot::ApiDescription<Arc<ComputeStubContext>>, String> {
    compute_api::compute_api_mod::api_description::<StubComputeApi>().map_err(|e| e.to_string())
}

/// Create the Dropshot API description for the stub volume backend
pub fn volume_api_description() -> Result<dropshot::ApiDescription<Arc<VolumeStubContext>>, String>
{
    volume_api::volume_api_mod::api_description::<StubVolumeApi>().map_err(|e| e.to_string())
}

// ============================================================================
// Tests
// ============================================================================

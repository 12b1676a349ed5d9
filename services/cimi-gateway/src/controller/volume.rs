// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Volumes
//!
//! The one resource family served by the second backend. Capacity is the
//! unit seam: CIMI documents carry kilobytes, the backend speaks whole
//! gigabytes, so reads multiply and creates divide (rounding up, never
//! below one).
//!
//! Create is stricter than the other writes: the body must identify
//! itself as a volume-create document, either by its wrapping element or
//! by its `resourceURI` discriminator, and any top-level member outside
//! the accepted set rejects the whole request.

use cimi_document::mapping::{first_unknown_key, lookup, match_up};
use cimi_document::status::volume_state;
use cimi_document::{EntityMetadata, CIMI_NAMESPACE};
use http::StatusCode;
use serde_json::{json, Value};

use super::{
    operation, resource_uri, translate_state, unwrap_root, value_text, value_u64, ResponseData,
    Scope,
};
use crate::error::CimiError;

const CREATE_KEYS: &[&str] = &["resourceURI", "name", "description", "volumeTemplate"];

fn volume_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("Volume", &["resourceURI"])
        .attribute("Collection", &["resourceURI"])
        .attribute("operation", &["rel", "href"])
        .attribute("property", &["key"])
        .plural("volumes", "Volume")
        .sequence(
            "Volume",
            &[
                "id",
                "name",
                "description",
                "created",
                "updated",
                "property",
                "state",
                "type",
                "capacity",
                "operations",
            ],
        )
        .sequence("Collection", &["id", "count", "volumes", "operations"])
}

fn map_volume(scope: &Scope<'_>, volume_id: &str, volume: &Value) -> Value {
    let href = scope.cimi_id(&format!("volume/{volume_id}"));
    let mut body = json!({"id": href});
    match_up(&mut body, volume, "name", "display_name");
    match_up(&mut body, volume, "description", "display_description");
    match_up(&mut body, volume, "created", "created_at");
    match_up(&mut body, volume, "state", "status");
    translate_state(&mut body, "state", volume_state);
    body["type"] = json!(format!("{CIMI_NAMESPACE}/mapped"));
    if let Some(size) = volume.get("size").and_then(value_u64) {
        body["capacity"] = json!(size * 1_000_000);
    }
    body["operations"] = json!([operation("edit", &href), operation("delete", &href)]);
    body["resourceURI"] = Value::String(resource_uri("Volume"));
    body
}

/// Backend size in whole gigabytes for a CIMI capacity in kilobytes.
fn backend_size_gb(capacity_kb: u64) -> u64 {
    capacity_kb.div_ceil(1_000_000).max(1)
}

/// Unwrap and validate a volume-create document. The wrapping element and
/// the `resourceURI` discriminator are alternatives; a body with neither
/// could be anything, so it is refused.
fn create_data(document: Value) -> Result<Value, CimiError> {
    let identified = document.get("VolumeCreate").is_some_and(Value::is_object)
        || document.get("resourceURI").and_then(Value::as_str)
            == Some(&format!("{CIMI_NAMESPACE}/VolumeCreate"));
    if !identified {
        return Err(CimiError::BadRequest);
    }
    let data = unwrap_root(document, "VolumeCreate");
    let Some(map) = data.as_object() else {
        return Err(CimiError::BadRequest);
    };
    if let Some(unknown) = first_unknown_key(map, CREATE_KEYS) {
        tracing::debug!(key = unknown, "volume create carries an unknown member");
        return Err(CimiError::BadRequest);
    }
    Ok(data)
}

/// GET `/{tenant}/volume/{id}`
///
/// A backend 404 becomes an empty CIMI 404: the volume id namespace is
/// this gateway's, so the not-found answer should be its own, not the
/// backend's error document.
pub async fn get(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let volume_id = scope.param(0)?;
    let url = scope.volume_url(&format!("volumes/{volume_id}"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if response.status == StatusCode::NOT_FOUND {
        return Ok(ResponseData::empty(StatusCode::NOT_FOUND));
    }
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;
    let volume = document.get("volume").cloned().unwrap_or_else(|| json!({}));
    let body = map_volume(scope, volume_id, &volume);
    scope.rendered(StatusCode::OK, "Volume", &body, &volume_metadata())
}

/// GET `/{tenant}/volumecollection`
pub async fn get_collection(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let url = scope.volume_url("volumes")?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if response.status == StatusCode::NOT_FOUND {
        return Ok(ResponseData::empty(StatusCode::NOT_FOUND));
    }
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;

    let mut entries = Vec::new();
    for volume in document
        .get("volumes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(volume_id) = volume.get("id").and_then(value_text) else {
            continue;
        };
        let mut entry = json!({"id": scope.cimi_id(&format!("volume/{volume_id}"))});
        match_up(&mut entry, volume, "name", "display_name");
        entry["resourceURI"] = Value::String(resource_uri("Volume"));
        entries.push(entry);
    }

    let count = entries.len();
    let collection_id = scope.cimi_id("volumecollection");
    let body = json!({
        "id": collection_id,
        "resourceURI": resource_uri("VolumeCollection"),
        "volumes": entries,
        "count": count,
        "operations": [operation("add", &collection_id)],
    });
    scope.rendered(StatusCode::OK, "Collection", &body, &volume_metadata())
}

/// POST `/{tenant}/volumecollection` with a `VolumeCreate` document
pub async fn create(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let data = create_data(scope.document()?)?;

    let Some(capacity_kb) =
        lookup(&data, "volumeTemplate/volumeConfig/capacity").and_then(value_u64)
    else {
        return Err(CimiError::BadRequest);
    };

    let mut volume = json!({"size": backend_size_gb(capacity_kb)});
    match_up(&mut volume, &data, "display_name", "name");
    match_up(&mut volume, &data, "display_description", "description");

    let url = scope.volume_url("volumes")?;
    let response = scope
        .backend
        .post(&url, scope.auth_token, &json!({"volume": volume}))
        .await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let created = response.json()?;
    let Some(volume_id) = created.pointer("/volume/id").and_then(value_text) else {
        return Err(CimiError::Internal);
    };
    let created_volume = created.get("volume").cloned().unwrap_or_else(|| json!({}));
    let body = map_volume(scope, &volume_id, &created_volume);
    scope.rendered(StatusCode::CREATED, "Volume", &body, &volume_metadata())
}

/// DELETE `/{tenant}/volume/{id}`
///
/// The backend acknowledges deletion asynchronously; any success becomes
/// a plain CIMI 200.
pub async fn delete(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let volume_id = scope.param(0)?;
    let url = scope.volume_url(&format!("volumes/{volume_id}"))?;
    let response = scope.backend.delete(&url, scope.auth_token).await?;
    if response.is_success() {
        return Ok(ResponseData::empty(StatusCode::OK));
    }
    Ok(ResponseData::passthrough(response))
}

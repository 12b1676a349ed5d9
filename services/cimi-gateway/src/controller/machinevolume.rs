// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Machine-volume attachments
//!
//! Attachments live under a machine on the compute backend, not on the
//! volume service. Their CIMI ids carry both parents, machine then
//! attachment, and each document links across to the volume resource it
//! binds. Attach is the only create in the system that answers with a
//! `Location` header, since the new attachment's id is not knowable from
//! the request.

use cimi_document::mapping::{get_href, last_segment, match_up};
use cimi_document::EntityMetadata;
use http::StatusCode;
use serde_json::{json, Value};

use super::{operation, resource_uri, unwrap_root, value_text, ResponseData, Scope};
use crate::error::CimiError;

fn attachment_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("MachineVolume", &["resourceURI"])
        .attribute("Collection", &["resourceURI"])
        .attribute("volume", &["href"])
        .attribute("operation", &["rel", "href"])
        .plural("machineVolumes", "MachineVolume")
        .sequence(
            "MachineVolume",
            &["id", "name", "description", "initialLocation", "volume", "operations"],
        )
        .sequence(
            "Collection",
            &["id", "count", "machineVolumes", "operations"],
        )
}

fn map_attachment(
    scope: &Scope<'_>,
    machine_ref: &str,
    attachment_ref: &str,
    attachment: &Value,
) -> Value {
    let href = scope.cimi_id(&format!("machinevolume/{machine_ref}/{attachment_ref}"));
    let mut body = json!({"id": href});
    match_up(&mut body, attachment, "initialLocation", "device");
    if let Some(volume_id) = attachment.get("volumeId").and_then(value_text) {
        body["volume"] = json!({"href": scope.cimi_id(&format!("volume/{volume_id}"))});
    }
    body["operations"] = json!([operation("edit", &href), operation("delete", &href)]);
    body["resourceURI"] = Value::String(resource_uri("MachineVolume"));
    body
}

/// GET `/{tenant}/machinevolume/{machineId}/{attachmentId}`
pub async fn get(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let attachment_id = scope.param(1)?;
    let url = scope.compute_url(&format!(
        "servers/{machine_id}/os-volume_attachments/{attachment_id}"
    ))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;
    let attachment = document
        .get("volumeAttachment")
        .cloned()
        .unwrap_or_else(|| json!({}));

    // The backend echoes both parents; the path is the fallback.
    let machine_ref = attachment
        .get("serverId")
        .and_then(value_text)
        .unwrap_or_else(|| machine_id.to_string());
    let attachment_ref = attachment
        .get("id")
        .and_then(value_text)
        .unwrap_or_else(|| attachment_id.to_string());

    let body = map_attachment(scope, &machine_ref, &attachment_ref, &attachment);
    scope.rendered(StatusCode::OK, "MachineVolume", &body, &attachment_metadata())
}

/// DELETE `/{tenant}/machinevolume/{machineId}/{attachmentId}`
pub async fn delete(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let attachment_id = scope.param(1)?;
    let url = scope.compute_url(&format!(
        "servers/{machine_id}/os-volume_attachments/{attachment_id}"
    ))?;
    let response = scope.backend.delete(&url, scope.auth_token).await?;
    Ok(ResponseData::passthrough(response))
}

/// GET `/{tenant}/machinevolumecollection/{machineId}`
pub async fn get_collection(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let url = scope.compute_url(&format!("servers/{machine_id}/os-volume_attachments"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;

    let mut entries = Vec::new();
    for attachment in document
        .get("volumeAttachments")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(attachment_id) = attachment.get("id").and_then(value_text) else {
            continue;
        };
        let machine_ref = attachment
            .get("serverId")
            .and_then(value_text)
            .unwrap_or_else(|| machine_id.to_string());
        entries.push(map_attachment(scope, &machine_ref, &attachment_id, attachment));
    }

    let count = entries.len();
    let collection_id = scope.cimi_id(&format!("machinevolumecollection/{machine_id}"));
    let body = json!({
        "id": collection_id,
        "resourceURI": resource_uri("MachineVolumeCollection"),
        "machineVolumes": entries,
        "count": count,
        "operations": [operation("add", &collection_id)],
    });
    scope.rendered(StatusCode::OK, "Collection", &body, &attachment_metadata())
}

/// POST `/{tenant}/machinevolumecollection/{machineId}` with a
/// `MachineVolume` document
pub async fn create(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let data = unwrap_root(scope.document()?, "MachineVolume");

    let Some(volume_href) = get_href(&data, "volume") else {
        return Err(CimiError::MalformedBody);
    };
    let volume_id = last_segment(volume_href);
    let Some(device) = data
        .get("initialLocation")
        .and_then(Value::as_str)
        .filter(|device| !device.is_empty())
    else {
        return Err(CimiError::MalformedBody);
    };

    let url = scope.compute_url(&format!("servers/{machine_id}/os-volume_attachments"))?;
    let payload = json!({"volumeAttachment": {"volumeId": volume_id, "device": device}});
    let response = scope.backend.post(&url, scope.auth_token, &payload).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }

    let created = response.json()?;
    let attachment = created
        .get("volumeAttachment")
        .cloned()
        .unwrap_or_else(|| json!({}));
    let Some(attachment_id) = attachment.get("id").and_then(value_text) else {
        return Err(CimiError::Internal);
    };
    let machine_ref = attachment
        .get("serverId")
        .and_then(value_text)
        .unwrap_or_else(|| machine_id.to_string());

    let body = map_attachment(scope, &machine_ref, &attachment_id, &attachment);
    let location = format!(
        "{}/{}",
        scope.config.request_prefix,
        body["id"].as_str().unwrap_or_default()
    );
    Ok(scope
        .rendered(StatusCode::CREATED, "MachineVolume", &body, &attachment_metadata())?
        .with_location(location))
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Machine images
//!
//! Read-only view over backend images. Image status has its own
//! vocabulary, narrower than the machine one.

use cimi_document::mapping::match_up;
use cimi_document::status::image_state;
use cimi_document::EntityMetadata;
use http::StatusCode;
use serde_json::{json, Value};

use super::{resource_uri, translate_state, value_text, ResponseData, Scope};
use crate::error::CimiError;

fn image_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("MachineImage", &["resourceURI"])
        .attribute("Collection", &["resourceURI"])
        .plural("machineImages", "MachineImage")
        .sequence(
            "MachineImage",
            &[
                "id",
                "name",
                "description",
                "created",
                "updated",
                "property",
                "state",
                "imageLocation",
            ],
        )
        .sequence("Collection", &["id", "count", "machineImages", "operations"])
}

/// GET `/{tenant}/machineimage/{id}`
pub async fn get(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let image_id = scope.param(0)?;
    let url = scope.compute_url(&format!("images/{image_id}"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;
    let image = document.get("image").cloned().unwrap_or_else(|| json!({}));

    let mut body = json!({"id": scope.cimi_id(&format!("machineimage/{image_id}"))});
    match_up(&mut body, &image, "name", "name");
    match_up(&mut body, &image, "created", "created");
    match_up(&mut body, &image, "updated", "updated");
    match_up(&mut body, &image, "state", "status");
    translate_state(&mut body, "state", image_state);
    body["imageLocation"] = body["id"].clone();
    body["resourceURI"] = Value::String(resource_uri("MachineImage"));

    scope.rendered(StatusCode::OK, "MachineImage", &body, &image_metadata())
}

/// GET `/{tenant}/machineimagecollection`
pub async fn get_collection(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let url = scope.compute_url("images")?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;

    let mut entries = Vec::new();
    for image in document
        .get("images")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(image_id) = image.get("id").and_then(value_text) else {
            continue;
        };
        let mut entry = json!({
            "id": scope.cimi_id(&format!("machineimage/{image_id}")),
        });
        match_up(&mut entry, image, "name", "name");
        entry["resourceURI"] = Value::String(resource_uri("MachineImage"));
        entries.push(entry);
    }

    let count = entries.len();
    let body = json!({
        "id": scope.cimi_id("machineimagecollection"),
        "resourceURI": resource_uri("MachineImageCollection"),
        "machineImages": entries,
        "count": count,
    });
    scope.rendered(StatusCode::OK, "Collection", &body, &image_metadata())
}

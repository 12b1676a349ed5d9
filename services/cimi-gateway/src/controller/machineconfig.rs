// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Machine configurations
//!
//! Read-only view over backend flavors. Unlike the machine document,
//! configuration memory stays in the backend's own MB unit and disk
//! capacity scales GB to MB.

use cimi_document::mapping::match_up;
use cimi_document::EntityMetadata;
use http::StatusCode;
use serde_json::{json, Value};

use super::{resource_uri, value_text, ResponseData, Scope};
use crate::error::CimiError;

fn config_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("MachineConfiguration", &["resourceURI"])
        .attribute("Collection", &["resourceURI"])
        .plural("machineConfigurations", "MachineConfiguration")
        .sequence(
            "MachineConfiguration",
            &["id", "name", "description", "created", "updated", "property", "cpu", "memory", "disks"],
        )
        .sequence(
            "Collection",
            &["id", "count", "machineConfigurations", "operations"],
        )
}

fn map_flavor(scope: &Scope<'_>, flavor_id: &str, flavor: &Value) -> Value {
    let mut body = json!({
        "id": scope.cimi_id(&format!("machineconfiguration/{flavor_id}")),
    });
    match_up(&mut body, flavor, "name", "name");
    match_up(&mut body, flavor, "cpu", "vcpus");
    match_up(&mut body, flavor, "memory", "ram");
    if let Some(disk) = flavor.get("disk").and_then(Value::as_u64) {
        body["disks"] = json!([{"capacity": disk * 1000}]);
    }
    body["resourceURI"] = Value::String(resource_uri("MachineConfiguration"));
    body
}

/// GET `/{tenant}/machineconfiguration/{id}`
pub async fn get(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let flavor_id = scope.param(0)?;
    let url = scope.compute_url(&format!("flavors/{flavor_id}"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;
    let flavor = document.get("flavor").cloned().unwrap_or_else(|| json!({}));

    let body = map_flavor(scope, flavor_id, &flavor);
    scope.rendered(StatusCode::OK, "MachineConfiguration", &body, &config_metadata())
}

/// GET `/{tenant}/machineconfigurationcollection`
pub async fn get_collection(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let url = scope.compute_url("flavors/detail")?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;

    let mut entries = Vec::new();
    for flavor in document
        .get("flavors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(flavor_id) = flavor.get("id").and_then(value_text) else {
            continue;
        };
        entries.push(map_flavor(scope, &flavor_id, flavor));
    }

    let count = entries.len();
    let body = json!({
        "id": scope.cimi_id("machineconfigurationcollection"),
        "resourceURI": resource_uri("MachineConfigurationCollection"),
        "machineConfigurations": entries,
        "count": count,
    });
    scope.rendered(StatusCode::OK, "Collection", &body, &config_metadata())
}

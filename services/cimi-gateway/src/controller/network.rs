// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Network interface collections
//!
//! Interfaces are not a backend resource of their own: they are carved out
//! of the address map embedded in the server document. Each named address
//! group becomes one interface entry, private before public, and groups
//! without addresses produce no entry at all.

use cimi_document::mapping::lookup;
use cimi_document::EntityMetadata;
use http::StatusCode;
use serde_json::{json, Value};

use super::{resource_uri, ResponseData, Scope};
use crate::error::CimiError;

fn interface_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("Collection", &["resourceURI"])
        .attribute("Entry", &["resourceURI"])
        .attribute("addresses", &["href"])
        .plural("entries", "Entry")
        .sequence("Collection", &["id", "entries"])
        .sequence("Entry", &["id", "addresses"])
}

fn interface_entry(scope: &Scope<'_>, machine_id: &str, group: &str) -> Value {
    let mut entry = json!({
        "id": scope.cimi_id(&format!(
            "networkinterfacescollectionentry/{machine_id}/{group}"
        )),
        "addresses": {
            "href": scope.cimi_id(&format!(
                "machinenetworkinterfaceaddressescollection/{machine_id}/{group}"
            )),
        },
    });
    entry["resourceURI"] = Value::String(resource_uri("NetworkInterfacesCollectionEntry"));
    entry
}

/// GET `/{tenant}/networkinterfacescollection/{machineId}`
pub async fn get_collection(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let url = scope.compute_url(&format!("servers/{machine_id}"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;
    let server = document.get("server").cloned().unwrap_or_else(|| json!({}));

    let mut entries = Vec::new();
    for group in ["private", "public"] {
        let populated = lookup(&server, &format!("addresses/{group}"))
            .and_then(Value::as_array)
            .is_some_and(|addresses| !addresses.is_empty());
        if populated {
            entries.push(interface_entry(scope, machine_id, group));
        }
    }

    let body = json!({
        "id": scope.cimi_id(&format!("networkinterfacescollection/{machine_id}")),
        "resourceURI": resource_uri("NetworkInterfacesCollection"),
        "entries": entries,
    });
    scope.rendered(StatusCode::OK, "Collection", &body, &interface_metadata())
}

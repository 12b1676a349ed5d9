// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Cloud entry point
//!
//! The discovery document CIMI clients fetch first. Composed entirely from
//! configuration; the only resource that makes no backend call.

use cimi_document::EntityMetadata;
use http::StatusCode;
use serde_json::{json, Value};

use super::{resource_uri, ResponseData, Scope};
use crate::error::CimiError;

fn entry_point_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("CloudEntryPoint", &["resourceURI"])
        .attribute("machines", &["href"])
        .attribute("machineConfigs", &["href"])
        .attribute("machineImages", &["href"])
        .attribute("volumes", &["href"])
        .sequence(
            "CloudEntryPoint",
            &[
                "id",
                "name",
                "description",
                "created",
                "updated",
                "property",
                "baseURI",
                "machines",
                "machineConfigs",
                "machineImages",
                "volumes",
                "operations",
            ],
        )
}

/// GET `/{tenant}/cloudentrypoint`
pub async fn get(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let mut body = json!({
        "id": scope.cimi_id("cloudentrypoint"),
        "name": "CloudEntryPoint",
        "description": "Cloud Entry Point",
    });
    if let Some(host) = scope.host {
        body["baseURI"] = Value::String(format!(
            "http://{}{}/",
            host, scope.config.request_prefix
        ));
    }
    body["machines"] = json!({"href": scope.cimi_id("machinecollection")});
    body["machineConfigs"] = json!({"href": scope.cimi_id("machineconfigurationcollection")});
    body["machineImages"] = json!({"href": scope.cimi_id("machineimagecollection")});
    body["volumes"] = json!({"href": scope.cimi_id("volumecollection")});
    body["resourceURI"] = Value::String(resource_uri("CloudEntryPoint"));

    scope.rendered(StatusCode::OK, "CloudEntryPoint", &body, &entry_point_metadata())
}

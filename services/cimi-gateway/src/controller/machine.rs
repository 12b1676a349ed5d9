// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Machines
//!
//! The widest resource family: single GET enriches the backend server
//! with flavor-derived capacity fields, collection GET batches one flavor
//! list for every entry, POST on the collection creates, POST on a single
//! machine runs a lifecycle action, DELETE forwards.
//!
//! Lifecycle actions are double-keyed: the same CIMI action verb maps to
//! different backend operations depending on the server's current backend
//! status, and a pair with no mapping is an invalid request for that
//! state, answered 501 rather than silently ignored.

use std::collections::HashMap;

use cimi_document::mapping::{last_segment, lookup, match_up, truthy};
use cimi_document::status::machine_state;
use cimi_document::{EntityMetadata, CIMI_NAMESPACE};
use http::StatusCode;
use serde_json::{json, Map, Value};

use super::{
    operation, resource_uri, translate_state, unwrap_root, value_text, ResponseData, Scope,
};
use crate::backend::BackendResponse;
use crate::error::CimiError;

fn machine_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("Machine", &["resourceURI"])
        .attribute("Collection", &["resourceURI"])
        .attribute("networkInterfaces", &["href"])
        .attribute("volumes", &["href"])
        .attribute("operation", &["rel", "href"])
        .attribute("property", &["key"])
        .plural("machines", "Machine")
        .sequence(
            "Machine",
            &[
                "id",
                "name",
                "description",
                "created",
                "updated",
                "property",
                "state",
                "cpu",
                "memory",
                "disks",
                "networkInterfaces",
                "volumes",
                "credentials",
                "operations",
            ],
        )
        .sequence("Collection", &["id", "count", "machines", "operations"])
}

/// Backend operation for a lifecycle action, keyed by the server's
/// current backend status and the action URI's trailing verb.
fn backend_operation(status: &str, action: &str) -> Option<&'static str> {
    match (status, action) {
        ("ACTIVE", "stop") => Some("os-stop"),
        ("ACTIVE", "restart") => Some("reboot"),
        ("ACTIVE", "pause") => Some("pause"),
        ("ACTIVE", "suspend") => Some("suspend"),
        ("SHUTOFF", "start") => Some("os-start"),
        ("PAUSED", "start") => Some("unpause"),
        ("SUSPENDED", "start") => Some("resume"),
        _ => None,
    }
}

/// Actions a CIMI client may usefully request next, given the current
/// backend status. Delete is always available.
fn lifecycle_operations(scope: &Scope<'_>, machine_id: &str, status: &str) -> Vec<Value> {
    let href = scope.cimi_id(&format!("machine/{machine_id}"));
    let mut verbs: Vec<&str> = Vec::new();
    match status {
        "ACTIVE" => verbs.extend(["stop", "restart", "pause", "suspend"]),
        "SHUTOFF" | "PAUSED" | "SUSPENDED" => verbs.push("start"),
        _ => {}
    }
    let mut operations: Vec<Value> = verbs
        .iter()
        .map(|verb| operation(&format!("{CIMI_NAMESPACE}/action/{verb}"), &href))
        .collect();
    operations.push(operation("delete", &href));
    operations
}

enum MachineRead {
    Mapped(Value),
    Passthrough(BackendResponse),
}

/// Fetch one server and build its machine document. The flavor lookup
/// only enriches: if it fails the document ships without capacity fields.
async fn read_machine(scope: &Scope<'_>, machine_id: &str) -> Result<MachineRead, CimiError> {
    let url = scope.compute_url(&format!("servers/{machine_id}"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(MachineRead::Passthrough(response));
    }
    let document = response.json()?;
    let server = document.get("server").cloned().unwrap_or_else(|| json!({}));

    let mut body = json!({"id": scope.cimi_id(&format!("machine/{machine_id}"))});
    match_up(&mut body, &server, "name", "name");
    match_up(&mut body, &server, "created", "created");
    match_up(&mut body, &server, "updated", "updated");
    match_up(&mut body, &server, "state", "status");
    translate_state(&mut body, "state", machine_state);

    if let Some(flavor_id) = server.pointer("/flavor/id").and_then(value_text) {
        if let Ok(flavor_url) = scope.compute_url(&format!("flavors/{flavor_id}")) {
            if let Ok(flavor_response) = scope.backend.get(&flavor_url, scope.auth_token).await {
                if flavor_response.is_success() {
                    if let Ok(flavor_document) = flavor_response.json() {
                        let flavor = flavor_document
                            .get("flavor")
                            .cloned()
                            .unwrap_or_else(|| json!({}));
                        match_up(&mut body, &flavor, "cpu", "vcpus");
                        if let Some(ram) = flavor.get("ram").and_then(Value::as_u64) {
                            body["memory"] = json!(ram * 1000);
                        }
                        if let Some(disk) = flavor.get("disk").and_then(Value::as_u64) {
                            body["disks"] =
                                json!([{"capacity": disk * 1_000_000, "format": ""}]);
                        }
                    }
                }
            }
        }
    }

    body["networkInterfaces"] = json!({
        "href": scope.cimi_id(&format!("networkinterfacescollection/{machine_id}")),
    });
    body["volumes"] = json!({
        "href": scope.cimi_id(&format!("machinevolumecollection/{machine_id}")),
    });

    let status = server.get("status").and_then(Value::as_str).unwrap_or("");
    body["operations"] = Value::Array(lifecycle_operations(scope, machine_id, status));
    body["resourceURI"] = Value::String(resource_uri("Machine"));
    Ok(MachineRead::Mapped(body))
}

/// GET `/{tenant}/machine/{id}`
pub async fn get(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    match read_machine(scope, machine_id).await? {
        MachineRead::Mapped(body) => {
            scope.rendered(StatusCode::OK, "Machine", &body, &machine_metadata())
        }
        MachineRead::Passthrough(response) => Ok(ResponseData::passthrough(response)),
    }
}

/// POST `/{tenant}/machine/{id}` with an `Action` document
pub async fn post(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let action_document = unwrap_root(scope.document()?, "Action");
    let Some(action_uri) = action_document.get("action").and_then(Value::as_str) else {
        return Err(CimiError::NotImplemented);
    };
    let verb = last_segment(action_uri);

    // The mapping depends on where the server is now.
    let server_url = scope.compute_url(&format!("servers/{machine_id}"))?;
    let current = scope.backend.get(&server_url, scope.auth_token).await?;
    if !current.is_success() {
        return Ok(ResponseData::passthrough(current));
    }
    let server_document = current.json()?;
    let status = server_document
        .pointer("/server/status")
        .and_then(Value::as_str)
        .unwrap_or("");

    let Some(backend_op) = backend_operation(status, verb) else {
        tracing::debug!(status, verb, "no lifecycle mapping for action");
        return Err(CimiError::NotImplemented);
    };

    let payload = if backend_op == "reboot" {
        let reboot_type = if action_document.get("force").is_some_and(truthy) {
            "HARD"
        } else {
            "SOFT"
        };
        json!({"reboot": {"type": reboot_type}})
    } else {
        json!({backend_op: Value::Null})
    };

    let action_url = scope.compute_url(&format!("servers/{machine_id}/action"))?;
    let response = scope.backend.post(&action_url, scope.auth_token, &payload).await?;
    if response.is_success() {
        return Ok(ResponseData::empty(StatusCode::ACCEPTED));
    }
    Ok(ResponseData::passthrough(response))
}

/// DELETE `/{tenant}/machine/{id}`
pub async fn delete(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let url = scope.compute_url(&format!("servers/{machine_id}"))?;
    let response = scope.backend.delete(&url, scope.auth_token).await?;
    Ok(ResponseData::passthrough(response))
}

/// GET `/{tenant}/machinecollection`
///
/// One flavor-list call serves every entry; a per-entry flavor fetch
/// would make the collection N+1 against the backend.
pub async fn get_collection(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let url = scope.compute_url("servers/detail")?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;

    let mut flavors: HashMap<String, (Option<u64>, Option<u64>)> = HashMap::new();
    let flavors_url = scope.compute_url("flavors/detail")?;
    if let Ok(flavor_response) = scope.backend.get(&flavors_url, scope.auth_token).await {
        if flavor_response.is_success() {
            if let Ok(flavor_document) = flavor_response.json() {
                for flavor in flavor_document
                    .get("flavors")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                {
                    let Some(flavor_id) = flavor.get("id").and_then(value_text) else {
                        continue;
                    };
                    flavors.insert(
                        flavor_id,
                        (
                            flavor.get("vcpus").and_then(Value::as_u64),
                            flavor.get("ram").and_then(Value::as_u64),
                        ),
                    );
                }
            }
        }
    }

    let mut entries = Vec::new();
    for server in document
        .get("servers")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(server_id) = server.get("id").and_then(value_text) else {
            continue;
        };
        let mut entry = json!({"id": scope.cimi_id(&format!("machine/{server_id}"))});
        match_up(&mut entry, server, "name", "name");
        match_up(&mut entry, server, "created", "created");
        match_up(&mut entry, server, "updated", "updated");
        match_up(&mut entry, server, "state", "status");
        translate_state(&mut entry, "state", machine_state);

        if let Some((vcpus, ram)) = server
            .pointer("/flavor/id")
            .and_then(value_text)
            .and_then(|flavor_id| flavors.get(&flavor_id))
        {
            if let Some(vcpus) = vcpus {
                entry["cpu"] = json!(vcpus);
            }
            if let Some(ram) = ram {
                entry["memory"] = json!(ram * 1000);
            }
        }

        entry["networkInterfaces"] = json!({
            "href": scope.cimi_id(&format!("networkinterfacescollection/{server_id}")),
        });
        entry["volumes"] = json!({
            "href": scope.cimi_id(&format!("machinevolumecollection/{server_id}")),
        });
        entry["resourceURI"] = Value::String(resource_uri("Machine"));
        entries.push(entry);
    }

    let count = entries.len();
    let collection_id = scope.cimi_id("machinecollection");
    let body = json!({
        "id": collection_id,
        "resourceURI": resource_uri("MachineCollection"),
        "machines": entries,
        "count": count,
        "operations": [operation("add", &collection_id)],
    });
    scope.rendered(StatusCode::OK, "Collection", &body, &machine_metadata())
}

/// POST `/{tenant}/machinecollection` with a `MachineCreate` document
pub async fn create(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let data = unwrap_root(scope.document()?, "MachineCreate");

    // Both template references are mandatory; their trailing segment is
    // the backend id.
    let Some(image_href) =
        lookup(&data, "machineTemplate/machineImage/href").and_then(Value::as_str)
    else {
        return Err(CimiError::BadRequest);
    };
    let Some(config_href) =
        lookup(&data, "machineTemplate/machineConfig/href").and_then(Value::as_str)
    else {
        return Err(CimiError::BadRequest);
    };

    let mut server = Map::new();
    if let Some(name) = data.get("name").and_then(Value::as_str) {
        server.insert("name".to_string(), json!(name));
    }
    server.insert("imageRef".to_string(), json!(last_segment(image_href)));
    server.insert("flavorRef".to_string(), json!(last_segment(config_href)));
    if let Some(password) = lookup(&data, "credentials/password").and_then(Value::as_str) {
        if !password.is_empty() {
            server.insert("adminPass".to_string(), json!(password));
        }
    }

    let url = scope.compute_url("servers")?;
    let response = scope
        .backend
        .post(&url, scope.auth_token, &json!({"server": server}))
        .await?;

    match response.status {
        // Synchronous creation: answer with the full machine document.
        StatusCode::CREATED => {
            let created = response.json()?;
            let Some(server_id) = created.pointer("/server/id").and_then(value_text) else {
                return Err(CimiError::Internal);
            };
            match read_machine(scope, &server_id).await? {
                MachineRead::Mapped(body) => {
                    scope.rendered(StatusCode::CREATED, "Machine", &body, &machine_metadata())
                }
                MachineRead::Passthrough(fetch) => Ok(ResponseData::passthrough(fetch)),
            }
        }
        // Asynchronous acceptance: a pending document with the generated
        // credentials, which exist nowhere else after this response.
        StatusCode::ACCEPTED => {
            let created = response.json()?;
            let Some(server_id) = created.pointer("/server/id").and_then(value_text) else {
                return Err(CimiError::Internal);
            };
            let mut body = json!({"id": scope.cimi_id(&format!("machine/{server_id}"))});
            match_up(&mut body, &data, "name", "name");
            match_up(&mut body, &data, "description", "description");
            body["state"] = json!("CREATING");
            if let Some(password) = created.pointer("/server/adminPass").and_then(Value::as_str) {
                body["credentials"] = json!({"userName": "root", "password": password});
            }
            body["resourceURI"] = Value::String(resource_uri("Machine"));
            scope.rendered(StatusCode::ACCEPTED, "Machine", &body, &machine_metadata())
        }
        _ => Ok(ResponseData::passthrough(response)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case("ACTIVE", "stop", Some("os-stop"); "stop a running machine")]
    #[test_case("ACTIVE", "restart", Some("reboot"); "restart a running machine")]
    #[test_case("ACTIVE", "pause", Some("pause"); "pause a running machine")]
    #[test_case("ACTIVE", "suspend", Some("suspend"); "suspend a running machine")]
    #[test_case("SHUTOFF", "start", Some("os-start"); "start a stopped machine")]
    #[test_case("PAUSED", "start", Some("unpause"); "start a paused machine")]
    #[test_case("SUSPENDED", "start", Some("resume"); "start a suspended machine")]
    #[test_case("ACTIVE", "start", None; "start is invalid while running")]
    #[test_case("SHUTOFF", "stop", None; "stop is invalid while stopped")]
    #[test_case("BUILD", "stop", None; "nothing maps during build")]
    fn action_mapping_is_keyed_by_current_status(
        status: &str,
        verb: &str,
        expected: Option<&str>,
    ) {
        assert_eq!(backend_operation(status, verb), expected);
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Network interface addresses
//!
//! Like the interface collection these are views over the server document's
//! address map, one level deeper: the collection lists every address in one
//! named group, the single resource confirms one IP literal inside that
//! group. An IP that does not appear in the group yields a document without
//! an `ip` member rather than an error, the address id the client asked
//! about simply has nothing behind it.

use cimi_document::mapping::lookup;
use cimi_document::EntityMetadata;
use http::StatusCode;
use serde_json::{json, Value};

use super::{resource_uri, value_text, ResponseData, Scope};
use crate::error::CimiError;

fn address_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("Address", &["resourceURI"])
        .attribute("property", &["version"])
        .sequence(
            "Address",
            &["id", "name", "description", "created", "updated", "property", "ip", "hostname"],
        )
}

fn address_collection_metadata() -> EntityMetadata {
    EntityMetadata::new()
        .attribute("Collection", &["resourceURI"])
        .attribute("Entry", &["resourceURI"])
        .attribute("address", &["href"])
        .plural("entries", "Entry")
        .sequence("Collection", &["id", "entries"])
        .sequence("Entry", &["id", "address"])
}

/// The group entry whose `addr` equals the requested IP literal.
fn matched_address<'a>(server: &'a Value, group: &str, ip: &str) -> Option<&'a Value> {
    lookup(server, &format!("addresses/{group}"))?
        .as_array()?
        .iter()
        .find(|entry| entry.get("addr").and_then(Value::as_str) == Some(ip))
}

/// GET `/{tenant}/machinenetworkinterfaceaddress/{machineId}/{key}/{ip}`
pub async fn get(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let group = scope.param(1)?;
    let ip = scope.param(2)?;

    let url = scope.compute_url(&format!("servers/{machine_id}"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;
    let server = document.get("server").cloned().unwrap_or_else(|| json!({}));

    let mut body = json!({
        "id": scope.cimi_id(&format!(
            "machinenetworkinterfaceaddress/{machine_id}/{group}/{ip}"
        )),
    });
    if let Some(address) = matched_address(&server, group, ip) {
        body["ip"] = json!(ip);
        if let Some(version) = address.get("version") {
            body["property"] = json!({"version": version});
        }
    }
    body["resourceURI"] = Value::String(resource_uri("MachineNetworkInterfaceAddress"));
    scope.rendered(StatusCode::OK, "Address", &body, &address_metadata())
}

/// GET `/{tenant}/machinenetworkinterfaceaddressescollection/{machineId}/{key}`
pub async fn get_collection(scope: &Scope<'_>) -> Result<ResponseData, CimiError> {
    let machine_id = scope.param(0)?;
    let group = scope.param(1)?;

    let url = scope.compute_url(&format!("servers/{machine_id}"))?;
    let response = scope.backend.get(&url, scope.auth_token).await?;
    if !response.is_success() {
        return Ok(ResponseData::passthrough(response));
    }
    let document = response.json()?;
    let server = document.get("server").cloned().unwrap_or_else(|| json!({}));

    let mut entries = Vec::new();
    for address in lookup(&server, &format!("addresses/{group}"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
    {
        let Some(ip) = address.get("addr").and_then(value_text) else {
            continue;
        };
        let mut entry = json!({
            "id": scope.cimi_id(&format!(
                "machinenetworkinterfaceaddressescollectionentry/{machine_id}/{group}/{ip}"
            )),
            "address": {
                "href": scope.cimi_id(&format!(
                    "machinenetworkinterfaceaddress/{machine_id}/{group}/{ip}"
                )),
            },
        });
        entry["resourceURI"] =
            Value::String(resource_uri("MachineNetworkInterfaceAddressesCollectionEntry"));
        entries.push(entry);
    }

    let body = json!({
        "id": scope.cimi_id(&format!(
            "machinenetworkinterfaceaddressescollection/{machine_id}/{group}"
        )),
        "resourceURI": resource_uri("MachineNetworkInterfaceAddressesCollection"),
        "entries": entries,
    });
    scope.rendered(
        StatusCode::OK,
        "Collection",
        &body,
        &address_collection_metadata(),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn server() -> Value {
        json!({
            "addresses": {
                "private": [{"addr": "10.0.0.3", "version": 4}],
                "public": [
                    {"addr": "172.24.4.100", "version": 4},
                    {"addr": "2001:db8::5", "version": 6},
                ],
            }
        })
    }

    #[test]
    fn matched_address_finds_the_ip_within_its_group() {
        let server = server();
        let hit = matched_address(&server, "public", "2001:db8::5").unwrap();
        assert_eq!(hit["version"], json!(6));
    }

    #[test]
    fn matched_address_does_not_cross_groups() {
        let server = server();
        assert!(matched_address(&server, "private", "172.24.4.100").is_none());
        assert!(matched_address(&server, "fixed", "10.0.0.3").is_none());
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

// Allow expect/unwrap in tests - they provide clear panic messages on failure
#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Integration tests for the CIMI gateway against the stub backends
//!
//! Each test starts the stub compute and volume servers plus a gateway
//! wired to them on ephemeral ports, then drives the gateway over plain
//! HTTP the way a CIMI client would: JSON and XML bodies, tenant-prefixed
//! paths, and assertions on the translated documents.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use backend_stub_server::{ComputeStubContext, VolumeStubContext, SEED_SERVER_ID, SEED_VOLUME_ID};
use cimi_gateway::config::Config;
use cimi_gateway::ApiContext;

const TENANT: &str = "acme";
const PREFIX: &str = "/cimiv1";
const VERSION_HEADER: &str = "CIMI-Specification-Version";
const NS: &str = "http://schemas.dmtf.org/cimi/1";

// ============================================================================
// Harness
// ============================================================================

struct Gateway {
    /// `http://host:port`, without the CIMI prefix.
    origin: String,
    /// `http://host:port/cimiv1`
    base: String,
    client: reqwest::Client,
    _compute: dropshot::HttpServer<Arc<ComputeStubContext>>,
    _volume: dropshot::HttpServer<Arc<VolumeStubContext>>,
    _gateway: dropshot::HttpServer<Arc<ApiContext>>,
}

impl Gateway {
    fn url(&self, tail: &str) -> String {
        format!("{}/{}/{}", self.base, TENANT, tail)
    }
}

fn dropshot_config() -> dropshot::ConfigDropshot {
    dropshot::ConfigDropshot {
        bind_address: "127.0.0.1:0".parse().expect("loopback bind address"),
        default_request_body_max_bytes: 1024 * 1024,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    }
}

fn start_compute() -> dropshot::HttpServer<Arc<ComputeStubContext>> {
    let api = backend_stub_server::compute_api_description().expect("compute api description");
    let log = dropshot::ConfigLogging::StderrTerminal {
        level: dropshot::ConfigLoggingLevel::Warn,
    }
    .to_logger("compute-stub-test")
    .expect("compute stub logger");
    dropshot::HttpServerStarter::new(
        &dropshot_config(),
        api,
        Arc::new(ComputeStubContext::new()),
        &log,
    )
    .expect("start compute stub")
    .start()
}

fn start_volume() -> dropshot::HttpServer<Arc<VolumeStubContext>> {
    let api = backend_stub_server::volume_api_description().expect("volume api description");
    let log = dropshot::ConfigLogging::StderrTerminal {
        level: dropshot::ConfigLoggingLevel::Warn,
    }
    .to_logger("volume-stub-test")
    .expect("volume stub logger");
    dropshot::HttpServerStarter::new(
        &dropshot_config(),
        api,
        Arc::new(VolumeStubContext::new()),
        &log,
    )
    .expect("start volume stub")
    .start()
}

fn start_gateway(config: Config) -> dropshot::HttpServer<Arc<ApiContext>> {
    let api = cimi_gateway::api_description().expect("gateway api description");
    let log = dropshot::ConfigLogging::StderrTerminal {
        level: dropshot::ConfigLoggingLevel::Warn,
    }
    .to_logger("cimi-gateway-test")
    .expect("gateway logger");
    dropshot::HttpServerStarter::new(
        &dropshot_config(),
        api,
        Arc::new(ApiContext::new(config)),
        &log,
    )
    .expect("start gateway")
    .start()
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().expect("bind address"),
        request_prefix: PREFIX.to_string(),
        // The stubs serve /{tenant}/... without a version segment.
        compute_version_path: String::new(),
        volume_version_path: String::new(),
        compute_endpoint: None,
        volume_endpoint: None,
    }
}

/// Start both stubs and a gateway statically wired to them.
async fn gateway() -> Gateway {
    let compute = start_compute();
    let volume = start_volume();

    let mut config = test_config();
    config.compute_endpoint =
        Some(url::Url::parse(&format!("http://{}", compute.local_addr())).expect("compute url"));
    config.volume_endpoint =
        Some(url::Url::parse(&format!("http://{}", volume.local_addr())).expect("volume url"));

    let server = start_gateway(config);
    let origin = format!("http://{}", server.local_addr());
    let base = format!("{origin}{PREFIX}");

    // Give the servers a moment to be ready
    tokio::time::sleep(Duration::from_millis(50)).await;

    Gateway {
        origin,
        base,
        client: reqwest::Client::new(),
        _compute: compute,
        _volume: volume,
        _gateway: server,
    }
}

async fn get_json(gw: &Gateway, tail: &str) -> (reqwest::StatusCode, Value) {
    let response = gw
        .client
        .get(gw.url(tail))
        .send()
        .await
        .expect("gateway request");
    let status = response.status();
    let body: Value = response.json().await.expect("json response body");
    (status, body)
}

async fn post_json(gw: &Gateway, tail: &str, body: &Value) -> reqwest::Response {
    gw.client
        .post(gw.url(tail))
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .expect("gateway request")
}

fn version_header(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(VERSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

// ============================================================================
// Routing and negotiation
// ============================================================================

#[tokio::test]
async fn unknown_resource_kind_is_not_implemented() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url("disk/1"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 501);
    assert_eq!(version_header(&response), None);
    assert_eq!(response.text().await.expect("body"), "Not implemented");
}

#[tokio::test]
async fn paths_need_a_tenant_and_a_resource() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(format!("{}/{}", gw.base, TENANT))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.expect("body"), "Bad request");
}

#[tokio::test]
async fn put_is_not_implemented_on_any_resource() {
    let gw = gateway().await;

    let response = gw
        .client
        .put(gw.url(&format!("machine/{SEED_SERVER_ID}")))
        .header("Content-Type", "application/json")
        .body("{}")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 501);
    assert_eq!(response.text().await.expect("body"), "Not implemented");
}

#[tokio::test]
async fn resource_tokens_are_case_insensitive() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url("MachineImage/image-0001"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn paths_outside_the_prefix_are_router_not_found() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(format!("{}/other/{}/machine", gw.origin, TENANT))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
    assert_eq!(version_header(&response), None);
}

#[tokio::test]
async fn unsupported_accept_values_fall_back_to_json() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url("cloudentrypoint"))
        .header("Accept", "text/html")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"), "{content_type}");
}

#[tokio::test]
async fn malformed_request_bodies_are_rejected() {
    let gw = gateway().await;

    let response = gw
        .client
        .post(gw.url("machinecollection"))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    assert_eq!(
        response.text().await.expect("body"),
        "Request body can not be parsed, malformed request body"
    );
}

// ============================================================================
// Cloud entry point
// ============================================================================

#[tokio::test]
async fn cloud_entry_point_advertises_the_collections() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url("cloudentrypoint"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    assert_eq!(version_header(&response).as_deref(), Some("1.0.0"));

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["id"], json!(format!("{TENANT}/cloudentrypoint")));
    assert_eq!(body["resourceURI"], json!(format!("{NS}/CloudEntryPoint")));
    assert_eq!(body["baseURI"], json!(format!("{}/", gw.base)));
    assert_eq!(
        body["machines"]["href"],
        json!(format!("{TENANT}/machinecollection"))
    );
    assert_eq!(
        body["machineConfigs"]["href"],
        json!(format!("{TENANT}/machineconfigurationcollection"))
    );
    assert_eq!(
        body["machineImages"]["href"],
        json!(format!("{TENANT}/machineimagecollection"))
    );
    assert_eq!(
        body["volumes"]["href"],
        json!(format!("{TENANT}/volumecollection"))
    );
}

#[tokio::test]
async fn cloud_entry_point_renders_xml_on_request() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url("cloudentrypoint"))
        .header("Accept", "application/xml")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/xml"), "{content_type}");

    let text = response.text().await.expect("body");
    assert!(text.contains("<CloudEntryPoint"), "{text}");
    assert!(text.contains(&format!("xmlns=\"{NS}\"")), "{text}");
    assert!(
        text.contains(&format!("machines href=\"{TENANT}/machinecollection\"")),
        "{text}"
    );
}

// ============================================================================
// Machines
// ============================================================================

#[tokio::test]
async fn machine_get_merges_server_and_flavor_details() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, &format!("machine/{SEED_SERVER_ID}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], json!(format!("{TENANT}/machine/{SEED_SERVER_ID}")));
    assert_eq!(body["name"], json!("demo-vm"));
    assert_eq!(body["state"], json!("STARTED"));
    assert_eq!(body["created"], json!("2026-08-01T10:00:00Z"));

    // m1.tiny: 1 vcpu, 512 MB, 1 GB disk
    assert_eq!(body["cpu"], json!(1));
    assert_eq!(body["memory"], json!(512_000));
    assert_eq!(body["disks"], json!([{"capacity": 1_000_000, "format": ""}]));

    assert_eq!(
        body["networkInterfaces"]["href"],
        json!(format!("{TENANT}/networkinterfacescollection/{SEED_SERVER_ID}"))
    );
    assert_eq!(
        body["volumes"]["href"],
        json!(format!("{TENANT}/machinevolumecollection/{SEED_SERVER_ID}"))
    );
    assert_eq!(body["resourceURI"], json!(format!("{NS}/Machine")));

    // A running machine offers stop/restart/pause/suspend plus delete.
    let rels: Vec<&str> = body["operations"]
        .as_array()
        .expect("operations array")
        .iter()
        .filter_map(|op| op["rel"].as_str())
        .collect();
    assert_eq!(
        rels,
        vec![
            format!("{NS}/action/stop"),
            format!("{NS}/action/restart"),
            format!("{NS}/action/pause"),
            format!("{NS}/action/suspend"),
            "delete".to_string(),
        ]
    );
    assert_eq!(
        body["operations"][0]["href"],
        json!(format!("{TENANT}/machine/{SEED_SERVER_ID}"))
    );
}

#[tokio::test]
async fn machine_get_passes_backend_not_found_through() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url("machine/absent"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
    assert_eq!(version_header(&response), None);
    let text = response.text().await.expect("body");
    assert!(text.contains("not found"), "{text}");
}

#[tokio::test]
async fn machine_collection_batches_the_flavor_lookup() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, "machinecollection").await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], json!(format!("{TENANT}/machinecollection")));
    assert_eq!(body["count"], json!(1));

    let machine = &body["machines"][0];
    assert_eq!(machine["state"], json!("STARTED"));
    assert_eq!(machine["cpu"], json!(1));
    assert_eq!(machine["memory"], json!(512_000));
    assert_eq!(
        machine["volumes"]["href"],
        json!(format!("{TENANT}/machinevolumecollection/{SEED_SERVER_ID}"))
    );

    assert_eq!(body["operations"][0]["rel"], json!("add"));
    assert_eq!(
        body["operations"][0]["href"],
        json!(format!("{TENANT}/machinecollection"))
    );
}

#[tokio::test]
async fn machine_create_returns_a_pending_document_with_credentials() {
    let gw = gateway().await;

    let create = json!({
        "resourceURI": format!("{NS}/MachineCreate"),
        "name": "new-vm",
        "description": "fresh worker",
        "machineTemplate": {
            "machineImage": {"href": format!("{TENANT}/machineimage/image-0001")},
            "machineConfig": {"href": format!("{TENANT}/machineconfiguration/2")},
        },
        "credentials": {"password": "s3cret"},
    });
    let response = post_json(&gw, "machinecollection", &create).await;
    assert_eq!(response.status(), 202);
    assert_eq!(version_header(&response).as_deref(), Some("1.0.0"));

    let body: Value = response.json().await.expect("json body");
    let id = body["id"].as_str().expect("machine id");
    assert!(id.starts_with(&format!("{TENANT}/machine/")), "{id}");
    assert_eq!(body["name"], json!("new-vm"));
    assert_eq!(body["description"], json!("fresh worker"));
    assert_eq!(body["state"], json!("CREATING"));
    assert_eq!(body["credentials"]["userName"], json!("root"));
    assert_eq!(body["credentials"]["password"], json!("s3cret"));

    // The machine is fetchable under its new id afterwards.
    let machine_id = id.rsplit('/').next().expect("trailing id segment");
    let (status, fetched) = get_json(&gw, &format!("machine/{machine_id}")).await;
    assert_eq!(status, 200);
    assert_eq!(fetched["name"], json!("new-vm"));
    // m1.small: 2048 MB
    assert_eq!(fetched["memory"], json!(2_048_000));
}

#[tokio::test]
async fn machine_create_requires_both_template_references() {
    let gw = gateway().await;

    let missing_config = json!({
        "name": "broken",
        "machineTemplate": {
            "machineImage": {"href": format!("{TENANT}/machineimage/image-0001")},
        },
    });
    let response = post_json(&gw, "machinecollection", &missing_config).await;
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.expect("body"), "Bad request");
}

#[tokio::test]
async fn machine_actions_follow_the_current_state() {
    let gw = gateway().await;
    let machine = format!("machine/{SEED_SERVER_ID}");

    // Stop the running machine.
    let stop = json!({
        "resourceURI": format!("{NS}/Action"),
        "action": format!("{NS}/action/stop"),
    });
    let response = post_json(&gw, &machine, &stop).await;
    assert_eq!(response.status(), 202);
    assert_eq!(version_header(&response).as_deref(), Some("1.0.0"));
    assert_eq!(response.text().await.expect("body"), "");

    let (_, body) = get_json(&gw, &machine).await;
    assert_eq!(body["state"], json!("STOPPED"));

    // Stopping a stopped machine has no mapping.
    let response = post_json(&gw, &machine, &stop).await;
    assert_eq!(response.status(), 501);
    assert_eq!(response.text().await.expect("body"), "Not implemented");

    // Start brings it back.
    let start = json!({"action": format!("{NS}/action/start")});
    let response = post_json(&gw, &machine, &start).await;
    assert_eq!(response.status(), 202);
    let (_, body) = get_json(&gw, &machine).await;
    assert_eq!(body["state"], json!("STARTED"));
}

#[tokio::test]
async fn machine_restart_translates_force_to_a_hard_reboot() {
    let gw = gateway().await;

    let restart = json!({
        "action": format!("{NS}/action/restart"),
        "force": true,
    });
    let response = post_json(&gw, &format!("machine/{SEED_SERVER_ID}"), &restart).await;
    assert_eq!(response.status(), 202);
}

#[tokio::test]
async fn machine_actions_accept_xml_documents() {
    let gw = gateway().await;

    let body = format!(
        "<Action xmlns=\"{NS}\"><action>{NS}/action/pause</action></Action>"
    );
    let response = gw
        .client
        .post(gw.url(&format!("machine/{SEED_SERVER_ID}")))
        .header("Content-Type", "application/xml")
        .body(body)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 202);

    let (_, machine) = get_json(&gw, &format!("machine/{SEED_SERVER_ID}")).await;
    assert_eq!(machine["state"], json!("PAUSED"));
}

#[tokio::test]
async fn machine_delete_forwards_to_the_backend() {
    let gw = gateway().await;

    let response = gw
        .client
        .delete(gw.url(&format!("machine/{SEED_SERVER_ID}")))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 204);

    let after = gw
        .client
        .get(gw.url(&format!("machine/{SEED_SERVER_ID}")))
        .send()
        .await
        .expect("request");
    assert_eq!(after.status(), 404);
}

// ============================================================================
// Machine configurations and images
// ============================================================================

#[tokio::test]
async fn machine_configuration_reports_flavor_capacity_unscaled() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, "machineconfiguration/1").await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], json!(format!("{TENANT}/machineconfiguration/1")));
    assert_eq!(body["name"], json!("m1.tiny"));
    assert_eq!(body["cpu"], json!(1));
    assert_eq!(body["memory"], json!(512));
    assert_eq!(body["disks"], json!([{"capacity": 1000}]));
    assert_eq!(
        body["resourceURI"],
        json!(format!("{NS}/MachineConfiguration"))
    );
}

#[tokio::test]
async fn machine_configuration_collection_lists_every_flavor() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, "machineconfigurationcollection").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["machineConfigurations"][1]["memory"], json!(2048));
    assert_eq!(body["machineConfigurations"][1]["disks"], json!([{"capacity": 20_000}]));
}

#[tokio::test]
async fn machine_image_translates_state_and_points_location_at_itself() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, "machineimage/image-0001").await;
    assert_eq!(status, 200);
    assert_eq!(body["name"], json!("cirros-0.6"));
    assert_eq!(body["state"], json!("AVAILABLE"));
    assert_eq!(body["imageLocation"], body["id"]);
    assert_eq!(body["resourceURI"], json!(format!("{NS}/MachineImage")));

    // A still-uploading image reports CREATING.
    let (_, saving) = get_json(&gw, "machineimage/image-0002").await;
    assert_eq!(saving["state"], json!("CREATING"));
}

#[tokio::test]
async fn machine_image_collection_counts_the_images() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, "machineimagecollection").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], json!(2));
    assert_eq!(
        body["machineImages"][0]["id"],
        json!(format!("{TENANT}/machineimage/image-0001"))
    );
    assert_eq!(body["machineImages"][0]["name"], json!("cirros-0.6"));
    assert_eq!(
        body["machineImages"][0]["resourceURI"],
        json!(format!("{NS}/MachineImage"))
    );
}

// ============================================================================
// Network interfaces and addresses
// ============================================================================

#[tokio::test]
async fn network_interfaces_partition_private_before_public() {
    let gw = gateway().await;

    let (status, body) =
        get_json(&gw, &format!("networkinterfacescollection/{SEED_SERVER_ID}")).await;
    assert_eq!(status, 200);
    assert_eq!(
        body["id"],
        json!(format!("{TENANT}/networkinterfacescollection/{SEED_SERVER_ID}"))
    );

    let entries = body["entries"].as_array().expect("entries array");
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[0]["id"],
        json!(format!(
            "{TENANT}/networkinterfacescollectionentry/{SEED_SERVER_ID}/private"
        ))
    );
    assert_eq!(
        entries[0]["addresses"]["href"],
        json!(format!(
            "{TENANT}/machinenetworkinterfaceaddressescollection/{SEED_SERVER_ID}/private"
        ))
    );
    assert_eq!(
        entries[1]["id"],
        json!(format!(
            "{TENANT}/networkinterfacescollectionentry/{SEED_SERVER_ID}/public"
        ))
    );
}

#[tokio::test]
async fn address_collection_lists_the_ips_of_one_group() {
    let gw = gateway().await;

    let (status, body) = get_json(
        &gw,
        &format!("machinenetworkinterfaceaddressescollection/{SEED_SERVER_ID}/public"),
    )
    .await;
    assert_eq!(status, 200);

    let entries = body["entries"].as_array().expect("entries array");
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0]["address"]["href"],
        json!(format!(
            "{TENANT}/machinenetworkinterfaceaddress/{SEED_SERVER_ID}/public/172.24.4.100"
        ))
    );
}

#[tokio::test]
async fn address_get_confirms_the_ip_within_its_group() {
    let gw = gateway().await;

    let (status, body) = get_json(
        &gw,
        &format!("machinenetworkinterfaceaddress/{SEED_SERVER_ID}/private/10.0.0.3"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["ip"], json!("10.0.0.3"));
    assert_eq!(body["property"]["version"], json!(4));

    // An IP the group does not hold produces a document without one.
    let (status, body) = get_json(
        &gw,
        &format!("machinenetworkinterfaceaddress/{SEED_SERVER_ID}/private/10.9.9.9"),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body.get("ip").is_none(), "{body}");
}

#[tokio::test]
async fn address_version_renders_as_an_xml_attribute() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url(&format!(
            "machinenetworkinterfaceaddress/{SEED_SERVER_ID}/private/10.0.0.3"
        )))
        .header("Accept", "application/xml")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let text = response.text().await.expect("body");
    assert!(text.contains("<Address"), "{text}");
    assert!(text.contains("property version=\"4\""), "{text}");
}

// ============================================================================
// Volumes
// ============================================================================

#[tokio::test]
async fn volume_get_scales_gigabytes_to_kilobytes() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, &format!("volume/{SEED_VOLUME_ID}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], json!(format!("{TENANT}/volume/{SEED_VOLUME_ID}")));
    assert_eq!(body["name"], json!("demo-data"));
    assert_eq!(body["state"], json!("AVAILABLE"));
    assert_eq!(body["capacity"], json!(2_000_000));
    assert_eq!(body["type"], json!(format!("{NS}/mapped")));
    assert_eq!(body["created"], json!("2026-08-01T09:00:00Z"));

    let rels: Vec<&str> = body["operations"]
        .as_array()
        .expect("operations array")
        .iter()
        .filter_map(|op| op["rel"].as_str())
        .collect();
    assert_eq!(rels, vec!["edit", "delete"]);
}

#[tokio::test]
async fn missing_volumes_become_an_empty_cimi_404() {
    let gw = gateway().await;

    let response = gw
        .client
        .get(gw.url("volume/absent"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
    assert_eq!(version_header(&response).as_deref(), Some("1.0.0"));
    assert_eq!(response.text().await.expect("body"), "");
}

#[tokio::test]
async fn volume_collection_lists_and_counts() {
    let gw = gateway().await;

    let (status, body) = get_json(&gw, "volumecollection").await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], json!(1));
    assert_eq!(
        body["volumes"][0]["id"],
        json!(format!("{TENANT}/volume/{SEED_VOLUME_ID}"))
    );
    assert_eq!(body["volumes"][0]["name"], json!("demo-data"));
    assert_eq!(body["operations"][0]["rel"], json!("add"));
}

#[tokio::test]
async fn volume_create_converts_capacity_and_answers_created() {
    let gw = gateway().await;

    let create = json!({
        "resourceURI": format!("{NS}/VolumeCreate"),
        "name": "scratch",
        "description": "temporary space",
        "volumeTemplate": {"volumeConfig": {"capacity": 1_500_000}},
    });
    let response = post_json(&gw, "volumecollection", &create).await;
    assert_eq!(response.status(), 201);
    assert_eq!(version_header(&response).as_deref(), Some("1.0.0"));

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["name"], json!("scratch"));
    assert_eq!(body["state"], json!("CREATING"));
    // 1.5 GB of kilobytes rounds up to a 2 GB backend volume.
    assert_eq!(body["capacity"], json!(2_000_000));
}

#[tokio::test]
async fn volume_create_rejects_unknown_members() {
    let gw = gateway().await;

    let create = json!({
        "resourceURI": format!("{NS}/VolumeCreate"),
        "name": "scratch",
        "bogus": true,
        "volumeTemplate": {"volumeConfig": {"capacity": 1}},
    });
    let response = post_json(&gw, "volumecollection", &create).await;
    assert_eq!(response.status(), 400);
    assert_eq!(response.text().await.expect("body"), "Bad request");
}

#[tokio::test]
async fn volume_create_requires_its_discriminator() {
    let gw = gateway().await;

    let create = json!({
        "name": "anonymous",
        "volumeTemplate": {"volumeConfig": {"capacity": 1}},
    });
    let response = post_json(&gw, "volumecollection", &create).await;
    assert_eq!(response.status(), 400);

    let no_capacity = json!({
        "resourceURI": format!("{NS}/VolumeCreate"),
        "name": "empty",
        "volumeTemplate": {"volumeConfig": {}},
    });
    let response = post_json(&gw, "volumecollection", &no_capacity).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn volume_create_accepts_xml_documents() {
    let gw = gateway().await;

    let body = format!(
        "<VolumeCreate xmlns=\"{NS}\"><name>from-xml</name>\
         <volumeTemplate><volumeConfig><capacity>1000000</capacity></volumeConfig>\
         </volumeTemplate></VolumeCreate>"
    );
    let response = gw
        .client
        .post(gw.url("volumecollection"))
        .header("Content-Type", "application/xml")
        .body(body)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 201);

    let created: Value = response.json().await.expect("json body");
    assert_eq!(created["name"], json!("from-xml"));
    assert_eq!(created["capacity"], json!(1_000_000));
}

#[tokio::test]
async fn volume_delete_remaps_backend_success_to_plain_ok() {
    let gw = gateway().await;

    let response = gw
        .client
        .delete(gw.url(&format!("volume/{SEED_VOLUME_ID}")))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    assert_eq!(version_header(&response).as_deref(), Some("1.0.0"));
    assert_eq!(response.text().await.expect("body"), "");

    // Deleting it again surfaces the backend's not-found untouched.
    let again = gw
        .client
        .delete(gw.url(&format!("volume/{SEED_VOLUME_ID}")))
        .send()
        .await
        .expect("request");
    assert_eq!(again.status(), 404);
    assert_eq!(version_header(&again), None);
}

// ============================================================================
// Machine-volume attachments
// ============================================================================

#[tokio::test]
async fn machine_volume_links_both_parents() {
    let gw = gateway().await;

    let (status, body) = get_json(
        &gw,
        &format!("machinevolume/{SEED_SERVER_ID}/{SEED_VOLUME_ID}"),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        body["id"],
        json!(format!("{TENANT}/machinevolume/{SEED_SERVER_ID}/{SEED_VOLUME_ID}"))
    );
    assert_eq!(body["initialLocation"], json!("/dev/vdb"));
    assert_eq!(
        body["volume"]["href"],
        json!(format!("{TENANT}/volume/{SEED_VOLUME_ID}"))
    );
    assert_eq!(body["resourceURI"], json!(format!("{NS}/MachineVolume")));
}

#[tokio::test]
async fn machine_volume_collection_counts_attachments() {
    let gw = gateway().await;

    let (status, body) =
        get_json(&gw, &format!("machinevolumecollection/{SEED_SERVER_ID}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["machineVolumes"][0]["initialLocation"], json!("/dev/vdb"));
    assert_eq!(body["operations"][0]["rel"], json!("add"));
    assert_eq!(
        body["operations"][0]["href"],
        json!(format!("{TENANT}/machinevolumecollection/{SEED_SERVER_ID}"))
    );
}

#[tokio::test]
async fn attaching_a_volume_answers_with_a_location() {
    let gw = gateway().await;

    let attach = json!({
        "MachineVolume": {
            "volume": {"href": format!("{TENANT}/volume/vol-0099")},
            "initialLocation": "/dev/vdc",
        }
    });
    let response = post_json(
        &gw,
        &format!("machinevolumecollection/{SEED_SERVER_ID}"),
        &attach,
    )
    .await;
    assert_eq!(response.status(), 201);
    assert_eq!(version_header(&response).as_deref(), Some("1.0.0"));
    assert_eq!(
        response
            .headers()
            .get("location")
            .and_then(|value| value.to_str().ok()),
        Some(format!("{PREFIX}/{TENANT}/machinevolume/{SEED_SERVER_ID}/vol-0099").as_str())
    );

    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["initialLocation"], json!("/dev/vdc"));
    assert_eq!(
        body["volume"]["href"],
        json!(format!("{TENANT}/volume/vol-0099"))
    );
}

#[tokio::test]
async fn attaching_requires_a_volume_href_and_a_device() {
    let gw = gateway().await;

    let no_device = json!({
        "volume": {"href": format!("{TENANT}/volume/{SEED_VOLUME_ID}")},
    });
    let response = post_json(
        &gw,
        &format!("machinevolumecollection/{SEED_SERVER_ID}"),
        &no_device,
    )
    .await;
    assert_eq!(response.status(), 400);
    assert_eq!(
        response.text().await.expect("body"),
        "Request body can not be parsed, malformed request body"
    );

    let no_href = json!({"initialLocation": "/dev/vdc"});
    let response = post_json(
        &gw,
        &format!("machinevolumecollection/{SEED_SERVER_ID}"),
        &no_href,
    )
    .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn detaching_passes_the_backend_response_through() {
    let gw = gateway().await;

    let response = gw
        .client
        .delete(gw.url(&format!(
            "machinevolume/{SEED_SERVER_ID}/{SEED_VOLUME_ID}"
        )))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 202);
    assert_eq!(version_header(&response), None);

    let after = gw
        .client
        .get(gw.url(&format!(
            "machinevolume/{SEED_SERVER_ID}/{SEED_VOLUME_ID}"
        )))
        .send()
        .await
        .expect("request");
    assert_eq!(after.status(), 404);
}

// ============================================================================
// Service catalog resolution
// ============================================================================

#[tokio::test]
async fn service_catalog_resolves_backend_endpoints_once() {
    let compute = start_compute();
    let volume = start_volume();

    // No static endpoints: the gateway starts blind.
    let server = start_gateway(test_config());
    let base = format!("http://{}{}", server.local_addr(), PREFIX);
    let client = reqwest::Client::new();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let machine_url = format!("{base}/{TENANT}/machine/{SEED_SERVER_ID}");

    // Before any catalog arrives, backend calls cannot be placed.
    let blind = client.get(&machine_url).send().await.expect("request");
    assert_eq!(blind.status(), 500);
    assert_eq!(
        blind.text().await.expect("body"),
        "Backend request failed"
    );

    // The first request carrying a catalog resolves both endpoints and is
    // itself served with them.
    let catalog = json!([
        {
            "type": "compute",
            "endpoints": [
                {"publicURL": format!("http://{}/v2/{TENANT}", compute.local_addr())}
            ],
        },
        {
            "type": "volume",
            "endpoints": [
                {"publicURL": format!("http://{}/v1/{TENANT}", volume.local_addr())}
            ],
        },
    ]);
    let resolved = client
        .get(&machine_url)
        .header("X-Service-Catalog", catalog.to_string())
        .send()
        .await
        .expect("request");
    assert_eq!(resolved.status(), 200);

    // Later requests ride the cached endpoints without the header.
    let cached = client.get(&machine_url).send().await.expect("request");
    assert_eq!(cached.status(), 200);
    let body: Value = cached.json().await.expect("json body");
    assert_eq!(body["name"], json!("demo-vm"));

    drop(server);
    drop(compute);
    drop(volume);
}

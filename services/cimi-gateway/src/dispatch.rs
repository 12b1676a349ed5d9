// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! CIMI request dispatch
//!
//! All four HTTP methods funnel through [`handle`]: strip the configured
//! prefix, read tenant and resource-kind token off the front of the
//! remaining path, and route `(kind, verb)` to a controller function.
//! A path outside the prefix is not a CIMI request at all and surfaces as
//! a router-level 404; everything under the prefix answers in CIMI terms,
//! including the 501 for kinds or verbs nothing implements.

use http::HeaderMap;

use dropshot::HttpError;

use crate::config::parse_service_catalog;
use crate::controller::{self, ResponseData, Scope};
use crate::error::CimiError;
use crate::{negotiate, ApiContext};

/// HTTP method as the dispatch table sees it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

/// The closed set of resource-kind tokens CIMI routes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResourceKind {
    CloudEntryPoint,
    Machine,
    MachineCollection,
    MachineConfiguration,
    MachineConfigurationCollection,
    MachineImage,
    MachineImageCollection,
    NetworkInterface,
    NetworkInterfaceCollection,
    NetworkAddress,
    NetworkAddressCollection,
    Volume,
    VolumeCollection,
    MachineVolume,
    MachineVolumeCollection,
}

impl ResourceKind {
    /// Token comparison is case-insensitive; callers lowercase first.
    fn from_token(token: &str) -> Option<ResourceKind> {
        match token {
            "cloudentrypoint" => Some(ResourceKind::CloudEntryPoint),
            "machine" => Some(ResourceKind::Machine),
            "machinecollection" => Some(ResourceKind::MachineCollection),
            "machineconfiguration" => Some(ResourceKind::MachineConfiguration),
            "machineconfigurationcollection" => {
                Some(ResourceKind::MachineConfigurationCollection)
            }
            "machineimage" => Some(ResourceKind::MachineImage),
            "machineimagecollection" => Some(ResourceKind::MachineImageCollection),
            "networkinterface" => Some(ResourceKind::NetworkInterface),
            "networkinterfacescollection" => Some(ResourceKind::NetworkInterfaceCollection),
            "machinenetworkinterfaceaddress" => Some(ResourceKind::NetworkAddress),
            "machinenetworkinterfaceaddressescollection" => {
                Some(ResourceKind::NetworkAddressCollection)
            }
            "volume" => Some(ResourceKind::Volume),
            "volumecollection" => Some(ResourceKind::VolumeCollection),
            "machinevolume" => Some(ResourceKind::MachineVolume),
            "machinevolumecollection" => Some(ResourceKind::MachineVolumeCollection),
            _ => None,
        }
    }
}

/// Segments below the prefix, or `None` when the path is not under it.
fn split_path<'a>(path: &'a str, prefix: &str) -> Option<Vec<&'a str>> {
    let remainder = path.strip_prefix(prefix)?;
    // "/cimiv1x" must not match a "/cimiv1" prefix.
    if !remainder.is_empty() && !remainder.starts_with('/') {
        return None;
    }
    Some(remainder.split('/').filter(|s| !s.is_empty()).collect())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Answer one request. `segments` is the raw wildcard capture, before
/// prefix checking.
pub async fn handle(
    context: &ApiContext,
    verb: Verb,
    segments: &[String],
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ResponseData, HttpError> {
    let path = format!("/{}", segments.join("/"));
    let Some(parts) = split_path(&path, &context.config.request_prefix) else {
        return Err(HttpError::for_not_found(
            None,
            format!("{path} is outside the CIMI prefix"),
        ));
    };

    // First sight of a service catalog pins the backend endpoints for the
    // life of the process.
    if !context.endpoints.is_resolved() {
        if let Some(raw) = header_str(headers, "x-service-catalog") {
            if let Some(endpoints) = parse_service_catalog(raw) {
                context.endpoints.offer(endpoints);
            }
        }
    }

    let outcome = dispatch(context, verb, &parts, headers, body).await;
    Ok(outcome.unwrap_or_else(|error| error.response()))
}

async fn dispatch(
    context: &ApiContext,
    verb: Verb,
    parts: &[&str],
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ResponseData, CimiError> {
    if parts.len() < 2 {
        return Err(CimiError::BadRequest);
    }
    let tenant = parts[0];
    let token = parts[1].to_lowercase();
    let Some(kind) = ResourceKind::from_token(&token) else {
        tracing::debug!(token, "unroutable resource kind");
        return Err(CimiError::NotImplemented);
    };
    let params: Vec<String> = parts[2..].iter().map(|part| part.to_string()).collect();

    let scope = Scope {
        tenant,
        params: &params,
        request_format: negotiate::best_match(header_str(headers, "content-type")),
        response_format: negotiate::best_match(header_str(headers, "accept")),
        auth_token: header_str(headers, "x-auth-token"),
        host: header_str(headers, "host"),
        body,
        config: &context.config,
        backend: &context.backend,
        endpoints: &context.endpoints,
    };
    tracing::info!(?verb, tenant, ?kind, "dispatching CIMI request");
    route(kind, verb, &scope).await
}

/// The verb table. Pairs absent here, PUT on everything included, answer
/// with the protocol's 501.
async fn route(
    kind: ResourceKind,
    verb: Verb,
    scope: &Scope<'_>,
) -> Result<ResponseData, CimiError> {
    match (kind, verb) {
        (ResourceKind::CloudEntryPoint, Verb::Get) => {
            controller::cloudentrypoint::get(scope).await
        }
        (ResourceKind::Machine, Verb::Get) => controller::machine::get(scope).await,
        (ResourceKind::Machine, Verb::Post) => controller::machine::post(scope).await,
        (ResourceKind::Machine, Verb::Delete) => controller::machine::delete(scope).await,
        (ResourceKind::MachineCollection, Verb::Get) => {
            controller::machine::get_collection(scope).await
        }
        (ResourceKind::MachineCollection, Verb::Post) => controller::machine::create(scope).await,
        (ResourceKind::MachineConfiguration, Verb::Get) => {
            controller::machineconfig::get(scope).await
        }
        (ResourceKind::MachineConfigurationCollection, Verb::Get) => {
            controller::machineconfig::get_collection(scope).await
        }
        (ResourceKind::MachineImage, Verb::Get) => controller::machineimage::get(scope).await,
        (ResourceKind::MachineImageCollection, Verb::Get) => {
            controller::machineimage::get_collection(scope).await
        }
        (ResourceKind::NetworkInterfaceCollection, Verb::Get) => {
            controller::network::get_collection(scope).await
        }
        (ResourceKind::NetworkAddress, Verb::Get) => controller::address::get(scope).await,
        (ResourceKind::NetworkAddressCollection, Verb::Get) => {
            controller::address::get_collection(scope).await
        }
        (ResourceKind::Volume, Verb::Get) => controller::volume::get(scope).await,
        (ResourceKind::Volume, Verb::Delete) => controller::volume::delete(scope).await,
        (ResourceKind::VolumeCollection, Verb::Get) => {
            controller::volume::get_collection(scope).await
        }
        (ResourceKind::VolumeCollection, Verb::Post) => controller::volume::create(scope).await,
        (ResourceKind::MachineVolume, Verb::Get) => controller::machinevolume::get(scope).await,
        (ResourceKind::MachineVolume, Verb::Delete) => {
            controller::machinevolume::delete(scope).await
        }
        (ResourceKind::MachineVolumeCollection, Verb::Get) => {
            controller::machinevolume::get_collection(scope).await
        }
        (ResourceKind::MachineVolumeCollection, Verb::Post) => {
            controller::machinevolume::create(scope).await
        }
        _ => Err(CimiError::NotImplemented),
    }
}

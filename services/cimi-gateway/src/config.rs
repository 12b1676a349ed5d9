// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Gateway configuration
//!
//! Backend endpoints come from the environment when operators pin them, or
//! else from the first inbound request carrying an `X-Service-Catalog`
//! header. Catalog resolution happens at most once per process; after that
//! every request reads the same endpoints without synchronization.

use std::net::SocketAddr;
use std::sync::OnceLock;

use anyhow::Context;
use serde::Deserialize;
use url::Url;

/// Static settings, fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// Leading path segment all CIMI requests must carry, e.g. `/cimiv1`.
    pub request_prefix: String,
    /// Version path prepended to compute backend paths, e.g. `/v2`.
    pub compute_version_path: String,
    /// Version path prepended to volume backend paths, e.g. `/v1`.
    pub volume_version_path: String,
    /// Compute endpoint override; `None` defers to the service catalog.
    pub compute_endpoint: Option<Url>,
    /// Volume endpoint override; `None` defers to the service catalog.
    pub volume_endpoint: Option<Url>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .context("BIND_ADDRESS is not a socket address")?;
        let request_prefix =
            std::env::var("CIMI_REQUEST_PREFIX").unwrap_or_else(|_| "/cimiv1".to_string());
        let compute_version_path =
            std::env::var("COMPUTE_VERSION_PATH").unwrap_or_else(|_| "/v2".to_string());
        let volume_version_path =
            std::env::var("VOLUME_VERSION_PATH").unwrap_or_else(|_| "/v1".to_string());
        let compute_endpoint = endpoint_from_env("COMPUTE_ENDPOINT")?;
        let volume_endpoint = endpoint_from_env("VOLUME_ENDPOINT")?;

        Ok(Config {
            bind_address,
            request_prefix,
            compute_version_path,
            volume_version_path,
            compute_endpoint,
            volume_endpoint,
        })
    }
}

fn endpoint_from_env(name: &str) -> anyhow::Result<Option<Url>> {
    match std::env::var(name) {
        Ok(value) => {
            let url = Url::parse(&value).with_context(|| format!("{name} is not a URL"))?;
            let origin = origin_only(&url)
                .with_context(|| format!("{name} has no usable scheme/host/port"))?;
            Ok(Some(origin))
        }
        Err(_) => Ok(None),
    }
}

/// Strip a URL down to scheme, host, and port. Catalog entries often
/// carry tenant-scoped paths that must not leak into backend URLs.
fn origin_only(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    let base = match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    };
    Url::parse(&base).ok()
}

#[derive(Debug, Deserialize)]
struct CatalogService {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    #[serde(rename = "publicURL")]
    public_url: String,
}

/// Backend addresses recovered from one service catalog document.
#[derive(Debug, Clone, Default)]
pub struct CatalogEndpoints {
    pub compute: Option<Url>,
    pub volume: Option<Url>,
}

/// Parse an `X-Service-Catalog` header value. Returns `None` when the
/// document is unparseable or names neither backend, so a useless header
/// never consumes the once-only resolution slot.
pub fn parse_service_catalog(raw: &str) -> Option<CatalogEndpoints> {
    let services: Vec<CatalogService> = serde_json::from_str(raw).ok()?;

    let mut found = CatalogEndpoints::default();
    for service in services {
        let slot = match service.service_type.as_str() {
            "compute" => &mut found.compute,
            "volume" => &mut found.volume,
            _ => continue,
        };
        if slot.is_some() {
            continue;
        }
        *slot = service
            .endpoints
            .first()
            .and_then(|endpoint| Url::parse(&endpoint.public_url).ok())
            .and_then(|url| origin_only(&url));
    }

    if found.compute.is_none() && found.volume.is_none() {
        None
    } else {
        Some(found)
    }
}

/// Catalog-derived endpoints, resolved at most once per process.
#[derive(Debug, Default)]
pub struct EndpointCache {
    resolved: OnceLock<CatalogEndpoints>,
}

impl EndpointCache {
    pub fn new() -> Self {
        EndpointCache {
            resolved: OnceLock::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Record catalog endpoints unless a previous request already did.
    pub fn offer(&self, endpoints: CatalogEndpoints) {
        if self.resolved.set(endpoints).is_ok() {
            tracing::info!("backend endpoints resolved from service catalog");
        }
    }

    pub fn compute(&self) -> Option<&Url> {
        self.resolved.get().and_then(|cached| cached.compute.as_ref())
    }

    pub fn volume(&self) -> Option<&Url> {
        self.resolved.get().and_then(|cached| cached.volume.as_ref())
    }
}

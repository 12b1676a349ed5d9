// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! CIMI gateway server binary
//!
//! Environment:
//! - `BIND_ADDRESS`: listen address (default `127.0.0.1:8080`)
//! - `CIMI_REQUEST_PREFIX`: URL prefix for CIMI routes (default `/cimiv1`)
//! - `COMPUTE_ENDPOINT` / `VOLUME_ENDPOINT`: backend base URLs; when
//!   unset, endpoints are resolved from the first request carrying an
//!   `X-Service-Catalog` header
//! - `COMPUTE_VERSION_PATH` / `VOLUME_VERSION_PATH`: backend API version
//!   segments (defaults `/v2` and `/v1`)

use std::sync::Arc;

use anyhow::Result;
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use tracing::info;

use cimi_gateway::config::Config;
use cimi_gateway::ApiContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "cimi_gateway=info,dropshot=info".to_string()),
        ))
        .init();

    let config = Config::from_env()?;
    let bind_address = config.bind_address;
    let request_prefix = config.request_prefix.clone();

    // Get API description from the trait implementation
    let api = cimi_gateway::api_description()
        .map_err(|e| anyhow::anyhow!("Failed to create API description: {}", e))?;

    let config_dropshot = ConfigDropshot {
        bind_address,
        default_request_body_max_bytes: 1024 * 1024, // 1MB
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };

    let config_logging = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };
    let log = config_logging
        .to_logger("cimi-gateway")
        .map_err(|error| anyhow::anyhow!("failed to create logger: {}", error))?;

    let context = Arc::new(ApiContext::new(config));
    let server = HttpServerStarter::new(&config_dropshot, api, context, &log)
        .map_err(|error| anyhow::anyhow!("failed to create server: {}", error))?
        .start();

    info!(
        "CIMI gateway running on http://{}{}",
        bind_address, request_prefix
    );

    server
        .await
        .map_err(|error| anyhow::anyhow!("server failed: {}", error))
}

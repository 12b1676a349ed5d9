// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Standalone stub backends for testing and development
//!
//! Run with:
//! ```bash
//! cargo run -p backend-stub-server
//! ```
//!
//! Then point the gateway at the two services:
//! ```bash
//! COMPUTE_ENDPOINT=http://127.0.0.1:8774 \
//! VOLUME_ENDPOINT=http://127.0.0.1:8776 cargo run -p cimi-gateway
//! ```

use anyhow::Result;
use dropshot::{ConfigDropshot, ConfigLogging, ConfigLoggingLevel, HttpServerStarter};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use backend_stub_server::{
    compute_api_description, volume_api_description, ComputeStubContext, VolumeStubContext,
};

const COMPUTE_PORT: u16 = 8774;
const VOLUME_PORT: u16 = 8776;

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = ConfigLogging::StderrTerminal {
        level: ConfigLoggingLevel::Info,
    };
    let log = log_config.to_logger("backend-stub-server")?;

    let compute_config = ConfigDropshot {
        bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, COMPUTE_PORT)),
        default_request_body_max_bytes: 1024 * 1024,
        default_handler_task_mode: dropshot::HandlerTaskMode::Detached,
        ..Default::default()
    };
    let volume_config = ConfigDropshot {
        bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, VOLUME_PORT)),
        ..compute_config.clone()
    };

    let compute_api = compute_api_description().map_err(|e| anyhow::anyhow!(e))?;
    let compute_server = HttpServerStarter::new(
        &compute_config,
        compute_api,
        Arc::new(ComputeStubContext::new()),
        &log,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create compute stub: {}", e))?
    .start();

    let volume_api = volume_api_description().map_err(|e| anyhow::anyhow!(e))?;
    let volume_server = HttpServerStarter::new(
        &volume_config,
        volume_api,
        Arc::new(VolumeStubContext::new()),
        &log,
    )
    .map_err(|e| anyhow::anyhow!("Failed to create volume stub: {}", e))?
    .start();

    tracing::info!("Stub compute backend listening on http://127.0.0.1:{COMPUTE_PORT}");
    tracing::info!("Stub volume backend listening on http://127.0.0.1:{VOLUME_PORT}");

    let (compute_result, volume_result) = tokio::join!(compute_server, volume_server);
    compute_result.map_err(|e| anyhow::anyhow!("Compute stub error: {}", e))?;
    volume_result.map_err(|e| anyhow::anyhow!("Volume stub error: {}", e))
}

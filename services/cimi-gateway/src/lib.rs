// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! CIMI protocol-translation gateway
//!
//! Implements the DMTF CIMI 1.0 HTTP surface in front of two
//! OpenStack-style backends: a compute service (servers, flavors, images,
//! volume attachments) and a separately addressed volume service. Inbound
//! CIMI requests, JSON or XML, are dispatched on the
//! `/{prefix}/{tenant}/{resource}` convention, translated into backend
//! JSON calls, and the backend's answers are reshaped into CIMI documents
//! on the way out.
//!
//! The crate is organized around that pipeline:
//!
//! - [`dispatch`] strips the prefix and routes on the resource token
//! - [`controller`] holds one module per resource family
//! - [`backend`] is the thin outbound HTTP client
//! - [`negotiate`] and [`cimi_document`] handle the two wire formats
//! - [`config`] carries endpoints, resolved statically or from a
//!   service-catalog header
//!
//! Nothing here holds resource state: every request re-fetches from the
//! backends, and the only cross-request state is the once-resolved
//! backend endpoint pair.

pub mod backend;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod negotiate;

use std::sync::Arc;

use dropshot::{Body, HttpError, Path, RequestContext, UntypedBody};
use http::Response;

use cimi_api::{CimiApi, CimiPath};

use crate::backend::BackendClient;
use crate::config::{Config, EndpointCache};
use crate::dispatch::Verb;

/// Shared state for all gateway requests
#[derive(Debug)]
pub struct ApiContext {
    pub config: Config,
    pub backend: BackendClient,
    pub endpoints: EndpointCache,
}

impl ApiContext {
    pub fn new(config: Config) -> Self {
        ApiContext {
            config,
            backend: BackendClient::new(),
            endpoints: EndpointCache::new(),
        }
    }
}

/// Implementation of the CIMI API
enum CimiGatewayImpl {}

impl CimiApi for CimiGatewayImpl {
    type Context = Arc<ApiContext>;

    async fn cimi_get(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
    ) -> Result<Response<Body>, HttpError> {
        dispatch::handle(
            rqctx.context(),
            Verb::Get,
            &path.into_inner().path,
            rqctx.request.headers(),
            &[],
        )
        .await?
        .into_response()
    }

    async fn cimi_post(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
        body: UntypedBody,
    ) -> Result<Response<Body>, HttpError> {
        dispatch::handle(
            rqctx.context(),
            Verb::Post,
            &path.into_inner().path,
            rqctx.request.headers(),
            body.as_bytes(),
        )
        .await?
        .into_response()
    }

    async fn cimi_put(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
        body: UntypedBody,
    ) -> Result<Response<Body>, HttpError> {
        dispatch::handle(
            rqctx.context(),
            Verb::Put,
            &path.into_inner().path,
            rqctx.request.headers(),
            body.as_bytes(),
        )
        .await?
        .into_response()
    }

    async fn cimi_delete(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
    ) -> Result<Response<Body>, HttpError> {
        dispatch::handle(
            rqctx.context(),
            Verb::Delete,
            &path.into_inner().path,
            rqctx.request.headers(),
            &[],
        )
        .await?
        .into_response()
    }
}

/// Create the Dropshot API description for the CIMI gateway
pub fn api_description() -> Result<dropshot::ApiDescription<Arc<ApiContext>>, String> {
    cimi_api::cimi_api_mod::api_description::<CimiGatewayImpl>().map_err(|e| e.to_string())
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! CIMI Gateway API Trait Definition
//!
//! The CIMI protocol routes on `/{prefix}/{tenant}/{resource}/...` with a
//! closed set of resource names, its own error document conventions, and
//! per-request content negotiation between JSON and XML. None of that maps
//! onto typed per-resource endpoints, so this trait exposes one wildcard
//! route per HTTP method and the gateway performs CIMI dispatch itself.
//!
//! The endpoints are unpublished: an OpenAPI document of three wildcard
//! routes would describe nothing useful about the protocol.

use dropshot::{Body, HttpError, Path, RequestContext, UntypedBody};
use http::Response;
use schemars::JsonSchema;
use serde::Deserialize;

/// Path segments below the server root, uninterpreted by the router.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CimiPath {
    pub path: Vec<String>,
}

/// HTTP surface of the CIMI gateway
///
/// `PUT` is routed even though no resource currently accepts it: the CIMI
/// error contract wants an unsupported verb on a known resource to produce
/// the protocol's own 501 document rather than a router-level rejection.
#[dropshot::api_description]
pub trait CimiApi {
    /// Context type for request handlers
    type Context: Send + Sync + 'static;

    #[endpoint {
        method = GET,
        path = "/{path:.*}",
        unpublished = true,
    }]
    async fn cimi_get(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
    ) -> Result<Response<Body>, HttpError>;

    #[endpoint {
        method = POST,
        path = "/{path:.*}",
        unpublished = true,
    }]
    async fn cimi_post(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
        body: UntypedBody,
    ) -> Result<Response<Body>, HttpError>;

    #[endpoint {
        method = PUT,
        path = "/{path:.*}",
        unpublished = true,
    }]
    async fn cimi_put(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
        body: UntypedBody,
    ) -> Result<Response<Body>, HttpError>;

    #[endpoint {
        method = DELETE,
        path = "/{path:.*}",
        unpublished = true,
    }]
    async fn cimi_delete(
        rqctx: RequestContext<Self::Context>,
        path: Path<CimiPath>,
    ) -> Result<Response<Body>, HttpError>;
}

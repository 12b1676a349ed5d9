// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! HTTP client for the compute and volume backends
//!
//! The gateway always speaks JSON to the backends no matter what format
//! the CIMI client negotiated, forwards the caller's auth token untouched,
//! and attempts every call exactly once. Transport failures surface as
//! [`CimiError::BackendUnavailable`]; non-2xx responses are not failures
//! here, they are captured verbatim for the controller to pass through or
//! remap.

use http::StatusCode;
use serde_json::Value;

use crate::error::CimiError;

/// Verbatim capture of one backend exchange.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl BackendResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Parse the body as a JSON document. A backend that reports success
    /// with an unreadable body is treated the same as one that never
    /// answered.
    pub fn json(&self) -> Result<Value, CimiError> {
        serde_json::from_str(&self.body).map_err(|error| {
            tracing::warn!(%error, "backend returned undecodable JSON");
            CimiError::BackendUnavailable
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackendClient {
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new() -> Self {
        BackendClient {
            client: reqwest::Client::new(),
        }
    }

    pub async fn get(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<BackendResponse, CimiError> {
        self.execute(self.client.get(url), "GET", url, token).await
    }

    pub async fn post(
        &self,
        url: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<BackendResponse, CimiError> {
        self.execute(self.client.post(url).json(body), "POST", url, token)
            .await
    }

    pub async fn delete(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<BackendResponse, CimiError> {
        self.execute(self.client.delete(url), "DELETE", url, token)
            .await
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: &str,
        url: &str,
        token: Option<&str>,
    ) -> Result<BackendResponse, CimiError> {
        let mut request = request.header(http::header::ACCEPT, "application/json");
        if let Some(token) = token {
            request = request.header("X-Auth-Token", token);
        }

        let response = request.send().await.map_err(|error| {
            tracing::warn!(method, url, %error, "backend request failed");
            CimiError::BackendUnavailable
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(|error| {
            tracing::warn!(method, url, %error, "backend response body unreadable");
            CimiError::BackendUnavailable
        })?;

        tracing::debug!(method, url, status = status.as_u16(), "backend exchange");
        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn json_helper_distinguishes_decodable_bodies() {
        let response = BackendResponse {
            status: StatusCode::OK,
            content_type: Some("application/json".to_string()),
            body: r#"{"server": {"id": "s1"}}"#.to_string(),
        };
        let document = response.json().unwrap();
        assert_eq!(document["server"]["id"], "s1");

        let broken = BackendResponse {
            body: "<html>proxy error</html>".to_string(),
            ..response
        };
        assert_eq!(broken.json().unwrap_err(), CimiError::BackendUnavailable);
    }
}

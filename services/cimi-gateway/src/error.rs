// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! CIMI protocol error taxonomy
//!
//! CIMI errors are deliberately terse: a fixed status code and a short
//! plain-text body, never a structured document and never backend detail.
//! The `Display` string of each variant is exactly the body the client
//! receives.

use http::StatusCode;
use thiserror::Error;

use crate::controller::ResponseData;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CimiError {
    /// Malformed path or missing mandatory create fields.
    #[error("Bad request")]
    BadRequest,

    /// Body present but undeserializable, or missing mandatory sub-fields.
    #[error("Request body can not be parsed, malformed request body")]
    MalformedBody,

    /// Reserved for the auth layer in front of the gateway.
    #[error("Access denied")]
    AccessDenied,

    /// Unroutable kind, unsupported verb, or an action invalid for the
    /// resource's current state.
    #[error("Not implemented")]
    NotImplemented,

    /// Reserved for reservation-style create checks; nothing raises it.
    #[error("The requested name already exists as a different type")]
    Conflict,

    /// The backend could not be addressed or did not answer.
    #[error("Backend request failed")]
    BackendUnavailable,

    /// A response that was built could not be serialized.
    #[error("Internal error")]
    Internal,
}

impl CimiError {
    pub fn status(&self) -> StatusCode {
        match self {
            CimiError::BadRequest | CimiError::MalformedBody => StatusCode::BAD_REQUEST,
            CimiError::AccessDenied => StatusCode::FORBIDDEN,
            CimiError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            CimiError::Conflict => StatusCode::CONFLICT,
            CimiError::BackendUnavailable | CimiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The error as it goes out on the wire. Error responses never carry
    /// the CIMI version header; only completed translations do.
    pub fn response(&self) -> ResponseData {
        ResponseData {
            status: self.status(),
            content_type: Some("text/plain".to_string()),
            location: None,
            cimi_version: false,
            body: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(CimiError::BadRequest, 400, "Bad request"; "bad request")]
    #[test_case(
        CimiError::MalformedBody,
        400,
        "Request body can not be parsed, malformed request body";
        "malformed body"
    )]
    #[test_case(CimiError::AccessDenied, 403, "Access denied"; "access denied")]
    #[test_case(CimiError::NotImplemented, 501, "Not implemented"; "not implemented")]
    #[test_case(
        CimiError::Conflict,
        409,
        "The requested name already exists as a different type";
        "conflict"
    )]
    #[test_case(CimiError::BackendUnavailable, 500, "Backend request failed"; "backend")]
    fn wire_form_is_fixed(error: CimiError, status: u16, body: &str) {
        let response = error.response();
        assert_eq!(response.status.as_u16(), status);
        assert_eq!(response.body, body);
        assert!(!response.cimi_version);
    }
}

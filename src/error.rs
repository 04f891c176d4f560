//! Failure taxonomy and the error normalizer.
//!
//! Every component in the pipeline raises a typed [`Failure`] instead of
//! formatting its own error response. [`Failure::into_response`] is the single
//! point where a failure becomes HTTP: a fixed kind→status mapping and one
//! uniform JSON body shape, `{"message": ..., "detail": ...}`.
//!
//! Clients never see stack traces or internal identifiers. Details ride along
//! only for failures the client can act on (a JSON parse error, a bad
//! credential); `Internal` and `UpstreamUnavailable` details are logged
//! server-side and replaced with a generic message on the wire.

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::response::Response;

/// A classified failure raised by any pipeline stage, the router, or a
/// handler. Consumed only by the normalizer; never silently dropped.
#[derive(Debug, Error)]
pub enum Failure {
    /// Malformed input — unparseable body, missing field.
    #[error("bad request: {detail}")]
    BadRequest { detail: String },

    /// Missing or invalid credential.
    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    /// No matching route, or no such resource.
    #[error("not found")]
    NotFound,

    /// Path is known but not for this HTTP method.
    #[error("method not allowed")]
    MethodNotAllowed,

    /// A collaborator the pipeline depends on could not be reached.
    #[error("upstream unavailable: {detail}")]
    UpstreamUnavailable { detail: String },

    /// Anything unclassified, including caught handler panics.
    #[error("internal error: {detail}")]
    Internal { detail: String },
}

impl Failure {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest { detail: detail.into() }
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized { detail: detail.into() }
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn method_not_allowed() -> Self {
        Self::MethodNotAllowed
    }

    pub fn upstream(detail: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { detail: detail.into() }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal { detail: detail.into() }
    }

    /// The fixed status for this failure kind. Must not vary by route.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The fixed client-facing message for this failure kind.
    pub fn message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad request",
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotFound => "not found",
            Self::MethodNotAllowed => "method not allowed",
            Self::UpstreamUnavailable { .. } => "upstream unavailable",
            Self::Internal { .. } => "internal server error",
        }
    }

    /// Detail safe to send to the client. `None` for kinds whose detail is
    /// internal (upstream addresses, panic payloads).
    fn client_detail(&self) -> Option<&str> {
        match self {
            Self::BadRequest { detail } | Self::Unauthorized { detail } => Some(detail),
            _ => None,
        }
    }

    /// Normalizes this failure into the uniform JSON error response.
    ///
    /// The terminal stage of the pipeline: by the time a failure reaches the
    /// transport it has passed through here, whatever raised it.
    pub fn into_response(self) -> Response {
        match &self {
            Self::Internal { detail } => error!(detail = %detail, "request failed"),
            Self::UpstreamUnavailable { detail } => warn!(detail = %detail, "collaborator unreachable"),
            _ => {}
        }

        let body = ErrorBody { message: self.message(), detail: self.client_detail() };
        // ErrorBody has no failure modes serde_json can hit; fall back to a
        // bare status if it somehow does.
        match serde_json::to_vec(&body) {
            Ok(bytes) => Response::builder().status(self.status()).json_bytes(bytes),
            Err(_) => Response::status(self.status()),
        }
    }
}

/// The one client-facing error shape.
#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

/// Infrastructure errors: binding the port, accepting a connection.
///
/// Application-level failures are [`Failure`] values normalized into HTTP
/// responses; this type never reaches a client.
#[derive(Debug, Error)]
#[error("io: {0}")]
pub struct Error(#[from] std::io::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_fixed() {
        assert_eq!(Failure::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(Failure::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Failure::not_found().status(), StatusCode::NOT_FOUND);
        assert_eq!(Failure::method_not_allowed().status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(Failure::upstream("x").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(Failure::internal("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_request_detail_reaches_the_client() {
        let response = Failure::bad_request("expected field `title`").into_response();
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "bad request");
        assert_eq!(body["detail"], "expected field `title`");
    }

    #[test]
    fn internal_detail_never_leaks() {
        let response = Failure::internal("panicked at src/tasks.rs:42").into_response();
        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "internal server error");
        assert!(body.get("detail").is_none());
        assert!(!String::from_utf8_lossy(response.body()).contains("tasks.rs"));
    }

    #[test]
    fn error_body_is_always_json() {
        let response = Failure::not_found().into_response();
        assert_eq!(response.header("content-type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "not found");
    }
}

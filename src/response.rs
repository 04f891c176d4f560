//! Outgoing HTTP response type.
//!
//! A [`Response`] is write-once: constructors and the consuming builder are
//! the only ways to produce one, and nothing mutates it afterwards. Once the
//! pipeline hands a response to the transport, no later stage can touch it.

use bytes::Bytes;
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::error::Failure;

/// An outgoing HTTP response.
///
/// # Shortcuts
///
/// ```rust
/// use http::StatusCode;
/// use taskd::Response;
///
/// Response::json(&serde_json::json!({ "id": 1 })).unwrap();
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use http::StatusCode;
/// use taskd::Response;
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/api/tasks/42")
///     .json(&serde_json::json!({ "id": "42" }))
///     .unwrap();
/// ```
pub struct Response {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Response {
    /// `200 OK` with a JSON body serialized from `value`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Failure> {
        Self::builder().json(value)
    }

    /// Response with the given status and no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, headers: Vec::new(), body: Bytes::new() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { status: StatusCode::OK, headers: Vec::new() }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts into the hyper-side response type for the transport.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder.body(Full::new(self.body)).unwrap_or_else(|_| {
            // Only reachable via a malformed header name/value baked into
            // code; surface as a bare 500 rather than dropping the connection.
            http::Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Full::new(Bytes::new()))
                .expect("empty 500 response is always valid")
        })
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Fluent builder for [`Response`], obtained via [`Response::builder`].
///
/// Defaults to `200 OK`. Terminated by a body method — the builder is
/// consumed, which is what makes the response write-once.
pub struct ResponseBuilder {
    status: StatusCode,
    headers: Vec<(String, String)>,
}

impl ResponseBuilder {
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body serialized from `value`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Response, Failure> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| Failure::internal(format!("response serialization failed: {e}")))?;
        Ok(self.json_bytes(bytes))
    }

    /// Terminate with pre-serialized JSON bytes.
    pub fn json_bytes(mut self, body: impl Into<Bytes>) -> Response {
        self.headers.insert(0, ("content-type".to_owned(), "application/json".to_owned()));
        Response { status: self.status, headers: self.headers, body: body.into() }
    }

    /// Terminate with no body (e.g. `204 No Content`).
    pub fn no_body(self) -> Response {
        Response { status: self.status, headers: self.headers, body: Bytes::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_content_type_and_status() {
        let response = Response::json(&serde_json::json!({ "ok": true })).unwrap();
        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn builder_carries_custom_status_and_headers() {
        let response = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/api/tasks/7")
            .json(&serde_json::json!({ "id": "7" }))
            .unwrap();

        assert_eq!(response.status_code(), StatusCode::CREATED);
        assert_eq!(response.header("location"), Some("/api/tasks/7"));
    }

    #[test]
    fn into_http_preserves_the_wire_shape() {
        let http = Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/api/tasks/7")
            .json_bytes(&b"{}"[..])
            .into_http();

        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers()["location"], "/api/tasks/7");
        assert_eq!(http.headers()["content-type"], "application/json");
    }
}

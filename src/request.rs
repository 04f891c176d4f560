//! Incoming HTTP request type and its per-request context bag.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

use crate::auth::Identity;
use crate::error::Failure;

/// An incoming HTTP request, owned exclusively by the pipeline for the
/// duration of one request.
///
/// Besides the wire data (method, path, headers, raw body), the request
/// carries a context bag that stages fill as it moves down the chain: the
/// body parser deposits the parsed JSON value, the auth guard deposits the
/// resolved [`Identity`]. Nothing here outlives the request.
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    context: Context,
}

/// Per-request scratch state written by pipeline stages, read by handlers.
#[derive(Default)]
struct Context {
    json: Option<serde_json::Value>,
    identity: Option<Identity>,
}

impl Request {
    /// Builds a request from its wire parts. Called by the server once the
    /// body has been collected; public so tests can drive
    /// [`App::handle`](crate::App::handle) without a socket.
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body,
            params: HashMap::new(),
            context: Context::default(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The raw, unparsed body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/api/tasks/{id}`, `req.param("id")` on `/api/tasks/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The parsed JSON body, if the body parser stage found one.
    pub fn json_value(&self) -> Option<&serde_json::Value> {
        self.context.json.as_ref()
    }

    /// Deserializes the parsed JSON body into `T`.
    ///
    /// Fails with `BadRequest` if no JSON body was present or the shape does
    /// not match — both are client mistakes, not server ones.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Failure> {
        let value = self
            .context
            .json
            .as_ref()
            .ok_or_else(|| Failure::bad_request("expected a JSON body"))?;
        serde_json::from_value(value.clone())
            .map_err(|e| Failure::bad_request(format!("invalid request body: {e}")))
    }

    /// The identity the auth guard resolved, if this request passed one.
    pub fn identity(&self) -> Option<&Identity> {
        self.context.identity.as_ref()
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub(crate) fn set_json(&mut self, value: serde_json::Value) {
        self.context.json = Some(value);
    }

    pub(crate) fn set_identity(&mut self, identity: Identity) {
        self.context.identity = Some(identity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_json(value: serde_json::Value) -> Request {
        let mut req = Request::new(Method::POST, "/api/tasks", HeaderMap::new(), Bytes::new());
        req.set_json(value);
        req
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", "application/json".parse().unwrap());

        let req = Request::new(Method::GET, "/health", headers, Bytes::new());
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("CONTENT-TYPE"), Some("application/json"));
    }

    #[test]
    fn json_extraction_requires_a_parsed_body() {
        let req = Request::new(Method::POST, "/api/tasks", HeaderMap::new(), Bytes::new());
        let err = req.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, Failure::BadRequest { .. }));
    }

    #[test]
    fn json_extraction_rejects_mismatched_shapes() {
        #[derive(serde::Deserialize)]
        struct Draft {
            #[allow(dead_code)]
            title: String,
        }

        let req = request_with_json(serde_json::json!({ "name": "wrong field" }));
        assert!(matches!(req.json::<Draft>(), Err(Failure::BadRequest { .. })));
    }
}

//! JSON body parser stage.
//!
//! A pure format-validation gate: when the declared content type is JSON, the
//! raw body must parse before anything downstream runs. Handlers then read
//! the parsed value from the request context instead of touching raw bytes.
//!
//! Bodies with another declared content type pass through untouched, and an
//! absent or empty body is fine — whether a body was *required* is the
//! handler's call (`req.json()` fails with `BadRequest` if it needed one).

use async_trait::async_trait;

use crate::error::Failure;
use crate::middleware::{Outcome, Stage};
use crate::request::Request;

pub struct BodyParser;

fn declares_json(req: &Request) -> bool {
    let Some(content_type) = req.header("content-type") else {
        return false;
    };
    // Strip parameters: "application/json; charset=utf-8" → "application/json".
    let mime = content_type.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case("application/json") || mime.to_ascii_lowercase().ends_with("+json")
}

#[async_trait]
impl Stage for BodyParser {
    async fn apply(&self, mut req: Request) -> Outcome {
        if !declares_json(&req) || req.body().is_empty() {
            return Outcome::Next(req);
        }

        match serde_json::from_slice(req.body()) {
            Ok(value) => {
                req.set_json(value);
                Outcome::Next(req)
            }
            Err(e) => Outcome::Fail(Failure::bad_request(format!("invalid JSON body: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::{HeaderMap, Method};

    fn json_request(body: &'static str) -> Request {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        Request::new(Method::POST, "/api/tasks", headers, Bytes::from_static(body.as_bytes()))
    }

    #[tokio::test]
    async fn well_formed_json_lands_in_the_context() {
        let outcome = BodyParser.apply(json_request(r#"{"title":"walk"}"#)).await;

        let Outcome::Next(req) = outcome else { panic!("expected Next") };
        assert_eq!(req.json_value().unwrap()["title"], "walk");
    }

    #[tokio::test]
    async fn malformed_json_fails_with_bad_request() {
        let outcome = BodyParser.apply(json_request(r#"{"title": unquoted}"#)).await;

        let Outcome::Fail(failure) = outcome else { panic!("expected Fail") };
        assert!(matches!(failure, Failure::BadRequest { .. }));
    }

    #[tokio::test]
    async fn empty_body_passes_with_no_context_value() {
        let outcome = BodyParser.apply(json_request("")).await;

        let Outcome::Next(req) = outcome else { panic!("expected Next") };
        assert!(req.json_value().is_none());
    }

    #[tokio::test]
    async fn non_json_content_type_is_not_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/plain".parse().unwrap());
        let req = Request::new(
            Method::POST,
            "/api/tasks",
            headers,
            Bytes::from_static(b"not json at all"),
        );

        let Outcome::Next(req) = BodyParser.apply(req).await else { panic!("expected Next") };
        assert!(req.json_value().is_none());
    }

    #[tokio::test]
    async fn json_content_type_with_parameters_is_recognized() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json; charset=utf-8".parse().unwrap());
        let req = Request::new(Method::POST, "/api/tasks", headers, Bytes::from_static(b"[1,2]"));

        let Outcome::Next(req) = BodyParser.apply(req).await else { panic!("expected Next") };
        assert!(req.json_value().is_some());
    }
}

//! Liveness endpoint.
//!
//! `GET /health` answers whether the process can serve HTTP at all, so it
//! deliberately has no dependencies — no collaborator calls, no auth, no
//! side effects beyond the usual request log line.

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::app::State;
use crate::error::Failure;
use crate::request::Request;
use crate::response::Response;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
}

/// `GET /health` → 200 `{"status":"ok","timestamp":<RFC 3339>}`.
pub async fn check(_state: State, _req: Request) -> Result<Response, Failure> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| Failure::internal(format!("timestamp formatting failed: {e}")))?;
    Response::json(&Health { status: "ok", timestamp })
}

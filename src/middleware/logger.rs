//! Request/response logging.
//!
//! Side-effect only: observes every request/response pair after the pipeline
//! settles and emits one structured record. Never alters control flow or
//! payload.

use std::time::Duration;

use http::{Method, StatusCode};
use tracing::info;

pub(crate) struct Logger;

impl Logger {
    pub(crate) fn record(&self, method: &Method, path: &str, status: StatusCode, elapsed: Duration) {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "request handled"
        );
    }
}

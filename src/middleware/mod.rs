//! Pipeline stages.
//!
//! A [`Stage`] is one link in the middleware chain. Its contract is fixed:
//! given the request, it yields exactly one [`Outcome`] — pass the (possibly
//! enriched) request onward, terminate with a response, or raise a
//! [`Failure`](crate::Failure) that flows straight to the error normalizer.
//!
//! Stages never see a committed response and never run after one; the
//! pipeline enforces that, not the stages themselves.

use async_trait::async_trait;

use crate::error::Failure;
use crate::request::Request;
use crate::response::Response;

pub mod auth;
pub mod body;
pub(crate) mod logger;

/// What a stage decided to do with the request.
pub enum Outcome {
    /// Continue to the next stage with the (possibly mutated) request.
    Next(Request),
    /// Terminate the chain with this response; no further stage runs.
    Respond(Response),
    /// Raise a failure; flows directly to the error normalizer.
    Fail(Failure),
}

/// One link in the middleware chain.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn apply(&self, req: Request) -> Outcome;
}

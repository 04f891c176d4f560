//! Auth guard stage, applied only to routes registered as guarded.
//!
//! Reads `Authorization: Bearer <token>`. A missing or malformed header is
//! rejected *before* the verifier is consulted — no collaborator call for
//! input that cannot possibly be valid. Verification is one call, no
//! retries; a verifier outage is surfaced as `UpstreamUnavailable` so the
//! normalizer can tell the client the failure was not theirs.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::{Authenticator, VerifyError};
use crate::error::Failure;
use crate::middleware::{Outcome, Stage};
use crate::request::Request;

pub struct AuthGuard {
    verifier: Arc<dyn Authenticator>,
}

impl AuthGuard {
    pub fn new(verifier: Arc<dyn Authenticator>) -> Self {
        Self { verifier }
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.header("authorization")?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[async_trait]
impl Stage for AuthGuard {
    async fn apply(&self, mut req: Request) -> Outcome {
        let Some(token) = bearer_token(&req).map(str::to_owned) else {
            return Outcome::Fail(Failure::unauthorized("missing bearer token"));
        };

        match self.verifier.verify(&token).await {
            Ok(identity) => {
                req.set_identity(identity);
                Outcome::Next(req)
            }
            Err(VerifyError::Rejected) => {
                Outcome::Fail(Failure::unauthorized("invalid or expired token"))
            }
            Err(VerifyError::Unavailable(detail)) => Outcome::Fail(Failure::upstream(detail)),
        }
    }
}

//! Authentication collaborator interface and the `/api/auth` handlers.
//!
//! The pipeline never implements credential logic itself — it calls through
//! the narrow [`Authenticator`] trait. The guard uses [`Authenticator::verify`]
//! exactly once per request; the login and register handlers use
//! [`Authenticator::issue`] and [`Authenticator::register`].
//!
//! [`MemoryAuthenticator`] is the reference implementation used by the bin
//! and the tests. It stores users and sessions in process memory and issues
//! opaque random tokens. It is deliberately not a real credential store:
//! password hashing and token formats are the trait implementor's concern.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::app::State;
use crate::error::Failure;
use crate::request::Request;
use crate::response::Response;

/// Opaque subject reference established by the auth guard.
///
/// Lives only in the request context; never persisted past the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>) -> Self {
        Self { subject: subject.into() }
    }
}

/// Why a credential could not be resolved to an [`Identity`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The verifier looked at the credential and said no.
    #[error("credential rejected")]
    Rejected,

    /// The verifier itself could not be reached. Not retried; surfaces as
    /// `UpstreamUnavailable`.
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
}

/// The external authentication collaborator.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolves a bearer token to an identity. One call per request, no
    /// retries.
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;

    /// Checks a username/password pair and issues a fresh token.
    async fn issue(&self, username: &str, password: &str) -> Result<String, Failure>;

    /// Creates a new subject for a username/password pair.
    async fn register(&self, username: &str, password: &str) -> Result<Identity, Failure>;
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

/// `POST /api/auth/register` → 201 with the created subject.
pub async fn register(state: State, req: Request) -> Result<Response, Failure> {
    let creds: Credentials = req.json()?;
    let identity = state.auth.register(&creds.username, &creds.password).await?;
    Response::builder()
        .status(StatusCode::CREATED)
        .json(&serde_json::json!({ "subject": identity.subject }))
}

/// `POST /api/auth/login` → 200 with an issued token.
pub async fn login(state: State, req: Request) -> Result<Response, Failure> {
    let creds: Credentials = req.json()?;
    let token = state.auth.issue(&creds.username, &creds.password).await?;
    Response::json(&serde_json::json!({ "token": token }))
}

struct UserRecord {
    subject: String,
    password: String,
}

/// In-memory [`Authenticator`] for dev and tests.
pub struct MemoryAuthenticator {
    users: RwLock<HashMap<String, UserRecord>>,
    sessions: RwLock<HashMap<String, String>>,
}

impl MemoryAuthenticator {
    pub fn new() -> Self {
        Self { users: RwLock::new(HashMap::new()), sessions: RwLock::new(HashMap::new()) }
    }

    fn fresh_token() -> String {
        format!("{:032x}{:032x}", fastrand::u128(..), fastrand::u128(..))
    }
}

impl Default for MemoryAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for MemoryAuthenticator {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(token)
            .map(|subject| Identity::new(subject.clone()))
            .ok_or(VerifyError::Rejected)
    }

    async fn issue(&self, username: &str, password: &str) -> Result<String, Failure> {
        let subject = {
            let users = self.users.read().unwrap_or_else(|e| e.into_inner());
            let record = users
                .get(username)
                .filter(|record| record.password == password)
                .ok_or_else(|| Failure::unauthorized("invalid username or password"))?;
            record.subject.clone()
        };

        let token = Self::fresh_token();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(token.clone(), subject);
        Ok(token)
    }

    async fn register(&self, username: &str, password: &str) -> Result<Identity, Failure> {
        if username.is_empty() || password.is_empty() {
            return Err(Failure::bad_request("username and password must be non-empty"));
        }

        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.contains_key(username) {
            return Err(Failure::bad_request("username already registered"));
        }

        let subject = format!("user-{}", users.len() + 1);
        users.insert(
            username.to_owned(),
            UserRecord { subject: subject.clone(), password: password.to_owned() },
        );
        Ok(Identity::new(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_then_login_then_verify() {
        let auth = MemoryAuthenticator::new();

        let identity = auth.register("alice", "s3cret").await.unwrap();
        let token = auth.issue("alice", "s3cret").await.unwrap();
        let verified = auth.verify(&token).await.unwrap();

        assert_eq!(verified, identity);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = MemoryAuthenticator::new();
        auth.register("alice", "s3cret").await.unwrap();

        let err = auth.issue("alice", "nope").await.unwrap_err();
        assert!(matches!(err, Failure::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let auth = MemoryAuthenticator::new();
        auth.register("alice", "s3cret").await.unwrap();

        let err = auth.register("alice", "other").await.unwrap_err();
        assert!(matches!(err, Failure::BadRequest { .. }));
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let auth = MemoryAuthenticator::new();
        assert!(matches!(auth.verify("bogus").await, Err(VerifyError::Rejected)));
    }

    #[tokio::test]
    async fn tokens_are_unique_per_login() {
        let auth = MemoryAuthenticator::new();
        auth.register("alice", "s3cret").await.unwrap();

        let first = auth.issue("alice", "s3cret").await.unwrap();
        let second = auth.issue("alice", "s3cret").await.unwrap();
        assert_ne!(first, second);
    }
}

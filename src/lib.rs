//! # taskd
//!
//! A small task-management HTTP API built on an explicit request pipeline.
//!
//! ## The pipeline
//!
//! Every request takes the same fixed path:
//!
//! ```text
//! body parser → router → auth guard (task routes only) → handler
//!                                                          │
//!               error normalizer ◀── any Failure ──────────┘
//! ```
//!
//! Each stage either passes the request onward (possibly enriching its
//! context), terminates with a response, or raises a typed [`Failure`].
//! Failures skip every remaining stage and reach the normalizer, the only
//! place that turns them into HTTP: a fixed status per kind and one uniform
//! JSON error body. A logger observes every request/response pair; it never
//! touches either.
//!
//! ## The surface
//!
//! | Method | Path | Auth |
//! |---|---|---|
//! | GET | `/health` | — |
//! | POST | `/api/auth/register` | — |
//! | POST | `/api/auth/login` | — |
//! | GET / POST | `/api/tasks` | bearer token |
//! | GET / PUT / DELETE | `/api/tasks/{id}` | bearer token |
//!
//! Credential storage and task persistence live behind the [`Authenticator`]
//! and [`TaskStore`] traits — the pipeline gates and dispatches, it does not
//! implement either. [`MemoryAuthenticator`] and [`MemoryTaskStore`] are the
//! in-process reference collaborators used by the bin and the tests.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskd::{App, MemoryAuthenticator, MemoryTaskStore, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = App::new(
//!         Arc::new(MemoryAuthenticator::new()),
//!         Arc::new(MemoryTaskStore::new()),
//!     );
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//! ```

mod app;
mod config;
mod error;
mod handler;
mod pipeline;
mod request;
mod response;
mod router;
mod server;

pub mod auth;
pub mod health;
pub mod middleware;
pub mod tasks;

pub use app::{App, State};
pub use auth::{Authenticator, Identity, MemoryAuthenticator, VerifyError};
pub use config::{Config, ConfigError};
pub use error::{Error, Failure};
pub use handler::Handler;
pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use server::Server;
pub use tasks::{MemoryTaskStore, Task, TaskDraft, TaskStore};

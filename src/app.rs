//! Application assembly: the explicit dependency bundle and route table.
//!
//! There is no global app instance. [`App::new`] takes the collaborators,
//! builds the route table and pipeline once, and the result is immutable —
//! tests construct as many independent instances as they like and drive
//! [`App::handle`] directly, no socket required.

use std::sync::Arc;

use http::Method;

use crate::auth::{self, Authenticator};
use crate::health;
use crate::middleware::auth::AuthGuard;
use crate::middleware::body::BodyParser;
use crate::middleware::Stage;
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::tasks::{self, TaskStore};

/// The collaborator bundle every handler receives. Cloning is two Arc
/// bumps.
#[derive(Clone)]
pub struct State {
    pub auth: Arc<dyn Authenticator>,
    pub tasks: Arc<dyn TaskStore>,
}

/// One fully-wired API instance.
pub struct App {
    pipeline: Pipeline,
}

impl App {
    /// Wires the pipeline: body parser → router → auth guard (task routes
    /// only) → handler, with the normalizer and logger around the whole
    /// thing.
    pub fn new(auth: Arc<dyn Authenticator>, tasks: Arc<dyn TaskStore>) -> Self {
        let state = State { auth: Arc::clone(&auth), tasks };
        let stages: Vec<Arc<dyn Stage>> = vec![Arc::new(BodyParser)];
        let guard = Arc::new(AuthGuard::new(auth));

        Self { pipeline: Pipeline::new(stages, guard, Self::routes(), state) }
    }

    /// The full HTTP surface. Three disjoint mounts: `/health`,
    /// `/api/auth/*`, and the guarded `/api/tasks/*`.
    fn routes() -> Router {
        Router::new()
            .on(Method::GET, "/health", health::check)
            .on(Method::POST, "/api/auth/register", auth::register)
            .on(Method::POST, "/api/auth/login", auth::login)
            .guarded(Method::GET, "/api/tasks", tasks::list)
            .guarded(Method::POST, "/api/tasks", tasks::create)
            .guarded(Method::GET, "/api/tasks/{id}", tasks::get)
            .guarded(Method::PUT, "/api/tasks/{id}", tasks::update)
            .guarded(Method::DELETE, "/api/tasks/{id}", tasks::remove)
    }

    /// Runs one request through the pipeline. Always yields a response.
    pub async fn handle(&self, req: Request) -> Response {
        self.pipeline.handle(req).await
    }
}

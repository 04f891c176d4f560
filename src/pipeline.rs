//! The request-handling pipeline: chain execution, dispatch, normalization.
//!
//! Every request takes the same path — global stages in declared order, then
//! route lookup, then the auth guard (guarded routes only), then the handler.
//! Any of those can short-circuit with a response or a
//! [`Failure`](crate::Failure); a failure skips every remaining stage and
//! goes straight to the normalizer. Exactly one response leaves per request,
//! and once it does, nothing downstream can write to it.
//!
//! Handler panics are caught on the handler future itself
//! (`catch_unwind`, not `tokio::spawn`) and mapped to `Internal`. Keeping
//! the future attached to the connection task means a client disconnect
//! drops it mid-poll, cancelling in-flight collaborator calls.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::app::State;
use crate::error::Failure;
use crate::middleware::logger::Logger;
use crate::middleware::{Outcome, Stage};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

pub(crate) struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    guard: Arc<dyn Stage>,
    router: Router,
    state: State,
    logger: Logger,
}

impl Pipeline {
    pub(crate) fn new(
        stages: Vec<Arc<dyn Stage>>,
        guard: Arc<dyn Stage>,
        router: Router,
        state: State,
    ) -> Self {
        Self { stages, guard, router, state, logger: Logger }
    }

    /// The whole per-request path. Always produces a response; failures are
    /// normalized here and logged along with every success.
    pub(crate) async fn handle(&self, req: Request) -> Response {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.path().to_owned();

        let response = match self.run(req).await {
            Ok(response) => response,
            Err(failure) => failure.into_response(),
        };

        self.logger.record(&method, &path, response.status_code(), started.elapsed());
        response
    }

    async fn run(&self, mut req: Request) -> Result<Response, Failure> {
        for stage in &self.stages {
            match stage.apply(req).await {
                Outcome::Next(next) => req = next,
                Outcome::Respond(response) => return Ok(response),
                Outcome::Fail(failure) => return Err(failure),
            }
        }

        let matched = self.router.lookup(req.method(), req.path())?;
        req.set_params(matched.params);

        // Guard only where declared; skipping it elsewhere is routing policy,
        // not an accident.
        if matched.guarded {
            match self.guard.apply(req).await {
                Outcome::Next(next) => req = next,
                Outcome::Respond(response) => return Ok(response),
                Outcome::Fail(failure) => return Err(failure),
            }
        }

        let handler = matched.handler;
        match AssertUnwindSafe(handler.call(self.state.clone(), req)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(Failure::internal(panic_detail(panic))),
        }
    }
}

/// Best-effort extraction of a panic payload for the server-side log. Never
/// sent to the client.
fn panic_detail(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("handler panicked: {msg}")
    } else {
        "handler panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryAuthenticator;
    use crate::middleware::auth::AuthGuard;
    use crate::middleware::body::BodyParser;
    use crate::tasks::MemoryTaskStore;
    use bytes::Bytes;
    use http::{HeaderMap, Method, StatusCode};

    fn state() -> State {
        State {
            auth: Arc::new(MemoryAuthenticator::new()),
            tasks: Arc::new(MemoryTaskStore::new()),
        }
    }

    fn pipeline(router: Router) -> Pipeline {
        let state = state();
        let guard = Arc::new(AuthGuard::new(Arc::clone(&state.auth)));
        Pipeline::new(vec![Arc::new(BodyParser)], guard, router, state)
    }

    fn get(path: &str) -> Request {
        Request::new(Method::GET, path, HeaderMap::new(), Bytes::new())
    }

    #[tokio::test]
    async fn a_panicking_handler_becomes_a_500() {
        async fn boom(_: State, _: Request) -> Result<Response, Failure> {
            panic!("boom: secret internal state");
        }

        let pipeline = pipeline(Router::new().on(Method::GET, "/boom", boom));
        let response = pipeline.handle(get("/boom")).await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["message"], "internal server error");
        assert!(!String::from_utf8_lossy(response.body()).contains("secret"));
    }

    #[tokio::test]
    async fn a_failing_stage_skips_the_handler() {
        async fn never(_: State, _: Request) -> Result<Response, Failure> {
            unreachable!("stage failure must short-circuit dispatch");
        }

        let pipeline = pipeline(Router::new().guarded(Method::GET, "/api/tasks", never));
        let response = pipeline.handle(get("/api/tasks")).await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn a_responding_stage_terminates_the_chain() {
        struct Teapot;

        #[async_trait::async_trait]
        impl Stage for Teapot {
            async fn apply(&self, _req: Request) -> Outcome {
                Outcome::Respond(Response::status(StatusCode::IM_A_TEAPOT))
            }
        }

        async fn never(_: State, _: Request) -> Result<Response, Failure> {
            unreachable!("a stage response must terminate the chain");
        }

        let state = state();
        let guard = Arc::new(AuthGuard::new(Arc::clone(&state.auth)));
        let pipeline = Pipeline::new(
            vec![Arc::new(Teapot)],
            guard,
            Router::new().on(Method::GET, "/anything", never),
            state,
        );

        let response = pipeline.handle(get("/anything")).await;
        assert_eq!(response.status_code(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn stages_run_in_declared_order() {
        use std::sync::Mutex;

        struct Tag(&'static str, Arc<Mutex<Vec<&'static str>>>);

        #[async_trait::async_trait]
        impl Stage for Tag {
            async fn apply(&self, req: Request) -> Outcome {
                self.1.lock().unwrap().push(self.0);
                Outcome::Next(req)
            }
        }

        async fn ok(_: State, _: Request) -> Result<Response, Failure> {
            Ok(Response::status(StatusCode::OK))
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = state();
        let guard = Arc::new(AuthGuard::new(Arc::clone(&state.auth)));
        let pipeline = Pipeline::new(
            vec![
                Arc::new(Tag("first", Arc::clone(&seen))),
                Arc::new(Tag("second", Arc::clone(&seen))),
            ],
            guard,
            Router::new().on(Method::GET, "/", ok),
            state,
        );

        pipeline.handle(get("/")).await;
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }
}

//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. The table
//! is built once at startup and never mutated afterwards, so the pipeline can
//! share it across connection tasks without locking.
//!
//! Lookup distinguishes two misses: a path no tree knows (`NotFound`) and a
//! path some *other* method's tree knows (`MethodNotAllowed`). Routes are
//! registered as plain or guarded; the pipeline applies the auth guard only
//! to guarded matches, so skipping the guard is declared policy, not an
//! accident of control flow.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::error::Failure;
use crate::handler::{BoxedHandler, Handler};

struct Route {
    handler: BoxedHandler,
    guarded: bool,
}

/// Outcome of a successful route lookup.
pub(crate) struct RouteMatch {
    pub(crate) handler: BoxedHandler,
    pub(crate) guarded: bool,
    pub(crate) params: HashMap<String, String>,
}

/// The application route table.
///
/// Each registration call returns `self` so route declarations chain:
///
/// ```rust,no_run
/// # use http::Method;
/// # use taskd::{Failure, Request, Response, Router, State};
/// # async fn check(_: State, _: Request) -> Result<Response, Failure> { todo!() }
/// # async fn list(_: State, _: Request) -> Result<Response, Failure> { todo!() }
/// let routes = Router::new()
///     .on(Method::GET, "/health", check)
///     .guarded(Method::GET, "/api/tasks", list);
/// ```
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers an unguarded handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves
    /// them.
    ///
    /// # Panics
    ///
    /// Panics on an invalid or conflicting path pattern. Routes are declared
    /// once at startup, so a bad pattern is a programming error surfaced
    /// before the server accepts traffic.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, handler, false)
    }

    /// Registers a handler behind the auth guard.
    pub fn guarded(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.add(method, path, handler, true)
    }

    fn add(mut self, method: Method, path: &str, handler: impl Handler, guarded: bool) -> Self {
        let route = Route { handler: handler.into_boxed_handler(), guarded };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Finds the unique route entry for (method, path).
    ///
    /// `Err(NotFound)` when no method's tree matches the path,
    /// `Err(MethodNotAllowed)` when the path exists under a different method.
    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Result<RouteMatch, Failure> {
        if let Some(tree) = self.routes.get(method) {
            if let Ok(matched) = tree.at(path) {
                let params = matched
                    .params
                    .iter()
                    .map(|(k, v)| (k.to_owned(), v.to_owned()))
                    .collect();
                return Ok(RouteMatch {
                    handler: Arc::clone(&matched.value.handler),
                    guarded: matched.value.guarded,
                    params,
                });
            }
        }

        let path_known = self
            .routes
            .iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok());

        Err(if path_known { Failure::method_not_allowed() } else { Failure::not_found() })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

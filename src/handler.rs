//! Handler trait and type erasure.
//!
//! The route table needs to hold handlers of *different* concrete types in a
//! single map, so handlers are stored as trait objects behind a common
//! interface. The chain from user code to vtable call:
//!
//! ```text
//! async fn list(state: State, req: Request) -> Result<Response, Failure>
//!        ↓ router.on(Method::GET, "/api/tasks", list)
//! list.into_boxed_handler()              ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(list))              ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(state, req)               ← one vtable dispatch per request
//! ```
//!
//! The only runtime cost per request is one Arc clone plus one virtual call —
//! negligible next to network I/O.
//!
//! Handlers return `Result<Response, Failure>`: the `Err` arm flows to the
//! error normalizer, which is how every handler shares one failure contract.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::app::State;
use crate::error::Failure;
use crate::request::Request;
use crate::response::Response;

/// A heap-allocated, type-erased future resolving to a handler outcome.
///
/// `Pin<Box<…>>` because the runtime polls the future in place; `Send +
/// 'static` so tokio may move it across worker threads.
pub(crate) type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<Response, Failure>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, state: State, req: Request) -> HandlerFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure) with the signature:
///
/// ```text
/// async fn name(state: State, req: Request) -> Result<Response, Failure>
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it, which
/// keeps the dispatch contract fixed.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(State, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Failure>> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(State, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Failure>> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype holding a concrete handler `F`, bridging the typed world to the
/// trait-object world.
struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(State, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response, Failure>> + Send + 'static,
{
    fn call(&self, state: State, req: Request) -> HandlerFuture {
        Box::pin((self.0)(state, req))
    }
}

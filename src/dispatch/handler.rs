//! Handler abstraction.
//!
//! A handler receives a [`RequestContext`] and either answers with a response
//! or delegates to the rest of the chain through `ctx.next()`.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::dispatch::context::RequestContext;
use crate::error::HandlerResult;

/// A route or middleware handler.
///
/// Implemented for every `Fn(RequestContext) -> impl Future<Output = HandlerResult>`,
/// so plain `async fn`s and annotated closures can be registered directly.
pub trait Handler: Send + Sync + 'static {
    /// Run the handler for one request.
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(ctx))
    }
}

/// Type-erased handler as stored in the registry.
pub type BoxedHandler = Arc<dyn Handler>;

/// Erase a handler's type for registration.
pub fn boxed<H: Handler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}

/// Build the handler list for a registration call.
///
/// ```rust,ignore
/// router.get("/user/[id]", false, handlers![auth, load_user])?;
/// ```
#[macro_export]
macro_rules! handlers {
    ($($handler:expr),* $(,)?) => {
        ::std::vec![$($crate::dispatch::boxed($handler)),*]
    };
}

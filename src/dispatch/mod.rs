//! Handler dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Resolution (handlers, primary route)
//!     → chain.rs (Chain, one step per handler)
//!     → context.rs (RequestContext handed to each handler)
//!     → handler.rs (Handler::call)
//!     → ctx.next() → next step ... → Response
//! ```

pub mod chain;
pub mod context;
pub mod handler;

pub use chain::Next;
pub use context::{Data, Env, FunctionContext, RequestContext};
pub use handler::{boxed, BoxedHandler, Handler};

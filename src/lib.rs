//! Edge function request router.
//!
//! File-path style patterns (`/user/[id]`, `/files/[[path]]`), prefix
//! middleware, and a sequential `next()` chain, plus a local Axum host.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use dispatch::{Data, Env, FunctionContext, RequestContext};
pub use error::{BoxError, HandlerResult, RouterError};
pub use http::{DevServer, EdgeRequest};
pub use lifecycle::Shutdown;
pub use routing::{MethodFilter, ParamValue, Params, Router};

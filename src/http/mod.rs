//! HTTP plumbing around the router.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, timeout)
//!     → Router::handle
//!     → request.rs (EdgeRequest, body buffering)
//!     → handlers build responses with response.rs
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{BodyError, EdgeRequest, X_REQUEST_ID};
pub use server::DevServer;

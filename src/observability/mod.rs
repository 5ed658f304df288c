//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router::handle produces:
//!     → logging.rs (structured log events inside a per-request span)
//!     → metrics.rs (request counter, latency histogram)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID rides on the `handle` span, so every event in a chain carries it
//! - Metrics are cheap; with no recorder installed they are no-ops

pub mod logging;
pub mod metrics;

//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! registration: "/user/[id]"
//!     → pattern.rs (parse into Literal / Param / CatchAll segments)
//!     → registry.rs (standard or middleware list)
//!
//! request: GET /user/42
//!     → pattern::split_path
//!     → registry.rs (PrefixMatcher for middleware, ExactMatcher for routes)
//!     → handler list, primary route
//!     → dispatch::chain (params.rs rebuilds bindings per step)
//! ```
//!
//! # Design Decisions
//! - Matching is linear over registered entries; tables are small
//! - Segments compare case-sensitively and without percent-decoding

pub mod matcher;
pub mod params;
pub mod pattern;
pub mod registry;
pub mod router;

pub use matcher::MethodFilter;
pub use params::{ParamValue, Params};
pub use pattern::{PathPattern, PatternError, Segment};
pub use router::{RouteInfo, RouteMatch, Router};

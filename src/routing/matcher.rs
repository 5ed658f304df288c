//! Route matching logic.
//!
//! # Responsibilities
//! - Filter entries by method (exact verb or wildcard)
//! - Match standard routes exactly (segment count must line up)
//! - Match middleware entries by prefix
//!
//! # Design Decisions
//! - Matching works on pre-split path segments; no regex, no allocation
//! - Method and path checks are separate so the registry can filter by
//!   method once and order the survivors before path matching
//! - Literal comparison is case-sensitive

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

use crate::routing::pattern::{PathPattern, Segment};

/// Method condition of a registered entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Matches every request method.
    Any,
    /// Matches one verb.
    Exact(Method),
}

impl MethodFilter {
    /// Returns true if a request with `method` passes this filter.
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Exact(expected) => expected == method,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, MethodFilter::Any)
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        MethodFilter::Exact(method)
    }
}

impl FromStr for MethodFilter {
    type Err = axum::http::method::InvalidMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" || s.eq_ignore_ascii_case("all") {
            return Ok(MethodFilter::Any);
        }
        Method::from_bytes(s.to_ascii_uppercase().as_bytes()).map(MethodFilter::Exact)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.write_str("*"),
            MethodFilter::Exact(method) => f.write_str(method.as_str()),
        }
    }
}

/// Trait for matching a request path against a registered pattern.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if `path` (already split into segments) matches `pattern`.
    fn matches(&self, pattern: &PathPattern, path: &[&str]) -> bool;
}

/// Exact matching used for standard routes.
///
/// Segment counts must agree, except that a trailing catch-all absorbs the
/// remaining one-or-more path segments.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatcher;

impl Matcher for ExactMatcher {
    fn matches(&self, pattern: &PathPattern, path: &[&str]) -> bool {
        let segments = pattern.segments();

        if pattern.ends_with_catch_all() {
            if path.len() < segments.len() {
                return false;
            }
        } else if path.len() != segments.len() {
            return false;
        }

        segments.iter().zip(path).all(|(seg, actual)| match seg {
            Segment::Literal(text) => text == actual,
            Segment::Param(_) | Segment::CatchAll(_) => true,
        })
    }
}

/// Prefix matching used for middleware entries.
///
/// Every pattern segment must line up with a path segment; extra trailing
/// path segments are allowed, so `/v1` matches `/v1/users/42`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixMatcher;

impl Matcher for PrefixMatcher {
    fn matches(&self, pattern: &PathPattern, path: &[&str]) -> bool {
        let prefix = pattern
            .segments()
            .iter()
            .enumerate()
            .all(|(i, seg)| match seg {
                Segment::Literal(text) => path.get(i).is_some_and(|actual| actual == text),
                Segment::Param(_) | Segment::CatchAll(_) => i < path.len(),
            });

        // A trailing catch-all also accepts any path of the same length.
        prefix || (pattern.ends_with_catch_all() && pattern.len() == path.len())
    }
}

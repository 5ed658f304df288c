//! Path parameter extraction.
//!
//! Walks the request path by index and binds `[name]` segments to a single
//! value and a trailing `[[name]]` segment to the rest of the path.

use std::collections::HashMap;

use serde::Serialize;

use crate::routing::pattern::{PathPattern, Segment};

/// A bound path parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Bound by a `[name]` segment.
    One(String),
    /// Bound by a `[[name]]` segment.
    Many(Vec<String>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::One(v) => Some(v),
            ParamValue::Many(_) => None,
        }
    }

    pub fn as_slice(&self) -> Option<&[String]> {
        match self {
            ParamValue::One(_) => None,
            ParamValue::Many(v) => Some(v),
        }
    }
}

/// Parameter bindings for one handler invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Params {
    inner: HashMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.inner.get(name)
    }

    /// Value of a single-segment parameter.
    pub fn get_one(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(ParamValue::as_str)
    }

    /// Segments bound by a catch-all parameter.
    pub fn get_many(&self, name: &str) -> Option<&[String]> {
        self.inner.get(name).and_then(ParamValue::as_slice)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) -> Option<ParamValue> {
        self.inner.insert(name.into(), value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Extract bindings for `pattern` from the request path segments.
///
/// Indexes past the end of the pattern produce no binding. Nothing is
/// validated here; the path is assumed to have matched already.
pub fn extract<S: AsRef<str>>(pattern: &PathPattern, path: &[S]) -> Params {
    let mut params = Params::new();
    let segments = pattern.segments();

    for (i, value) in path.iter().enumerate() {
        match segments.get(i) {
            Some(Segment::CatchAll(name)) => {
                let rest = path[i..].iter().map(|s| s.as_ref().to_string()).collect();
                params.insert(name.clone(), ParamValue::Many(rest));
            }
            Some(Segment::Param(name)) => {
                params.insert(name.clone(), ParamValue::One(value.as_ref().to_string()));
            }
            _ => {}
        }
    }

    params
}

//! Per-request context.
//!
//! # Responsibilities
//! - Carry the inbound request, host bindings and shared data to handlers
//! - Hold the parameter bindings for the current handler
//! - Expose the continuation (`next`) into the rest of the chain
//!
//! # Design Decisions
//! - `Data` is shared by every handler of one request and by nothing else
//! - `Params` is rebuilt for every handler; edits do not leak downstream
//! - `Env` is opaque to the router and cheap to clone

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use serde_json::Value;

use crate::dispatch::chain::Next;
use crate::error::RouterError;
use crate::http::request::EdgeRequest;
use crate::routing::params::{ParamValue, Params};

/// Environment bindings supplied by the host.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: Arc<HashMap<String, String>>,
}

impl Env {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self {
            vars: Arc::new(vars),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<HashMap<String, String>> for Env {
    fn from(vars: HashMap<String, String>) -> Self {
        Self::new(vars)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Env {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Mutable data bag shared by all handlers of one request.
#[derive(Debug, Clone, Default)]
pub struct Data {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.lock().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.inner.lock().expect("request data mutex poisoned")
    }
}

/// The value a host hands to `Router::handle` for one request.
#[derive(Debug)]
pub struct FunctionContext {
    pub request: Request<Body>,
    pub env: Env,
    pub data: Data,
    /// Path of the function being executed; defaults to the request path.
    pub function_path: String,
}

impl FunctionContext {
    pub fn new(request: Request<Body>) -> Self {
        let function_path = request.uri().path().to_string();
        Self {
            request,
            env: Env::default(),
            data: Data::default(),
            function_path,
        }
    }

    pub fn with_env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn with_function_path(mut self, path: impl Into<String>) -> Self {
        self.function_path = path.into();
        self
    }
}

/// What a handler receives.
pub struct RequestContext {
    request: EdgeRequest,
    env: Env,
    data: Data,
    params: Params,
    function_path: Arc<str>,
    next: Next,
}

impl RequestContext {
    pub(crate) fn new(
        request: EdgeRequest,
        env: Env,
        data: Data,
        params: Params,
        function_path: Arc<str>,
        next: Next,
    ) -> Self {
        Self {
            request,
            env,
            data,
            params,
            function_path,
            next,
        }
    }

    pub fn request(&self) -> &EdgeRequest {
        &self.request
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Shorthand for a single-segment parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(ParamValue::as_str)
    }

    pub fn function_path(&self) -> &str {
        &self.function_path
    }

    /// Run the rest of the chain with the current request.
    ///
    /// Each handler may call this at most once; a second call fails with
    /// [`RouterError::DoubleInvocation`] and the request ends in a 500.
    pub async fn next(&self) -> Result<Response, RouterError> {
        self.next.run(self.request.clone()).await
    }

    /// Run the rest of the chain with a replacement request.
    pub async fn next_with(&self, request: EdgeRequest) -> Result<Response, RouterError> {
        self.next.run(request).await
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request", &self.request)
            .field("params", &self.params)
            .field("function_path", &self.function_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_lookup() {
        let env: Env = [("API_URL", "https://api.test")].into_iter().collect();
        assert_eq!(env.get("API_URL"), Some("https://api.test"));
        assert_eq!(env.get("MISSING"), None);
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_data_shared_between_clones() {
        let data = Data::new();
        let other = data.clone();
        data.insert("user", "alice");
        assert_eq!(other.get("user"), Some(Value::from("alice")));
        assert!(other.contains("user"));
        assert_eq!(other.remove("user"), Some(Value::from("alice")));
        assert!(!data.contains("user"));
    }

    #[test]
    fn test_function_context_defaults() {
        let request = Request::builder()
            .uri("/api/users?limit=1")
            .body(Body::empty())
            .unwrap();
        let ctx = FunctionContext::new(request);
        assert_eq!(ctx.function_path, "/api/users");
        assert!(ctx.env.is_empty());

        let ctx = ctx.with_function_path("/api/[[path]]");
        assert_eq!(ctx.function_path, "/api/[[path]]");
    }
}

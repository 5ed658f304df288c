//! Router facade.
//!
//! # Responsibilities
//! - Registration per HTTP verb plus a wildcard-method variant
//! - Debug toggle controlling 404/500 body verbosity
//! - The `handle` entry point: prepare the request, resolve, run the chain,
//!   turn every failure into a response
//!
//! # Design Decisions
//! - Patterns are parsed at registration; a bad pattern is rejected there
//! - The registry is read-only while requests are handled, so a `Router`
//!   can sit behind an `Arc` without locking
//! - `handle` never returns an error: not-found, double invocation, handler
//!   errors and panics all become responses

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::http::Method;
use axum::response::Response;
use futures_util::FutureExt;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::RouterConfig;
use crate::dispatch::chain::{Chain, ChainParts};
use crate::dispatch::context::FunctionContext;
use crate::dispatch::handler::BoxedHandler;
use crate::error::RouterError;
use crate::http::request::{is_mutating, EdgeRequest, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::matcher::MethodFilter;
use crate::routing::params::{self, Params};
use crate::routing::pattern::{split_path, PathPattern};
use crate::routing::registry::{Route, RouteRegistry};

/// Default cap on buffered request bodies (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Summary of a registered entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub method: String,
    pub pattern: String,
    pub handlers: usize,
    pub middleware: bool,
}

/// What a request resolves to, without running any handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Pattern of the primary route.
    pub pattern: Option<String>,
    pub matched_routes: usize,
    pub matched_middleware: usize,
    pub handlers: usize,
    pub params: Params,
}

/// Request router for edge functions.
#[derive(Debug)]
pub struct Router {
    registry: RouteRegistry,
    debug: bool,
    body_limit: usize,
}

impl Router {
    pub fn new() -> Self {
        Self {
            registry: RouteRegistry::new(),
            debug: false,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Create a router using the debug flag and body limit from `config`.
    pub fn with_config(config: &RouterConfig) -> Self {
        Self {
            registry: RouteRegistry::new(),
            debug: config.debug,
            body_limit: config.limits.max_body_bytes,
        }
    }

    /// Toggle diagnostic bodies on 404 and 500 responses.
    pub fn debug(&mut self, enabled: bool) -> &mut Self {
        self.debug = enabled;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Set the maximum buffered body size for POST, PUT and PATCH.
    pub fn body_limit(&mut self, bytes: usize) -> &mut Self {
        self.body_limit = bytes;
        self
    }

    /// Register handlers for `method` at `pattern`.
    pub fn register(
        &mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        let parsed = PathPattern::parse(pattern).map_err(|source| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let method = method.into();

        tracing::debug!(
            method = %method,
            pattern = %parsed,
            middleware = is_middleware,
            handlers = handlers.len(),
            "Registering route"
        );

        self.registry
            .register(Route::new(method, parsed, handlers), is_middleware);
        Ok(self)
    }

    pub fn get(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::GET, pattern, is_middleware, handlers)
    }

    pub fn post(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::POST, pattern, is_middleware, handlers)
    }

    pub fn put(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::PUT, pattern, is_middleware, handlers)
    }

    pub fn patch(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::PATCH, pattern, is_middleware, handlers)
    }

    pub fn delete(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::DELETE, pattern, is_middleware, handlers)
    }

    pub fn head(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::HEAD, pattern, is_middleware, handlers)
    }

    pub fn options(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(Method::OPTIONS, pattern, is_middleware, handlers)
    }

    /// Register for every method.
    pub fn all(
        &mut self,
        pattern: &str,
        is_middleware: bool,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, RouterError> {
        self.register(MethodFilter::Any, pattern, is_middleware, handlers)
    }

    /// Registered standard routes, in registration order.
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.registry.routes().iter().map(|r| info(r, false)).collect()
    }

    /// Registered middleware entries, in registration order.
    pub fn middleware(&self) -> Vec<RouteInfo> {
        self.registry.middleware().iter().map(|r| info(r, true)).collect()
    }

    /// Registered entries, standard routes first, then middleware.
    pub fn entries(&self) -> Vec<RouteInfo> {
        let mut entries = self.routes();
        entries.extend(self.middleware());
        entries
    }

    /// Resolve a request without running it.
    pub fn resolve(&self, method: &Method, path: &str) -> RouteMatch {
        let segments = split_path(path);
        let resolution = self.registry.resolve(method, &segments);
        RouteMatch {
            params: resolution
                .route
                .as_deref()
                .map(|pattern| params::extract(pattern, &segments))
                .unwrap_or_default(),
            pattern: resolution.route.as_ref().map(|p| p.to_string()),
            matched_routes: resolution.matched_routes,
            matched_middleware: resolution.matched_middleware,
            handlers: resolution.handlers.len(),
        }
    }

    /// Handle one request.
    pub async fn handle(&self, ctx: FunctionContext) -> Response {
        let start = Instant::now();
        let method = ctx.request.method().clone();
        let path = ctx.request.uri().path().to_string();
        let request_id = ctx
            .request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let span = tracing::info_span!(
            "handle",
            request_id = %request_id,
            method = %method,
            path = %path,
        );

        let response = async {
            match AssertUnwindSafe(self.dispatch(ctx)).catch_unwind().await {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => self.fault(err),
                Err(panic) => self.fault(RouterError::Handler(panic_message(panic).into())),
            }
        }
        .instrument(span)
        .await;

        metrics::record_request(method.as_str(), response.status().as_u16(), start);
        response
    }

    async fn dispatch(&self, ctx: FunctionContext) -> Result<Response, RouterError> {
        let FunctionContext {
            request,
            env,
            data,
            function_path,
        } = ctx;

        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request =
            EdgeRequest::from_request(request, is_mutating(&method), self.body_limit).await?;

        let segments = split_path(&path);
        let resolution = self.registry.resolve(&method, &segments);

        let route = resolution
            .route
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        tracing::debug!(
            route = %route,
            routes = resolution.matched_routes,
            middleware = resolution.matched_middleware,
            handlers = resolution.handlers.len(),
            "Resolved request"
        );

        let chain = Chain::new(ChainParts {
            handlers: resolution.handlers,
            route: resolution.route,
            segments: segments.into_iter().map(String::from).collect(),
            env,
            data,
            function_path,
            method,
            path,
            debug: self.debug,
        });

        let result = chain.start(request).await;
        if chain.is_poisoned() {
            return Err(RouterError::DoubleInvocation);
        }
        result
    }

    fn fault(&self, err: RouterError) -> Response {
        let status = err.status();
        match &err {
            RouterError::NotFound { .. } | RouterError::Body(_) => {
                tracing::warn!(status = status.as_u16(), error = %err, "Request rejected");
            }
            _ => {
                tracing::error!(status = status.as_u16(), error = %err.diagnostic(), "Request failed");
            }
        }

        if self.debug {
            response::text(status, err.diagnostic())
        } else {
            response::empty(status)
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn info(route: &Route, middleware: bool) -> RouteInfo {
    RouteInfo {
        method: route.method().to_string(),
        pattern: route.pattern().to_string(),
        handlers: route.handler_count(),
        middleware,
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("handler panicked: {}", msg)
    } else {
        "handler panicked".to_string()
    }
}

//! Sequential dispatch chain.
//!
//! # Responsibilities
//! - Run the resolved handlers in order, one continuation step at a time
//! - Rebuild parameter bindings before every handler invocation
//! - Answer 404 when the chain runs out of handlers
//! - Detect a continuation invoked more than once for the same step
//!
//! # Design Decisions
//! - A single cursor records the highest index started; starting an index
//!   that is not above it is a double invocation
//! - A double invocation poisons the chain, so the request fails even if the
//!   offending handler swallows the error
//! - Each step is boxed; the recursion depth equals the handler count

use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::dispatch::context::{Data, Env, RequestContext};
use crate::dispatch::handler::BoxedHandler;
use crate::error::RouterError;
use crate::http::request::EdgeRequest;
use crate::http::response;
use crate::routing::params::{self, Params};
use crate::routing::pattern::PathPattern;

/// Everything one request's chain needs, shared by all of its steps.
pub(crate) struct Chain {
    handlers: Vec<BoxedHandler>,
    route: Option<Arc<PathPattern>>,
    segments: Vec<String>,
    env: Env,
    data: Data,
    function_path: Arc<str>,
    method: Method,
    path: String,
    debug: bool,
    cursor: AtomicIsize,
    poisoned: AtomicBool,
}

pub(crate) struct ChainParts {
    pub handlers: Vec<BoxedHandler>,
    pub route: Option<Arc<PathPattern>>,
    pub segments: Vec<String>,
    pub env: Env,
    pub data: Data,
    pub function_path: String,
    pub method: Method,
    pub path: String,
    pub debug: bool,
}

impl Chain {
    pub(crate) fn new(parts: ChainParts) -> Arc<Self> {
        Arc::new(Self {
            handlers: parts.handlers,
            route: parts.route,
            segments: parts.segments,
            env: parts.env,
            data: parts.data,
            function_path: parts.function_path.into(),
            method: parts.method,
            path: parts.path,
            debug: parts.debug,
            cursor: AtomicIsize::new(-1),
            poisoned: AtomicBool::new(false),
        })
    }

    /// Run the chain from the first handler.
    pub(crate) fn start(
        self: &Arc<Self>,
        request: EdgeRequest,
    ) -> BoxFuture<'static, Result<Response, RouterError>> {
        Self::step(Arc::clone(self), 0, request)
    }

    /// True once any handler invoked its continuation twice.
    pub(crate) fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    fn step(
        chain: Arc<Self>,
        index: usize,
        request: EdgeRequest,
    ) -> BoxFuture<'static, Result<Response, RouterError>> {
        Box::pin(async move {
            let position = index as isize;
            if chain.cursor.fetch_max(position, Ordering::SeqCst) >= position {
                chain.poisoned.store(true, Ordering::SeqCst);
                tracing::error!(step = index, "continuation invoked more than once");
                return Err(RouterError::DoubleInvocation);
            }

            let Some(handler) = chain.handlers.get(index).cloned() else {
                return Ok(chain.exhausted());
            };

            tracing::trace!(step = index, total = chain.handlers.len(), "invoking handler");

            let ctx = RequestContext::new(
                request,
                chain.env.clone(),
                chain.data.clone(),
                chain.params(),
                Arc::clone(&chain.function_path),
                Next {
                    chain: Arc::clone(&chain),
                    index: index + 1,
                },
            );

            handler.call(ctx).await.map_err(RouterError::from_boxed)
        })
    }

    fn params(&self) -> Params {
        match &self.route {
            Some(pattern) => params::extract(pattern, &self.segments),
            None => Params::new(),
        }
    }

    fn exhausted(&self) -> Response {
        tracing::warn!(method = %self.method, path = %self.path, "no handler left in chain");
        if self.debug {
            let err = RouterError::NotFound {
                method: self.method.clone(),
                path: self.path.clone(),
            };
            response::text(StatusCode::NOT_FOUND, err.diagnostic())
        } else {
            response::empty(StatusCode::NOT_FOUND)
        }
    }
}

/// Continuation into the rest of a chain.
#[derive(Clone)]
pub struct Next {
    chain: Arc<Chain>,
    index: usize,
}

impl Next {
    /// Run the handler after the current one, and everything it delegates to.
    pub async fn run(&self, request: EdgeRequest) -> Result<Response, RouterError> {
        Chain::step(Arc::clone(&self.chain), self.index, request).await
    }
}

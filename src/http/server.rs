//! Local HTTP host for a `Router`.
//!
//! # Responsibilities
//! - Create the Axum app with the edge router mounted as its fallback
//! - Wire up middleware (tracing, request ID, timeout)
//! - Turn each inbound request into a `FunctionContext`
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::dispatch::context::{Env, FunctionContext};
use crate::lifecycle::shutdown;
use crate::routing::Router;

/// State injected into the fallback handler.
#[derive(Clone)]
struct AppState {
    router: Arc<Router>,
    env: Env,
}

/// HTTP host running edge functions locally.
pub struct DevServer {
    app: axum::Router,
}

impl DevServer {
    /// Mount `router` with the bindings and timeout from `config`.
    pub fn new(router: Router, config: &RouterConfig) -> Self {
        let state = AppState {
            router: Arc::new(router),
            env: config.env(),
        };
        let app = Self::build_app(state, Duration::from_secs(config.server.request_timeout_secs));
        Self { app }
    }

    #[allow(deprecated)]
    fn build_app(state: AppState, timeout: Duration) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(timeout)),
            )
    }

    /// The Axum app, for embedding in another server.
    pub fn into_app(self) -> axum::Router {
        self.app
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        signal: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Dev server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown::wait(signal))
            .await?;

        tracing::info!("Dev server stopped");
        Ok(())
    }
}

async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let ctx = FunctionContext::new(request).with_env(state.env.clone());
    state.router.handle(ctx).await
}

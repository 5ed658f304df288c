//! Edge function dev host.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ DevServer (axum fallback, request ID, timeout, trace)
//!                          │
//!                          ▼
//!                     Router::handle
//!                          │ resolve: middleware (prefix) + routes (exact)
//!                          ▼
//!                     ┌──────────┐ next() ┌──────────┐ next() ┌─────────┐
//!                     │middleware│───────▶│middleware│───────▶│ handler │
//!                     └──────────┘        └──────────┘        └─────────┘
//!                          │
//!     Client Response ◀────┘  (404 when the chain runs dry, 500 on faults)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::http::{header, HeaderValue, StatusCode};
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use edge_router::config::{load_config, RouterConfig};
use edge_router::http::response;
use edge_router::lifecycle::signals;
use edge_router::observability::{logging, metrics};
use edge_router::{
    handlers, DevServer, HandlerResult, RequestContext, Router, RouterError, Shutdown,
};

#[derive(Parser)]
#[command(name = "edge-router")]
#[command(about = "Run edge functions behind the file-path router", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Diagnostic bodies on 404/500 responses
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind.to_string();
    }
    config.debug |= cli.debug;

    logging::init(&config.observability.log_level);

    tracing::info!("edge-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        debug = config.debug,
        max_body_bytes = config.limits.max_body_bytes,
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let mut router = Router::with_config(&config);
    register_functions(&mut router)?;
    for entry in router.entries() {
        tracing::info!(
            method = %entry.method,
            pattern = %entry.pattern,
            handlers = entry.handlers,
            middleware = entry.middleware,
            "Function registered"
        );
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_signals(shutdown));

    DevServer::new(router, &config).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn register_functions(router: &mut Router) -> Result<(), RouterError> {
    router
        .all("/", true, handlers![stamp])?
        .all("/api", true, handlers![require_json])?
        .get("/", false, handlers![index])?
        .get("/hello", false, handlers![hello])?
        .get("/user/[id]", false, handlers![user])?
        .get("/files/[[path]]", false, handlers![files])?
        .post("/api/echo", false, handlers![echo])?;
    Ok(())
}

/// Adds a `server-timing` header to every response.
async fn stamp(ctx: RequestContext) -> HandlerResult {
    let started = std::time::Instant::now();
    let mut res = ctx.next().await?;
    let timing = format!("edge;dur={:.3}", started.elapsed().as_secs_f64() * 1000.0);
    res.headers_mut()
        .insert("server-timing", HeaderValue::from_str(&timing)?);
    Ok(res)
}

/// Rejects API calls with a body but no JSON content type.
async fn require_json(ctx: RequestContext) -> HandlerResult {
    let has_body = ctx.request().headers().contains_key(header::CONTENT_LENGTH);
    let is_json = ctx
        .request()
        .header(header::CONTENT_TYPE.as_str())
        .is_some_and(|v| v.starts_with("application/json"));
    if has_body && !is_json {
        return Ok(response::text(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected application/json",
        ));
    }
    Ok(ctx.next().await?)
}

async fn index(ctx: RequestContext) -> HandlerResult {
    let routes = ["/hello", "/user/[id]", "/files/[[path]]", "/api/echo"];
    Ok(response::json(
        StatusCode::OK,
        &json!({ "function": ctx.function_path(), "routes": routes }),
    )?)
}

async fn hello(ctx: RequestContext) -> HandlerResult {
    let name = ctx.env().get("GREETING_NAME").unwrap_or("world");
    Ok(response::text(StatusCode::OK, format!("Hello, {}!", name)))
}

async fn user(ctx: RequestContext) -> HandlerResult {
    Ok(response::json(StatusCode::OK, &json!({ "id": ctx.param("id") }))?)
}

async fn files(ctx: RequestContext) -> HandlerResult {
    let path = ctx.params().get_many("path").unwrap_or_default();
    Ok(response::json(StatusCode::OK, &json!({ "path": path }))?)
}

async fn echo(ctx: RequestContext) -> HandlerResult {
    let body: serde_json::Value = ctx.request().json().await?;
    Ok(response::json(StatusCode::OK, &json!({ "echo": body }))?)
}

//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use edge_router::http::response;
use edge_router::{
    DevServer, FunctionContext, HandlerResult, RequestContext, RouterConfig, Shutdown,
};

/// Build a `FunctionContext` with an empty body.
pub fn request(method: Method, path: &str) -> FunctionContext {
    request_with_body(method, path, Body::empty())
}

/// Build a `FunctionContext` carrying `body`.
pub fn request_with_body(method: Method, path: &str, body: impl Into<Body>) -> FunctionContext {
    FunctionContext::new(
        Request::builder()
            .method(method)
            .uri(format!("http://edge.test{}", path))
            .body(body.into())
            .unwrap(),
    )
}

/// Collect a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Handler answering 200 with `label`.
pub fn reply(label: &'static str) -> impl Fn(RequestContext) -> std::future::Ready<HandlerResult> + Clone {
    move |_ctx: RequestContext| -> std::future::Ready<HandlerResult> {
        std::future::ready(Ok(response::text(StatusCode::OK, label)))
    }
}

/// Handler appending `label` to the shared `trail` and continuing.
pub fn mark(
    label: &'static str,
) -> impl Fn(RequestContext) -> BoxFuture<'static, HandlerResult> + Clone {
    move |ctx: RequestContext| -> BoxFuture<'static, HandlerResult> {
        Box::pin(async move {
            let mut trail = ctx
                .data()
                .get("trail")
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default();
            if !trail.is_empty() {
                trail.push(',');
            }
            trail.push_str(label);
            ctx.data().insert("trail", trail);
            Ok(ctx.next().await?)
        })
    }
}

/// Terminal handler answering with the accumulated trail.
pub async fn trail(ctx: RequestContext) -> HandlerResult {
    let trail = ctx
        .data()
        .get("trail")
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default();
    Ok(response::text(StatusCode::OK, trail))
}

/// Start a `DevServer` on a free loopback port.
pub async fn start_dev_server(
    router: edge_router::Router,
    config: RouterConfig,
) -> (SocketAddr, Arc<Shutdown>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = DevServer::new(router, &config).run(listener, rx).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}

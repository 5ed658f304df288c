//! Request handling and transformation.
//!
//! # Responsibilities
//! - Wrap the inbound request so every handler in a chain can see it
//! - Make the body re-readable for mutating verbs (POST, PUT, PATCH)
//! - Enforce the configured body size limit while buffering
//!
//! # Design Decisions
//! - The request head is shared behind `Arc`; handlers never copy headers
//! - A streaming body is one-shot: the first read consumes it and later reads
//!   fail with `BodyError::AlreadyConsumed`
//! - A buffered body is `Bytes`, so re-reads are reference-count bumps

use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method, Request, Uri};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Errors raised while preparing or reading a request body.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The declared or buffered body exceeds the configured limit.
    #[error("body exceeds limit of {limit} bytes")]
    TooLarge { limit: usize },

    /// A streaming body was read a second time.
    #[error("body stream already consumed")]
    AlreadyConsumed,

    /// The underlying transport failed while reading.
    #[error("failed to read body: {0}")]
    Read(#[source] axum::Error),

    /// The body was not valid UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The body was not the expected JSON.
    #[error("body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone)]
enum RequestBody {
    Buffered(Bytes),
    Streaming(Arc<Mutex<Option<Body>>>),
}

/// The request as seen by handlers.
///
/// Cloning is cheap; clones share the head and the body.
#[derive(Clone)]
pub struct EdgeRequest {
    head: Arc<Parts>,
    body: RequestBody,
    limit: usize,
}

impl EdgeRequest {
    /// Wrap an inbound request.
    ///
    /// With `reusable` set the body is read once up front (at most `limit`
    /// bytes) so it can be read again by every handler.
    pub async fn from_request(
        req: Request<Body>,
        reusable: bool,
        limit: usize,
    ) -> Result<Self, BodyError> {
        let (head, body) = req.into_parts();

        let body = if reusable {
            if declared_length(&head.headers).is_some_and(|len| len > limit) {
                return Err(BodyError::TooLarge { limit });
            }
            RequestBody::Buffered(read_limited(body, limit).await?)
        } else {
            RequestBody::Streaming(Arc::new(Mutex::new(Some(body))))
        };

        Ok(Self {
            head: Arc::new(head),
            body,
            limit,
        })
    }

    /// Build a request whose body is already in memory.
    pub fn buffered(req: Request<Bytes>) -> Self {
        let (head, bytes) = req.into_parts();
        Self {
            head: Arc::new(head),
            body: RequestBody::Buffered(bytes),
            limit: usize::MAX,
        }
    }

    pub fn method(&self) -> &Method {
        &self.head.method
    }

    pub fn uri(&self) -> &Uri {
        &self.head.uri
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        self.head.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns true if the body can be read more than once.
    pub fn is_reusable(&self) -> bool {
        matches!(self.body, RequestBody::Buffered(_))
    }

    /// Read the whole body.
    pub async fn bytes(&self) -> Result<Bytes, BodyError> {
        match &self.body {
            RequestBody::Buffered(bytes) => Ok(bytes.clone()),
            RequestBody::Streaming(slot) => {
                let body = slot
                    .lock()
                    .expect("request body mutex poisoned")
                    .take()
                    .ok_or(BodyError::AlreadyConsumed)?;
                read_limited(body, self.limit).await
            }
        }
    }

    /// Read the body as UTF-8 text.
    pub async fn text(&self) -> Result<String, BodyError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    /// Read the body as JSON.
    pub async fn json<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl std::fmt::Debug for EdgeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeRequest")
            .field("method", &self.head.method)
            .field("uri", &self.head.uri)
            .field("reusable", &self.is_reusable())
            .finish()
    }
}

/// Returns true for verbs whose body must survive being read twice.
pub fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Collect `body`, failing with `TooLarge` once it passes `limit` bytes.
async fn read_limited(body: Body, limit: usize) -> Result<Bytes, BodyError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(BodyError::Read)?;
        if buf.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("http://edge.test/items/7?draft=1")
            .header("x-tenant", "acme")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_buffered_body_reads_twice() {
        let req = EdgeRequest::from_request(request(Method::POST, "hello"), true, 1024)
            .await
            .unwrap();
        assert!(req.is_reusable());
        assert_eq!(req.text().await.unwrap(), "hello");
        assert_eq!(req.text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_streaming_body_is_one_shot() {
        let req = EdgeRequest::from_request(request(Method::GET, "hello"), false, 1024)
            .await
            .unwrap();
        let clone = req.clone();
        assert_eq!(req.bytes().await.unwrap(), Bytes::from("hello"));
        assert!(matches!(
            clone.bytes().await,
            Err(BodyError::AlreadyConsumed)
        ));
    }

    #[tokio::test]
    async fn test_limit_enforced_when_buffering() {
        let err = EdgeRequest::from_request(request(Method::PUT, "0123456789"), true, 4)
            .await
            .unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: 4 }));

        let streamed = EdgeRequest::from_request(request(Method::GET, "0123456789"), false, 4)
            .await
            .unwrap();
        assert!(matches!(
            streamed.bytes().await,
            Err(BodyError::TooLarge { limit: 4 })
        ));

        let declared = Request::builder()
            .method(Method::POST)
            .header(header::CONTENT_LENGTH, "10")
            .body(Body::from("0123456789"))
            .unwrap();
        let err = EdgeRequest::from_request(declared, true, 4).await.unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: 4 }));
    }

    #[tokio::test]
    async fn test_json_body() {
        #[derive(serde::Deserialize)]
        struct Item {
            name: String,
        }

        let req = EdgeRequest::buffered(
            Request::builder()
                .method(Method::PATCH)
                .body(Bytes::from(r#"{"name":"lamp"}"#))
                .unwrap(),
        );
        let item: Item = req.json().await.unwrap();
        assert_eq!(item.name, "lamp");
        assert!(matches!(req.text().await, Ok(ref s) if s.contains("lamp")));
    }

    #[test]
    fn test_accessors() {
        let req = EdgeRequest::buffered(
            Request::builder()
                .uri("/items/7?draft=1")
                .header("x-tenant", "acme")
                .body(Bytes::new())
                .unwrap(),
        );
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.path(), "/items/7");
        assert_eq!(req.header("x-tenant"), Some("acme"));
        assert_eq!(req.header("missing"), None);
    }

    #[test]
    fn test_mutating_methods() {
        assert!(is_mutating(&Method::POST));
        assert!(is_mutating(&Method::PUT));
        assert!(is_mutating(&Method::PATCH));
        assert!(!is_mutating(&Method::GET));
        assert!(!is_mutating(&Method::DELETE));
    }
}

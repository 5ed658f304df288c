//! Error types for the router.

use axum::http::{Method, StatusCode};
use thiserror::Error;

use crate::http::request::BodyError;
use crate::routing::pattern::PatternError;

/// Boxed error returned by handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result returned by handlers.
pub type HandlerResult = Result<axum::response::Response, BoxError>;

/// Errors surfaced by registration and dispatch.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A handler called its continuation more than once.
    #[error("next() called multiple times")]
    DoubleInvocation,

    /// No handler resolves for the method and path.
    #[error("Handler not found!")]
    NotFound { method: Method, path: String },

    /// A handler returned an error or panicked.
    #[error("{0}")]
    Handler(BoxError),

    /// A registration pattern could not be parsed.
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },

    /// The request body could not be prepared or read.
    #[error("request body: {0}")]
    Body(#[from] BodyError),
}

impl RouterError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            RouterError::NotFound { .. } => StatusCode::NOT_FOUND,
            RouterError::Body(BodyError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            RouterError::Body(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text shown in debug mode.
    ///
    /// Handler faults include the whole `source()` chain, one cause per line.
    pub fn diagnostic(&self) -> String {
        let RouterError::Handler(err) = self else {
            return self.to_string();
        };

        let mut out = err.to_string();
        let mut cause = err.source();
        while let Some(inner) = cause {
            out.push_str("\ncaused by: ");
            out.push_str(&inner.to_string());
            cause = inner.source();
        }
        out
    }

    /// Classify an error returned by a handler.
    ///
    /// A double invocation or handler fault propagated from `next()` keeps
    /// its identity; anything else the handler returns is a handler fault.
    pub(crate) fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<RouterError>() {
            Ok(inner) => match *inner {
                RouterError::DoubleInvocation => RouterError::DoubleInvocation,
                RouterError::Handler(cause) => RouterError::Handler(cause),
                other => RouterError::Handler(Box::new(other)),
            },
            Err(other) => RouterError::Handler(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("loading profile failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_status_codes() {
        let not_found = RouterError::NotFound {
            method: Method::GET,
            path: "/nope".into(),
        };
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            RouterError::DoubleInvocation.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_diagnostic_messages() {
        assert_eq!(
            RouterError::DoubleInvocation.diagnostic(),
            "next() called multiple times"
        );
        let not_found = RouterError::NotFound {
            method: Method::GET,
            path: "/nope".into(),
        };
        assert_eq!(not_found.diagnostic(), "Handler not found!");
    }

    #[test]
    fn test_diagnostic_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "profile.json missing");
        let err = RouterError::Handler(Box::new(Outer(io)));
        assert_eq!(
            err.diagnostic(),
            "loading profile failed\ncaused by: profile.json missing"
        );
    }

    #[test]
    fn test_from_boxed_keeps_double_invocation() {
        let boxed: BoxError = Box::new(RouterError::DoubleInvocation);
        assert!(matches!(
            RouterError::from_boxed(boxed),
            RouterError::DoubleInvocation
        ));
    }

    #[test]
    fn test_from_boxed_treats_everything_else_as_fault() {
        let boxed: BoxError = Box::new(BodyError::AlreadyConsumed);
        let err = RouterError::from_boxed(boxed);
        assert!(matches!(err, RouterError::Handler(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let boxed: BoxError = Box::new(RouterError::NotFound {
            method: Method::GET,
            path: "/elsewhere".into(),
        });
        let err = RouterError::from_boxed(boxed);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.diagnostic(), "Handler not found!");

        let boxed: BoxError = "plain failure".into();
        assert!(matches!(
            RouterError::from_boxed(boxed),
            RouterError::Handler(_)
        ));
    }

    #[test]
    fn test_from_boxed_unwraps_propagated_fault() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "profile.json missing");
        let inner = RouterError::Handler(Box::new(Outer(io)));
        let err = RouterError::from_boxed(Box::new(inner));
        assert_eq!(
            err.diagnostic(),
            "loading profile failed\ncaused by: profile.json missing"
        );
    }
}

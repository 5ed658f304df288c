//! Route and middleware storage.
//!
//! # Responsibilities
//! - Keep standard routes and middleware entries in registration order
//! - Resolve a request into one handler list: middleware first, route last
//!
//! # Design Decisions
//! - Append-only; overlapping and duplicate patterns are allowed and settled
//!   at match time
//! - Standard candidates are stably ordered wildcard-method first; every
//!   matching candidate contributes its handlers and the last one is the
//!   primary route whose pattern drives parameter extraction
//! - All matching middleware entries apply, in registration order

use std::sync::Arc;

use axum::http::Method;

use crate::dispatch::handler::BoxedHandler;
use crate::routing::matcher::{ExactMatcher, Matcher, MethodFilter, PrefixMatcher};
use crate::routing::pattern::PathPattern;

/// A registered (method, pattern, handlers) entry.
pub struct Route {
    method: MethodFilter,
    pattern: Arc<PathPattern>,
    handlers: Vec<BoxedHandler>,
}

impl Route {
    pub fn new(method: MethodFilter, pattern: PathPattern, handlers: Vec<BoxedHandler>) -> Self {
        Self {
            method,
            pattern: Arc::new(pattern),
            handlers,
        }
    }

    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.to_string())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Outcome of resolving one request against the registry.
pub struct Resolution {
    /// Pattern of the primary route, if any standard route matched.
    pub route: Option<Arc<PathPattern>>,
    /// Concatenated handlers, middleware first.
    pub handlers: Vec<BoxedHandler>,
    /// Number of standard routes that matched.
    pub matched_routes: usize,
    /// Number of middleware entries that matched.
    pub matched_middleware: usize,
}

/// Holds the two ordered entry lists.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<Route>,
    middleware: Vec<Route>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the middleware or standard list.
    pub fn register(&mut self, route: Route, is_middleware: bool) {
        if is_middleware {
            self.middleware.push(route);
        } else {
            self.routes.push(route);
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn middleware(&self) -> &[Route] {
        &self.middleware
    }

    /// Resolve the handler list for a request.
    pub fn resolve(&self, method: &Method, path: &[&str]) -> Resolution {
        let middleware: Vec<&Route> = self
            .middleware
            .iter()
            .filter(|m| m.method.accepts(method) && PrefixMatcher.matches(&m.pattern, path))
            .collect();

        let routes = self.match_routes(method, path);

        let handlers = middleware
            .iter()
            .chain(routes.iter())
            .flat_map(|r| r.handlers.iter().cloned())
            .collect();

        Resolution {
            route: routes.last().map(|r| Arc::clone(&r.pattern)),
            handlers,
            matched_routes: routes.len(),
            matched_middleware: middleware.len(),
        }
    }

    /// Matching standard routes in precedence order; the last one is primary.
    fn match_routes(&self, method: &Method, path: &[&str]) -> Vec<&Route> {
        let mut candidates: Vec<&Route> = self
            .routes
            .iter()
            .filter(|r| r.method.accepts(method))
            .collect();

        // Stable: wildcard entries first, each group keeps registration order.
        candidates.sort_by_key(|r| !r.method.is_wildcard());

        candidates.retain(|r| ExactMatcher.matches(&r.pattern, path));
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::context::RequestContext;
    use crate::error::HandlerResult;
    use crate::handlers;
    use crate::routing::pattern::split_path;

    async fn noop(_ctx: RequestContext) -> HandlerResult {
        Ok(crate::http::response::empty(axum::http::StatusCode::OK))
    }

    fn route(method: MethodFilter, pattern: &str, count: usize) -> Route {
        let handlers = (0..count).map(|_| crate::dispatch::boxed(noop)).collect();
        Route::new(method, PathPattern::parse(pattern).unwrap(), handlers)
    }

    fn resolve(registry: &RouteRegistry, method: Method, path: &str) -> Resolution {
        registry.resolve(&method, &split_path(path))
    }

    #[test]
    fn test_exact_route_resolves_alone() {
        let mut registry = RouteRegistry::new();
        registry.register(route(Method::GET.into(), "/user/[id]", 1), false);
        registry.register(route(Method::GET.into(), "/user/[id]/posts", 2), false);

        let res = resolve(&registry, Method::GET, "/user/42");
        assert_eq!(res.matched_routes, 1);
        assert_eq!(res.handlers.len(), 1);
        assert_eq!(res.route.unwrap().to_string(), "/user/[id]");

        let res = resolve(&registry, Method::POST, "/user/42");
        assert!(res.route.is_none());
        assert!(res.handlers.is_empty());
    }

    #[test]
    fn test_wildcard_route_prepends_to_specific() {
        let mut registry = RouteRegistry::new();
        registry.register(route(Method::GET.into(), "/items/[id]", 1), false);
        registry.register(route(MethodFilter::Any, "/items/[slug]", 2), false);

        let res = resolve(&registry, Method::GET, "/items/9");
        assert_eq!(res.matched_routes, 2);
        assert_eq!(res.handlers.len(), 3);
        // The specific-method route sorts last and is primary.
        assert_eq!(res.route.unwrap().to_string(), "/items/[id]");

        let res = resolve(&registry, Method::DELETE, "/items/9");
        assert_eq!(res.matched_routes, 1);
        assert_eq!(res.route.unwrap().to_string(), "/items/[slug]");
    }

    #[test]
    fn test_same_method_overlap_last_registered_is_primary() {
        let mut registry = RouteRegistry::new();
        registry.register(route(Method::GET.into(), "/a/[x]", 1), false);
        registry.register(route(Method::GET.into(), "/a/[y]", 1), false);

        let res = resolve(&registry, Method::GET, "/a/1");
        assert_eq!(res.handlers.len(), 2);
        assert_eq!(res.route.unwrap().to_string(), "/a/[y]");
    }

    #[test]
    fn test_middleware_prefix_and_order() {
        let mut registry = RouteRegistry::new();
        registry.register(route(MethodFilter::Any, "/", 1), true);
        registry.register(route(Method::GET.into(), "/v1", 2), true);
        registry.register(route(Method::POST.into(), "/v1", 4), true);
        registry.register(route(Method::GET.into(), "/v1/users/[id]", 1), false);

        let res = resolve(&registry, Method::GET, "/v1/users/42");
        assert_eq!(res.matched_middleware, 2);
        assert_eq!(res.matched_routes, 1);
        assert_eq!(res.handlers.len(), 4);

        let res = resolve(&registry, Method::GET, "/v2");
        assert_eq!(res.matched_middleware, 1);
        assert!(res.route.is_none());
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let mut registry = RouteRegistry::new();
        registry.register(route(MethodFilter::Any, "/files/[[rest]]", 1), false);
        registry.register(route(Method::GET.into(), "/files", 1), true);

        let a = resolve(&registry, Method::GET, "/files/a/b");
        let b = resolve(&registry, Method::GET, "/files/a/b");
        assert_eq!(a.route, b.route);
        assert_eq!(a.handlers.len(), b.handlers.len());
        assert!(a
            .handlers
            .iter()
            .zip(&b.handlers)
            .all(|(x, y)| Arc::ptr_eq(x, y)));
    }

    #[test]
    fn test_handlers_macro_builds_list() {
        let list = handlers![noop, noop];
        assert_eq!(list.len(), 2);
    }
}

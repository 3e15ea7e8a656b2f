//! Exact-path router.

use crate::{Request, Response};
use http::Method;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Async handler function type.
pub type Handler =
    Arc<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync>;

#[derive(Clone)]
struct Route {
    method: Method,
    path: String,
    handler: Handler,
}

/// Routes requests by method and literal path. A trailing slash is ignored.
#[derive(Default, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add GET route.
    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    /// Add OPTIONS route.
    pub fn options<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(Method::OPTIONS, path, handler)
    }

    /// Add route with method. Later registrations for the same pair are shadowed.
    pub fn route<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |req| Box::pin(handler(req)));
        self.routes.push(Route {
            method,
            path: normalize(path).to_string(),
            handler,
        });
        self
    }

    pub fn find(&self, method: &Method, path: &str) -> Option<&Handler> {
        let path = normalize(path);
        self.routes
            .iter()
            .find(|r| r.method == *method && r.path == path)
            .map(|r| &r.handler)
    }

    /// Whether any method is routed at `path`.
    pub fn path_exists(&self, path: &str) -> bool {
        let path = normalize(path);
        self.routes.iter().any(|r| r.path == path)
    }

    /// Methods routed at `path`, for an `Allow` header.
    pub fn allowed_methods(&self, path: &str) -> Vec<&Method> {
        let path = normalize(path);
        self.routes
            .iter()
            .filter(|r| r.path == path)
            .map(|r| &r.method)
            .collect()
    }

    /// All routes (for introspection).
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.path.as_str()))
    }
}

fn normalize(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new()
            .get("/", |_| async { Response::ok() })
            .get("/leaderboard", |_| async { Response::ok() })
            .options("/leaderboard", |_| async { Response::no_content() })
    }

    #[test]
    fn test_find_by_method_and_path() {
        let router = router();
        assert!(router.find(&Method::GET, "/").is_some());
        assert!(router.find(&Method::GET, "/leaderboard").is_some());
        assert!(router.find(&Method::GET, "/leaderboard/").is_some());
        assert!(router.find(&Method::POST, "/leaderboard").is_none());
        assert!(router.find(&Method::GET, "/leaderboard/extra").is_none());
    }

    #[test]
    fn test_path_exists_and_allowed_methods() {
        let router = router();
        assert!(router.path_exists("/leaderboard"));
        assert!(!router.path_exists("/missing"));
        assert_eq!(
            router.allowed_methods("/leaderboard"),
            vec![&Method::GET, &Method::OPTIONS]
        );
        assert_eq!(router.routes().count(), 3);
    }
}

//! Middleware support for request/response processing.
//!
//! Middleware wraps routing, so it also sees requests that match no route
//! (CORS preflights, 404s).

use crate::router::Router;
use crate::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed response future borrowed from the chain.
pub type BoxResponse<'a> = Pin<Box<dyn Future<Output = Response> + Send + 'a>>;

/// Middleware trait for processing requests.
pub trait Middleware: Send + Sync {
    /// Process request, call `next` to continue the chain.
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxResponse<'a>;
}

/// Next middleware, or the router at the end of the chain.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Middleware {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Router {
        router: &'a Router,
    },
}

impl<'a> Next<'a> {
    /// Terminal step: dispatch through the router.
    pub fn router(router: &'a Router) -> Self {
        Self {
            inner: NextInner::Router { router },
        }
    }

    pub fn middleware(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Middleware {
                middleware,
                next: Box::new(next),
            },
        }
    }

    pub fn run(self, req: Request) -> BoxResponse<'a> {
        match self.inner {
            NextInner::Router { router } => dispatch(router, req),
            NextInner::Middleware { middleware, next } => middleware.handle(req, *next),
        }
    }
}

fn dispatch(router: &Router, req: Request) -> BoxResponse<'_> {
    if let Some(handler) = router.find(req.method(), req.path()) {
        return handler(req);
    }

    let path = req.path().to_string();
    let resp = if router.path_exists(&path) {
        let allow = router
            .allowed_methods(&path)
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Response::method_not_allowed()
            .header("allow", &allow)
            .json(&serde_json::json!({
                "error": "method not allowed",
                "method": req.method().as_str(),
                "path": path
            }))
    } else {
        Response::not_found().json(&serde_json::json!({
            "error": "not found",
            "path": path
        }))
    };
    Box::pin(async move { resp })
}

/// Ordered middleware list; the first added runs outermost.
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Run `req` through every middleware, then the router.
    pub fn run<'a>(&'a self, router: &'a Router, req: Request) -> BoxResponse<'a> {
        let mut next = Next::router(router);
        for mw in self.middlewares.iter().rev() {
            next = Next::middleware(mw.as_ref(), next);
        }
        next.run(req)
    }
}

/// CORS middleware. Answers preflights itself and decorates every other
/// response without touching its existing headers.
pub struct CorsMiddleware {
    origin: String,
    methods: &'static str,
    allow_credentials: bool,
}

impl CorsMiddleware {
    /// Allow all origins, read-only methods.
    pub fn permissive() -> Self {
        Self {
            origin: "*".to_string(),
            methods: "GET, OPTIONS",
            allow_credentials: false,
        }
    }

    /// Allow a specific origin, with credentials.
    pub fn origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            allow_credentials: true,
            ..Self::permissive()
        }
    }

    fn decorate(&self, resp: &mut Response) {
        resp.set_header("access-control-allow-origin", &self.origin);
        if self.allow_credentials {
            resp.set_header("access-control-allow-credentials", "true");
        }
    }
}

impl Middleware for CorsMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxResponse<'a> {
        Box::pin(async move {
            if req.method() == http::Method::OPTIONS {
                let mut resp = Response::no_content()
                    .header("access-control-allow-methods", self.methods)
                    .header("access-control-allow-headers", "Content-Type, Authorization")
                    .header("access-control-max-age", "86400");
                self.decorate(&mut resp);
                return resp;
            }

            let mut resp = next.run(req).await;
            self.decorate(&mut resp);
            resp
        })
    }
}

/// Logs one line per request with status and latency.
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxResponse<'a> {
        let method = req.method().clone();
        let path = req.path().to_string();
        let remote = req.remote_addr();

        Box::pin(async move {
            let start = std::time::Instant::now();
            let resp = next.run(req).await;
            let duration = start.elapsed();

            #[cfg(feature = "tracing")]
            tracing::info!(
                method = %method,
                path = %path,
                remote = ?remote,
                status = resp.status_code().as_u16(),
                duration_ms = duration.as_millis() as u64,
                "request"
            );

            #[cfg(not(feature = "tracing"))]
            eprintln!(
                "{} {} {} {:?} {}ms",
                method,
                path,
                remote,
                resp.status_code().as_u16(),
                duration.as_millis()
            );

            resp
        })
    }
}

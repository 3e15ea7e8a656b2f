//! HTTP/1.1 and HTTP/2 server.

use crate::middleware::{Middleware, MiddlewareChain};
use crate::{HttpError, Request, Response, Router};
use hyper::server::conn::{http1, http2};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::future::Future;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use tokio::net::TcpListener;

/// HTTP server configuration.
pub struct HttpServer {
    addr: SocketAddr,
    router: Router,
    middleware: MiddlewareChain,
    http2_only: bool,
}

impl HttpServer {
    /// Resolve the listen address. Nothing is bound until [`HttpServer::serve`].
    pub fn bind(addr: impl ToSocketAddrs) -> crate::Result<Self> {
        let addr = addr
            .to_socket_addrs()
            .map_err(|e| HttpError::InvalidAddr(e.to_string()))?
            .next()
            .ok_or_else(|| HttpError::InvalidAddr("address resolved to nothing".into()))?;

        Ok(Self {
            addr,
            router: Router::new(),
            middleware: MiddlewareChain::new(),
            http2_only: false,
        })
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Add middleware. The first one added runs outermost.
    pub fn middleware<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middleware = self.middleware.add(middleware);
        self
    }

    /// Use HTTP/2 only (prior knowledge, no HTTP/1.1 fallback).
    pub fn http2_only(mut self) -> Self {
        self.http2_only = true;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind and serve until the process exits.
    pub async fn serve(self) -> crate::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn serve_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send,
    ) -> crate::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// Stops accepting on shutdown; connections already accepted run to
    /// completion on their own tasks.
    pub async fn serve_listener(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send,
    ) -> crate::Result<()> {
        let local = listener.local_addr()?;

        #[cfg(feature = "tracing")]
        tracing::info!(addr = %local, http2_only = self.http2_only, "listening");

        #[cfg(not(feature = "tracing"))]
        eprintln!("ladder-http listening on {}", local);

        let router = Arc::new(self.router);
        let middleware = Arc::new(self.middleware);
        let http2_only = self.http2_only;

        tokio::pin!(shutdown);

        loop {
            let (stream, remote_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => break,
            };

            let io = TokioIo::new(stream);
            let router = Arc::clone(&router);
            let middleware = Arc::clone(&middleware);

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let router = Arc::clone(&router);
                    let middleware = Arc::clone(&middleware);

                    async move {
                        let resp = handle_request(req, remote_addr, &router, &middleware).await;
                        Ok::<_, Infallible>(resp.into_hyper())
                    }
                });

                let result = if http2_only {
                    http2::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await
                } else {
                    http1::Builder::new().serve_connection(io, service).await
                };

                if let Err(e) = result {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(remote = %remote_addr, "connection error: {}", e);

                    #[cfg(not(feature = "tracing"))]
                    eprintln!("connection error from {}: {}", remote_addr, e);
                }
            });
        }

        #[cfg(feature = "tracing")]
        tracing::info!(addr = %local, "stopped accepting connections");

        Ok(())
    }
}

async fn handle_request(
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
    router: &Router,
    middleware: &MiddlewareChain,
) -> Response {
    let (parts, _body) = req.into_parts();
    let mut request = Request::new(parts.method, parts.uri, parts.version, parts.headers);
    request.set_remote_addr(remote_addr);

    middleware.run(router, request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_resolves_address() {
        let server = HttpServer::bind("127.0.0.1:7360").unwrap();
        assert_eq!(server.local_addr().port(), 7360);
    }

    #[test]
    fn test_bind_rejects_garbage() {
        let err = HttpServer::bind("not an address").err().unwrap();
        assert!(matches!(err, HttpError::InvalidAddr(_)));
    }
}

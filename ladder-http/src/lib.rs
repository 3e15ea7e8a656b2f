//! # ladder-http
//!
//! Small HTTP/1.1 and HTTP/2 server over hyper, used to expose the ladder
//! leaderboard. Exact-path routing, composable middleware and JSON
//! responses; request bodies are not read.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ladder_http::{HttpServer, Router, Response};
//!
//! #[tokio::main]
//! async fn main() -> ladder_http::Result<()> {
//!     let router = Router::new()
//!         .get("/health", |_| async { Response::ok().json(&serde_json::json!({ "status": "ok" })) });
//!
//!     HttpServer::bind("127.0.0.1:7360")?
//!         .router(router)
//!         .serve()
//!         .await
//! }
//! ```

mod error;
pub mod middleware;
mod request;
mod response;
mod router;
mod server;

pub use error::{HttpError, Result};
pub use middleware::{CorsMiddleware, LoggingMiddleware, Middleware, Next};
pub use request::{QueryParams, Request};
pub use response::Response;
pub use router::{Handler, Router};
pub use server::HttpServer;

pub use http::{Method, StatusCode};

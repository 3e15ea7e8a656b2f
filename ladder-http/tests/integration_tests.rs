//! Integration tests for ladder-http

use ladder_http::middleware::BoxResponse;
use ladder_http::{
    CorsMiddleware, HttpServer, LoggingMiddleware, Middleware, Next, Request, Response, Router,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

#[tokio::test]
async fn test_basic_get() {
    let router = Router::new().get("/", |_| async { Response::ok().text("Hello, World!") });
    let addr = spawn_server(router).await;

    let resp = reqwest::get(format!("http://{}/", addr)).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "Hello, World!");
}

#[tokio::test]
async fn test_json_response() {
    let router = Router::new().get("/api/status", |_| async {
        Response::ok().json(&serde_json::json!({ "status": "ok" }))
    });
    let addr = spawn_server(router).await;

    let resp = reqwest::get(format!("http://{}/api/status", addr)).await.unwrap();

    assert_eq!(resp.status(), 200);
    assert!(
        resp.headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json")
    );
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_query_params_decoded() {
    let router = Router::new().get("/echo", |req: Request| async move {
        Response::ok().json(&serde_json::json!({
            "user": req.query_param("user"),
            "limit": req.query_param("limit"),
            "repeats": req.query().all("limit").len(),
        }))
    });
    let addr = spawn_server(router).await;

    let json: serde_json::Value = reqwest::get(format!("http://{}/echo?user=a%2Fb+c", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["user"], "a/b c");
    assert!(json["limit"].is_null());

    let json: serde_json::Value = reqwest::get(format!("http://{}/echo?limit=1&limit=2", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(json["limit"].is_null());
    assert_eq!(json["repeats"], 2);
}

#[tokio::test]
async fn test_remote_addr_is_recorded() {
    let router = Router::new().get("/whoami", |req: Request| async move {
        let ip = req.remote_addr().map(|a| a.ip().to_string()).unwrap_or_default();
        Response::ok().text(ip)
    });
    let addr = spawn_server_with(router, |s| s.middleware(LoggingMiddleware)).await;

    let resp = reqwest::get(format!("http://{}/whoami", addr)).await.unwrap();
    assert_eq!(resp.text().await.unwrap(), "127.0.0.1");
}

#[tokio::test]
async fn test_not_found() {
    let router = Router::new().get("/exists", |_| async { Response::ok() });
    let addr = spawn_server(router).await;

    let resp = reqwest::get(format!("http://{}/nonexistent", addr)).await.unwrap();

    assert_eq!(resp.status(), 404);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["error"], "not found");
}

#[tokio::test]
async fn test_method_not_allowed() {
    let router = Router::new().get("/resource", |_| async { Response::ok() });
    let addr = spawn_server(router).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{}/resource", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 405);
    assert_eq!(resp.headers().get("allow").unwrap(), "GET");
}

struct CountingMiddleware {
    count: Arc<AtomicUsize>,
}

impl Middleware for CountingMiddleware {
    fn handle<'a>(&'a self, req: Request, next: Next<'a>) -> BoxResponse<'a> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            let mut resp = next.run(req).await;
            resp.set_header("x-counted", "yes");
            resp
        })
    }
}

#[tokio::test]
async fn test_middleware_sees_unrouted_requests() {
    let count = Arc::new(AtomicUsize::new(0));
    let router = Router::new().get("/", |_| async { Response::ok() });
    let addr = spawn_server_with(router, |server| {
        server
            .middleware(LoggingMiddleware)
            .middleware(CountingMiddleware {
                count: count.clone(),
            })
    })
    .await;

    let resp = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(resp.headers().get("x-counted").unwrap(), "yes");

    let resp = reqwest::get(format!("http://{}/missing", addr)).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(resp.headers().get("x-counted").unwrap(), "yes");

    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cors_preflight_and_headers_preserved() {
    let router = Router::new().get("/api", |_| async {
        Response::ok().header("x-custom", "kept").text("ok")
    });
    let addr = spawn_server_with(router, |server| server.middleware(CorsMiddleware::permissive())).await;

    let client = reqwest::Client::new();
    let resp = client
        .request(reqwest::Method::OPTIONS, format!("http://{}/api", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(
        resp.headers().get("access-control-allow-methods").unwrap(),
        "GET, OPTIONS"
    );

    let resp = client.get(format!("http://{}/api", addr)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers().get("access-control-allow-origin").unwrap(), "*");
    assert_eq!(resp.headers().get("x-custom").unwrap(), "kept");
    assert!(resp.headers().get("content-type").is_some());
}

#[tokio::test]
async fn test_http2_only() {
    let router = Router::new().get("/", |_| async { Response::ok().text("h2") });
    let addr = spawn_server_with(router, |server| server.http2_only()).await;

    let client = reqwest::Client::builder()
        .http2_prior_knowledge()
        .build()
        .unwrap();
    let resp = client.get(format!("http://{}/", addr)).send().await.unwrap();

    assert_eq!(resp.version(), reqwest::Version::HTTP_2);
    assert_eq!(resp.text().await.unwrap(), "h2");
}

#[tokio::test]
async fn test_concurrent_requests() {
    let router = Router::new().get("/", |_| async { Response::ok().text("ok") });
    let addr = spawn_server(router).await;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let url = format!("http://{}/", addr);
        handles.push(tokio::spawn(async move { reqwest::get(url).await.unwrap().status() }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let router = Router::new().get("/", |_| async { Response::ok() });
    let server = HttpServer::bind(addr).unwrap().router(router);
    let task = tokio::spawn(server.serve_listener(listener, async move {
        let _ = rx.await;
    }));

    let resp = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(resp.status(), 200);

    tx.send(()).unwrap();
    task.await.unwrap().unwrap();

    let fresh = reqwest::Client::builder().pool_max_idle_per_host(0).build().unwrap();
    assert!(fresh.get(format!("http://{}/", addr)).send().await.is_err());
}

// Serves on a pre-bound ephemeral listener so the port is known up front
async fn spawn_server(router: Router) -> String {
    spawn_server_with(router, |server| server).await
}

async fn spawn_server_with(router: Router, configure: impl FnOnce(HttpServer) -> HttpServer) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = configure(HttpServer::bind(addr).unwrap().router(router));
    tokio::spawn(async move {
        server
            .serve_listener(listener, std::future::pending())
            .await
            .unwrap();
    });

    addr.to_string()
}

//! HTTP handlers.

use ladder::{Leaderboard, LeaderboardQuery};
use ladder_http::{Request, Response, Router, StatusCode};
use std::sync::Arc;

/// Body of every 500; failure details only go to the log.
pub const LOAD_FAILED: &str = "Failed to load leaderboard";

/// `GET /leaderboard` and `GET /health`.
pub fn router(board: Arc<Leaderboard>) -> Router {
    let health_board = Arc::clone(&board);
    Router::new()
        .get("/leaderboard", move |req| {
            let board = Arc::clone(&board);
            async move { leaderboard(&board, req).await }
        })
        .get("/health", move |_| {
            let board = Arc::clone(&health_board);
            async move { health(&board).await }
        })
}

/// Liveness plus a cheap store round trip.
pub async fn health(board: &Leaderboard) -> Response {
    match board.store().user_count().await {
        Ok(users) => Response::ok().json(&serde_json::json!({ "status": "ok", "users": users })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            Response::error(StatusCode::SERVICE_UNAVAILABLE, "store unavailable")
        }
    }
}

/// Query parameters: `window`, `limit`, `offset`, `userId`. None of them
/// can make the request fail.
pub async fn leaderboard(board: &Leaderboard, req: Request) -> Response {
    let params = req.query();
    let query = LeaderboardQuery::from_params(
        params.get("window"),
        params.get("limit"),
        params.get("offset"),
        params.get("userId"),
    );

    match board.query(&query).await {
        Ok(resp) => Response::ok().json(&resp),
        Err(e) => {
            tracing::error!(
                error = %e,
                window = %query.window,
                user_id = query.user_id.as_deref().unwrap_or(""),
                "leaderboard query failed"
            );
            Response::error(StatusCode::INTERNAL_SERVER_ERROR, LOAD_FAILED)
        }
    }
}

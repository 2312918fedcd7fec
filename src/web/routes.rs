//! Router assembly: REST control surface, WebSocket push surface, health.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::{handlers, ws, AppState};

/// Build the application router with CORS configuration.
pub fn create_router(cors_origins: &str) -> Router<AppState> {
    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/api/rooms", post(handlers::create_room))
        .route("/api/rooms/{code}", get(handlers::room_snapshot))
        .route("/api/rooms/{code}/join", post(handlers::submit_join))
        .route("/api/rooms/{code}/admissions", post(handlers::review_admission))
        .route("/api/rooms/{code}/start", post(handlers::start_game))
        .route("/api/rooms/{code}/call", post(handlers::call_number))
        .route("/api/rooms/{code}/draft", post(handlers::update_draft))
        .route("/api/rooms/{code}/submit", post(handlers::submit_answers))
        .route("/api/rooms/{code}/end", post(handlers::end_round))
        .route("/api/rooms/{code}/score", post(handlers::score_submission))
        .route("/api/rooms/{code}/publish", post(handlers::publish_round))
        .route("/api/rooms/{code}/discard", post(handlers::discard_round))
        .route("/api/rooms/{code}/cancel", post(handlers::cancel_game))
        .route("/api/rooms/{code}/finish", post(handlers::finish_game))
        .route("/ws/{code}", get(ws::ws_handler))
        .route("/healthz", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Liveness endpoint.
async fn health_check() -> &'static str {
    "OK"
}

//! HTTP surface of the api service

pub mod post;
pub mod user;

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use crate::AppState;

/// Create the top-level router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check).with_state(state.clone()))
        .nest("/api/v1/user", user::router(state.clone()))
        .nest("/api/v1/post", post::router(state))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(serde_json::json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "snapfeed-api",
        "database": database,
    }))
}

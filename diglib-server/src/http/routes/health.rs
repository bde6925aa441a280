//! Health check endpoints
//!
//! `GET /health` is a liveness probe and never touches the database.
//! `GET /health/db` is a readiness probe that pings through a scoped session.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::db::{Session, SessionFactory};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Database readiness response
#[derive(Serialize)]
pub struct DatabaseHealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// GET /health/db
async fn database_health<F>(
    State(state): State<AppState<F>>,
) -> Result<Json<DatabaseHealthResponse>, ApiError>
where
    F: SessionFactory + 'static,
{
    state
        .sessions
        .scoped(|session| Box::pin(async move { session.ping().await }))
        .await?;

    Ok(Json(DatabaseHealthResponse {
        status: "healthy",
        database: "reachable",
    }))
}

/// Health routes
pub fn router<F>() -> Router<AppState<F>>
where
    F: SessionFactory + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(database_health::<F>))
}

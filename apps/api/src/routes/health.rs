//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: bool,
    pub server_time: DateTime<Utc>,
}

/// GET /health: 200 while the database answers, 503 otherwise.
pub async fn check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ApiResponse<HealthStatus>>) {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(ApiResponse::ok(HealthStatus {
            status,
            database,
            server_time: Utc::now(),
        })),
    )
}

//! Application handlers behind the gatekeeper.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::gatekeeper::AuthenticatedUser;
use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user_id: String,
}

/// `GET /health`: 200 when every dependency answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let report = state.health.check().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

/// `GET /api/v1/ping`
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}

/// `GET /api/v1/me`
pub async fn me(AuthenticatedUser(subject): AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: subject.into_inner(),
    })
}

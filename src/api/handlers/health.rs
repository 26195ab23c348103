use crate::{
    types::{AppError, HealthResponse},
    AppState,
};
use axum::{extract::State, Json};

/// Liveness probe; no authentication
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_tokens: state.token_store.active_count(),
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound("route".to_string())
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

use crate::{
    auth::{middleware::AuthUser, token_store::fingerprint},
    types::{AppError, LoginRequest, LogoutResponse, Result, TokenResponse},
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

/// Login with username and password
///
/// Does not require prior authentication. Whether the username or the
/// password was wrong is never revealed.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    let principal = state
        .verifier
        .verify(&payload.username, &payload.password)
        .await?;

    let token = state.token_store.issue(&principal.id);

    Ok(Json(token.into()))
}

/// Revoke the token the request was authenticated with
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<Json<LogoutResponse>> {
    let revoked = state.token_store.revoke(&session.token);
    tracing::info!(
        principal_id = %session.principal.id,
        token = %fingerprint(&session.token),
        "logged out"
    );

    Ok(Json(LogoutResponse { revoked }))
}

/// Exchange the presented token for a fresh one
pub async fn refresh_token(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
) -> Result<Json<TokenResponse>> {
    let token = state
        .token_store
        .rotate(&session.token)
        .map_err(AppError::Unauthorized)?;

    Ok(Json(token.into()))
}

use crate::{
    auth::middleware::AuthUser,
    types::{AppError, Principal, Result},
    AppState,
};
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};

/// Public record of the authenticated principal
pub async fn me(AuthUser(session): AuthUser) -> Json<Principal> {
    Json(session.principal)
}

/// Look up any principal by id.
///
/// Every authenticated principal may query every record.
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(session): AuthUser,
    path: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Principal>> {
    let Path(id) = path.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::debug!(principal_id = %session.principal.id, target = %id, "user lookup");

    let principal = state.directory.find_by_id(&id)?;

    Ok(Json(principal))
}

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use lnatprep_user::Permission;

use crate::{auth::AdminUser, error::AppError, routes::AppState};

/// GET /admin/permissions
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
) -> Result<Json<Vec<Permission>>, AppError> {
    Ok(Json(state.command.permissions().await?))
}

/// POST /admin/permissions
pub async fn upsert(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(permission): Json<Permission>,
) -> Result<impl IntoResponse, AppError> {
    state.command.upsert_permission(permission.clone()).await?;

    tracing::info!(admin_id = %admin.id, permission_id = %permission.id, "catalog entry saved");

    Ok((StatusCode::CREATED, Json(permission)))
}

use axum::{Json, extract::State};
use lnatprep_user::Resolution;

use crate::{auth::AuthUser, routes::AppState};

/// GET /me/entitlements
pub async fn entitlements(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Json<Resolution> {
    Json(state.command.resolve(&user).await)
}

mod maintenance;
mod permissions;
mod users;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::routes::AppState;

/// Every handler here takes [`crate::auth::AdminUser`], so the stored role is
/// checked per request.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/maintenance/sweep", post(maintenance::sweep))
        .route(
            "/permissions",
            get(permissions::list).post(permissions::upsert),
        )
        .route("/users/{id}/trial", post(users::grant_trial))
        .route("/users/{id}/entitlements", get(users::entitlements))
        .route(
            "/users/{id}/permissions",
            get(users::permissions).post(users::grant),
        )
        .route(
            "/users/{id}/permissions/{permission_id}",
            delete(users::revoke),
        )
        .route("/users/{id}/subscription", post(users::activate_subscription))
}

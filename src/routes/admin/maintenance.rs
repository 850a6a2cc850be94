use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lnatprep_user::MaintenanceStatus;
use serde_json::json;

use crate::{auth::AdminUser, routes::AppState};

/// POST /admin/maintenance/sweep
///
/// 200 when every user was processed, 207 when some failed, 503 when the
/// run could not start.
pub async fn sweep(State(state): State<AppState>, AdminUser(admin): AdminUser) -> Response {
    tracing::info!(admin_id = %admin.id, "manual maintenance triggered");

    match state.command.maintenance().await {
        Ok(report) => {
            let status = match report.status {
                MaintenanceStatus::Success => StatusCode::OK,
                MaintenanceStatus::PartialFailure => StatusCode::MULTI_STATUS,
            };

            (status, Json(report)).into_response()
        }
        Err(err) => {
            tracing::error!(admin_id = %admin.id, err = %err, "manual maintenance failed");

            run_failed()
        }
    }
}

fn run_failed() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "failed",
            "error": "service temporarily unavailable",
        })),
    )
        .into_response()
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use lnatprep_shared::Metadata;
use lnatprep_user::{
    ActivateSubscriptionInput, EntitlementSnapshot, GrantInput, PaymentInput, PermissionGrant,
    Resolution, Subscription, TrialGrant,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;

use crate::{auth::AdminUser, error::AppError, routes::AppState};

#[derive(Deserialize, Default)]
pub struct TrialBody {
    #[serde(default)]
    pub reason: Option<String>,
}

/// POST /admin/users/{id}/trial
pub async fn grant_trial(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    body: Option<Json<TrialBody>>,
) -> Result<Json<TrialGrant>, AppError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let trial = state
        .command
        .grant_trial(&id, body.reason, &Metadata::by(admin.id))
        .await?;

    Ok(Json(trial))
}

#[derive(Serialize)]
pub struct EntitlementsView {
    pub resolution: Resolution,
    pub cached: Option<EntitlementSnapshot>,
}

/// GET /admin/users/{id}/entitlements
pub async fn entitlements(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<EntitlementsView>, AppError> {
    let resolution = state.command.entitlements(&id).await?;
    let cached = state.command.cached(&id).await?;

    Ok(Json(EntitlementsView { resolution, cached }))
}

/// GET /admin/users/{id}/permissions
pub async fn permissions(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<PermissionGrant>>, AppError> {
    Ok(Json(state.command.history(&id).await?))
}

#[derive(Deserialize)]
pub struct GrantBody {
    pub permission_id: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
}

/// POST /admin/users/{id}/permissions
pub async fn grant(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<GrantBody>,
) -> Result<impl IntoResponse, AppError> {
    let grant_id = state
        .command
        .grant(
            GrantInput {
                user_id: id,
                permission_id: body.permission_id,
                expires_at: body.expires_at,
            },
            &Metadata::by(admin.id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "id": grant_id }))))
}

#[derive(Deserialize)]
pub struct RevokeQuery {
    pub reason: Option<String>,
}

/// DELETE /admin/users/{id}/permissions/{permission_id}
pub async fn revoke(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path((id, permission_id)): Path<(String, String)>,
    Query(query): Query<RevokeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let revoked = state
        .command
        .revoke(&id, &permission_id, query.reason, &Metadata::by(admin.id))
        .await?;

    Ok(Json(json!({ "revoked": revoked })))
}

#[derive(Deserialize)]
pub struct PaymentBody {
    pub reference: String,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Deserialize)]
pub struct SubscriptionBody {
    pub plan_id: String,
    pub plan_name: String,
    pub days: i64,
    #[serde(default)]
    pub payment: Option<PaymentBody>,
}

/// POST /admin/users/{id}/subscription
pub async fn activate_subscription(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<SubscriptionBody>,
) -> Result<Json<Subscription>, AppError> {
    let input = ActivateSubscriptionInput {
        plan_id: body.plan_id,
        plan_name: body.plan_name,
        days: body.days,
        payment: body.payment.map(|payment| PaymentInput {
            reference: payment.reference,
            amount_cents: payment.amount_cents,
            currency: payment.currency,
        }),
    };

    let subscription = state.command.activate_subscription(&id, input).await?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %id,
        subscription_id = %subscription.id,
        "subscription activated by admin"
    );

    Ok(Json(subscription))
}

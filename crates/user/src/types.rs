use std::collections::BTreeSet;

use lnatprep_shared::{
    RawTimestamp, normalize,
    user::{Role, State},
};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use time::OffsetDateTime;
use validator::Validate;

pub type PermissionId = String;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub state: State,
    pub trial_ends_at: Option<RawTimestamp>,
    pub subscription: Option<Subscription>,
    /// Legacy embedded grants. Superseded by [`PermissionGrant`] records and
    /// never read for entitlement decisions.
    pub permissions: Vec<PermissionId>,
    pub permission_status: Option<EntitlementSnapshot>,
    pub created_at: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(
    EnumString, Display, AsRefStr, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    pub status: SubscriptionStatus,
    pub plan_id: String,
    pub plan_name: String,
    pub start_date: RawTimestamp,
    pub end_date: Option<RawTimestamp>,
    pub trial_end: Option<RawTimestamp>,
    #[serde(default)]
    pub auto_renew: bool,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

impl Subscription {
    /// Active status and an end date that is absent or strictly in the future.
    /// An unreadable end date makes the subscription inactive.
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        self.status == SubscriptionStatus::Active
            && self
                .end_date
                .as_ref()
                .is_none_or(|end| normalize(end).is_after(now))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub reference: String,
    pub amount_cents: i64,
    pub currency: String,
    pub paid_at: RawTimestamp,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PermissionGrant {
    pub id: String,
    pub user_id: String,
    pub permission_id: PermissionId,
    pub granted_by: String,
    pub granted_at: RawTimestamp,
    pub expires_at: Option<RawTimestamp>,
    pub active: bool,
    pub revoked_at: Option<RawTimestamp>,
    pub revoked_by: Option<String>,
    pub revoke_reason: Option<String>,
}

impl PermissionGrant {
    /// A grant counts while its flag is set, it has not expired and it has not
    /// been revoked. Expiry equal to `now` is already expired; unreadable
    /// dates deny.
    pub fn is_active_at(&self, now: OffsetDateTime) -> bool {
        self.active
            && self
                .expires_at
                .as_ref()
                .is_none_or(|at| normalize(at).is_after(now))
            && self
                .revoked_at
                .as_ref()
                .is_none_or(|at| normalize(at).is_after(now))
    }
}

/// Catalog entry.
#[derive(Serialize, Deserialize, Validate, Clone, Debug, PartialEq)]
pub struct Permission {
    #[validate(length(min = 1, max = 50))]
    pub id: PermissionId,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Which mechanism produced a user's effective permissions.
#[derive(
    EnumString,
    Display,
    AsRefStr,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Default,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Source {
    AdminOverride,
    Trial,
    Subscription,
    ExplicitGrant,
    #[default]
    None,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Resolution {
    pub permissions: BTreeSet<PermissionId>,
    pub source: Source,
    pub trial_active: bool,
    pub subscription_active: bool,
}

impl Resolution {
    pub fn has(&self, permission_id: &str) -> bool {
        self.permissions.contains(permission_id)
    }
}

/// Cached copy of a [`Resolution`] stored on the user document.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSnapshot {
    pub permissions: Vec<PermissionId>,
    pub source: Source,
    pub trial_active: bool,
    pub subscription_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub computed_at: OffsetDateTime,
}

impl EntitlementSnapshot {
    pub fn new(resolution: &Resolution, computed_at: OffsetDateTime) -> Self {
        Self {
            permissions: resolution.permissions.iter().cloned().collect(),
            source: resolution.source,
            trial_active: resolution.trial_active,
            subscription_active: resolution.subscription_active,
            computed_at,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            permissions: self.permissions.iter().cloned().collect(),
            source: self.source,
            trial_active: self.trial_active,
            subscription_active: self.subscription_active,
        }
    }
}

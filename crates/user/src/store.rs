use lnatprep_shared::{
    RawTimestamp,
    user::{Role, State},
};

use crate::{
    EntitlementSnapshot, Permission, PermissionGrant, PermissionId, StoreError, Subscription,
    User,
};

/// Document store holding users, subscriptions, permission grants and the
/// permission catalog.
#[async_trait::async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<(), StoreError>;

    /// Insert or replace a subscription history record.
    async fn save_subscription(&self, subscription: &Subscription) -> Result<(), StoreError>;

    async fn find_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError>;

    async fn insert_grant(&self, grant: &PermissionGrant) -> Result<(), StoreError>;

    async fn find_grants(&self, filter: &GrantFilter) -> Result<Vec<PermissionGrant>, StoreError>;

    async fn revoke_grant(&self, id: &str, revocation: &Revocation) -> Result<(), StoreError>;

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError>;

    async fn find_permission(&self, id: &str) -> Result<Option<Permission>, StoreError>;

    async fn save_permission(&self, permission: &Permission) -> Result<(), StoreError>;
}

/// Field-level update of a user document. `None` leaves a field untouched;
/// `Some(None)` clears an optional field.
#[derive(Default, Clone, Debug)]
pub struct UserUpdate {
    pub role: Option<Role>,
    pub state: Option<State>,
    pub trial_ends_at: Option<Option<RawTimestamp>>,
    pub subscription: Option<Option<Subscription>>,
    pub permissions: Option<Vec<PermissionId>>,
    pub permission_status: Option<EntitlementSnapshot>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.state.is_none()
            && self.trial_ends_at.is_none()
            && self.subscription.is_none()
            && self.permissions.is_none()
            && self.permission_status.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(role) = self.role {
            user.role = role;
        }

        if let Some(state) = self.state {
            user.state = state;
        }

        if let Some(trial_ends_at) = &self.trial_ends_at {
            user.trial_ends_at = trial_ends_at.clone();
        }

        if let Some(subscription) = &self.subscription {
            user.subscription = subscription.clone();
        }

        if let Some(permissions) = &self.permissions {
            user.permissions = permissions.clone();
        }

        if let Some(permission_status) = &self.permission_status {
            user.permission_status = Some(permission_status.clone());
        }
    }
}

#[derive(Clone, Debug)]
pub struct GrantFilter {
    pub user_id: String,
    pub permission_id: Option<PermissionId>,
    pub active: Option<bool>,
}

impl GrantFilter {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            permission_id: None,
            active: None,
        }
    }

    /// Grants whose `active` flag is still set. Expiry is not checked here.
    pub fn flagged_active(user_id: impl Into<String>) -> Self {
        Self {
            active: Some(true),
            ..Self::user(user_id)
        }
    }

    pub fn permission(mut self, permission_id: impl Into<PermissionId>) -> Self {
        self.permission_id = Some(permission_id.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct Revocation {
    pub revoked_at: RawTimestamp,
    pub revoked_by: String,
    pub reason: Option<String>,
}

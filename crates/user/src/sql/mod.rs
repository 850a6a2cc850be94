//! SQLite-backed [`Store`]. Documents keep their original shape: dates and
//! embedded records live in TEXT columns as JSON.

mod grant;
mod permission;
mod subscription;
mod user;

use lnatprep_shared::RawTimestamp;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;

use crate::{
    GrantFilter, Permission, PermissionGrant, Revocation, Store, StoreError, Subscription, User,
    UserUpdate,
};

#[derive(Clone)]
pub struct SqliteStore {
    read_db: SqlitePool,
    write_db: SqlitePool,
}

impl SqliteStore {
    pub fn new(read_db: SqlitePool, write_db: SqlitePool) -> Self {
        Self { read_db, write_db }
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self::new(pool.clone(), pool)
    }
}

#[async_trait::async_trait]
impl Store for SqliteStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        user::find(&self.read_db, user::FindType::Id(id.to_owned())).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        user::find(&self.read_db, user::FindType::Email(email.to_owned())).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        user::list(&self.read_db).await
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        user::create(&self.write_db, user).await
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<(), StoreError> {
        user::update(&self.write_db, id, update).await
    }

    async fn save_subscription(&self, subscription: &Subscription) -> Result<(), StoreError> {
        subscription::save(&self.write_db, subscription).await
    }

    async fn find_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        subscription::find_by_user(&self.read_db, user_id).await
    }

    async fn insert_grant(&self, grant: &PermissionGrant) -> Result<(), StoreError> {
        grant::insert(&self.write_db, grant).await
    }

    async fn find_grants(&self, filter: &GrantFilter) -> Result<Vec<PermissionGrant>, StoreError> {
        grant::find(&self.read_db, filter).await
    }

    async fn revoke_grant(&self, id: &str, revocation: &Revocation) -> Result<(), StoreError> {
        grant::revoke(&self.write_db, id, revocation).await
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        permission::list(&self.read_db).await
    }

    async fn find_permission(&self, id: &str) -> Result<Option<Permission>, StoreError> {
        permission::find(&self.read_db, id).await
    }

    async fn save_permission(&self, permission: &Permission) -> Result<(), StoreError> {
        permission::save(&self.write_db, permission).await
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(value)?)
}

/// Parse a JSON document column. A document that no longer matches its type
/// is logged and read as absent, so the record it carried grants nothing.
fn from_json<T: DeserializeOwned>(
    id: &str,
    column: &'static str,
    value: Option<String>,
) -> Option<T> {
    let value = value?;

    match serde_json::from_str(&value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(id, column, err = %err, "ignoring malformed document");
            None
        }
    }
}

/// Stored dates are JSON values; anything that is not JSON is kept as text
/// and left for the normalizer to judge.
fn timestamp(value: String) -> RawTimestamp {
    serde_json::from_str(&value).unwrap_or(RawTimestamp::Text(value))
}

fn timestamp_opt(value: Option<String>) -> Option<RawTimestamp> {
    value.map(timestamp)
}

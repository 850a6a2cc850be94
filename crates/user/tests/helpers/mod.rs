use std::{
    path::PathBuf,
    str::FromStr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use lnatprep_shared::{FixedClock, RawTimestamp, user::Role};
use lnatprep_user::{
    Command, GrantFilter, Permission, PermissionGrant, RegisterInput, Revocation, SqliteStore,
    Store, StoreError, Subscription, User, UserUpdate,
};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use time::{OffsetDateTime, macros::datetime};

pub const NOW: OffsetDateTime = datetime!(2025-03-01 12:00 UTC);

pub struct TestState {
    pub pool: SqlitePool,
    pub clock: FixedClock,
}

impl TestState {
    pub fn store(&self) -> SqliteStore {
        SqliteStore::from_pool(self.pool.clone())
    }

    pub fn command(&self) -> Command<SqliteStore> {
        Command::new(self.store()).with_clock(self.clock.clone())
    }
}

pub async fn setup_test_state(path: PathBuf) -> anyhow::Result<TestState> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.to_str().unwrap()))?
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;
    let mut conn = pool.acquire().await?;
    lnatprep_db::migrate(&mut conn).await?;

    Ok(TestState {
        pool,
        clock: FixedClock::new(NOW),
    })
}

#[allow(dead_code)]
pub async fn create_user<S: Store>(cmd: &Command<S>, name: &str) -> anyhow::Result<String> {
    Ok(cmd
        .register(RegisterInput {
            email: format!("{name}@lnatprep.localhost"),
        })
        .await?)
}

#[allow(dead_code)]
pub async fn create_admin<S: Store>(cmd: &Command<S>, name: &str) -> anyhow::Result<String> {
    let id = create_user(cmd, name).await?;
    cmd.set_role(&id, Role::Admin).await?;

    Ok(id)
}

/// User whose registration trial has been removed, leaving no trial and no
/// subscription.
#[allow(dead_code)]
pub async fn create_lapsed_user<S: Store>(cmd: &Command<S>, name: &str) -> anyhow::Result<String> {
    let id = create_user(cmd, name).await?;
    set_trial_end(cmd, &id, None).await?;
    cmd.store
        .update_user(
            &id,
            &UserUpdate {
                subscription: Some(None),
                ..Default::default()
            },
        )
        .await?;

    Ok(id)
}

#[allow(dead_code)]
pub async fn set_trial_end<S: Store>(
    cmd: &Command<S>,
    user_id: &str,
    trial_ends_at: Option<RawTimestamp>,
) -> anyhow::Result<()> {
    cmd.store
        .update_user(
            user_id,
            &UserUpdate {
                trial_ends_at: Some(trial_ends_at),
                ..Default::default()
            },
        )
        .await?;

    Ok(())
}

/// Store that can be told to fail or hang on specific calls.
#[allow(dead_code)]
#[derive(Clone)]
pub struct FlakyStore {
    pub inner: SqliteStore,
    pub fail_grants: Arc<AtomicBool>,
    pub fail_list_users: Arc<AtomicBool>,
    pub fail_catalog: Arc<AtomicBool>,
    pub fail_update_for: Arc<Mutex<Option<String>>>,
    pub hanging_finds: Arc<AtomicUsize>,
    pub find_calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new(inner: SqliteStore) -> Self {
        Self {
            inner,
            fail_grants: Default::default(),
            fail_list_users: Default::default(),
            fail_catalog: Default::default(),
            fail_update_for: Default::default(),
            hanging_finds: Default::default(),
            find_calls: Default::default(),
        }
    }

    pub fn fail_update_for(&self, user_id: &str) {
        *self.fail_update_for.lock().unwrap() = Some(user_id.to_owned());
    }
}

#[async_trait::async_trait]
impl Store for FlakyStore {
    async fn find_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);

        let hanging = self
            .hanging_finds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if hanging {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        self.inner.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_email(email).await
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        if self.fail_list_users.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(sqlx::Error::PoolClosed));
        }

        self.inner.list_users().await
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner.create_user(user).await
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<(), StoreError> {
        if self.fail_update_for.lock().unwrap().as_deref() == Some(id) {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }

        self.inner.update_user(id, update).await
    }

    async fn save_subscription(&self, subscription: &Subscription) -> Result<(), StoreError> {
        self.inner.save_subscription(subscription).await
    }

    async fn find_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        self.inner.find_subscriptions(user_id).await
    }

    async fn insert_grant(&self, grant: &PermissionGrant) -> Result<(), StoreError> {
        self.inner.insert_grant(grant).await
    }

    async fn find_grants(&self, filter: &GrantFilter) -> Result<Vec<PermissionGrant>, StoreError> {
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }

        self.inner.find_grants(filter).await
    }

    async fn revoke_grant(&self, id: &str, revocation: &Revocation) -> Result<(), StoreError> {
        self.inner.revoke_grant(id, revocation).await
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>, StoreError> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(sqlx::Error::PoolClosed));
        }

        self.inner.list_permissions().await
    }

    async fn find_permission(&self, id: &str) -> Result<Option<Permission>, StoreError> {
        self.inner.find_permission(id).await
    }

    async fn save_permission(&self, permission: &Permission) -> Result<(), StoreError> {
        self.inner.save_permission(permission).await
    }
}

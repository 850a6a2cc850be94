use lnatprep_shared::user::{Role, State};
use time::Duration;
use ulid::Ulid;
use validator::Validate;

use crate::{Store, Subscription, SubscriptionStatus, TRIAL_DAYS, User, UserUpdate};

#[derive(Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,
}

impl<S: Store> super::Command<S> {
    /// Create a user with a seven day trial.
    pub async fn register(&self, input: RegisterInput) -> lnatprep_shared::Result<String> {
        input.validate()?;

        let email = input.email.to_lowercase();

        if self.find_by_email(&email).await?.is_some() {
            lnatprep_shared::user!("Email already exists");
        }

        let now = self.now();
        let trial_ends_at = now + Duration::days(TRIAL_DAYS);
        let id = Ulid::new().to_string();

        let subscription = Subscription {
            id: Ulid::new().to_string(),
            user_id: id.to_owned(),
            status: SubscriptionStatus::Trial,
            plan_id: "trial".to_owned(),
            plan_name: "Free trial".to_owned(),
            start_date: now.into(),
            end_date: Some(trial_ends_at.into()),
            trial_end: Some(trial_ends_at.into()),
            auto_renew: false,
            payments: vec![],
        };

        let user = User {
            id: id.to_owned(),
            email,
            role: Role::User,
            state: State::Active,
            trial_ends_at: Some(trial_ends_at.into()),
            subscription: Some(subscription.clone()),
            permissions: vec![],
            permission_status: None,
            created_at: now.unix_timestamp(),
        };

        self.call("create_user", || self.store.create_user(&user))
            .await?;
        self.call("save_subscription", || {
            self.store.save_subscription(&subscription)
        })
        .await?;

        tracing::info!(user_id = %id, trial_ends_at = %trial_ends_at, "user registered");

        self.refresh_snapshot_quietly(&id).await;

        Ok(id)
    }

    pub async fn find_by_email(&self, email: &str) -> lnatprep_shared::Result<Option<User>> {
        let email = email.to_lowercase();

        Ok(self
            .call("find_user_by_email", || self.store.find_user_by_email(&email))
            .await?)
    }

    pub async fn set_role(&self, user_id: &str, role: Role) -> lnatprep_shared::Result<()> {
        let user = self.load_user(user_id).await?;
        if user.role == role {
            return Ok(());
        }

        let update = UserUpdate {
            role: Some(role),
            ..Default::default()
        };

        self.call("update_user", || self.store.update_user(user_id, &update))
            .await?;

        tracing::info!(user_id, role = %role, "role changed");

        self.refresh_snapshot_quietly(user_id).await;

        Ok(())
    }

    pub async fn suspend(&self, user_id: &str) -> lnatprep_shared::Result<()> {
        self.set_state(user_id, State::Suspended).await
    }

    pub async fn activate(&self, user_id: &str) -> lnatprep_shared::Result<()> {
        self.set_state(user_id, State::Active).await
    }

    async fn set_state(&self, user_id: &str, state: State) -> lnatprep_shared::Result<()> {
        let user = self.load_user(user_id).await?;
        if user.state == state {
            return Ok(());
        }

        let update = UserUpdate {
            state: Some(state),
            ..Default::default()
        };

        self.call("update_user", || self.store.update_user(user_id, &update))
            .await?;

        tracing::info!(user_id, state = %state, "state changed");

        Ok(())
    }
}

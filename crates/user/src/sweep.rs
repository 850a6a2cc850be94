use futures::{StreamExt, stream};
use lnatprep_shared::Metadata;
use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::{
    EntitlementSnapshot, GrantFilter, Store, SubscriptionStatus, User, UserUpdate,
    resolver::{Evaluation, evaluate},
};

#[derive(Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failed_user_ids: Vec<String>,
}

impl SweepReport {
    fn record(&mut self, user_id: String, outcome: lnatprep_shared::Result<Outcome>) {
        self.processed += 1;

        match outcome {
            Ok(Outcome::Done) => self.succeeded += 1,
            Ok(Outcome::Skipped) => self.skipped += 1,
            Err(_) => {
                self.failed += 1;
                self.failed_user_ids.push(user_id);
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

enum Outcome {
    Done,
    Skipped,
}

#[derive(Serialize, Display, AsRefStr, Clone, Copy, Debug, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Success,
    PartialFailure,
}

#[derive(Serialize, Clone, Debug)]
pub struct MaintenanceReport {
    pub status: MaintenanceStatus,
    pub steps: Vec<String>,
    pub sweep: SweepReport,
    pub refresh: SweepReport,
}

impl<S: Store> super::Command<S> {
    /// Clear lapsed trials, subscriptions and grants for every non-admin user
    /// and write a fresh snapshot for each. A user that fails is counted and
    /// skipped; only failing to list users aborts the sweep.
    pub async fn sweep_all(&self) -> lnatprep_shared::Result<SweepReport> {
        let users = self.call("list_users", || self.store.list_users()).await?;
        let metadata = Metadata::system("sweep");

        tracing::info!(users = users.len(), "expiry sweep started");

        let outcomes = stream::iter(users)
            .map(|user| {
                let metadata = &metadata;
                async move {
                    let user_id = user.id.clone();
                    let outcome = self.sweep_user(user, metadata).await;

                    if let Err(err) = &outcome {
                        tracing::error!(user_id = %user_id, err = %err, "failed to sweep user");
                    }

                    (user_id, outcome)
                }
            })
            .buffer_unordered(self.options.sweep_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut report = SweepReport::default();
        for (user_id, outcome) in outcomes {
            report.record(user_id, outcome);
        }

        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "expiry sweep finished"
        );

        Ok(report)
    }

    async fn sweep_user(
        &self,
        user: User,
        metadata: &Metadata,
    ) -> lnatprep_shared::Result<Outcome> {
        if user.is_admin() {
            return Ok(Outcome::Skipped);
        }

        let now = self.now();
        let Evaluation {
            trial_active,
            subscription_active,
        } = evaluate(&user, now);

        let mut update = UserUpdate::default();

        if subscription_active {
            if trial_active {
                update.trial_ends_at = Some(None);
                tracing::info!(user_id = %user.id, "trial superseded by subscription");
            }
        } else if !trial_active {
            let revoked = self
                .revoke_matching(
                    GrantFilter::flagged_active(&user.id),
                    Some("expired".to_owned()),
                    metadata,
                )
                .await?;

            if user.trial_ends_at.is_some() {
                update.trial_ends_at = Some(None);
            }

            if let Some(subscription) = &user.subscription {
                let mut expired = subscription.clone();
                expired.status = SubscriptionStatus::Expired;
                self.call("save_subscription", || self.store.save_subscription(&expired))
                    .await?;

                update.subscription = Some(None);
            }

            if !user.permissions.is_empty() {
                update.permissions = Some(vec![]);
            }

            if revoked > 0 || !update.is_empty() {
                tracing::info!(user_id = %user.id, revoked, "cleared lapsed entitlements");
            }
        }

        let mut swept = user;
        update.apply(&mut swept);

        // Resolved after the revocations above so the snapshot never shows
        // grants that were just deactivated.
        let resolution = self.resolve(&swept).await;
        update.permission_status = Some(EntitlementSnapshot::new(&resolution, now));

        self.call("update_user", || self.store.update_user(&swept.id, &update))
            .await?;

        Ok(Outcome::Done)
    }

    /// Recompute and store the snapshot of every user, admins included.
    pub async fn refresh_snapshots(&self) -> lnatprep_shared::Result<SweepReport> {
        let users = self.call("list_users", || self.store.list_users()).await?;

        let outcomes = stream::iter(users)
            .map(|user| async move {
                let resolution = self.resolve(&user).await;
                let outcome = self
                    .persist_snapshot(&user.id, &resolution)
                    .await
                    .map(|_| Outcome::Done);

                if let Err(err) = &outcome {
                    tracing::error!(user_id = %user.id, err = %err, "failed to refresh snapshot");
                }

                (user.id, outcome)
            })
            .buffer_unordered(self.options.sweep_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let mut report = SweepReport::default();
        for (user_id, outcome) in outcomes {
            report.record(user_id, outcome);
        }

        Ok(report)
    }

    /// Sweep followed by a snapshot refresh, as triggered by an administrator
    /// or the schedule. `Err` means the store could not be reached at all.
    pub async fn maintenance(&self) -> lnatprep_shared::Result<MaintenanceReport> {
        let mut steps = vec!["Sweeping expired trials, subscriptions and grants".to_owned()];

        let sweep = self.sweep_all().await?;
        steps.push(format!(
            "Swept {} users: {} updated, {} skipped, {} failed",
            sweep.processed, sweep.succeeded, sweep.skipped, sweep.failed
        ));

        steps.push("Refreshing entitlement snapshots".to_owned());
        let refresh = self.refresh_snapshots().await?;
        steps.push(format!(
            "Refreshed {} snapshots, {} failed",
            refresh.succeeded, refresh.failed
        ));

        let status = if sweep.is_clean() && refresh.is_clean() {
            MaintenanceStatus::Success
        } else {
            MaintenanceStatus::PartialFailure
        };

        tracing::info!(status = %status, "maintenance finished");

        Ok(MaintenanceReport {
            status,
            steps,
            sweep,
            refresh,
        })
    }
}

use lnatprep_shared::{Metadata, normalize};
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::{Store, UserUpdate};

pub const TRIAL_DAYS: i64 = 7;

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrialGrant {
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    /// Always [`TRIAL_DAYS`], whether the trial was extended or started.
    pub days_added: i64,
}

impl<S: Store> super::Command<S> {
    /// Give the user seven more days of trial. A trial still running is
    /// extended from its current end; otherwise a new one starts now.
    pub async fn grant_trial(
        &self,
        user_id: &str,
        reason: Option<String>,
        metadata: &Metadata,
    ) -> lnatprep_shared::Result<TrialGrant> {
        let granted_by = metadata.trigger_by()?;
        let user = self.load_user(user_id).await?;
        let now = self.now();

        let current_end = user
            .trial_ends_at
            .as_ref()
            .and_then(|end| normalize(end).valid())
            .filter(|end| *end > now);

        let Some(ends_at) = current_end
            .unwrap_or(now)
            .checked_add(Duration::days(TRIAL_DAYS))
        else {
            lnatprep_shared::user!("trial of user {user_id} cannot be extended past year 9999");
        };

        let update = UserUpdate {
            trial_ends_at: Some(Some(ends_at.into())),
            ..Default::default()
        };

        self.call("update_user", || self.store.update_user(user_id, &update))
            .await?;

        tracing::info!(
            user_id,
            granted_by = %granted_by,
            reason = reason.as_deref().unwrap_or_default(),
            extended = current_end.is_some(),
            ends_at = %ends_at,
            "trial granted"
        );

        self.refresh_snapshot_quietly(user_id).await;

        Ok(TrialGrant {
            ends_at,
            days_added: TRIAL_DAYS,
        })
    }
}

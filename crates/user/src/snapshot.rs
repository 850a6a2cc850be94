use crate::{EntitlementSnapshot, Resolution, Store, UserUpdate};

impl<S: Store> super::Command<S> {
    /// Write `resolution` onto the user document as the cached snapshot.
    pub async fn persist_snapshot(
        &self,
        user_id: &str,
        resolution: &Resolution,
    ) -> lnatprep_shared::Result<EntitlementSnapshot> {
        let snapshot = EntitlementSnapshot::new(resolution, self.now());
        let update = UserUpdate {
            permission_status: Some(snapshot.clone()),
            ..Default::default()
        };

        self.call("update_user", || self.store.update_user(user_id, &update))
            .await?;

        Ok(snapshot)
    }

    /// Last stored snapshot, without recomputing it. Only fit for display:
    /// access decisions go through [`Self::resolve`].
    pub async fn cached(
        &self,
        user_id: &str,
    ) -> lnatprep_shared::Result<Option<EntitlementSnapshot>> {
        Ok(self.load_user(user_id).await?.permission_status)
    }

    pub async fn refresh_snapshot(
        &self,
        user_id: &str,
    ) -> lnatprep_shared::Result<EntitlementSnapshot> {
        let user = self.load_user(user_id).await?;
        let resolution = self.resolve(&user).await;

        self.persist_snapshot(user_id, &resolution).await
    }

    /// Snapshot refresh after a write that already succeeded. A failure only
    /// leaves the cache stale until the next sweep.
    pub(crate) async fn refresh_snapshot_quietly(&self, user_id: &str) {
        if let Err(err) = self.refresh_snapshot(user_id).await {
            tracing::warn!(user_id, err = %err, "failed to refresh entitlement snapshot");
        }
    }
}

use std::collections::BTreeSet;

use lnatprep_shared::Metadata;
use time::OffsetDateTime;
use ulid::Ulid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{GrantFilter, PermissionGrant, PermissionId, Revocation, Store};

#[derive(Validate, Clone, Debug)]
pub struct GrantInput {
    #[validate(length(min = 1, max = 26))]
    pub user_id: String,
    #[validate(length(min = 1, max = 50))]
    pub permission_id: PermissionId,
    /// `None` grants the permission permanently.
    pub expires_at: Option<OffsetDateTime>,
}

impl<S: Store> super::Command<S> {
    /// Grant a permission to a user and return the grant id. Granting a
    /// permission the user already actively holds returns the existing id.
    pub async fn grant(
        &self,
        input: GrantInput,
        metadata: &Metadata,
    ) -> lnatprep_shared::Result<String> {
        input.validate()?;

        let granted_by = metadata.trigger_by()?;
        let now = self.now();

        if input.expires_at.is_some_and(|at| at <= now) {
            let mut errors = ValidationErrors::new();
            errors.add(
                "expires_at",
                ValidationError::new("past").with_message("expiry must be in the future".into()),
            );

            return Err(errors.into());
        }

        if !self.is_known_permission(&input.permission_id).await? {
            lnatprep_shared::not_found!("permission {}", input.permission_id);
        }

        self.load_user(&input.user_id).await?;

        let filter = GrantFilter::flagged_active(&input.user_id).permission(&input.permission_id);
        let existing = self
            .call("find_grants", || self.store.find_grants(&filter))
            .await?;

        if let Some(grant) = existing.into_iter().find(|grant| grant.is_active_at(now)) {
            tracing::debug!(
                user_id = %input.user_id,
                permission_id = %input.permission_id,
                grant_id = %grant.id,
                "permission already granted"
            );

            return Ok(grant.id);
        }

        let grant = PermissionGrant {
            id: Ulid::new().to_string(),
            user_id: input.user_id,
            permission_id: input.permission_id,
            granted_by,
            granted_at: now.into(),
            expires_at: input.expires_at.map(Into::into),
            active: true,
            revoked_at: None,
            revoked_by: None,
            revoke_reason: None,
        };

        self.call("insert_grant", || self.store.insert_grant(&grant))
            .await?;

        tracing::info!(
            user_id = %grant.user_id,
            permission_id = %grant.permission_id,
            grant_id = %grant.id,
            granted_by = %grant.granted_by,
            "permission granted"
        );

        self.refresh_snapshot_quietly(&grant.user_id).await;

        Ok(grant.id)
    }

    /// Deactivate every active-flagged grant of `permission_id` for the user.
    /// Returns how many records changed; zero is not an error.
    pub async fn revoke(
        &self,
        user_id: &str,
        permission_id: &str,
        reason: Option<String>,
        metadata: &Metadata,
    ) -> lnatprep_shared::Result<usize> {
        let revoked = self
            .revoke_matching(
                GrantFilter::flagged_active(user_id).permission(permission_id),
                reason,
                metadata,
            )
            .await?;

        if revoked > 0 {
            tracing::info!(user_id, permission_id, revoked, "permission revoked");
            self.refresh_snapshot_quietly(user_id).await;
        }

        Ok(revoked)
    }

    pub(crate) async fn revoke_matching(
        &self,
        filter: GrantFilter,
        reason: Option<String>,
        metadata: &Metadata,
    ) -> lnatprep_shared::Result<usize> {
        let revocation = Revocation {
            revoked_at: self.now().into(),
            revoked_by: metadata.trigger_by()?,
            reason,
        };

        let grants = self
            .call("find_grants", || self.store.find_grants(&filter))
            .await?;

        for grant in grants.iter() {
            self.call("revoke_grant", || {
                self.store.revoke_grant(&grant.id, &revocation)
            })
            .await?;
        }

        Ok(grants.len())
    }

    /// Permissions the user holds through explicit grants. The legacy
    /// embedded array on the user document is not consulted.
    pub async fn list_active(
        &self,
        user_id: &str,
    ) -> lnatprep_shared::Result<BTreeSet<PermissionId>> {
        let now = self.now();
        let filter = GrantFilter::flagged_active(user_id);
        let grants = self
            .call("find_grants", || self.store.find_grants(&filter))
            .await?;

        Ok(grants
            .into_iter()
            .filter(|grant| grant.is_active_at(now))
            .map(|grant| grant.permission_id)
            .collect())
    }

    /// Every grant ever issued to the user, oldest first.
    pub async fn history(&self, user_id: &str) -> lnatprep_shared::Result<Vec<PermissionGrant>> {
        let filter = GrantFilter::user(user_id);

        Ok(self
            .call("find_grants", || self.store.find_grants(&filter))
            .await?)
    }
}

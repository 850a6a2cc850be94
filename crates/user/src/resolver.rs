use std::collections::BTreeSet;

use lnatprep_shared::{normalize, user::Tool};
use time::OffsetDateTime;

use crate::{PermissionId, Resolution, Source, Store, User};

/// Trial and subscription state of a user at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    pub trial_active: bool,
    pub subscription_active: bool,
}

pub fn evaluate(user: &User, now: OffsetDateTime) -> Evaluation {
    let trial_active = user
        .trial_ends_at
        .as_ref()
        .is_some_and(|end| normalize(end).is_after(now));

    let subscription_active = user
        .subscription
        .as_ref()
        .is_some_and(|subscription| subscription.is_active_at(now));

    Evaluation {
        trial_active,
        subscription_active,
    }
}

/// Everything a trial, a subscription or an admin role unlocks.
pub fn tool_set() -> BTreeSet<PermissionId> {
    Tool::ids().collect()
}

/// Resolution from the user document alone. Explicit grants are layered on by
/// [`Resolution::with_grants`] when this returns [`Source::None`], and admins
/// only get the tools here: catalog entries are added by [`Command::resolve`].
///
/// [`Command::resolve`]: crate::Command::resolve
pub fn resolve_base(user: &User, now: OffsetDateTime) -> Resolution {
    if user.is_admin() {
        return Resolution {
            permissions: tool_set(),
            source: Source::AdminOverride,
            trial_active: false,
            subscription_active: false,
        };
    }

    let Evaluation {
        trial_active,
        subscription_active,
    } = evaluate(user, now);

    let source = if subscription_active {
        Source::Subscription
    } else if trial_active {
        Source::Trial
    } else {
        Source::None
    };

    let permissions = match source {
        Source::None => BTreeSet::new(),
        _ => tool_set(),
    };

    Resolution {
        permissions,
        source,
        trial_active,
        subscription_active,
    }
}

impl Resolution {
    pub fn with_grants(mut self, grants: BTreeSet<PermissionId>) -> Self {
        if self.source == Source::None && !grants.is_empty() {
            self.permissions = grants;
            self.source = Source::ExplicitGrant;
        }

        self
    }
}

impl<S: Store> super::Command<S> {
    /// Effective permissions of `user` right now. Never fails: a grant lookup
    /// that errors denies access.
    pub async fn resolve(&self, user: &User) -> Resolution {
        let now = self.now();
        let base = resolve_base(user, now);

        match base.source {
            Source::AdminOverride => Resolution {
                permissions: self.full_set().await,
                ..base
            },
            Source::None => match self.list_active(&user.id).await {
                Ok(grants) => base.with_grants(grants),
                Err(err) => {
                    tracing::warn!(
                        user_id = %user.id,
                        err = %err,
                        "grant lookup failed, denying access"
                    );
                    base
                }
            },
            _ => base,
        }
    }

    /// Tools plus every catalog entry. Falls back to the tools alone when the
    /// catalog cannot be read.
    async fn full_set(&self) -> BTreeSet<PermissionId> {
        let mut permissions = tool_set();

        match self
            .call("list_permissions", || self.store.list_permissions())
            .await
        {
            Ok(catalog) => permissions.extend(catalog.into_iter().map(|entry| entry.id)),
            Err(err) => {
                tracing::warn!(err = %err, "catalog lookup failed, admin limited to tools");
            }
        }

        permissions
    }

    pub async fn entitlements(&self, user_id: &str) -> lnatprep_shared::Result<Resolution> {
        let user = self.load_user(user_id).await?;
        let resolution = self.resolve(&user).await;

        tracing::debug!(
            user_id,
            source = %resolution.source,
            permissions = resolution.permissions.len(),
            "resolved entitlements"
        );

        Ok(resolution)
    }
}

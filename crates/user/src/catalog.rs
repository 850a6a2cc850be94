use std::str::FromStr;

use lnatprep_shared::user::Tool;
use strum::VariantArray;
use validator::Validate;

use crate::{Permission, Store};

impl<S: Store> super::Command<S> {
    pub async fn permissions(&self) -> lnatprep_shared::Result<Vec<Permission>> {
        Ok(self
            .call("list_permissions", || self.store.list_permissions())
            .await?)
    }

    pub async fn upsert_permission(&self, permission: Permission) -> lnatprep_shared::Result<()> {
        permission.validate()?;

        self.call("save_permission", || self.store.save_permission(&permission))
            .await?;

        tracing::info!(permission_id = %permission.id, "catalog entry saved");

        Ok(())
    }

    /// Add the built-in tools to the catalog. Existing entries are kept.
    pub async fn seed_catalog(&self) -> lnatprep_shared::Result<usize> {
        let mut seeded = 0;

        for tool in Tool::VARIANTS {
            let id = tool.to_string();
            if self
                .call("find_permission", || self.store.find_permission(&id))
                .await?
                .is_some()
            {
                continue;
            }

            self.upsert_permission(Permission {
                id,
                name: tool.display_name().to_owned(),
                description: None,
            })
            .await?;

            seeded += 1;
        }

        Ok(seeded)
    }

    pub(crate) async fn is_known_permission(&self, id: &str) -> lnatprep_shared::Result<bool> {
        if Tool::from_str(id).is_ok() {
            return Ok(true);
        }

        Ok(self
            .call("find_permission", || self.store.find_permission(id))
            .await?
            .is_some())
    }
}

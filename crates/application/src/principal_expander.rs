use std::collections::BTreeSet;
use std::sync::Arc;

use bastion_core::{AppResult, TenantId};
use bastion_domain::{PermissionGrant, User, UserGroupId, UserId};

use crate::{Expansion, IdentityStore, ResolveMode};

/// Expands a grant's user and group references into users.
#[derive(Clone)]
pub struct PrincipalExpander {
    identity_store: Arc<dyn IdentityStore>,
}

impl PrincipalExpander {
    /// Creates an expander over an identity store.
    #[must_use]
    pub fn new(identity_store: Arc<dyn IdentityStore>) -> Self {
        Self { identity_store }
    }

    /// Returns direct users united with members of referenced groups.
    pub async fn expand_users(
        &self,
        tenant_id: TenantId,
        grant: &PermissionGrant,
        mode: ResolveMode,
    ) -> AppResult<Expansion<UserId, User>> {
        match mode {
            ResolveMode::Flat => Ok(Expansion::Identities(
                self.user_ids(tenant_id, grant).await?,
            )),
            ResolveMode::Hydrated => Ok(Expansion::Records(
                self.users(tenant_id, grant).await?,
            )),
        }
    }

    /// Returns the de-duplicated user ids authorized by the grant.
    pub async fn user_ids(
        &self,
        tenant_id: TenantId,
        grant: &PermissionGrant,
    ) -> AppResult<BTreeSet<UserId>> {
        let direct: BTreeSet<UserId> = grant.users().iter().copied().collect();
        let mut user_ids = if direct.is_empty() {
            BTreeSet::new()
        } else {
            self.identity_store
                .existing_user_ids(tenant_id, &direct)
                .await?
        };

        user_ids.extend(self.group_members(tenant_id, grant.user_groups()).await?);
        Ok(user_ids)
    }

    async fn users(&self, tenant_id: TenantId, grant: &PermissionGrant) -> AppResult<Vec<User>> {
        let mut candidates: BTreeSet<UserId> = grant.users().iter().copied().collect();
        candidates.extend(self.group_members(tenant_id, grant.user_groups()).await?);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut users = self.identity_store.get_users(tenant_id, &candidates).await?;
        users.sort_by(|left, right| {
            left.username
                .cmp(&right.username)
                .then_with(|| left.id.cmp(&right.id))
        });
        users.dedup_by_key(|user| user.id);

        Ok(users)
    }

    async fn group_members(
        &self,
        tenant_id: TenantId,
        group_ids: &[UserGroupId],
    ) -> AppResult<BTreeSet<UserId>> {
        if group_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let group_ids: BTreeSet<UserGroupId> = group_ids.iter().copied().collect();
        self.identity_store
            .get_group_members(tenant_id, &group_ids)
            .await
    }
}

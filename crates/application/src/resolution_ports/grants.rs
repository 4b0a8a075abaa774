use std::collections::BTreeSet;

use async_trait::async_trait;
use bastion_core::{AppResult, TenantId};
use bastion_domain::{GrantId, PermissionGrant, UserGroupId, UserId};

/// Read access to stored permission grants.
#[async_trait]
pub trait PermissionGrantRepository: Send + Sync {
    /// Lists every grant of the tenant ordered by name.
    async fn list_grants(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionGrant>>;

    /// Finds one grant.
    async fn find_grant(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
    ) -> AppResult<Option<PermissionGrant>>;

    /// Lists grants referencing the user directly or through any of the groups.
    async fn list_grants_for_principals(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<Vec<PermissionGrant>>;
}

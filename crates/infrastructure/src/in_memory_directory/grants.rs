use bastion_application::PermissionGrantRepository;
use bastion_domain::GrantId;

use super::*;

#[async_trait]
impl PermissionGrantRepository for InMemoryDirectory {
    async fn list_grants(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionGrant>> {
        Ok(self
            .read_tenant(tenant_id, |directory| directory.grants.clone())
            .await)
    }

    async fn find_grant(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
    ) -> AppResult<Option<PermissionGrant>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                directory
                    .grants
                    .iter()
                    .find(|grant| grant.id() == grant_id)
                    .cloned()
            })
            .await)
    }

    async fn list_grants_for_principals(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let group_ids: Vec<UserGroupId> = group_ids.iter().copied().collect();
        Ok(self
            .read_tenant(tenant_id, |directory| {
                directory
                    .grants
                    .iter()
                    .filter(|grant| grant.references_principal(user_id, &group_ids))
                    .cloned()
                    .collect()
            })
            .await)
    }
}

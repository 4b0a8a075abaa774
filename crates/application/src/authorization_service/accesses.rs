use std::collections::BTreeMap;

use bastion_domain::Account;

use super::*;

type AccessKey = (UserId, AssetId, AccountId);

impl AuthorizationService {
    /// Returns the `(user, asset, account)` authorizations of one grant at `now`.
    ///
    /// An invalid grant authorizes nothing.
    pub async fn resolve_grant_accesses(
        &self,
        tenant_id: TenantId,
        grant: &PermissionGrant,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<AuthorizedAccess>> {
        if !grant.is_valid(now) {
            return Ok(Vec::new());
        }

        let user_ids = self.principal_expander.user_ids(tenant_id, grant).await?;
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let accounts = self.account_resolver.accounts(tenant_id, grant).await?;
        let mut accesses = BTreeMap::new();
        for user_id in user_ids {
            for account in &accounts {
                merge_access(&mut accesses, user_id, account, grant.actions());
            }
        }

        Ok(accesses.into_values().collect())
    }

    /// Returns every authorization a user currently holds, de-duplicated.
    ///
    /// Actions granted to the same account by several grants are merged. A user
    /// that no longer exists holds nothing.
    pub async fn authorized_accesses_for_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<Vec<AuthorizedAccess>> {
        let now = self.clock.now();
        if !self.user_exists(tenant_id, user_id).await? {
            return Ok(Vec::new());
        }

        let group_ids = self.user_group_ids(tenant_id, user_id).await?;
        let grants = self
            .grant_repository
            .list_grants_for_principals(tenant_id, user_id, &group_ids)
            .await?;

        let mut accesses = BTreeMap::new();
        for grant in grants.iter().filter(|grant| grant.is_valid(now)) {
            for account in self.account_resolver.accounts(tenant_id, grant).await? {
                merge_access(&mut accesses, user_id, &account, grant.actions());
            }
        }

        Ok(accesses.into_values().collect())
    }
}

fn merge_access(
    accesses: &mut BTreeMap<AccessKey, AuthorizedAccess>,
    user_id: UserId,
    account: &Account,
    actions: ActionSet,
) {
    accesses
        .entry((user_id, account.asset_id, account.id))
        .and_modify(|access| access.actions = access.actions.union(actions))
        .or_insert_with(|| AuthorizedAccess {
            user_id,
            asset_id: account.asset_id,
            account_id: account.id,
            username: account.username.clone(),
            actions,
        });
}

use std::collections::BTreeSet;
use std::sync::Arc;

use bastion_core::{AppResult, TenantId};
use bastion_domain::{Account, AccountId, AccountSpec, AssetId, PermissionGrant};

use crate::{AccountQuery, AccountStore, AssetSetResolver, Expansion, ResolveMode};

/// Resolves the concrete accounts a grant authorizes.
#[derive(Clone)]
pub struct AccountResolver {
    asset_resolver: AssetSetResolver,
    account_store: Arc<dyn AccountStore>,
}

impl AccountResolver {
    /// Creates a resolver reusing an asset set resolver.
    #[must_use]
    pub fn new(asset_resolver: AssetSetResolver, account_store: Arc<dyn AccountStore>) -> Self {
        Self {
            asset_resolver,
            account_store,
        }
    }

    /// Returns accounts on the grant's assets admitted by its account spec.
    pub async fn resolve_accounts(
        &self,
        tenant_id: TenantId,
        grant: &PermissionGrant,
        mode: ResolveMode,
    ) -> AppResult<Expansion<AccountId, Account>> {
        let accounts = self.accounts(tenant_id, grant).await?;

        Ok(match mode {
            ResolveMode::Flat => {
                Expansion::Identities(accounts.iter().map(|account| account.id).collect())
            }
            ResolveMode::Hydrated => Expansion::Records(accounts),
        })
    }

    /// Returns the authorized accounts in asset name, name, username order.
    pub async fn accounts(
        &self,
        tenant_id: TenantId,
        grant: &PermissionGrant,
    ) -> AppResult<Vec<Account>> {
        let asset_ids = self.asset_resolver.asset_ids(tenant_id, grant).await?;
        self.accounts_on_assets(tenant_id, grant.accounts(), asset_ids)
            .await
    }

    /// Returns accounts on `asset_ids` admitted by `spec`.
    pub async fn accounts_on_assets(
        &self,
        tenant_id: TenantId,
        spec: &AccountSpec,
        asset_ids: BTreeSet<AssetId>,
    ) -> AppResult<Vec<Account>> {
        if asset_ids.is_empty() {
            return Ok(Vec::new());
        }

        let usernames = match spec.explicit_names() {
            None => None,
            Some(names) if names.is_empty() => return Ok(Vec::new()),
            Some(names) => Some(names.clone()),
        };

        self.account_store
            .query_accounts(
                tenant_id,
                &AccountQuery {
                    asset_ids,
                    usernames,
                },
            )
            .await
    }
}

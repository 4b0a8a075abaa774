use std::collections::BTreeSet;

use bastion_domain::{Account, AccountId, Asset, NodeId, NodeKey, User};

use crate::{Expansion, GrantQuery, ResolveMode};

use super::*;

impl AuthorizationService {
    /// Evaluates one grant's validity now.
    pub async fn grant_validity(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
    ) -> AppResult<GrantValidity> {
        let grant = self.require_grant(tenant_id, grant_id).await?;
        let now = self.clock.now();

        Ok(GrantValidity {
            grant_id,
            evaluated_at: now,
            is_active: grant.is_active(),
            is_expired: grant.is_expired(now),
            is_valid: grant.is_valid(now),
        })
    }

    /// Lists grants matching an optional status and account-name filter.
    pub async fn list_grants(
        &self,
        tenant_id: TenantId,
        status: Option<GrantStatus>,
        account_names: Option<BTreeSet<String>>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let now = self.clock.now();
        let mut query = GrantQuery::new();
        query = match status {
            Some(GrantStatus::Active) => query.active(),
            Some(GrantStatus::Inactive) => query.inactive(),
            Some(GrantStatus::Valid) => query.valid(now),
            Some(GrantStatus::Invalid) => query.invalid(now),
            None => query,
        };
        if let Some(account_names) = account_names {
            query = query.filter_by_accounts(account_names);
        }

        self.list_grants_matching(tenant_id, &query).await
    }

    /// Lists grants matching a prepared query.
    pub async fn list_grants_matching(
        &self,
        tenant_id: TenantId,
        query: &GrantQuery,
    ) -> AppResult<Vec<PermissionGrant>> {
        let mut grants = self.grant_repository.list_grants(tenant_id).await?;
        grants.retain(|grant| query.matches(grant));
        Ok(grants)
    }

    /// Expands the users of a stored grant.
    pub async fn expand_grant_users(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
        mode: ResolveMode,
    ) -> AppResult<Expansion<UserId, User>> {
        let grant = self.require_grant(tenant_id, grant_id).await?;
        self.principal_expander
            .expand_users(tenant_id, &grant, mode)
            .await
    }

    /// Expands the assets of a stored grant.
    pub async fn expand_grant_assets(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
        mode: ResolveMode,
    ) -> AppResult<Expansion<AssetId, Asset>> {
        let grant = self.require_grant(tenant_id, grant_id).await?;
        self.asset_resolver
            .expand_assets(tenant_id, &grant, mode)
            .await
    }

    /// Resolves the accounts of a stored grant.
    pub async fn resolve_grant_accounts(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
        mode: ResolveMode,
    ) -> AppResult<Expansion<AccountId, Account>> {
        let grant = self.require_grant(tenant_id, grant_id).await?;
        self.account_resolver
            .resolve_accounts(tenant_id, &grant, mode)
            .await
    }

    /// Lists grants currently authorizing access to an asset.
    pub async fn grants_for_asset(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<Vec<PermissionGrant>> {
        let now = self.clock.now();
        let mut grants = self.grant_repository.list_grants(tenant_id).await?;
        grants.retain(|grant| grant.is_valid(now));

        self.retain_grants_covering_asset(tenant_id, grants, asset_id)
            .await
    }

    /// Keeps grants referencing the asset directly or through a node above it.
    ///
    /// A missing asset is covered by nothing. Costs one asset-store call and
    /// at most two node-store calls regardless of the grant count.
    pub(super) async fn retain_grants_covering_asset(
        &self,
        tenant_id: TenantId,
        mut grants: Vec<PermissionGrant>,
        asset_id: AssetId,
    ) -> AppResult<Vec<PermissionGrant>> {
        if grants.is_empty() || !self.asset_exists(tenant_id, asset_id).await? {
            return Ok(Vec::new());
        }

        let node_ids: BTreeSet<NodeId> = grants
            .iter()
            .filter(|grant| !grant.assets().contains(&asset_id))
            .flat_map(|grant| grant.nodes().iter().copied())
            .collect();

        if node_ids.is_empty() {
            grants.retain(|grant| grant.assets().contains(&asset_id));
            return Ok(grants);
        }

        let asset_node_keys = self
            .node_store
            .get_asset_node_keys(tenant_id, asset_id)
            .await?;
        let granted_node_keys = if asset_node_keys.is_empty() {
            Default::default()
        } else {
            self.node_store.get_node_keys(tenant_id, &node_ids).await?
        };

        grants.retain(|grant| {
            grant.assets().contains(&asset_id)
                || grant
                    .nodes()
                    .iter()
                    .filter_map(|node_id| granted_node_keys.get(node_id))
                    .any(|granted: &NodeKey| {
                        asset_node_keys
                            .iter()
                            .any(|asset_key| granted.contains(asset_key))
                    })
        });

        Ok(grants)
    }
}

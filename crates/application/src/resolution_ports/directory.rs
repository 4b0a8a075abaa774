use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bastion_core::{AppResult, TenantId};
use bastion_domain::{
    Account, Asset, AssetId, NodeId, NodeKey, User, UserGroupId, UserId,
};

/// Identity subsystem lookups. Every call is one batched round trip.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Returns the subset of ids that still exist.
    async fn existing_user_ids(
        &self,
        tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<BTreeSet<UserId>>;

    /// Loads user records for existing ids.
    async fn get_users(
        &self,
        tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<Vec<User>>;

    /// Returns members of any of the groups.
    async fn get_group_members(
        &self,
        tenant_id: TenantId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<BTreeSet<UserId>>;

    /// Returns the groups a user belongs to.
    async fn get_user_group_ids(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<BTreeSet<UserGroupId>>;
}

/// Asset tree lookups.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Returns keys of the nodes that still exist.
    async fn get_node_keys(
        &self,
        tenant_id: TenantId,
        node_ids: &BTreeSet<NodeId>,
    ) -> AppResult<BTreeMap<NodeId, NodeKey>>;

    /// Returns assets placed under any of the nodes or their descendants.
    async fn get_transitive_asset_ids(
        &self,
        tenant_id: TenantId,
        node_keys: &BTreeSet<NodeKey>,
    ) -> AppResult<BTreeSet<AssetId>>;

    /// Returns keys of the nodes an asset is placed directly under.
    async fn get_asset_node_keys(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<BTreeSet<NodeKey>>;
}

/// Asset inventory lookups.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Returns the subset of ids that still exist.
    async fn existing_asset_ids(
        &self,
        tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<BTreeSet<AssetId>>;

    /// Loads asset records for existing ids, ordered by name.
    async fn get_assets(
        &self,
        tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<Vec<Asset>>;
}

/// Account filter: accounts on `asset_ids`, optionally restricted by username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountQuery {
    /// Assets whose accounts are considered.
    pub asset_ids: BTreeSet<AssetId>,
    /// Allowed usernames, `None` for every account.
    pub usernames: Option<BTreeSet<String>>,
}

impl AccountQuery {
    /// Returns whether an account satisfies the filter.
    #[must_use]
    pub fn matches(&self, account: &Account) -> bool {
        self.asset_ids.contains(&account.asset_id)
            && self
                .usernames
                .as_ref()
                .is_none_or(|usernames| usernames.contains(account.username.as_str()))
    }
}

/// Account inventory lookups.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Returns matching accounts ordered by asset name, account name, username.
    async fn query_accounts(
        &self,
        tenant_id: TenantId,
        query: &AccountQuery,
    ) -> AppResult<Vec<Account>>;
}

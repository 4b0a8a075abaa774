use std::collections::{BTreeMap, BTreeSet};

use bastion_application::{AccountQuery, AccountStore, AssetStore, NodeStore};
use bastion_domain::{NodeKey, compare_accounts_for_display};

use super::*;

#[async_trait]
impl NodeStore for InMemoryDirectory {
    async fn get_node_keys(
        &self,
        tenant_id: TenantId,
        node_ids: &BTreeSet<NodeId>,
    ) -> AppResult<BTreeMap<NodeId, NodeKey>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                node_ids
                    .iter()
                    .filter_map(|node_id| directory.nodes.get(node_id))
                    .map(|node| (node.id, node.key.clone()))
                    .collect()
            })
            .await)
    }

    async fn get_transitive_asset_ids(
        &self,
        tenant_id: TenantId,
        node_keys: &BTreeSet<NodeKey>,
    ) -> AppResult<BTreeSet<AssetId>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                directory
                    .nodes
                    .values()
                    .filter(|node| node_keys.iter().any(|key| key.contains(&node.key)))
                    .flat_map(|node| node.asset_ids.iter().copied())
                    .filter(|asset_id| directory.assets.contains_key(asset_id))
                    .collect()
            })
            .await)
    }

    async fn get_asset_node_keys(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<BTreeSet<NodeKey>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                directory
                    .nodes
                    .values()
                    .filter(|node| node.asset_ids.contains(&asset_id))
                    .map(|node| node.key.clone())
                    .collect()
            })
            .await)
    }
}

#[async_trait]
impl AssetStore for InMemoryDirectory {
    async fn existing_asset_ids(
        &self,
        tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<BTreeSet<AssetId>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                asset_ids
                    .iter()
                    .copied()
                    .filter(|asset_id| directory.assets.contains_key(asset_id))
                    .collect()
            })
            .await)
    }

    async fn get_assets(
        &self,
        tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<Vec<Asset>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                let mut assets: Vec<Asset> = asset_ids
                    .iter()
                    .filter_map(|asset_id| directory.assets.get(asset_id).cloned())
                    .collect();
                assets.sort_by(|left, right| {
                    left.name.cmp(&right.name).then_with(|| left.id.cmp(&right.id))
                });
                assets
            })
            .await)
    }
}

#[async_trait]
impl AccountStore for InMemoryDirectory {
    async fn query_accounts(
        &self,
        tenant_id: TenantId,
        query: &AccountQuery,
    ) -> AppResult<Vec<Account>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                let mut matched: Vec<(&str, &Account)> = directory
                    .accounts
                    .values()
                    .filter(|account| query.matches(account))
                    .filter_map(|account| {
                        directory
                            .assets
                            .get(&account.asset_id)
                            .map(|asset| (asset.name.as_str(), account))
                    })
                    .collect();
                matched.sort_by(|left, right| compare_accounts_for_display(*left, *right));

                matched
                    .into_iter()
                    .map(|(_, account)| account.clone())
                    .collect()
            })
            .await)
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;

use bastion_core::{AppResult, TenantId};
use bastion_domain::{Asset, AssetId, NodeId, NodeKey, PermissionGrant};

use crate::{AssetStore, Expansion, NodeStore, ResolveMode};

/// Expands a grant's asset and node references into assets.
#[derive(Clone)]
pub struct AssetSetResolver {
    node_store: Arc<dyn NodeStore>,
    asset_store: Arc<dyn AssetStore>,
}

impl AssetSetResolver {
    /// Creates a resolver over node and asset stores.
    #[must_use]
    pub fn new(node_store: Arc<dyn NodeStore>, asset_store: Arc<dyn AssetStore>) -> Self {
        Self {
            node_store,
            asset_store,
        }
    }

    /// Returns direct assets united with the closure of referenced nodes.
    pub async fn expand_assets(
        &self,
        tenant_id: TenantId,
        grant: &PermissionGrant,
        mode: ResolveMode,
    ) -> AppResult<Expansion<AssetId, Asset>> {
        match mode {
            ResolveMode::Flat => Ok(Expansion::Identities(
                self.asset_ids(tenant_id, grant).await?,
            )),
            ResolveMode::Hydrated => Ok(Expansion::Records(
                self.assets(tenant_id, grant).await?,
            )),
        }
    }

    /// Returns the de-duplicated asset ids covered by the grant.
    pub async fn asset_ids(
        &self,
        tenant_id: TenantId,
        grant: &PermissionGrant,
    ) -> AppResult<BTreeSet<AssetId>> {
        let direct: BTreeSet<AssetId> = grant.assets().iter().copied().collect();
        let mut asset_ids = if direct.is_empty() {
            BTreeSet::new()
        } else {
            self.asset_store
                .existing_asset_ids(tenant_id, &direct)
                .await?
        };

        asset_ids.extend(self.node_asset_ids(tenant_id, grant.nodes()).await?);
        Ok(asset_ids)
    }

    async fn assets(&self, tenant_id: TenantId, grant: &PermissionGrant) -> AppResult<Vec<Asset>> {
        let mut candidates: BTreeSet<AssetId> = grant.assets().iter().copied().collect();
        candidates.extend(self.node_asset_ids(tenant_id, grant.nodes()).await?);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut assets = self.asset_store.get_assets(tenant_id, &candidates).await?;
        assets.sort_by(|left, right| {
            left.name
                .cmp(&right.name)
                .then_with(|| left.id.cmp(&right.id))
        });
        assets.dedup_by_key(|asset| asset.id);

        Ok(assets)
    }

    async fn node_asset_ids(
        &self,
        tenant_id: TenantId,
        node_ids: &[NodeId],
    ) -> AppResult<BTreeSet<AssetId>> {
        if node_ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let node_ids: BTreeSet<NodeId> = node_ids.iter().copied().collect();
        let node_keys: BTreeSet<NodeKey> = self
            .node_store
            .get_node_keys(tenant_id, &node_ids)
            .await?
            .into_values()
            .collect();
        if node_keys.is_empty() {
            return Ok(BTreeSet::new());
        }

        self.node_store
            .get_transitive_asset_ids(tenant_id, &node_keys)
            .await
    }
}

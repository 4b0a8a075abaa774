use std::collections::BTreeMap;
use std::str::FromStr;

use bastion_application::{AccountQuery, AccountStore, AssetStore, NodeStore};
use bastion_core::AppError;
use bastion_domain::{Account, AccountAlias, AccountId, Asset, AssetId, NodeId, NodeKey};

use super::*;

#[derive(Debug, FromRow)]
struct NodeKeyRow {
    id: Uuid,
    key: String,
}

#[derive(Debug, FromRow)]
struct AssetRow {
    id: Uuid,
    name: String,
    address: String,
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    asset_id: Uuid,
    name: String,
    username: String,
    alias: Option<String>,
}

fn decode_node_key(tenant_id: TenantId, key: String) -> AppResult<NodeKey> {
    NodeKey::new(key.as_str()).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode node key '{key}' for tenant '{tenant_id}': {error}"
        ))
    })
}

#[async_trait]
impl NodeStore for PostgresDirectoryRepository {
    async fn get_node_keys(
        &self,
        tenant_id: TenantId,
        node_ids: &BTreeSet<NodeId>,
    ) -> AppResult<BTreeMap<NodeId, NodeKey>> {
        let rows = sqlx::query_as::<_, NodeKeyRow>(
            r#"
            SELECT id, key
            FROM directory_nodes
            WHERE tenant_id = $1
              AND id = ANY($2)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(uuids(node_ids, NodeId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("load node keys", tenant_id))?;

        rows.into_iter()
            .map(|row| Ok((NodeId::from_uuid(row.id), decode_node_key(tenant_id, row.key)?)))
            .collect()
    }

    async fn get_transitive_asset_ids(
        &self,
        tenant_id: TenantId,
        node_keys: &BTreeSet<NodeKey>,
    ) -> AppResult<BTreeSet<AssetId>> {
        let keys: Vec<String> = node_keys.iter().map(|key| key.as_str().to_owned()).collect();
        let rows = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT DISTINCT node_assets.asset_id AS id
            FROM directory_nodes AS nodes
            INNER JOIN directory_node_assets AS node_assets
                ON node_assets.tenant_id = nodes.tenant_id
               AND node_assets.node_id = nodes.id
            INNER JOIN directory_assets AS assets
                ON assets.tenant_id = node_assets.tenant_id
               AND assets.id = node_assets.asset_id
            WHERE nodes.tenant_id = $1
              AND EXISTS (
                  SELECT 1
                  FROM unnest($2::text[]) AS granted(key)
                  WHERE nodes.key = granted.key
                     OR starts_with(nodes.key, granted.key || ':')
              )
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(keys)
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("resolve node assets", tenant_id))?;

        Ok(rows.into_iter().map(|row| AssetId::from_uuid(row.id)).collect())
    }

    async fn get_asset_node_keys(
        &self,
        tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<BTreeSet<NodeKey>> {
        let rows = sqlx::query_as::<_, NodeKeyRow>(
            r#"
            SELECT nodes.id, nodes.key
            FROM directory_node_assets AS node_assets
            INNER JOIN directory_nodes AS nodes
                ON nodes.tenant_id = node_assets.tenant_id
               AND nodes.id = node_assets.node_id
            WHERE node_assets.tenant_id = $1
              AND node_assets.asset_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(asset_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("load asset nodes", tenant_id))?;

        rows.into_iter()
            .map(|row| decode_node_key(tenant_id, row.key))
            .collect()
    }
}

#[async_trait]
impl AssetStore for PostgresDirectoryRepository {
    async fn existing_asset_ids(
        &self,
        tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<BTreeSet<AssetId>> {
        let rows = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT id
            FROM directory_assets
            WHERE tenant_id = $1
              AND id = ANY($2)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(uuids(asset_ids, AssetId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("check assets", tenant_id))?;

        Ok(rows.into_iter().map(|row| AssetId::from_uuid(row.id)).collect())
    }

    async fn get_assets(
        &self,
        tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<Vec<Asset>> {
        let rows = sqlx::query_as::<_, AssetRow>(
            r#"
            SELECT id, name, address
            FROM directory_assets
            WHERE tenant_id = $1
              AND id = ANY($2)
            ORDER BY name, id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(uuids(asset_ids, AssetId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("load assets", tenant_id))?;

        Ok(rows
            .into_iter()
            .map(|row| Asset {
                id: AssetId::from_uuid(row.id),
                name: row.name,
                address: row.address,
            })
            .collect())
    }
}

#[async_trait]
impl AccountStore for PostgresDirectoryRepository {
    async fn query_accounts(
        &self,
        tenant_id: TenantId,
        query: &AccountQuery,
    ) -> AppResult<Vec<Account>> {
        let usernames: Option<Vec<String>> = query
            .usernames
            .as_ref()
            .map(|usernames| usernames.iter().cloned().collect());
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT
                accounts.id,
                accounts.asset_id,
                accounts.name,
                accounts.username,
                accounts.alias
            FROM directory_accounts AS accounts
            INNER JOIN directory_assets AS assets
                ON assets.tenant_id = accounts.tenant_id
               AND assets.id = accounts.asset_id
            WHERE accounts.tenant_id = $1
              AND accounts.asset_id = ANY($2)
              AND ($3::text[] IS NULL OR accounts.username = ANY($3))
            ORDER BY assets.name, accounts.name, accounts.username, accounts.id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(uuids(&query.asset_ids, AssetId::as_uuid))
        .bind(usernames)
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("query accounts", tenant_id))?;

        rows.into_iter()
            .map(|row| {
                let alias = row
                    .alias
                    .as_deref()
                    .map(AccountAlias::from_str)
                    .transpose()
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode alias of account '{}' in tenant '{tenant_id}': {error}",
                            row.id
                        ))
                    })?;

                Ok(Account {
                    id: AccountId::from_uuid(row.id),
                    asset_id: AssetId::from_uuid(row.asset_id),
                    name: row.name,
                    username: row.username,
                    alias,
                })
            })
            .collect()
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use bastion_application::IdentityStore;
use bastion_core::{AppError, AppResult, TenantId};
use bastion_domain::{
    Account, AccountId, Asset, AssetId, Node, NodeId, PermissionGrant, User, UserGroup,
    UserGroupId, UserId,
};
use tokio::sync::RwLock;

use crate::{DirectorySnapshot, TenantSnapshot};

mod grants;
mod inventory;

#[cfg(test)]
mod tests;

/// Records of one tenant held by [`InMemoryDirectory`].
#[derive(Debug, Clone, Default)]
struct TenantDirectory {
    users: BTreeMap<UserId, User>,
    user_groups: BTreeMap<UserGroupId, UserGroup>,
    assets: BTreeMap<AssetId, Asset>,
    nodes: BTreeMap<NodeId, Node>,
    accounts: BTreeMap<AccountId, Account>,
    grants: Vec<PermissionGrant>,
}

impl TenantDirectory {
    fn from_snapshot(snapshot: TenantSnapshot) -> AppResult<Self> {
        let tenant_id = snapshot.tenant_id;
        let mut grants = Vec::with_capacity(snapshot.grants.len());
        let mut grant_names = BTreeSet::new();
        for record in snapshot.grants {
            let grant = PermissionGrant::new(tenant_id, record.input, record.created_at)?;
            if !grant_names.insert(grant.name().as_str().to_owned()) {
                return Err(AppError::Conflict(format!(
                    "permission grant '{}' already exists for tenant '{tenant_id}'",
                    grant.name()
                )));
            }
            grants.push(grant);
        }
        grants.sort_by(|left, right| left.name().cmp(right.name()));

        Ok(Self {
            users: snapshot
                .users
                .into_iter()
                .map(|user| (user.id, user))
                .collect(),
            user_groups: snapshot
                .user_groups
                .into_iter()
                .map(|group| (group.id, group))
                .collect(),
            assets: snapshot
                .assets
                .into_iter()
                .map(|asset| (asset.id, asset))
                .collect(),
            nodes: snapshot
                .nodes
                .into_iter()
                .map(|node| (node.id, node))
                .collect(),
            accounts: snapshot
                .accounts
                .into_iter()
                .map(|account| (account.id, account))
                .collect(),
            grants,
        })
    }
}

/// In-memory directory and grant store implementing every resolution port.
///
/// Each tenant's records are replaced wholesale by [`Self::install`], so readers
/// never observe a half-loaded snapshot.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    tenants: RwLock<HashMap<TenantId, TenantDirectory>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory seeded from a snapshot.
    pub async fn from_snapshot(snapshot: DirectorySnapshot) -> AppResult<Self> {
        let directory = Self::new();
        directory.install(snapshot).await?;
        Ok(directory)
    }

    /// Validates a snapshot and replaces the records of every tenant it names.
    ///
    /// Nothing is replaced if any grant in the snapshot fails validation.
    pub async fn install(&self, snapshot: DirectorySnapshot) -> AppResult<()> {
        let mut prepared = HashMap::new();
        for tenant in snapshot.tenants {
            let tenant_id = tenant.tenant_id;
            if prepared
                .insert(tenant_id, TenantDirectory::from_snapshot(tenant)?)
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "tenant '{tenant_id}' appears more than once in the snapshot"
                )));
            }
        }

        let tenant_count = prepared.len();
        self.tenants.write().await.extend(prepared);
        tracing::info!(tenant_count, "installed directory snapshot");
        Ok(())
    }

    async fn read_tenant<T>(
        &self,
        tenant_id: TenantId,
        read: impl FnOnce(&TenantDirectory) -> T,
    ) -> T {
        let tenants = self.tenants.read().await;
        match tenants.get(&tenant_id) {
            Some(directory) => read(directory),
            None => read(&TenantDirectory::default()),
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryDirectory {
    async fn existing_user_ids(
        &self,
        tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<BTreeSet<UserId>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                user_ids
                    .iter()
                    .copied()
                    .filter(|user_id| directory.users.contains_key(user_id))
                    .collect()
            })
            .await)
    }

    async fn get_users(
        &self,
        tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<Vec<User>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                user_ids
                    .iter()
                    .filter_map(|user_id| directory.users.get(user_id).cloned())
                    .collect()
            })
            .await)
    }

    async fn get_group_members(
        &self,
        tenant_id: TenantId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<BTreeSet<UserId>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                group_ids
                    .iter()
                    .filter_map(|group_id| directory.user_groups.get(group_id))
                    .flat_map(|group| group.member_ids.iter().copied())
                    .filter(|user_id| directory.users.contains_key(user_id))
                    .collect()
            })
            .await)
    }

    async fn get_user_group_ids(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<BTreeSet<UserGroupId>> {
        Ok(self
            .read_tenant(tenant_id, |directory| {
                directory
                    .user_groups
                    .values()
                    .filter(|group| group.member_ids.contains(&user_id))
                    .map(|group| group.id)
                    .collect()
            })
            .await)
    }
}

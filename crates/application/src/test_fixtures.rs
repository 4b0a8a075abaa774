use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bastion_core::{AppError, AppResult, TenantId};
use bastion_domain::{
    Account, AccountId, Asset, AssetId, GrantId, Node, NodeId, NodeKey, PermissionGrant,
    PermissionGrantInput, User, UserGroup, UserGroupId, UserId, compare_accounts_for_display,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    AccountQuery, AccountStore, AssetStore, Clock, IdentityStore, NodeStore,
    PermissionGrantRepository,
};

pub(crate) fn tenant() -> TenantId {
    TenantId::from_uuid(Uuid::from_u128(7))
}

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("fixed timestamp must be valid"))
}

/// Builds a grant created a day before [`fixed_now`].
pub(crate) fn grant_with(configure: impl FnOnce(&mut PermissionGrantInput)) -> PermissionGrant {
    let created_at = fixed_now() - Duration::days(1);
    let mut input = PermissionGrantInput::named(format!("grant-{}", Uuid::new_v4()));
    configure(&mut input);
    PermissionGrant::new(tenant(), input, created_at)
        .unwrap_or_else(|error| panic!("test grant must be valid: {error}"))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CallCounts {
    pub existing_user_ids: usize,
    pub get_users: usize,
    pub get_group_members: usize,
    pub get_user_group_ids: usize,
    pub get_node_keys: usize,
    pub get_transitive_asset_ids: usize,
    pub get_asset_node_keys: usize,
    pub existing_asset_ids: usize,
    pub get_assets: usize,
    pub query_accounts: usize,
}

impl CallCounts {
    pub(crate) fn total(&self) -> usize {
        self.existing_user_ids
            + self.get_users
            + self.get_group_members
            + self.get_user_group_ids
            + self.get_node_keys
            + self.get_transitive_asset_ids
            + self.get_asset_node_keys
            + self.existing_asset_ids
            + self.get_assets
            + self.query_accounts
    }
}

#[derive(Default)]
struct DirectoryState {
    users: BTreeMap<UserId, User>,
    groups: BTreeMap<UserGroupId, UserGroup>,
    assets: BTreeMap<AssetId, Asset>,
    nodes: BTreeMap<NodeId, Node>,
    accounts: BTreeMap<AccountId, Account>,
    calls: CallCounts,
    unavailable: bool,
}

/// Tenant-agnostic directory implementing every store port with call counting.
#[derive(Default)]
pub(crate) struct FakeDirectory {
    state: Mutex<DirectoryState>,
}

impl FakeDirectory {
    fn with_state<T>(&self, apply: impl FnOnce(&mut DirectoryState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state)
    }

    fn record(
        &self,
        count: impl FnOnce(&mut CallCounts),
    ) -> AppResult<std::sync::MutexGuard<'_, DirectoryState>> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        count(&mut state.calls);
        if state.unavailable {
            return Err(AppError::Unavailable("directory offline".to_owned()));
        }
        Ok(state)
    }

    pub(crate) fn add_user(&self, username: &str) -> UserId {
        let user = User {
            id: UserId::new(),
            username: username.to_owned(),
            name: username.to_owned(),
            is_active: true,
        };
        let id = user.id;
        self.with_state(|state| state.users.insert(id, user));
        id
    }

    pub(crate) fn add_group(&self, name: &str, members: &[UserId]) -> UserGroupId {
        let group = UserGroup {
            id: UserGroupId::new(),
            name: name.to_owned(),
            member_ids: members.iter().copied().collect(),
        };
        let id = group.id;
        self.with_state(|state| state.groups.insert(id, group));
        id
    }

    pub(crate) fn add_asset(&self, name: &str) -> AssetId {
        let asset = Asset {
            id: AssetId::new(),
            name: name.to_owned(),
            address: String::new(),
        };
        let id = asset.id;
        self.with_state(|state| state.assets.insert(id, asset));
        id
    }

    pub(crate) fn add_node(&self, key: &str, asset_ids: &[AssetId]) -> NodeId {
        let node = Node {
            id: NodeId::new(),
            key: NodeKey::new(key).unwrap_or_else(|error| panic!("invalid key: {error}")),
            value: key.to_owned(),
            asset_ids: asset_ids.iter().copied().collect(),
        };
        let id = node.id;
        self.with_state(|state| state.nodes.insert(id, node));
        id
    }

    pub(crate) fn add_account(&self, asset_id: AssetId, name: &str, username: &str) -> AccountId {
        let account = Account {
            id: AccountId::new(),
            asset_id,
            name: name.to_owned(),
            username: username.to_owned(),
            alias: None,
        };
        let id = account.id;
        self.with_state(|state| state.accounts.insert(id, account));
        id
    }

    pub(crate) fn asset_name(&self, asset_id: AssetId) -> String {
        self.with_state(|state| {
            state
                .assets
                .get(&asset_id)
                .map(|asset| asset.name.clone())
                .unwrap_or_default()
        })
    }

    pub(crate) fn fail_with_unavailable(&self) {
        self.with_state(|state| state.unavailable = true);
    }

    pub(crate) fn calls(&self) -> CallCounts {
        self.with_state(|state| state.calls)
    }
}

#[async_trait]
impl IdentityStore for FakeDirectory {
    async fn existing_user_ids(
        &self,
        _tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<BTreeSet<UserId>> {
        let state = self.record(|calls| calls.existing_user_ids += 1)?;
        Ok(user_ids
            .iter()
            .copied()
            .filter(|user_id| state.users.contains_key(user_id))
            .collect())
    }

    async fn get_users(
        &self,
        _tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<Vec<User>> {
        let state = self.record(|calls| calls.get_users += 1)?;
        Ok(user_ids
            .iter()
            .filter_map(|user_id| state.users.get(user_id).cloned())
            .collect())
    }

    async fn get_group_members(
        &self,
        _tenant_id: TenantId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<BTreeSet<UserId>> {
        let state = self.record(|calls| calls.get_group_members += 1)?;
        Ok(group_ids
            .iter()
            .filter_map(|group_id| state.groups.get(group_id))
            .flat_map(|group| group.member_ids.iter().copied())
            .collect())
    }

    async fn get_user_group_ids(
        &self,
        _tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<BTreeSet<UserGroupId>> {
        let state = self.record(|calls| calls.get_user_group_ids += 1)?;
        Ok(state
            .groups
            .values()
            .filter(|group| group.member_ids.contains(&user_id))
            .map(|group| group.id)
            .collect())
    }
}

#[async_trait]
impl NodeStore for FakeDirectory {
    async fn get_node_keys(
        &self,
        _tenant_id: TenantId,
        node_ids: &BTreeSet<NodeId>,
    ) -> AppResult<BTreeMap<NodeId, NodeKey>> {
        let state = self.record(|calls| calls.get_node_keys += 1)?;
        Ok(node_ids
            .iter()
            .filter_map(|node_id| state.nodes.get(node_id))
            .map(|node| (node.id, node.key.clone()))
            .collect())
    }

    async fn get_transitive_asset_ids(
        &self,
        _tenant_id: TenantId,
        node_keys: &BTreeSet<NodeKey>,
    ) -> AppResult<BTreeSet<AssetId>> {
        let state = self.record(|calls| calls.get_transitive_asset_ids += 1)?;
        Ok(state
            .nodes
            .values()
            .filter(|node| node_keys.iter().any(|key| key.contains(&node.key)))
            .flat_map(|node| node.asset_ids.iter().copied())
            .filter(|asset_id| state.assets.contains_key(asset_id))
            .collect())
    }

    async fn get_asset_node_keys(
        &self,
        _tenant_id: TenantId,
        asset_id: AssetId,
    ) -> AppResult<BTreeSet<NodeKey>> {
        let state = self.record(|calls| calls.get_asset_node_keys += 1)?;
        Ok(state
            .nodes
            .values()
            .filter(|node| node.asset_ids.contains(&asset_id))
            .map(|node| node.key.clone())
            .collect())
    }
}

#[async_trait]
impl AssetStore for FakeDirectory {
    async fn existing_asset_ids(
        &self,
        _tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<BTreeSet<AssetId>> {
        let state = self.record(|calls| calls.existing_asset_ids += 1)?;
        Ok(asset_ids
            .iter()
            .copied()
            .filter(|asset_id| state.assets.contains_key(asset_id))
            .collect())
    }

    async fn get_assets(
        &self,
        _tenant_id: TenantId,
        asset_ids: &BTreeSet<AssetId>,
    ) -> AppResult<Vec<Asset>> {
        let state = self.record(|calls| calls.get_assets += 1)?;
        Ok(asset_ids
            .iter()
            .filter_map(|asset_id| state.assets.get(asset_id).cloned())
            .collect())
    }
}

#[async_trait]
impl AccountStore for FakeDirectory {
    async fn query_accounts(
        &self,
        _tenant_id: TenantId,
        query: &AccountQuery,
    ) -> AppResult<Vec<Account>> {
        let state = self.record(|calls| calls.query_accounts += 1)?;
        let mut accounts: Vec<(String, Account)> = state
            .accounts
            .values()
            .filter(|account| query.matches(account))
            .filter_map(|account| {
                state
                    .assets
                    .get(&account.asset_id)
                    .map(|asset| (asset.name.clone(), account.clone()))
            })
            .collect();
        accounts.sort_by(|left, right| {
            compare_accounts_for_display((&left.0, &left.1), (&right.0, &right.1))
        });

        Ok(accounts.into_iter().map(|(_, account)| account).collect())
    }
}

/// Grant repository backed by a fixed list.
#[derive(Default)]
pub(crate) struct FakeGrantRepository {
    grants: Mutex<Vec<PermissionGrant>>,
}

impl FakeGrantRepository {
    pub(crate) fn with_grants(grants: Vec<PermissionGrant>) -> Self {
        Self {
            grants: Mutex::new(grants),
        }
    }

    fn snapshot(&self) -> Vec<PermissionGrant> {
        self.grants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PermissionGrantRepository for FakeGrantRepository {
    async fn list_grants(&self, _tenant_id: TenantId) -> AppResult<Vec<PermissionGrant>> {
        Ok(self.snapshot())
    }

    async fn find_grant(
        &self,
        _tenant_id: TenantId,
        grant_id: GrantId,
    ) -> AppResult<Option<PermissionGrant>> {
        Ok(self
            .snapshot()
            .into_iter()
            .find(|grant| grant.id() == grant_id))
    }

    async fn list_grants_for_principals(
        &self,
        _tenant_id: TenantId,
        user_id: UserId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let group_ids: Vec<UserGroupId> = group_ids.iter().copied().collect();
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|grant| grant.references_principal(user_id, &group_ids))
            .collect())
    }
}

/// Clock frozen at one instant that counts its reads.
pub(crate) struct FixedClock {
    now: DateTime<Utc>,
    reads: AtomicUsize,
}

impl FixedClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            reads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.now
    }
}

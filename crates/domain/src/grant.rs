//! Permission grant aggregate and its validity evaluation.

use bastion_core::{AppResult, NonEmptyString, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::account_spec::AccountSpec;
use crate::action::ActionSet;
use crate::identifiers::{AssetId, GrantId, NodeId, UserGroupId, UserId};
use crate::validity::ValidityWindow;

/// Input used to create or restore a permission grant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PermissionGrantInput {
    /// Existing id when restoring from storage.
    #[serde(default)]
    pub id: Option<GrantId>,
    /// Grant name, unique per tenant.
    pub name: String,
    /// Directly referenced users.
    #[serde(default)]
    pub users: Vec<UserId>,
    /// Referenced user groups.
    #[serde(default)]
    pub user_groups: Vec<UserGroupId>,
    /// Directly referenced assets.
    #[serde(default)]
    pub assets: Vec<AssetId>,
    /// Referenced asset tree nodes.
    #[serde(default)]
    pub nodes: Vec<NodeId>,
    /// Stored account specification, a JSON list of names.
    #[serde(default = "empty_account_list")]
    pub accounts: Value,
    /// Allowed actions bitmask.
    #[serde(default)]
    pub actions: ActionSet,
    /// Start of validity, defaults to creation time.
    #[serde(default)]
    pub date_start: Option<DateTime<Utc>>,
    /// End of validity, defaults to a fixed offset after creation.
    #[serde(default)]
    pub date_expired: Option<DateTime<Utc>>,
    /// Activation flag.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Free-text comment.
    #[serde(default)]
    pub comment: String,
    /// Whether the grant was issued by a ticket workflow.
    #[serde(default)]
    pub from_ticket: bool,
    /// Creator identity.
    #[serde(default)]
    pub created_by: String,
}

impl PermissionGrantInput {
    /// Creates an input with every optional field at its default.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            users: Vec::new(),
            user_groups: Vec::new(),
            assets: Vec::new(),
            nodes: Vec::new(),
            accounts: empty_account_list(),
            actions: ActionSet::default(),
            date_start: None,
            date_expired: None,
            is_active: true,
            comment: String::new(),
            from_ticket: false,
            created_by: String::new(),
        }
    }
}

/// Grant authorizing users and groups to accounts on assets and nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionGrant {
    id: GrantId,
    tenant_id: TenantId,
    name: NonEmptyString,
    users: Vec<UserId>,
    user_groups: Vec<UserGroupId>,
    assets: Vec<AssetId>,
    nodes: Vec<NodeId>,
    accounts: AccountSpec,
    actions: ActionSet,
    validity: ValidityWindow,
    is_active: bool,
    comment: String,
    from_ticket: bool,
    created_at: DateTime<Utc>,
    created_by: String,
}

impl PermissionGrant {
    /// Validates the input and creates a grant.
    ///
    /// Malformed account specifications and empty validity windows are
    /// rejected here, so resolution never has to re-check them.
    pub fn new(
        tenant_id: TenantId,
        input: PermissionGrantInput,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(input.name)?;
        let accounts = AccountSpec::from_stored(&input.accounts)?;
        let validity =
            ValidityWindow::with_defaults(created_at, input.date_start, input.date_expired)?;

        Ok(Self {
            id: input.id.unwrap_or_default(),
            tenant_id,
            name,
            users: dedup_preserving_order(input.users),
            user_groups: dedup_preserving_order(input.user_groups),
            assets: dedup_preserving_order(input.assets),
            nodes: dedup_preserving_order(input.nodes),
            accounts,
            actions: input.actions,
            validity,
            is_active: input.is_active,
            comment: input.comment,
            from_ticket: input.from_ticket,
            created_at,
            created_by: input.created_by,
        })
    }

    /// Returns the grant id.
    #[must_use]
    pub fn id(&self) -> GrantId {
        self.id
    }

    /// Returns the owning tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the grant name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns directly referenced users.
    #[must_use]
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Returns referenced user groups.
    #[must_use]
    pub fn user_groups(&self) -> &[UserGroupId] {
        &self.user_groups
    }

    /// Returns directly referenced assets.
    #[must_use]
    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    /// Returns referenced nodes.
    #[must_use]
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Returns the account specification.
    #[must_use]
    pub fn accounts(&self) -> &AccountSpec {
        &self.accounts
    }

    /// Returns the allowed actions.
    #[must_use]
    pub fn actions(&self) -> ActionSet {
        self.actions
    }

    /// Returns the validity window.
    #[must_use]
    pub fn validity(&self) -> ValidityWindow {
        self.validity
    }

    /// Returns the activation flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        self.comment.as_str()
    }

    /// Returns whether a ticket workflow issued the grant.
    #[must_use]
    pub fn from_ticket(&self) -> bool {
        self.from_ticket
    }

    /// Returns the creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the creator identity.
    #[must_use]
    pub fn created_by(&self) -> &str {
        self.created_by.as_str()
    }

    /// Returns whether `now` falls outside `(date_start, date_expired)`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.validity.is_expired(now)
    }

    /// Returns whether the grant is active and inside its window at `now`.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) && self.is_active
    }

    /// Returns whether the user is referenced directly or through a group.
    #[must_use]
    pub fn references_principal(&self, user_id: UserId, group_ids: &[UserGroupId]) -> bool {
        self.users.contains(&user_id)
            || self
                .user_groups
                .iter()
                .any(|group_id| group_ids.contains(group_id))
    }

    /// Adds users, ignoring ones already referenced.
    pub fn add_users(&mut self, user_ids: impl IntoIterator<Item = UserId>) {
        extend_unique(&mut self.users, user_ids);
    }

    /// Removes users.
    pub fn remove_users(&mut self, user_ids: &[UserId]) {
        self.users.retain(|value| !user_ids.contains(value));
    }

    /// Adds user groups, ignoring ones already referenced.
    pub fn add_user_groups(&mut self, group_ids: impl IntoIterator<Item = UserGroupId>) {
        extend_unique(&mut self.user_groups, group_ids);
    }

    /// Removes user groups.
    pub fn remove_user_groups(&mut self, group_ids: &[UserGroupId]) {
        self.user_groups.retain(|value| !group_ids.contains(value));
    }

    /// Adds assets, ignoring ones already referenced.
    pub fn add_assets(&mut self, asset_ids: impl IntoIterator<Item = AssetId>) {
        extend_unique(&mut self.assets, asset_ids);
    }

    /// Removes assets.
    pub fn remove_assets(&mut self, asset_ids: &[AssetId]) {
        self.assets.retain(|value| !asset_ids.contains(value));
    }

    /// Adds nodes, ignoring ones already referenced.
    pub fn add_nodes(&mut self, node_ids: impl IntoIterator<Item = NodeId>) {
        extend_unique(&mut self.nodes, node_ids);
    }

    /// Removes nodes.
    pub fn remove_nodes(&mut self, node_ids: &[NodeId]) {
        self.nodes.retain(|value| !node_ids.contains(value));
    }

    /// Replaces the account specification.
    pub fn set_accounts(&mut self, accounts: AccountSpec) {
        self.accounts = accounts;
    }

    /// Replaces the allowed actions.
    pub fn set_actions(&mut self, actions: ActionSet) {
        self.actions = actions;
    }

    /// Flips the activation flag.
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}

fn dedup_preserving_order<T: PartialEq + Copy>(values: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(values.len());
    extend_unique(&mut unique, values);
    unique
}

fn extend_unique<T: PartialEq + Copy>(target: &mut Vec<T>, values: impl IntoIterator<Item = T>) {
    for value in values {
        if !target.contains(&value) {
            target.push(value);
        }
    }
}

fn empty_account_list() -> Value {
    Value::Array(Vec::new())
}

fn default_active() -> bool {
    true
}

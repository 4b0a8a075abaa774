//! Records owned by external subsystems and only read by the resolution engine.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use bastion_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::account_spec::AccountAlias;
use crate::identifiers::{AccountId, AssetId, NodeId, UserGroupId, UserId};

/// User record read from the identity subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Display name.
    pub name: String,
    /// Whether the identity subsystem still allows this user to sign in.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// User group with its current membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroup {
    /// Stable group identifier.
    pub id: UserGroupId,
    /// Group name.
    pub name: String,
    /// Users belonging to the group.
    #[serde(default)]
    pub member_ids: BTreeSet<UserId>,
}

/// Remote asset a grant can authorize access to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Stable asset identifier.
    pub id: AssetId,
    /// Asset name, used for user-facing ordering.
    pub name: String,
    /// Network address.
    #[serde(default)]
    pub address: String,
}

/// Materialized path of a node inside the asset tree, e.g. `1:4:2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeKey(String);

impl NodeKey {
    /// Creates a validated node key.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("node key must not be empty".to_owned()));
        }

        if trimmed.split(':').any(|segment| segment.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "node key '{value}' must not contain empty segments"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether `other` is this node or one of its descendants.
    #[must_use]
    pub fn contains(&self, other: &NodeKey) -> bool {
        other.0 == self.0
            || other
                .0
                .strip_prefix(self.0.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
    }

    /// Returns the parent key, or `None` for a root node.
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.0
            .rsplit_once(':')
            .map(|(parent, _)| Self(parent.to_owned()))
    }
}

impl TryFrom<String> for NodeKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeKey> for String {
    fn from(value: NodeKey) -> Self {
        value.0
    }
}

impl Display for NodeKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Asset tree node with its direct asset membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable node identifier.
    pub id: NodeId,
    /// Materialized tree path.
    pub key: NodeKey,
    /// Display label.
    #[serde(default)]
    pub value: String,
    /// Assets placed directly under this node.
    #[serde(default)]
    pub asset_ids: BTreeSet<AssetId>,
}

/// Account usable on exactly one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Stable account identifier.
    pub id: AccountId,
    /// Owning asset.
    pub asset_id: AssetId,
    /// Display name.
    pub name: String,
    /// Login username on the asset.
    pub username: String,
    /// Set for virtual accounts standing in for an alias such as `@ALL`.
    #[serde(default)]
    pub alias: Option<AccountAlias>,
}

impl Account {
    /// Returns whether this is a virtual alias account.
    #[must_use]
    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }
}

/// Orders accounts by `(asset name, account name, username)`.
///
/// Ties fall back to the account id so the order never depends on storage order.
#[must_use]
pub fn compare_accounts_for_display(
    left: (&str, &Account),
    right: (&str, &Account),
) -> Ordering {
    let (left_asset_name, left_account) = left;
    let (right_asset_name, right_account) = right;

    left_asset_name
        .cmp(right_asset_name)
        .then_with(|| left_account.name.cmp(&right_account.name))
        .then_with(|| left_account.username.cmp(&right_account.username))
        .then_with(|| left_account.id.cmp(&right_account.id))
}

fn default_true() -> bool {
    true
}

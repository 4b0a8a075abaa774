//! Domain entities and invariants for asset permission grants.

#![forbid(unsafe_code)]

mod account_spec;
mod action;
mod directory;
mod grant;
mod identifiers;
mod validity;

pub use account_spec::{AccountAlias, AccountSpec};
pub use action::{Action, ActionSet};
pub use directory::{
    Account, Asset, Node, NodeKey, User, UserGroup, compare_accounts_for_display,
};
pub use grant::{PermissionGrant, PermissionGrantInput};
pub use identifiers::{AccountId, AssetId, GrantId, NodeId, UserGroupId, UserId};
pub use validity::{DEFAULT_GRANT_LIFETIME_DAYS, ValidityWindow};

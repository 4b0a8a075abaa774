use std::collections::BTreeSet;

use bastion_application::{Expansion, GrantStatus, GrantValidity, ResolveMode};
use bastion_core::AppError;
use bastion_domain::{Account, Asset, PermissionGrant, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action_names;

/// Query string of the grant listing.
#[derive(Debug, Default, Deserialize)]
pub struct PermissionListQuery {
    /// One of `active`, `inactive`, `valid`, `invalid`.
    pub status: Option<String>,
    /// Comma-separated account names every returned grant must admit.
    pub accounts: Option<String>,
}

impl PermissionListQuery {
    pub fn status(&self) -> Result<Option<GrantStatus>, AppError> {
        self.status
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(GrantStatus::parse)
            .transpose()
    }

    pub fn account_names(&self) -> Option<BTreeSet<String>> {
        self.accounts.as_deref().map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_owned)
                .collect()
        })
    }
}

/// Query string of the per-grant expansions.
#[derive(Debug, Default, Deserialize)]
pub struct ExpansionQuery {
    pub flat: Option<bool>,
}

impl ExpansionQuery {
    pub fn mode(&self) -> ResolveMode {
        ResolveMode::from_flat(self.flat.unwrap_or(true))
    }
}

#[derive(Debug, Serialize)]
pub struct PermissionGrantResponse {
    pub id: Uuid,
    pub name: String,
    pub users: Vec<Uuid>,
    pub user_groups: Vec<Uuid>,
    pub assets: Vec<Uuid>,
    pub nodes: Vec<Uuid>,
    pub accounts: Vec<String>,
    pub actions: Vec<&'static str>,
    pub date_start: DateTime<Utc>,
    pub date_expired: DateTime<Utc>,
    pub is_active: bool,
    pub comment: String,
    pub from_ticket: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<PermissionGrant> for PermissionGrantResponse {
    fn from(grant: PermissionGrant) -> Self {
        Self {
            id: grant.id().as_uuid(),
            name: grant.name().as_str().to_owned(),
            users: grant.users().iter().map(|id| id.as_uuid()).collect(),
            user_groups: grant.user_groups().iter().map(|id| id.as_uuid()).collect(),
            assets: grant.assets().iter().map(|id| id.as_uuid()).collect(),
            nodes: grant.nodes().iter().map(|id| id.as_uuid()).collect(),
            accounts: grant.accounts().to_names(),
            actions: action_names(grant.actions()),
            date_start: grant.validity().date_start(),
            date_expired: grant.validity().date_expired(),
            is_active: grant.is_active(),
            comment: grant.comment().to_owned(),
            from_ticket: grant.from_ticket(),
            created_by: grant.created_by().to_owned(),
            created_at: grant.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GrantValidityResponse {
    pub grant_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub is_active: bool,
    pub is_expired: bool,
    pub is_valid: bool,
}

impl From<GrantValidity> for GrantValidityResponse {
    fn from(validity: GrantValidity) -> Self {
        Self {
            grant_id: validity.grant_id.as_uuid(),
            evaluated_at: validity.evaluated_at,
            is_active: validity.is_active,
            is_expired: validity.is_expired,
            is_valid: validity.is_valid,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub is_active: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.as_uuid(),
            username: user.username,
            name: user.name,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssetResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

impl From<Asset> for AssetResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id.as_uuid(),
            name: asset.name,
            address: asset.address,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub name: String,
    pub username: String,
    pub alias: Option<&'static str>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.as_uuid(),
            asset_id: account.asset_id.as_uuid(),
            alias: account.alias.map(|alias| alias.as_str()),
            name: account.name,
            username: account.username,
        }
    }
}

/// Expansion result: identifiers in flat mode, full records otherwise.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpansionResponse<R> {
    Flat { ids: Vec<Uuid> },
    Hydrated { records: Vec<R> },
}

impl<R> ExpansionResponse<R> {
    pub fn from_expansion<I, T>(expansion: Expansion<I, T>, as_uuid: fn(&I) -> Uuid) -> Self
    where
        R: From<T>,
    {
        match expansion {
            Expansion::Identities(ids) => Self::Flat {
                ids: ids.iter().map(as_uuid).collect(),
            },
            Expansion::Records(records) => Self::Hydrated {
                records: records.into_iter().map(R::from).collect(),
            },
        }
    }
}

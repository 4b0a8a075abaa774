//! JSON directory snapshot used to seed the in-memory adapter.

use std::path::Path;

use bastion_core::{AppError, AppResult, TenantId};
use bastion_domain::{Account, Asset, Node, PermissionGrantInput, User, UserGroup};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Whole-directory snapshot covering any number of tenants.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectorySnapshot {
    /// One entry per tenant scope.
    #[serde(default)]
    pub tenants: Vec<TenantSnapshot>,
}

/// Directory records and grants of one tenant.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantSnapshot {
    /// Scope the records belong to.
    pub tenant_id: TenantId,
    /// Users.
    #[serde(default)]
    pub users: Vec<User>,
    /// User groups with membership.
    #[serde(default)]
    pub user_groups: Vec<UserGroup>,
    /// Assets.
    #[serde(default)]
    pub assets: Vec<Asset>,
    /// Asset tree nodes.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Accounts.
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// Permission grants, validated when the snapshot is installed.
    #[serde(default)]
    pub grants: Vec<GrantRecord>,
}

/// Stored grant: the creation input plus its creation instant.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantRecord {
    /// Grant fields.
    #[serde(flatten)]
    pub input: PermissionGrantInput,
    /// Creation instant used to default the validity window.
    pub created_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    /// Parses a snapshot from JSON text.
    pub fn from_json(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw).map_err(|error| {
            AppError::Validation(format!("invalid directory snapshot: {error}"))
        })
    }

    /// Reads and parses a snapshot file.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            AppError::Internal(format!(
                "failed to read directory snapshot '{}': {error}",
                path.display()
            ))
        })?;

        Self::from_json(raw.as_str())
    }
}

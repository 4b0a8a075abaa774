//! Principal- and asset-centric authorization answers over many grants.
//!
//! Every public operation reads the clock once and threads that instant
//! through all validity checks of the call.

mod access;
mod accesses;
mod grants;

use std::collections::BTreeSet;
use std::sync::Arc;

use bastion_core::{AppError, AppResult, TenantId};
use bastion_domain::{
    AccountId, Action, ActionSet, AssetId, GrantId, PermissionGrant, UserGroupId, UserId,
};
use chrono::{DateTime, Utc};

use crate::{
    AccountResolver, AccountStore, AssetSetResolver, AssetStore, Clock, IdentityStore, NodeStore,
    PermissionGrantRepository, PrincipalExpander,
};

/// Collaborator stores the resolution engine reads from.
#[derive(Clone)]
pub struct DirectoryPorts {
    /// Users and group membership.
    pub identity_store: Arc<dyn IdentityStore>,
    /// Asset tree.
    pub node_store: Arc<dyn NodeStore>,
    /// Asset inventory.
    pub asset_store: Arc<dyn AssetStore>,
    /// Account inventory.
    pub account_store: Arc<dyn AccountStore>,
}

/// Grant status selector for bulk listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantStatus {
    /// `is_active` set.
    Active,
    /// `is_active` cleared.
    Inactive,
    /// Active and inside the window.
    Valid,
    /// Anything not valid.
    Invalid,
}

impl GrantStatus {
    /// Parses a transport value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "valid" => Ok(Self::Valid),
            "invalid" => Ok(Self::Invalid),
            _ => Err(AppError::Validation(format!(
                "unknown grant status '{value}'"
            ))),
        }
    }
}

/// Validity snapshot of one grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantValidity {
    /// Evaluated grant.
    pub grant_id: GrantId,
    /// Instant the evaluation used.
    pub evaluated_at: DateTime<Utc>,
    /// Activation flag.
    pub is_active: bool,
    /// Whether the instant is outside the window.
    pub is_expired: bool,
    /// Whether the grant currently authorizes anything.
    pub is_valid: bool,
}

/// One concrete authorization with the actions merged across grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedAccess {
    /// Authorized user.
    pub user_id: UserId,
    /// Target asset.
    pub asset_id: AssetId,
    /// Account on the asset.
    pub account_id: AccountId,
    /// Account username.
    pub username: String,
    /// Union of actions from every contributing grant.
    pub actions: ActionSet,
}

/// Question asked by a connection broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    /// Connecting user.
    pub user_id: UserId,
    /// Target asset.
    pub asset_id: AssetId,
    /// Account username on the asset.
    pub account_username: String,
    /// Requested action.
    pub action: Action,
}

/// Answer to an [`AccessRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the action is authorized.
    pub allowed: bool,
    /// Actions authorized on the account, merged across grants.
    pub actions: ActionSet,
    /// Grants contributing to the decision.
    pub grant_ids: Vec<GrantId>,
    /// Instant the decision used.
    pub evaluated_at: DateTime<Utc>,
}

/// Application service resolving permission grants into authorizations.
#[derive(Clone)]
pub struct AuthorizationService {
    grant_repository: Arc<dyn PermissionGrantRepository>,
    identity_store: Arc<dyn IdentityStore>,
    node_store: Arc<dyn NodeStore>,
    asset_store: Arc<dyn AssetStore>,
    principal_expander: PrincipalExpander,
    asset_resolver: AssetSetResolver,
    account_resolver: AccountResolver,
    clock: Arc<dyn Clock>,
}

impl AuthorizationService {
    /// Creates a service from a grant repository, directory stores and a clock.
    #[must_use]
    pub fn new(
        grant_repository: Arc<dyn PermissionGrantRepository>,
        directory: DirectoryPorts,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let asset_resolver = AssetSetResolver::new(
            directory.node_store.clone(),
            directory.asset_store.clone(),
        );
        let account_resolver =
            AccountResolver::new(asset_resolver.clone(), directory.account_store);

        Self {
            grant_repository,
            principal_expander: PrincipalExpander::new(directory.identity_store.clone()),
            identity_store: directory.identity_store,
            node_store: directory.node_store,
            asset_store: directory.asset_store,
            asset_resolver,
            account_resolver,
            clock,
        }
    }

    /// Returns the principal expander.
    #[must_use]
    pub fn principal_expander(&self) -> &PrincipalExpander {
        &self.principal_expander
    }

    /// Returns the asset set resolver.
    #[must_use]
    pub fn asset_resolver(&self) -> &AssetSetResolver {
        &self.asset_resolver
    }

    /// Returns the account resolver.
    #[must_use]
    pub fn account_resolver(&self) -> &AccountResolver {
        &self.account_resolver
    }

    async fn require_grant(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
    ) -> AppResult<PermissionGrant> {
        self.grant_repository
            .find_grant(tenant_id, grant_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "permission grant '{grant_id}' does not exist in tenant '{tenant_id}'"
                ))
            })
    }

    async fn user_exists(&self, tenant_id: TenantId, user_id: UserId) -> AppResult<bool> {
        let existing = self
            .identity_store
            .existing_user_ids(tenant_id, &BTreeSet::from([user_id]))
            .await?;
        Ok(existing.contains(&user_id))
    }

    async fn asset_exists(&self, tenant_id: TenantId, asset_id: AssetId) -> AppResult<bool> {
        let existing = self
            .asset_store
            .existing_asset_ids(tenant_id, &BTreeSet::from([asset_id]))
            .await?;
        Ok(existing.contains(&asset_id))
    }

    async fn user_group_ids(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<BTreeSet<UserGroupId>> {
        self.identity_store
            .get_user_group_ids(tenant_id, user_id)
            .await
    }
}

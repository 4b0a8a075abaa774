use std::str::FromStr;

use bastion_application::{AccessDecision, AccessRequest, AuthorizedAccess};
use bastion_core::AppError;
use bastion_domain::{Action, AssetId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::action_names;

/// Body of an access check.
#[derive(Debug, Deserialize)]
pub struct CheckAccessRequest {
    pub user_id: String,
    pub asset_id: String,
    pub account: String,
    #[serde(default = "default_action")]
    pub action: String,
}

fn default_action() -> String {
    Action::Connect.as_str().to_owned()
}

impl CheckAccessRequest {
    pub fn into_access_request(self) -> Result<AccessRequest, AppError> {
        let account_username = self.account.trim().to_owned();
        if account_username.is_empty() {
            return Err(AppError::Validation("account must not be empty".to_owned()));
        }

        Ok(AccessRequest {
            user_id: UserId::from_str(self.user_id.as_str())?,
            asset_id: AssetId::from_str(self.asset_id.as_str())?,
            account_username,
            action: Action::from_str(self.action.trim())?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct AccessDecisionResponse {
    pub allowed: bool,
    pub actions: Vec<&'static str>,
    pub grant_ids: Vec<Uuid>,
    pub evaluated_at: DateTime<Utc>,
}

impl From<AccessDecision> for AccessDecisionResponse {
    fn from(decision: AccessDecision) -> Self {
        Self {
            allowed: decision.allowed,
            actions: action_names(decision.actions),
            grant_ids: decision
                .grant_ids
                .iter()
                .map(|grant_id| grant_id.as_uuid())
                .collect(),
            evaluated_at: decision.evaluated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorizedAccessResponse {
    pub user_id: Uuid,
    pub asset_id: Uuid,
    pub account_id: Uuid,
    pub username: String,
    pub actions: Vec<&'static str>,
}

impl From<AuthorizedAccess> for AuthorizedAccessResponse {
    fn from(access: AuthorizedAccess) -> Self {
        Self {
            user_id: access.user_id.as_uuid(),
            asset_id: access.asset_id.as_uuid(),
            account_id: access.account_id.as_uuid(),
            username: access.username,
            actions: action_names(access.actions),
        }
    }
}

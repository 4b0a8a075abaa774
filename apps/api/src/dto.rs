mod authorizations;
mod permissions;

use serde::Serialize;

pub use authorizations::{AccessDecisionResponse, AuthorizedAccessResponse, CheckAccessRequest};
pub use permissions::{
    AccountResponse, AssetResponse, ExpansionQuery, ExpansionResponse, GrantValidityResponse,
    PermissionGrantResponse, PermissionListQuery, UserResponse,
};

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

fn action_names(actions: bastion_domain::ActionSet) -> Vec<&'static str> {
    actions
        .actions()
        .into_iter()
        .map(|action| action.as_str())
        .collect()
}

use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use bastion_core::TenantId;
use bastion_domain::UserId;

use crate::dto::{AccessDecisionResponse, AuthorizedAccessResponse, CheckAccessRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn user_authorizations_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<AuthorizedAccessResponse>>> {
    let accesses = state
        .authorization_service
        .authorized_accesses_for_user(tenant_id, UserId::from_str(user_id.as_str())?)
        .await?
        .into_iter()
        .map(AuthorizedAccessResponse::from)
        .collect();

    Ok(Json(accesses))
}

pub async fn check_access_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Json(payload): Json<CheckAccessRequest>,
) -> ApiResult<Json<AccessDecisionResponse>> {
    let request = payload.into_access_request()?;
    let decision = state
        .authorization_service
        .check_access(tenant_id, &request)
        .await?;

    tracing::debug!(
        %tenant_id,
        user_id = %request.user_id,
        asset_id = %request.asset_id,
        action = request.action.as_str(),
        allowed = decision.allowed,
        "access checked"
    );

    Ok(Json(AccessDecisionResponse::from(decision)))
}

use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use bastion_core::TenantId;
use bastion_domain::{AccountId, AssetId, GrantId, UserId};

use crate::dto::{
    AccountResponse, AssetResponse, ExpansionQuery, ExpansionResponse, GrantValidityResponse,
    PermissionGrantResponse, PermissionListQuery, UserResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Query(query): Query<PermissionListQuery>,
) -> ApiResult<Json<Vec<PermissionGrantResponse>>> {
    let grants = state
        .authorization_service
        .list_grants(tenant_id, query.status()?, query.account_names())
        .await?
        .into_iter()
        .map(PermissionGrantResponse::from)
        .collect();

    Ok(Json(grants))
}

pub async fn permission_validity_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(grant_id): Path<String>,
) -> ApiResult<Json<GrantValidityResponse>> {
    let validity = state
        .authorization_service
        .grant_validity(tenant_id, GrantId::from_str(grant_id.as_str())?)
        .await?;

    Ok(Json(GrantValidityResponse::from(validity)))
}

pub async fn permission_users_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(grant_id): Path<String>,
    Query(query): Query<ExpansionQuery>,
) -> ApiResult<Json<ExpansionResponse<UserResponse>>> {
    let expansion = state
        .authorization_service
        .expand_grant_users(
            tenant_id,
            GrantId::from_str(grant_id.as_str())?,
            query.mode(),
        )
        .await?;

    Ok(Json(ExpansionResponse::from_expansion(
        expansion,
        UserId::as_uuid,
    )))
}

pub async fn permission_assets_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(grant_id): Path<String>,
    Query(query): Query<ExpansionQuery>,
) -> ApiResult<Json<ExpansionResponse<AssetResponse>>> {
    let expansion = state
        .authorization_service
        .expand_grant_assets(
            tenant_id,
            GrantId::from_str(grant_id.as_str())?,
            query.mode(),
        )
        .await?;

    Ok(Json(ExpansionResponse::from_expansion(
        expansion,
        AssetId::as_uuid,
    )))
}

pub async fn permission_accounts_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(grant_id): Path<String>,
    Query(query): Query<ExpansionQuery>,
) -> ApiResult<Json<ExpansionResponse<AccountResponse>>> {
    let expansion = state
        .authorization_service
        .resolve_grant_accounts(
            tenant_id,
            GrantId::from_str(grant_id.as_str())?,
            query.mode(),
        )
        .await?;

    Ok(Json(ExpansionResponse::from_expansion(
        expansion,
        AccountId::as_uuid,
    )))
}

pub async fn asset_permissions_handler(
    State(state): State<AppState>,
    Extension(tenant_id): Extension<TenantId>,
    Path(asset_id): Path<String>,
) -> ApiResult<Json<Vec<PermissionGrantResponse>>> {
    let grants = state
        .authorization_service
        .grants_for_asset(tenant_id, AssetId::from_str(asset_id.as_str())?)
        .await?
        .into_iter()
        .map(PermissionGrantResponse::from)
        .collect();

    Ok(Json(grants))
}

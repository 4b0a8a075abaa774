use std::str::FromStr;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use bastion_core::{AppError, TenantId};

use crate::error::ApiResult;
use crate::state::AppState;

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Resolves the tenant scope of a request and stores it as an extension.
pub async fn resolve_tenant_scope(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let tenant_id = tenant_scope(request.headers(), state.default_tenant_id)?;

    request.extensions_mut().insert(tenant_id);
    Ok(next.run(request).await)
}

pub fn tenant_scope(headers: &HeaderMap, fallback: Option<TenantId>) -> Result<TenantId, AppError> {
    match headers.get(TENANT_HEADER) {
        Some(value) => {
            let value = value.to_str().map_err(|_| {
                AppError::Validation(format!("{TENANT_HEADER} header must be visible ASCII"))
            })?;
            TenantId::from_str(value)
        }
        None => fallback.ok_or_else(|| {
            AppError::Unauthorized(format!("{TENANT_HEADER} header is required"))
        }),
    }
}

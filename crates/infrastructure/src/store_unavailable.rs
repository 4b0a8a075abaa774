use bastion_core::{AppError, TenantId};

/// Maps a database failure to [`AppError::Unavailable`] and logs it.
pub(crate) fn store_unavailable(
    operation: &'static str,
    tenant_id: TenantId,
) -> impl FnOnce(sqlx::Error) -> AppError {
    move |error| {
        tracing::warn!(%tenant_id, operation, %error, "directory store query failed");
        AppError::Unavailable(format!(
            "failed to {operation} for tenant '{tenant_id}': {error}"
        ))
    }
}

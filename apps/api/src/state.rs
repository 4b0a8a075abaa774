use bastion_application::AuthorizationService;
use bastion_core::TenantId;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub default_tenant_id: Option<TenantId>,
}

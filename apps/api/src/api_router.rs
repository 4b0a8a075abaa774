use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let scoped_routes = Router::new()
        .route(
            "/api/permissions",
            get(handlers::permissions::list_permissions_handler),
        )
        .route(
            "/api/permissions/{grant_id}/validity",
            get(handlers::permissions::permission_validity_handler),
        )
        .route(
            "/api/permissions/{grant_id}/users",
            get(handlers::permissions::permission_users_handler),
        )
        .route(
            "/api/permissions/{grant_id}/assets",
            get(handlers::permissions::permission_assets_handler),
        )
        .route(
            "/api/permissions/{grant_id}/accounts",
            get(handlers::permissions::permission_accounts_handler),
        )
        .route(
            "/api/users/{user_id}/authorizations",
            get(handlers::authorizations::user_authorizations_handler),
        )
        .route(
            "/api/assets/{asset_id}/permissions",
            get(handlers::permissions::asset_permissions_handler),
        )
        .route(
            "/api/authorizations/check",
            post(handlers::authorizations::check_access_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::resolve_tenant_scope,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(scoped_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

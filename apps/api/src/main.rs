//! Bastion permission resolution API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use bastion_core::AppError;
use tracing::info;

use crate::api_config::{ApiConfig, StoreBackend, init_tracing};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let authorization_service = match &config.store_backend {
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool =
                api_services::connect_and_migrate(database_url.as_str(), *max_connections).await?;
            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }

            api_services::postgres_authorization_service(pool)
        }
        StoreBackend::Memory { seed_file } => {
            api_services::memory_authorization_service(seed_file.as_deref()).await?
        }
    };

    let app = api_router::build_router(AppState {
        authorization_service,
        default_tenant_id: config.default_tenant_id,
    });

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "bastion-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

use std::path::Path;
use std::sync::Arc;

use bastion_application::{AuthorizationService, DirectoryPorts};
use bastion_core::AppError;
use bastion_infrastructure::{
    DirectorySnapshot, InMemoryDirectory, PostgresDirectoryRepository,
    PostgresPermissionGrantRepository, SystemClock,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub async fn connect_and_migrate(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

pub fn postgres_authorization_service(pool: PgPool) -> AuthorizationService {
    let directory = Arc::new(PostgresDirectoryRepository::new(pool.clone()));

    AuthorizationService::new(
        Arc::new(PostgresPermissionGrantRepository::new(pool)),
        DirectoryPorts {
            identity_store: directory.clone(),
            node_store: directory.clone(),
            asset_store: directory.clone(),
            account_store: directory,
        },
        Arc::new(SystemClock),
    )
}

pub async fn memory_authorization_service(
    seed_file: Option<&Path>,
) -> Result<AuthorizationService, AppError> {
    let directory = match seed_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading directory snapshot");
            InMemoryDirectory::from_snapshot(DirectorySnapshot::from_path(path)?).await?
        }
        None => InMemoryDirectory::new(),
    };

    Ok(memory_service_over(Arc::new(directory)))
}

pub fn memory_service_over(directory: Arc<InMemoryDirectory>) -> AuthorizationService {
    AuthorizationService::new(
        directory.clone(),
        DirectoryPorts {
            identity_store: directory.clone(),
            node_store: directory.clone(),
            asset_store: directory.clone(),
            account_store: directory,
        },
        Arc::new(SystemClock),
    )
}

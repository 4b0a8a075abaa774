use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use bastion_core::{AppError, TenantId};
use tracing_subscriber::EnvFilter;

/// Where directory records and grants are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory snapshot, optionally seeded from a JSON file.
    Memory { seed_file: Option<PathBuf> },
    /// PostgreSQL read adapters.
    Postgres {
        database_url: String,
        max_connections: u32,
    },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub api_host: String,
    pub api_port: u16,
    pub store_backend: StoreBackend,
    pub default_tenant_id: Option<TenantId>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let store_backend = match lookup("STORE_BACKEND")
            .unwrap_or_else(|| "memory".to_owned())
            .as_str()
        {
            "memory" => StoreBackend::Memory {
                seed_file: non_empty(&lookup, "SEED_FILE").map(PathBuf::from),
            },
            "postgres" => {
                let database_url = non_empty(&lookup, "DATABASE_URL").ok_or_else(|| {
                    AppError::Validation(
                        "DATABASE_URL is required when STORE_BACKEND is 'postgres'".to_owned(),
                    )
                })?;
                let max_connections = match non_empty(&lookup, "DATABASE_MAX_CONNECTIONS") {
                    Some(value) => value.parse::<u32>().map_err(|error| {
                        AppError::Validation(format!("invalid DATABASE_MAX_CONNECTIONS: {error}"))
                    })?,
                    None => 10,
                };
                StoreBackend::Postgres {
                    database_url,
                    max_connections,
                }
            }
            other => {
                return Err(AppError::Validation(format!(
                    "STORE_BACKEND must be either 'memory' or 'postgres', got '{other}'"
                )));
            }
        };

        if migrate_only && !matches!(store_backend, StoreBackend::Postgres { .. }) {
            return Err(AppError::Validation(
                "migrate requires STORE_BACKEND to be 'postgres'".to_owned(),
            ));
        }

        let default_tenant_id = non_empty(&lookup, "DEFAULT_TENANT_ID")
            .map(|value| TenantId::from_str(value.as_str()))
            .transpose()?;

        Ok(Self {
            migrate_only,
            api_host,
            api_port,
            store_backend,
            default_tenant_id,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use bastion_core::AppError;

    use super::{ApiConfig, StoreBackend};

    fn load(pairs: &[(&str, &str)], migrate_only: bool) -> Result<ApiConfig, AppError> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(migrate_only, |name| values.get(name).cloned())
    }

    #[test]
    fn defaults_to_memory_backend_on_local_port() {
        let config = load(&[], false).unwrap_or_else(|error| panic!("config failed: {error}"));

        assert_eq!(config.api_port, 3001);
        assert_eq!(config.store_backend, StoreBackend::Memory { seed_file: None });
        assert!(config.default_tenant_id.is_none());
        assert_eq!(
            config
                .socket_address()
                .unwrap_or_else(|error| panic!("address failed: {error}"))
                .to_string(),
            "127.0.0.1:3001"
        );
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        let result = load(&[("STORE_BACKEND", "postgres")], false);

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn postgres_backend_reads_pool_size() {
        let config = load(
            &[
                ("STORE_BACKEND", "postgres"),
                ("DATABASE_URL", "postgres://localhost/bastion"),
                ("DATABASE_MAX_CONNECTIONS", "4"),
            ],
            true,
        )
        .unwrap_or_else(|error| panic!("config failed: {error}"));

        assert!(config.migrate_only);
        assert_eq!(
            config.store_backend,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/bastion".to_owned(),
                max_connections: 4,
            }
        );
    }

    #[test]
    fn memory_backend_keeps_seed_file_and_rejects_migrate() {
        let config = load(&[("SEED_FILE", "directory.json")], false)
            .unwrap_or_else(|error| panic!("config failed: {error}"));
        let migrate = load(&[], true);

        assert_eq!(
            config.store_backend,
            StoreBackend::Memory {
                seed_file: Some(PathBuf::from("directory.json"))
            }
        );
        assert!(matches!(migrate, Err(AppError::Validation(_))));
    }

    #[test]
    fn invalid_default_tenant_is_rejected() {
        let result = load(&[("DEFAULT_TENANT_ID", "not-a-uuid")], false);

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

//! Infrastructure adapters for the resolution ports.

#![forbid(unsafe_code)]

mod directory_snapshot;
mod in_memory_directory;
mod postgres_directory_repository;
mod postgres_permission_grant_repository;
mod store_unavailable;
mod system_clock;

pub use directory_snapshot::{DirectorySnapshot, GrantRecord, TenantSnapshot};
pub use in_memory_directory::InMemoryDirectory;
pub use postgres_directory_repository::PostgresDirectoryRepository;
pub use postgres_permission_grant_repository::PostgresPermissionGrantRepository;
pub use system_clock::SystemClock;

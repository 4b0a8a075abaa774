use std::collections::BTreeSet;

use async_trait::async_trait;
use bastion_application::IdentityStore;
use bastion_core::{AppResult, TenantId};
use bastion_domain::{User, UserGroupId, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::store_unavailable::store_unavailable;

mod inventory;

/// PostgreSQL-backed read adapter for users, groups, nodes, assets and accounts.
///
/// Every lookup is a single statement keyed by an identity array.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct IdRow {
    id: Uuid,
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    name: String,
    is_active: bool,
}

fn uuids<T>(ids: &BTreeSet<T>, as_uuid: fn(&T) -> Uuid) -> Vec<Uuid> {
    ids.iter().map(as_uuid).collect()
}

#[async_trait]
impl IdentityStore for PostgresDirectoryRepository {
    async fn existing_user_ids(
        &self,
        tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<BTreeSet<UserId>> {
        let rows = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT id
            FROM directory_users
            WHERE tenant_id = $1
              AND id = ANY($2)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(uuids(user_ids, UserId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("check users", tenant_id))?;

        Ok(rows.into_iter().map(|row| UserId::from_uuid(row.id)).collect())
    }

    async fn get_users(
        &self,
        tenant_id: TenantId,
        user_ids: &BTreeSet<UserId>,
    ) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, name, is_active
            FROM directory_users
            WHERE tenant_id = $1
              AND id = ANY($2)
            ORDER BY username, id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(uuids(user_ids, UserId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("load users", tenant_id))?;

        Ok(rows
            .into_iter()
            .map(|row| User {
                id: UserId::from_uuid(row.id),
                username: row.username,
                name: row.name,
                is_active: row.is_active,
            })
            .collect())
    }

    async fn get_group_members(
        &self,
        tenant_id: TenantId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<BTreeSet<UserId>> {
        let rows = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT DISTINCT members.user_id AS id
            FROM directory_user_group_members AS members
            INNER JOIN directory_users AS users
                ON users.tenant_id = members.tenant_id
               AND users.id = members.user_id
            WHERE members.tenant_id = $1
              AND members.group_id = ANY($2)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(uuids(group_ids, UserGroupId::as_uuid))
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("load group members", tenant_id))?;

        Ok(rows.into_iter().map(|row| UserId::from_uuid(row.id)).collect())
    }

    async fn get_user_group_ids(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
    ) -> AppResult<BTreeSet<UserGroupId>> {
        let rows = sqlx::query_as::<_, IdRow>(
            r#"
            SELECT group_id AS id
            FROM directory_user_group_members
            WHERE tenant_id = $1
              AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("load user groups", tenant_id))?;

        Ok(rows
            .into_iter()
            .map(|row| UserGroupId::from_uuid(row.id))
            .collect())
    }
}

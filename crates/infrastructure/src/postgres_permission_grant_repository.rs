use std::collections::BTreeSet;

use async_trait::async_trait;
use bastion_application::PermissionGrantRepository;
use bastion_core::{AppError, AppResult, TenantId};
use bastion_domain::{
    ActionSet, AssetId, GrantId, NodeId, PermissionGrant, PermissionGrantInput, UserGroupId,
    UserId,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::store_unavailable::store_unavailable;

const GRANT_COLUMNS: &str = r#"
    id,
    name,
    user_ids,
    user_group_ids,
    asset_ids,
    node_ids,
    accounts,
    actions,
    date_start,
    date_expired,
    is_active,
    comment,
    from_ticket,
    created_by,
    created_at
"#;

/// PostgreSQL-backed read adapter for permission grants.
#[derive(Clone)]
pub struct PostgresPermissionGrantRepository {
    pool: PgPool,
}

impl PostgresPermissionGrantRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionGrantRow {
    id: Uuid,
    name: String,
    user_ids: Vec<Uuid>,
    user_group_ids: Vec<Uuid>,
    asset_ids: Vec<Uuid>,
    node_ids: Vec<Uuid>,
    accounts: Vec<String>,
    actions: i32,
    date_start: DateTime<Utc>,
    date_expired: DateTime<Utc>,
    is_active: bool,
    comment: String,
    from_ticket: bool,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl PermissionGrantRow {
    fn into_grant(self, tenant_id: TenantId) -> AppResult<PermissionGrant> {
        let grant_id = self.id;
        let decode_error = |error: AppError| {
            AppError::Internal(format!(
                "failed to decode permission grant '{grant_id}' for tenant '{tenant_id}': {error}"
            ))
        };

        let bits = u32::try_from(self.actions).map_err(|_| {
            decode_error(AppError::Validation(format!(
                "negative action mask {}",
                self.actions
            )))
        })?;
        let actions = ActionSet::from_bits(bits).map_err(decode_error)?;

        let input = PermissionGrantInput {
            id: Some(GrantId::from_uuid(self.id)),
            name: self.name,
            users: self.user_ids.into_iter().map(UserId::from_uuid).collect(),
            user_groups: self
                .user_group_ids
                .into_iter()
                .map(UserGroupId::from_uuid)
                .collect(),
            assets: self.asset_ids.into_iter().map(AssetId::from_uuid).collect(),
            nodes: self.node_ids.into_iter().map(NodeId::from_uuid).collect(),
            accounts: Value::from(self.accounts),
            actions,
            date_start: Some(self.date_start),
            date_expired: Some(self.date_expired),
            is_active: self.is_active,
            comment: self.comment,
            from_ticket: self.from_ticket,
            created_by: self.created_by,
        };

        PermissionGrant::new(tenant_id, input, self.created_at).map_err(decode_error)
    }
}

/// Decodes listed rows, leaving out rows written before the account-name
/// constraint existed. Each skipped row is logged.
fn decode_grant_rows(tenant_id: TenantId, rows: Vec<PermissionGrantRow>) -> Vec<PermissionGrant> {
    rows.into_iter()
        .filter_map(|row| match row.into_grant(tenant_id) {
            Ok(grant) => Some(grant),
            Err(error) => {
                tracing::warn!(%tenant_id, %error, "skipping undecodable permission grant");
                None
            }
        })
        .collect()
}

#[async_trait]
impl PermissionGrantRepository for PostgresPermissionGrantRepository {
    async fn list_grants(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionGrant>> {
        let rows = sqlx::query_as::<_, PermissionGrantRow>(&format!(
            "SELECT {GRANT_COLUMNS} FROM permission_grants WHERE tenant_id = $1 ORDER BY name"
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("list permission grants", tenant_id))?;

        Ok(decode_grant_rows(tenant_id, rows))
    }

    async fn find_grant(
        &self,
        tenant_id: TenantId,
        grant_id: GrantId,
    ) -> AppResult<Option<PermissionGrant>> {
        let row = sqlx::query_as::<_, PermissionGrantRow>(&format!(
            "SELECT {GRANT_COLUMNS} FROM permission_grants WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id.as_uuid())
        .bind(grant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_unavailable("find permission grant", tenant_id))?;

        row.map(|row| row.into_grant(tenant_id)).transpose()
    }

    async fn list_grants_for_principals(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        group_ids: &BTreeSet<UserGroupId>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let group_ids: Vec<Uuid> = group_ids.iter().map(UserGroupId::as_uuid).collect();
        let rows = sqlx::query_as::<_, PermissionGrantRow>(&format!(
            r#"
            SELECT {GRANT_COLUMNS}
            FROM permission_grants
            WHERE tenant_id = $1
              AND ($2 = ANY(user_ids) OR user_group_ids && $3)
            ORDER BY name
            "#
        ))
        .bind(tenant_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_unavailable("list principal grants", tenant_id))?;

        Ok(decode_grant_rows(tenant_id, rows))
    }
}

#[cfg(test)]
mod tests {
    use bastion_core::{AppError, TenantId};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::{PermissionGrantRow, decode_grant_rows};

    fn row(name: &str, accounts: &[&str]) -> PermissionGrantRow {
        let created_at = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid timestamp"));
        PermissionGrantRow {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            user_ids: vec![Uuid::new_v4()],
            user_group_ids: Vec::new(),
            asset_ids: vec![Uuid::new_v4()],
            node_ids: Vec::new(),
            accounts: accounts.iter().map(|name| (*name).to_owned()).collect(),
            actions: 1,
            date_start: created_at,
            date_expired: created_at + Duration::days(30),
            is_active: true,
            comment: String::new(),
            from_ticket: false,
            created_by: String::new(),
            created_at,
        }
    }

    #[test]
    fn blank_account_name_fails_to_decode() {
        let result = row("broken", &["root", " "]).into_grant(TenantId::new());

        assert!(matches!(result, Err(AppError::Internal(message)) if message.contains("broken")));
    }

    #[test]
    fn listing_skips_rows_with_malformed_accounts() {
        let rows = vec![
            row("ops-web", &["root"]),
            row("padded", &[" root"]),
            row("ops-db", &["@ALL"]),
        ];

        let grants = decode_grant_rows(TenantId::new(), rows);

        let names: Vec<&str> = grants.iter().map(|grant| grant.name().as_str()).collect();
        assert_eq!(names, vec!["ops-web", "ops-db"]);
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;

use bastion_application::{
    AccessRequest, AccountQuery, AccountStore, AuthorizationService, DirectoryPorts, IdentityStore,
    NodeStore, PermissionGrantRepository,
};
use bastion_core::{AppError, TenantId};
use bastion_domain::{Action, AssetId, NodeKey, UserId};
use serde_json::json;
use uuid::Uuid;

use crate::{DirectorySnapshot, SystemClock};

use super::InMemoryDirectory;

const TENANT: &str = "00000000-0000-0000-0000-000000000001";
const ALICE: &str = "00000000-0000-0000-0000-0000000000a1";
const BOB: &str = "00000000-0000-0000-0000-0000000000b2";
const OPS: &str = "00000000-0000-0000-0000-0000000000c1";
const WEB: &str = "00000000-0000-0000-0000-0000000000d1";
const DB: &str = "00000000-0000-0000-0000-0000000000d2";
const ROOT_NODE: &str = "00000000-0000-0000-0000-0000000000e1";
const CHILD_NODE: &str = "00000000-0000-0000-0000-0000000000e2";

fn tenant() -> TenantId {
    TenantId::from_uuid(parse_uuid(TENANT))
}

fn parse_uuid(value: &str) -> Uuid {
    Uuid::parse_str(value).unwrap_or_else(|_| panic!("test uuid '{value}' must parse"))
}

fn user(value: &str) -> UserId {
    UserId::from_uuid(parse_uuid(value))
}

fn asset(value: &str) -> AssetId {
    AssetId::from_uuid(parse_uuid(value))
}

fn snapshot_json(grant_accounts: serde_json::Value) -> serde_json::Value {
    json!({
        "tenants": [{
            "tenant_id": TENANT,
            "users": [
                { "id": ALICE, "username": "alice", "name": "Alice" },
                { "id": BOB, "username": "bob", "name": "Bob" }
            ],
            "user_groups": [
                { "id": OPS, "name": "ops", "member_ids": [BOB] }
            ],
            "assets": [
                { "id": WEB, "name": "web-01", "address": "10.0.0.1" },
                { "id": DB, "name": "db-01", "address": "10.0.0.2" }
            ],
            "nodes": [
                { "id": ROOT_NODE, "key": "1", "value": "Default", "asset_ids": [] },
                { "id": CHILD_NODE, "key": "1:4", "value": "Databases", "asset_ids": [DB] }
            ],
            "accounts": [
                { "id": "00000000-0000-0000-0000-0000000000f1", "asset_id": WEB, "name": "root", "username": "root" },
                { "id": "00000000-0000-0000-0000-0000000000f2", "asset_id": DB, "name": "postgres", "username": "postgres" },
                { "id": "00000000-0000-0000-0000-0000000000f3", "asset_id": DB, "name": "admin", "username": "root" }
            ],
            "grants": [
                {
                    "name": "ops-databases",
                    "user_groups": [OPS],
                    "nodes": [ROOT_NODE],
                    "accounts": grant_accounts,
                    "actions": 5,
                    "created_at": "2020-01-01T00:00:00Z"
                },
                {
                    "name": "alice-web",
                    "users": [ALICE],
                    "assets": [WEB],
                    "accounts": ["root"],
                    "created_at": "2020-01-01T00:00:00Z"
                }
            ]
        }]
    })
}

async fn seeded_directory() -> InMemoryDirectory {
    let snapshot = DirectorySnapshot::from_json(snapshot_json(json!(["@ALL"])).to_string().as_str())
        .unwrap_or_else(|error| panic!("snapshot must parse: {error}"));
    InMemoryDirectory::from_snapshot(snapshot)
        .await
        .unwrap_or_else(|error| panic!("snapshot must install: {error}"))
}

#[tokio::test]
async fn grants_are_listed_by_name() {
    let directory = seeded_directory().await;

    let grants = directory
        .list_grants(tenant())
        .await
        .unwrap_or_else(|error| panic!("listing failed: {error}"));

    let names: Vec<&str> = grants.iter().map(|grant| grant.name().as_str()).collect();
    assert_eq!(names, vec!["alice-web", "ops-databases"]);
}

#[tokio::test]
async fn unknown_tenant_sees_nothing() {
    let directory = seeded_directory().await;
    let other = TenantId::new();

    let grants = directory.list_grants(other).await.unwrap_or_default();
    let users = directory
        .existing_user_ids(other, &BTreeSet::from([user(ALICE)]))
        .await
        .unwrap_or_default();

    assert!(grants.is_empty());
    assert!(users.is_empty());
}

#[tokio::test]
async fn malformed_account_spec_rejects_the_whole_snapshot() {
    let directory = seeded_directory().await;
    let snapshot = DirectorySnapshot::from_json(snapshot_json(json!("root")).to_string().as_str())
        .unwrap_or_else(|error| panic!("snapshot must parse: {error}"));

    let result = directory.install(snapshot).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    let grants = directory.list_grants(tenant()).await.unwrap_or_default();
    assert_eq!(grants.len(), 2);
}

#[tokio::test]
async fn transitive_assets_include_descendant_nodes() {
    let directory = seeded_directory().await;

    let asset_ids = directory
        .get_transitive_asset_ids(
            tenant(),
            &BTreeSet::from([NodeKey::new("1").unwrap_or_else(|_| panic!("valid key"))]),
        )
        .await
        .unwrap_or_else(|error| panic!("lookup failed: {error}"));

    assert_eq!(asset_ids, BTreeSet::from([asset(DB)]));
}

#[tokio::test]
async fn accounts_are_ordered_by_asset_then_name() {
    let directory = seeded_directory().await;

    let accounts = directory
        .query_accounts(
            tenant(),
            &AccountQuery {
                asset_ids: BTreeSet::from([asset(WEB), asset(DB)]),
                usernames: None,
            },
        )
        .await
        .unwrap_or_else(|error| panic!("query failed: {error}"));

    let names: Vec<&str> = accounts.iter().map(|account| account.name.as_str()).collect();
    assert_eq!(names, vec!["admin", "postgres", "root"]);
}

#[tokio::test]
async fn grants_for_principals_match_user_or_group() {
    let directory = seeded_directory().await;
    let groups = directory
        .get_user_group_ids(tenant(), user(BOB))
        .await
        .unwrap_or_else(|error| panic!("groups failed: {error}"));

    let grants = directory
        .list_grants_for_principals(tenant(), user(BOB), &groups)
        .await
        .unwrap_or_else(|error| panic!("listing failed: {error}"));

    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].name().as_str(), "ops-databases");
}

#[tokio::test]
async fn seeded_directory_answers_access_checks() {
    let directory = Arc::new(seeded_directory().await);
    let service = AuthorizationService::new(
        directory.clone(),
        DirectoryPorts {
            identity_store: directory.clone(),
            node_store: directory.clone(),
            asset_store: directory.clone(),
            account_store: directory,
        },
        Arc::new(SystemClock),
    );

    let allowed = service
        .check_access(
            tenant(),
            &AccessRequest {
                user_id: user(BOB),
                asset_id: asset(DB),
                account_username: "postgres".to_owned(),
                action: Action::Download,
            },
        )
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    let denied = service
        .check_access(
            tenant(),
            &AccessRequest {
                user_id: user(ALICE),
                asset_id: asset(DB),
                account_username: "postgres".to_owned(),
                action: Action::Connect,
            },
        )
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));

    assert!(allowed.allowed);
    assert!(!denied.allowed);
}

//! End-to-end tests for the RBAC administration services.
//!
//! Every scenario runs against a fully wired [`AdminConsole`] over an
//! in-memory document store. Fault injection on the store verifies the three
//! error policies:
//! 1. Access decisions deny on failure
//! 2. List reads degrade to empty
//! 3. Audit writes never fail the action they describe

use console_admin::collections;
use console_admin::{AdminActor, AdminConsole, AdminError, ConsoleConfig};
use console_auth::{NewSession, SessionResolver};
use console_org::{AdminAction, NewRole, UserRecord, UserStatus};
use console_rbac::{ops, pages, CrudOperation, OperationPermissionInput, PagePermissionInput};
use console_store::{DocumentStore, MemoryDocumentStore};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Test fixture providing an initialized console.
struct TestFixture {
    /// Store behind every service, for fault injection.
    store: Arc<MemoryDocumentStore>,
    /// The console under test.
    console: AdminConsole,
}

impl TestFixture {
    /// Create a console with default configuration.
    async fn new() -> Self {
        Self::with_config(ConsoleConfig::default()).await
    }

    /// Create a console with the given configuration.
    async fn with_config(config: ConsoleConfig) -> Self {
        let store = Arc::new(MemoryDocumentStore::new());
        let console = AdminConsole::new(store.clone(), config).expect("valid config");
        console.initialize().await.expect("seeded");
        Self { store, console }
    }

    /// Actor holding the super role.
    fn root(&self) -> AdminActor {
        AdminActor::new("root", "super_admin")
    }

    /// Create an active user with a role.
    async fn user(&self, email: &str, role: &str) -> UserRecord {
        self.console
            .users
            .create_user(UserRecord::new(email, email, role))
            .await
            .expect("user created")
    }

    /// Grant page operations to a role.
    async fn grant_page(&self, role_id: &str, page: &str, operations: &[CrudOperation]) {
        self.console
            .permissions
            .bulk_set_page_permissions(role_id, &[PagePermissionInput::new(page, operations.iter().copied())])
            .await
            .expect("granted");
    }
}

// ============================================================================
// Access evaluation
// ============================================================================

#[tokio::test]
async fn test_super_role_bypasses_every_check() {
    let fx = TestFixture::new().await;
    let evaluator = &fx.console.evaluator;

    assert!(evaluator.can_access_page("super_admin", "/anything/at/all", &CrudOperation::all()).await);
    assert!(evaluator.can_access_page("super_admin", pages::ADMIN_ROLES, &[]).await);
    assert!(evaluator.can_perform_operation("super_admin", "notARealOperation").await);
    assert!(evaluator.can_perform_operation("super_admin", ops::DELETE_USER).await);
}

#[tokio::test]
async fn test_missing_row_denies() {
    let fx = TestFixture::new().await;
    for page in pages::CONSOLE_PAGES {
        assert!(!fx.console.evaluator.can_access_page("admin", page, &[]).await);
        assert!(!fx.console.evaluator.can_access_page("user", page, &[]).await);
    }
    assert!(!fx.console.evaluator.can_access_page("ghost-role", pages::ADMIN, &[]).await);
}

#[tokio::test]
async fn test_moderator_scenario() {
    let fx = TestFixture::new().await;
    fx.grant_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Read]).await;
    let evaluator = &fx.console.evaluator;

    assert!(evaluator.can_access_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Read]).await);
    assert!(!evaluator.can_access_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Delete]).await);
    assert!(!evaluator.can_access_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Create]).await);
    assert!(!evaluator.can_access_page("moderator", pages::ADMIN_ROLES, &[]).await);
    assert!(!evaluator.can_access_page("moderator", "/admin/users/123", &[]).await);
    assert!(!evaluator.can_access_page("moderator", pages::ADMIN, &[]).await);
}

#[tokio::test]
async fn test_store_failure_denies_access() {
    let fx = TestFixture::new().await;
    fx.grant_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Read]).await;

    fx.store.set_unavailable(collections::PAGE_PERMISSIONS, true).await;
    assert!(!fx.console.evaluator.can_access_page("moderator", pages::ADMIN_USERS, &[]).await);

    fx.store.set_unavailable(collections::PAGE_PERMISSIONS, false).await;
    fx.store.set_unavailable(collections::ROLES, true).await;
    assert!(!fx.console.evaluator.can_access_page("super_admin", pages::ADMIN_USERS, &[]).await);
    assert!(!fx.console.evaluator.can_perform_operation("super_admin", ops::BAN_USER).await);
}

// ============================================================================
// Permission matrix
// ============================================================================

#[tokio::test]
async fn test_bulk_set_is_idempotent() {
    let fx = TestFixture::new().await;
    let ops_set = [CrudOperation::Read, CrudOperation::Update];
    let input = [PagePermissionInput::new(pages::ADMIN_USERS, ops_set)];

    fx.console.permissions.bulk_set_page_permissions("moderator", &input).await.unwrap();
    let first = fx
        .console
        .permissions
        .get_page_permission("moderator", pages::ADMIN_USERS)
        .await
        .unwrap()
        .unwrap();
    fx.console.permissions.bulk_set_page_permissions("moderator", &input).await.unwrap();
    let second = fx
        .console
        .permissions
        .get_page_permission("moderator", pages::ADMIN_USERS)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second.operations, ops_set.into_iter().collect::<BTreeSet<_>>());
    assert!(second.can_access);
}

#[tokio::test]
async fn test_matrix_round_trip() {
    let fx = TestFixture::new().await;
    let permissions = &fx.console.permissions;
    permissions
        .bulk_set_page_permissions(
            "moderator",
            &[
                PagePermissionInput::new(pages::ADMIN_USERS, [CrudOperation::Read, CrudOperation::Update]),
                PagePermissionInput::new(pages::ADMIN_LOGS, Vec::<CrudOperation>::new()),
            ],
        )
        .await
        .unwrap();
    permissions
        .bulk_set_operation_permissions(
            "moderator",
            &[
                OperationPermissionInput::new(ops::BAN_USER, true),
                OperationPermissionInput::new(ops::DELETE_USER, false),
            ],
        )
        .await
        .unwrap();

    let matrix = permissions.get_role_permission_matrix("moderator").await.unwrap();
    let pages_rows = permissions.get_page_permissions_for_role("moderator").await.unwrap();
    let op_rows = permissions.get_operation_permissions_for_role("moderator").await.unwrap();

    assert_eq!(matrix.role_name, "Moderator");
    assert_eq!(matrix.page_permissions.len(), pages_rows.len());
    for row in &pages_rows {
        assert_eq!(matrix.page_operations(&row.page_path), Some(&row.operations));
    }
    assert_eq!(matrix.operation_permissions.len(), op_rows.len());
    for row in &op_rows {
        assert_eq!(matrix.operation_permissions.get(&row.operation_name), Some(&row.allowed));
    }
    assert!(matrix.page_operations(pages::ADMIN_LOGS).is_some_and(|granted| granted.is_empty()));
}

#[tokio::test]
async fn test_bulk_set_is_all_or_nothing() {
    let fx = TestFixture::new().await;
    fx.grant_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Read]).await;

    let too_many: Vec<PagePermissionInput> = (0..501)
        .map(|i| PagePermissionInput::new(format!("/generated/{}", i), [CrudOperation::Read]))
        .collect();
    let err = fx
        .console
        .permissions
        .bulk_set_page_permissions("moderator", &too_many)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    let rows = fx.console.permissions.get_page_permissions_for_role("moderator").await.unwrap();
    assert_eq!(rows.len(), 1);
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_system_role_delete_leaves_role_and_rows() {
    let fx = TestFixture::new().await;
    fx.grant_page("admin", pages::ADMIN_USERS, &CrudOperation::all()).await;

    let err = fx.console.registry.delete_role("admin").await.unwrap_err();
    assert!(matches!(err, AdminError::SystemRoleProtected(_)));
    assert!(fx.console.registry.get_role("admin").await.is_some());
    assert_eq!(
        fx.console.permissions.get_page_permissions_for_role("admin").await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_orphans_are_reconciled() {
    let fx = TestFixture::new().await;
    let role = fx.console.registry.create_role(NewRole::new("Support", "")).await.unwrap();
    fx.grant_page(&role.id, pages::ADMIN_USERS, &[CrudOperation::Read]).await;

    fx.console.registry.delete_role(&role.id).await.unwrap();
    assert_eq!(fx.console.permissions.find_orphaned_permissions().await.unwrap().len(), 1);
    assert_eq!(fx.console.permissions.reconcile_orphaned_permissions().await.unwrap(), 1);
    assert!(fx.console.permissions.find_orphaned_permissions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cascade_delete_invalidates_snapshots() {
    let fx = TestFixture::with_config(ConsoleConfig::default().with_cascade_role_deletion(true)).await;
    let role = fx.console.registry.create_role(NewRole::new("Support", "")).await.unwrap();
    fx.grant_page(&role.id, pages::ADMIN_USERS, &[CrudOperation::Read]).await;

    let snapshot = fx.console.cache.get_or_load("u1", &role.id).await;
    assert!(snapshot.can_read(pages::ADMIN_USERS));

    fx.console.registry.delete_role(&role.id).await.unwrap();
    assert!(fx.console.permissions.find_orphaned_permissions().await.unwrap().is_empty());
    let snapshot = fx.console.cache.get_or_load("u1", &role.id).await;
    assert!(!snapshot.can_read(pages::ADMIN_USERS));
}

// ============================================================================
// Admin actions
// ============================================================================

#[tokio::test]
async fn test_ban_unban_cycle() {
    let fx = TestFixture::new().await;
    let user = fx.user("ada@example.com", "user").await;

    let banned = fx
        .console
        .admin
        .ban_user_as_admin(&fx.root(), &user.id, Some("reason"))
        .await
        .unwrap();
    assert_eq!(banned.status, UserStatus::Banned);
    assert!(!banned.is_active);

    let logs = fx.console.audit.get_admin_audit_logs(None, None).await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, AdminAction::Ban);
    assert_eq!(logs[0].changes.get("status"), Some(&json!("banned")));

    let unbanned = fx.console.admin.unban_user_as_admin(&fx.root(), &user.id).await.unwrap();
    assert_eq!(unbanned.status, UserStatus::Active);
    assert!(unbanned.is_active);

    let logs = fx.console.audit.get_admin_audit_logs(Some("root"), None).await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].action, AdminAction::Unban);
}

#[tokio::test]
async fn test_bulk_ban_with_missing_id() {
    let fx = TestFixture::new().await;
    let user = fx.user("ada@example.com", "user").await;

    let result = fx
        .console
        .admin
        .bulk_ban_users(&fx.root(), &[user.id.clone(), "missing".to_string()], None)
        .await;
    assert_eq!(result.success, 1);
    assert_eq!(result.failed, 1);
    assert!(result.errors.contains_key("missing"));
    assert_eq!(
        fx.console.users.get_user(&user.id).await.unwrap().status,
        UserStatus::Banned
    );
}

#[tokio::test]
async fn test_actions_require_grants() {
    let fx = TestFixture::new().await;
    let user = fx.user("ada@example.com", "user").await;
    let moderator = AdminActor::new("mod-1", "moderator");

    assert!(matches!(
        fx.console.admin.deactivate_user_as_admin(&moderator, &user.id, None).await,
        Err(AdminError::PermissionDenied(_))
    ));

    fx.grant_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Update]).await;
    fx.console
        .admin
        .deactivate_user_as_admin(&moderator, &user.id, None)
        .await
        .unwrap();

    assert!(matches!(
        fx.console.admin.delete_user_as_admin(&moderator, &user.id, None).await,
        Err(AdminError::PermissionDenied(_))
    ));
    fx.console
        .permissions
        .set_operation_permission("moderator", &OperationPermissionInput::new(ops::DELETE_USER, true))
        .await
        .unwrap();
    let deleted = fx
        .console
        .admin
        .delete_user_as_admin(&moderator, &user.id, Some("spam account"))
        .await
        .unwrap();
    assert_eq!(deleted.status, UserStatus::Deleted);
    assert_eq!(deleted.deleted_by.as_deref(), Some("mod-1"));
}

#[tokio::test]
async fn test_audit_outage_does_not_block_actions() {
    let fx = TestFixture::new().await;
    let user = fx.user("ada@example.com", "user").await;
    fx.store.set_unavailable(collections::AUDIT_LOGS, true).await;
    fx.store.set_unavailable(collections::ACTIVITY_LOGS, true).await;

    let banned = fx
        .console
        .admin
        .ban_user_as_admin(&fx.root(), &user.id, None)
        .await
        .unwrap();
    assert_eq!(banned.status, UserStatus::Banned);
    assert!(fx.console.audit.get_admin_audit_logs(None, None).await.is_empty());
}

#[tokio::test]
async fn test_list_reads_degrade_to_empty() {
    let fx = TestFixture::new().await;
    fx.user("ada@example.com", "user").await;

    fx.store.set_unavailable(collections::ROLES, true).await;
    fx.store.set_unavailable(collections::PERMISSIONS, true).await;
    fx.store.set_unavailable(collections::USERS, true).await;

    assert!(fx.console.registry.get_all_roles().await.is_empty());
    assert!(fx.console.catalog.get_all_permissions().await.is_empty());
    assert!(fx.console.users.get_all_users_for_admin().await.is_empty());
    assert!(fx.console.users.search_users_for_admin("ada").await.is_empty());
    assert!(matches!(
        fx.console.registry.delete_role("moderator").await,
        Err(AdminError::Store(_))
    ));
}

// ============================================================================
// Sessions and identity
// ============================================================================

#[tokio::test]
async fn test_ban_ends_sessions_and_identity() {
    let fx = TestFixture::new().await;
    let user = fx.user("ada@example.com", "user").await;
    let issued = fx
        .console
        .sessions
        .create_session(NewSession::new(&user.id, &user.email))
        .await
        .unwrap();
    assert!(fx.console.identity.resolve(&issued.token).await.unwrap().is_some());

    fx.console
        .admin
        .ban_user_as_admin(&fx.root(), &user.id, None)
        .await
        .unwrap();

    assert!(fx.console.sessions.resolve_session(&issued.token).await.unwrap().is_none());
    assert!(fx.console.identity.resolve(&issued.token).await.unwrap().is_none());
    assert!(fx.console.sessions.get_user_sessions(&user.id).await.is_empty());
}

#[tokio::test]
async fn test_role_change_refreshes_identity_snapshot() {
    let fx = TestFixture::new().await;
    fx.grant_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Read]).await;
    let user = fx.user("ada@example.com", "user").await;
    let issued = fx
        .console
        .sessions
        .create_session(NewSession::new(&user.id, &user.email))
        .await
        .unwrap();

    let identity = fx.console.identity.resolve(&issued.token).await.unwrap().unwrap();
    assert!(!identity.snapshot.can_read(pages::ADMIN_USERS));

    fx.console
        .admin
        .update_user_role_as_admin(&fx.root(), &user.id, "moderator")
        .await
        .unwrap();

    let identity = fx.console.identity.resolve(&issued.token).await.unwrap().unwrap();
    assert_eq!(identity.role_id, "moderator");
    assert!(identity.snapshot.can_read(pages::ADMIN_USERS));
}

#[tokio::test]
async fn test_matrix_edit_refreshes_cached_snapshots() {
    let fx = TestFixture::new().await;
    let before = fx.console.cache.get_or_load("u1", "moderator").await;
    assert!(!before.is_operation_allowed(ops::BAN_USER));

    fx.console
        .admin
        .set_role_operation_permissions_as_admin(
            &fx.root(),
            "moderator",
            &[OperationPermissionInput::new(ops::BAN_USER, true)],
        )
        .await
        .unwrap();

    let after = fx.console.cache.get_or_load("u1", "moderator").await;
    assert!(after.is_operation_allowed(ops::BAN_USER));
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_initial_admin_can_administer() {
    let fx = TestFixture::new().await;
    let admin = fx
        .console
        .bootstrap
        .setup_initial_admin("root@example.com", "correct horse", "Root")
        .await
        .unwrap();
    fx.console
        .credentials
        .verify_password(&admin.id, "correct horse")
        .await
        .unwrap();

    let issued = fx
        .console
        .sessions
        .create_session(NewSession::new(&admin.id, &admin.email))
        .await
        .unwrap();
    let identity = fx.console.identity.resolve(&issued.token).await.unwrap().unwrap();
    assert!(identity.snapshot.can_delete(pages::ADMIN_USERS));
    assert!(identity.snapshot.is_operation_allowed(ops::MANAGE_PAGE_PERMISSIONS));

    let target = fx.user("ada@example.com", "user").await;
    let banned = fx
        .console
        .admin
        .ban_user_as_admin(&identity.actor(), &target.id, None)
        .await
        .unwrap();
    assert_eq!(banned.status, UserStatus::Banned);

    assert!(fx
        .console
        .bootstrap
        .setup_initial_admin("second@example.com", "pw", "Second")
        .await
        .is_err());
}

#[tokio::test]
async fn test_store_stats_track_batches() {
    let fx = TestFixture::new().await;
    let before = fx.store.stats().await.batches_committed;
    fx.grant_page("moderator", pages::ADMIN_USERS, &[CrudOperation::Read]).await;
    assert_eq!(fx.store.stats().await.batches_committed, before + 1);
}

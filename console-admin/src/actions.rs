//! Admin action service
//!
//! Drives users through the lifecycle state machine and edits role
//! permission matrices on behalf of an explicit [`AdminActor`].
//!
//! Every entry point checks its own gate before touching data:
//!
//! | Action | Gate |
//! |--------|------|
//! | activate, deactivate | `UPDATE` on `/admin/users` |
//! | ban | `banUser` |
//! | unban | `unbanUser` |
//! | delete, restore, permanent delete | `deleteUser` |
//! | role change | `changeRole` |
//! | page matrix edit | `managePagePermissions` |
//! | operation matrix edit | `manageOperationPermissions` |
//!
//! Each successful mutation appends an admin audit entry and, except for
//! permanent deletion, an entry in the target user's activity history. Both
//! writes are best-effort.

use crate::audit::{ActivityLog, AuditLog};
use crate::error::{AdminError, AdminResult};
use crate::evaluator::{AccessEvaluator, SnapshotCache};
use crate::permission_store::PermissionStore;
use crate::registry::RoleRegistry;
use crate::users::UserDirectory;
use chrono::Utc;
use console_auth::{CredentialStore, SessionDirectory};
use console_org::{ActivityAction, AdminAction, AdminAuditLog, Transition, UserRecord};
use console_rbac::{ops, pages, CrudOperation, OperationPermissionInput, PagePermissionInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Reason recorded when a permanent deletion is given none.
pub const DEFAULT_PERMANENT_DELETE_REASON: &str = "Permanent deletion";

/// The administrator performing an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminActor {
    /// Acting user id.
    pub user_id: String,
    /// Role id the acting user holds.
    pub role_id: String,
}

impl AdminActor {
    /// Create an actor.
    pub fn new(user_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role_id: role_id.into(),
        }
    }
}

/// Outcome of a bulk action. Each id is processed independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkResult {
    /// Number of ids processed successfully.
    pub success: usize,
    /// Number of ids that failed.
    pub failed: usize,
    /// Failure message per user id.
    pub errors: BTreeMap<String, String>,
}

impl BulkResult {
    fn record(&mut self, user_id: &str, result: AdminResult<UserRecord>) {
        match result {
            Ok(_) => self.success += 1,
            Err(e) => {
                self.failed += 1;
                self.errors.insert(user_id.to_string(), e.to_string());
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BulkAction<'a> {
    Activate,
    Deactivate(Option<&'a str>),
    Ban(Option<&'a str>),
    Unban,
    Delete(Option<&'a str>),
    UpdateRole(&'a str),
}

/// Service orchestrating admin mutations.
pub struct AdminService {
    users: Arc<UserDirectory>,
    registry: Arc<RoleRegistry>,
    permissions: Arc<PermissionStore>,
    evaluator: Arc<AccessEvaluator>,
    audit: Arc<AuditLog>,
    activity: Arc<ActivityLog>,
    sessions: Option<Arc<SessionDirectory>>,
    credentials: Option<Arc<CredentialStore>>,
    cache: Option<Arc<SnapshotCache>>,
}

impl AdminService {
    /// Create the service.
    pub fn new(
        users: Arc<UserDirectory>,
        registry: Arc<RoleRegistry>,
        evaluator: Arc<AccessEvaluator>,
        audit: Arc<AuditLog>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            users,
            registry,
            permissions: evaluator.permissions(),
            evaluator,
            audit,
            activity,
            sessions: None,
            credentials: None,
            cache: None,
        }
    }

    /// Terminate sessions of users who get locked out.
    pub fn with_sessions(mut self, sessions: Arc<SessionDirectory>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Remove credentials of permanently deleted users.
    pub fn with_credentials(mut self, credentials: Arc<CredentialStore>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Invalidate cached snapshots after role and matrix changes.
    pub fn with_cache(mut self, cache: Arc<SnapshotCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    // ------------------------------------------------------------------
    // Status transitions
    // ------------------------------------------------------------------

    /// Reactivate an inactive user.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn activate_user_as_admin(&self, actor: &AdminActor, user_id: &str) -> AdminResult<UserRecord> {
        self.require_page(actor, pages::ADMIN_USERS, CrudOperation::Update).await?;
        self.transition(actor, user_id, Transition::Activate, None).await
    }

    /// Deactivate a user.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn deactivate_user_as_admin(
        &self,
        actor: &AdminActor,
        user_id: &str,
        reason: Option<&str>,
    ) -> AdminResult<UserRecord> {
        self.require_page(actor, pages::ADMIN_USERS, CrudOperation::Update).await?;
        self.transition(actor, user_id, Transition::Deactivate, reason).await
    }

    /// Ban a user and end their sessions.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn ban_user_as_admin(
        &self,
        actor: &AdminActor,
        user_id: &str,
        reason: Option<&str>,
    ) -> AdminResult<UserRecord> {
        self.require_operation(actor, ops::BAN_USER).await?;
        self.transition(actor, user_id, Transition::Ban, reason).await
    }

    /// Lift a ban.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn unban_user_as_admin(&self, actor: &AdminActor, user_id: &str) -> AdminResult<UserRecord> {
        self.require_operation(actor, ops::UNBAN_USER).await?;
        self.transition(actor, user_id, Transition::Unban, None).await
    }

    /// Soft delete a user and end their sessions.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn delete_user_as_admin(
        &self,
        actor: &AdminActor,
        user_id: &str,
        reason: Option<&str>,
    ) -> AdminResult<UserRecord> {
        self.require_operation(actor, ops::DELETE_USER).await?;
        self.transition(actor, user_id, Transition::Delete, reason).await
    }

    /// Bring a soft-deleted user back to `active`.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn restore_deleted_user(&self, actor: &AdminActor, user_id: &str) -> AdminResult<UserRecord> {
        self.require_operation(actor, ops::DELETE_USER).await?;
        self.transition(actor, user_id, Transition::Restore, None).await
    }

    /// Remove a user record for good.
    ///
    /// Sessions and the stored credential are removed best-effort. Only the
    /// admin audit trail records the deletion.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn permanently_delete_user(
        &self,
        actor: &AdminActor,
        user_id: &str,
        reason: Option<&str>,
    ) -> AdminResult<()> {
        self.require_operation(actor, ops::DELETE_USER).await?;
        let user = self.users.get_user(user_id).await?;
        self.users.remove_user(user_id).await?;

        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_PERMANENT_DELETE_REASON);
        let entry = AdminAuditLog::new(&actor.user_id, AdminAction::Delete, &user.id, &user.email)
            .with_change("action", "permanently_deleted")
            .with_reason(Some(reason));
        self.audit.log_admin_action(entry).await;

        self.end_sessions(user_id).await;
        if let Some(credentials) = &self.credentials {
            if let Err(e) = credentials.delete_credential(user_id).await {
                warn!(user_id = %user_id, error = %e, "Failed to delete credential");
            }
        }
        if let Some(cache) = &self.cache {
            cache.invalidate(user_id).await;
        }

        info!(user_id = %user_id, "User permanently deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Role changes
    // ------------------------------------------------------------------

    /// Assign a different role id to a user.
    #[instrument(skip(self, actor), fields(admin_id = %actor.user_id))]
    pub async fn update_user_role_as_admin(
        &self,
        actor: &AdminActor,
        user_id: &str,
        new_role_id: &str,
    ) -> AdminResult<UserRecord> {
        self.require_operation(actor, ops::CHANGE_ROLE).await?;
        self.change_role(actor, user_id, new_role_id).await
    }

    /// Assign a role by its name (case-insensitive).
    ///
    /// Only names of existing roles are accepted.
    pub async fn update_user_role_by_name(
        &self,
        actor: &AdminActor,
        user_id: &str,
        role_name: &str,
    ) -> AdminResult<UserRecord> {
        self.require_operation(actor, ops::CHANGE_ROLE).await?;
        let role = self
            .registry
            .get_role_by_name(role_name)
            .await
            .ok_or_else(|| AdminError::InvalidRole(role_name.to_string()))?;
        self.change_role(actor, user_id, &role.id).await
    }

    async fn change_role(&self, actor: &AdminActor, user_id: &str, new_role_id: &str) -> AdminResult<UserRecord> {
        let mut user = self.users.get_user(user_id).await?;
        if self.permissions.get_role(new_role_id).await?.is_none() {
            return Err(AdminError::RoleNotFound(new_role_id.to_string()));
        }

        let old_role = std::mem::replace(&mut user.role, new_role_id.to_string());
        user.updated_at = Utc::now();
        self.users.save_user(&user).await?;

        let entry = AdminAuditLog::new(&actor.user_id, AdminAction::UpdateRole, &user.id, &user.email)
            .with_change("oldRole", old_role.as_str())
            .with_change("newRole", new_role_id);
        self.audit.log_admin_action(entry).await;
        self.activity
            .log_activity(
                &user.id,
                ActivityAction::RoleChanged,
                format!("Role changed from {} to {} by admin", old_role, new_role_id),
            )
            .await;

        if let Some(cache) = &self.cache {
            cache.invalidate(user_id).await;
        }
        info!(user_id = %user_id, old_role = %old_role, new_role = %new_role_id, "User role changed");
        Ok(user)
    }

    // ------------------------------------------------------------------
    // Bulk variants
    // ------------------------------------------------------------------

    /// Activate each user independently.
    pub async fn bulk_activate_users(&self, actor: &AdminActor, user_ids: &[String]) -> BulkResult {
        self.bulk(actor, user_ids, BulkAction::Activate).await
    }

    /// Deactivate each user independently.
    pub async fn bulk_deactivate_users(
        &self,
        actor: &AdminActor,
        user_ids: &[String],
        reason: Option<&str>,
    ) -> BulkResult {
        self.bulk(actor, user_ids, BulkAction::Deactivate(reason)).await
    }

    /// Ban each user independently.
    pub async fn bulk_ban_users(&self, actor: &AdminActor, user_ids: &[String], reason: Option<&str>) -> BulkResult {
        self.bulk(actor, user_ids, BulkAction::Ban(reason)).await
    }

    /// Unban each user independently.
    pub async fn bulk_unban_users(&self, actor: &AdminActor, user_ids: &[String]) -> BulkResult {
        self.bulk(actor, user_ids, BulkAction::Unban).await
    }

    /// Soft delete each user independently.
    pub async fn bulk_delete_users(&self, actor: &AdminActor, user_ids: &[String], reason: Option<&str>) -> BulkResult {
        self.bulk(actor, user_ids, BulkAction::Delete(reason)).await
    }

    /// Assign one role id to each user independently.
    pub async fn bulk_update_roles(&self, actor: &AdminActor, user_ids: &[String], new_role_id: &str) -> BulkResult {
        self.bulk(actor, user_ids, BulkAction::UpdateRole(new_role_id)).await
    }

    #[instrument(skip(self, actor, user_ids), fields(admin_id = %actor.user_id, count = user_ids.len()))]
    async fn bulk(&self, actor: &AdminActor, user_ids: &[String], action: BulkAction<'_>) -> BulkResult {
        let mut result = BulkResult::default();
        for user_id in user_ids {
            let outcome = match action {
                BulkAction::Activate => self.activate_user_as_admin(actor, user_id).await,
                BulkAction::Deactivate(reason) => self.deactivate_user_as_admin(actor, user_id, reason).await,
                BulkAction::Ban(reason) => self.ban_user_as_admin(actor, user_id, reason).await,
                BulkAction::Unban => self.unban_user_as_admin(actor, user_id).await,
                BulkAction::Delete(reason) => self.delete_user_as_admin(actor, user_id, reason).await,
                BulkAction::UpdateRole(role_id) => self.update_user_role_as_admin(actor, user_id, role_id).await,
            };
            result.record(user_id, outcome);
        }

        if result.failed > 0 {
            warn!(success = result.success, failed = result.failed, "Bulk action partially failed");
        } else {
            info!(success = result.success, "Bulk action completed");
        }
        result
    }

    // ------------------------------------------------------------------
    // Permission matrix edits
    // ------------------------------------------------------------------

    /// Replace page grants of a role as one atomic batch.
    #[instrument(skip(self, actor, inputs), fields(admin_id = %actor.user_id, count = inputs.len()))]
    pub async fn set_role_page_permissions_as_admin(
        &self,
        actor: &AdminActor,
        role_id: &str,
        inputs: &[PagePermissionInput],
    ) -> AdminResult<()> {
        self.require_operation(actor, ops::MANAGE_PAGE_PERMISSIONS).await?;
        self.require_role(role_id).await?;
        self.permissions.bulk_set_page_permissions(role_id, inputs).await?;
        self.invalidate_role(role_id).await;
        info!(role_id = %role_id, "Role page permissions updated");
        Ok(())
    }

    /// Replace operation grants of a role as one atomic batch.
    #[instrument(skip(self, actor, inputs), fields(admin_id = %actor.user_id, count = inputs.len()))]
    pub async fn set_role_operation_permissions_as_admin(
        &self,
        actor: &AdminActor,
        role_id: &str,
        inputs: &[OperationPermissionInput],
    ) -> AdminResult<()> {
        self.require_operation(actor, ops::MANAGE_OPERATION_PERMISSIONS).await?;
        self.require_role(role_id).await?;
        self.permissions.bulk_set_operation_permissions(role_id, inputs).await?;
        self.invalidate_role(role_id).await;
        info!(role_id = %role_id, "Role operation permissions updated");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn require_operation(&self, actor: &AdminActor, operation: &str) -> AdminResult<()> {
        if self.evaluator.can_perform_operation(&actor.role_id, operation).await {
            Ok(())
        } else {
            warn!(admin_id = %actor.user_id, role_id = %actor.role_id, operation, "Operation denied");
            Err(AdminError::PermissionDenied(operation.to_string()))
        }
    }

    async fn require_page(&self, actor: &AdminActor, page: &str, op: CrudOperation) -> AdminResult<()> {
        if self.evaluator.can_access_page(&actor.role_id, page, &[op]).await {
            Ok(())
        } else {
            warn!(admin_id = %actor.user_id, role_id = %actor.role_id, page, "Page access denied");
            Err(AdminError::PermissionDenied(format!("{} {}", op, page)))
        }
    }

    async fn require_role(&self, role_id: &str) -> AdminResult<()> {
        match self.permissions.get_role(role_id).await? {
            Some(_) => Ok(()),
            None => Err(AdminError::RoleNotFound(role_id.to_string())),
        }
    }

    async fn transition(
        &self,
        actor: &AdminActor,
        user_id: &str,
        transition: Transition,
        reason: Option<&str>,
    ) -> AdminResult<UserRecord> {
        let mut user = self.users.get_user(user_id).await?;
        if !transition.allowed_from(user.status) {
            return Err(match transition {
                Transition::Restore => AdminError::UserNotDeleted(user_id.to_string()),
                _ => AdminError::InvalidTransition {
                    transition: transition.as_str().to_string(),
                    from: user.status,
                },
            });
        }

        user.apply(transition, &actor.user_id, Utc::now());
        self.users.save_user(&user).await?;

        let (action, activity, details) = describe(transition, reason);
        let mut entry = AdminAuditLog::new(&actor.user_id, action, &user.id, &user.email)
            .with_change("status", user.status.as_str())
            .with_reason(reason);
        if transition == Transition::Restore {
            entry = entry.with_change("action", "restored");
        }
        self.audit.log_admin_action(entry).await;
        self.activity.log_activity(&user.id, activity, details).await;

        if !user.status.is_active_flag() {
            self.end_sessions(user_id).await;
        }

        info!(user_id = %user_id, transition = %transition, status = %user.status, "User status changed");
        Ok(user)
    }

    async fn end_sessions(&self, user_id: &str) {
        let Some(sessions) = &self.sessions else {
            return;
        };
        match sessions.terminate_all_user_sessions(user_id, None).await {
            Ok(count) if count > 0 => info!(user_id = %user_id, count, "Sessions terminated"),
            Ok(_) => {}
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to terminate sessions"),
        }
    }

    async fn invalidate_role(&self, role_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate_role(role_id).await;
        }
    }
}

fn describe(transition: Transition, reason: Option<&str>) -> (AdminAction, ActivityAction, String) {
    match transition {
        Transition::Activate => (
            AdminAction::Activate,
            ActivityAction::AccountActivated,
            "Account activated by admin".to_string(),
        ),
        Transition::Deactivate => (
            AdminAction::Deactivate,
            ActivityAction::AccountDeactivated,
            "Account deactivated by admin".to_string(),
        ),
        Transition::Ban => {
            let reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .unwrap_or("No reason provided");
            (
                AdminAction::Ban,
                ActivityAction::AccountBanned,
                format!("Account banned by admin. Reason: {}", reason),
            )
        }
        Transition::Unban => (
            AdminAction::Unban,
            ActivityAction::AccountUnbanned,
            "Account unbanned by admin".to_string(),
        ),
        Transition::Delete => (
            AdminAction::Delete,
            ActivityAction::AccountDeleted,
            "Account deleted by admin".to_string(),
        ),
        Transition::Restore => (
            AdminAction::Activate,
            ActivityAction::AccountRestored,
            "Deleted account restored by admin".to_string(),
        ),
    }
}

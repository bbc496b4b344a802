//! Access evaluator
//!
//! Answers whether a role may perform CRUD operations on a page or a named
//! operation. Decisions are fail-closed: any error while resolving the role
//! or its grants is a denial, logged and never returned to the caller.
//!
//! ## Decision order
//!
//! ```text
//! role missing / store error ─→ deny
//! role name == super role     ─→ allow
//! exact (role, page) row with can_access and every required op ─→ allow
//! otherwise                   ─→ deny
//! ```
//!
//! [`SnapshotCache`] holds one [`PermissionSnapshot`] per acting user for the
//! synchronous checks. An entry is rebuilt when the user's role changes or
//! when it is invalidated; there is no time-based expiry.

use crate::error::AdminResult;
use crate::permission_store::PermissionStore;
use console_org::Role;
use console_rbac::{is_super_role, CrudOperation, PermissionSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Role-based access evaluator.
pub struct AccessEvaluator {
    permissions: Arc<PermissionStore>,
    super_role: String,
}

impl AccessEvaluator {
    /// Create an evaluator.
    ///
    /// # Arguments
    ///
    /// * `permissions` - Store holding roles and their grants
    /// * `super_role` - Role name that bypasses every check (case-insensitive)
    pub fn new(permissions: Arc<PermissionStore>, super_role: impl Into<String>) -> Self {
        Self {
            permissions,
            super_role: super_role.into(),
        }
    }

    /// The configured super role name.
    pub fn super_role(&self) -> &str {
        &self.super_role
    }

    /// The permission store decisions are read from.
    pub fn permissions(&self) -> Arc<PermissionStore> {
        Arc::clone(&self.permissions)
    }

    /// Whether a role entity is the super role.
    pub fn is_super(&self, role: &Role) -> bool {
        is_super_role(&role.name, &self.super_role)
    }

    /// Check whether a role may access a page with the required operations.
    ///
    /// An empty `required` slice is satisfied by page access alone.
    #[instrument(skip(self))]
    pub async fn can_access_page(&self, role_id: &str, page_path: &str, required: &[CrudOperation]) -> bool {
        match self.check_page(role_id, page_path, required).await {
            Ok(allowed) => {
                debug!(allowed, "Page access evaluated");
                allowed
            }
            Err(e) => {
                warn!(error = %e, "Page access check failed, denying");
                false
            }
        }
    }

    /// Check whether a role may perform a named operation.
    ///
    /// Names are matched exactly; unknown names are denied.
    #[instrument(skip(self))]
    pub async fn can_perform_operation(&self, role_id: &str, operation_name: &str) -> bool {
        match self.check_operation(role_id, operation_name).await {
            Ok(allowed) => {
                debug!(allowed, "Operation evaluated");
                allowed
            }
            Err(e) => {
                warn!(error = %e, "Operation check failed, denying");
                false
            }
        }
    }

    /// Load every grant of a role for synchronous checks.
    ///
    /// Returns a deny-all snapshot when the role cannot be resolved.
    pub async fn load_snapshot(&self, role_id: &str) -> PermissionSnapshot {
        self.try_load_snapshot(role_id).await.unwrap_or_else(|e| {
            warn!(role_id = %role_id, error = %e, "Snapshot load failed, denying all");
            PermissionSnapshot::deny_all(role_id)
        })
    }

    pub(crate) async fn try_load_snapshot(&self, role_id: &str) -> AdminResult<PermissionSnapshot> {
        let Some(role) = self.permissions.get_role(role_id).await? else {
            debug!(role_id = %role_id, "Unknown role, denying all");
            return Ok(PermissionSnapshot::deny_all(role_id));
        };

        if self.is_super(&role) {
            return Ok(PermissionSnapshot::from_rows(role_id, true, &[], &[]));
        }

        let pages = self.permissions.get_page_permissions_for_role(role_id).await?;
        let operations = self.permissions.get_operation_permissions_for_role(role_id).await?;
        Ok(PermissionSnapshot::from_rows(role_id, false, &pages, &operations))
    }

    async fn check_page(&self, role_id: &str, page_path: &str, required: &[CrudOperation]) -> AdminResult<bool> {
        let Some(role) = self.permissions.get_role(role_id).await? else {
            return Ok(false);
        };
        if self.is_super(&role) {
            return Ok(true);
        }

        Ok(self
            .permissions
            .get_page_permission(role_id, page_path)
            .await?
            .map(|row| row.allows(required))
            .unwrap_or(false))
    }

    async fn check_operation(&self, role_id: &str, operation_name: &str) -> AdminResult<bool> {
        let Some(role) = self.permissions.get_role(role_id).await? else {
            return Ok(false);
        };
        if self.is_super(&role) {
            return Ok(true);
        }

        Ok(self
            .permissions
            .get_operation_permission(role_id, operation_name)
            .await?
            .map(|row| row.allowed)
            .unwrap_or(false))
    }
}

/// Per-user permission snapshots.
pub struct SnapshotCache {
    evaluator: Arc<AccessEvaluator>,
    /// User id -> snapshot of the role the user held when it was built
    entries: Arc<RwLock<HashMap<String, Arc<PermissionSnapshot>>>>,
}

impl SnapshotCache {
    /// Create an empty cache.
    pub fn new(evaluator: Arc<AccessEvaluator>) -> Self {
        Self {
            evaluator,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The snapshot for a user acting with a role.
    ///
    /// Reloads when the cached entry was built for a different role. Snapshots
    /// built after a store failure deny everything and are not cached.
    pub async fn get_or_load(&self, user_id: &str, role_id: &str) -> Arc<PermissionSnapshot> {
        if let Some(snapshot) = self.entries.read().await.get(user_id) {
            if snapshot.role_id == role_id {
                return snapshot.clone();
            }
        }

        match self.evaluator.try_load_snapshot(role_id).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.entries
                    .write()
                    .await
                    .insert(user_id.to_string(), snapshot.clone());
                debug!(user_id = %user_id, role_id = %role_id, "Snapshot cached");
                snapshot
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Snapshot load failed, denying all");
                self.entries.write().await.remove(user_id);
                Arc::new(PermissionSnapshot::deny_all(role_id))
            }
        }
    }

    /// Drop one user's snapshot.
    pub async fn invalidate(&self, user_id: &str) {
        self.entries.write().await.remove(user_id);
    }

    /// Drop every snapshot built for a role.
    pub async fn invalidate_role(&self, role_id: &str) {
        self.entries.write().await.retain(|_, s| s.role_id != role_id);
    }

    /// Drop everything.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Number of cached snapshots.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

//! Role registry
//!
//! CRUD over role entities. System roles are protected: their name,
//! description and legacy permission list cannot be edited, and they cannot be
//! deleted. Reads are fail-soft; mutations surface typed errors.

use crate::collections;
use crate::config::ConsoleConfig;
use crate::error::{AdminError, AdminResult};
use crate::evaluator::SnapshotCache;
use crate::permission_store::PermissionStore;
use chrono::Utc;
use console_org::{default_catalog, NewRole, Permission, Role, RoleUpdate, SystemRole};
use console_rbac::is_super_role;
use console_store::{DocumentStore, WriteBatch};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Registry of role entities.
pub struct RoleRegistry {
    store: Arc<dyn DocumentStore>,
    permissions: Arc<PermissionStore>,
    config: Arc<ConsoleConfig>,
    cache: Option<Arc<SnapshotCache>>,
}

impl RoleRegistry {
    /// Create a registry.
    pub fn new(store: Arc<dyn DocumentStore>, permissions: Arc<PermissionStore>, config: Arc<ConsoleConfig>) -> Self {
        Self {
            store,
            permissions,
            config,
            cache: None,
        }
    }

    /// Invalidate this cache when roles are deleted.
    pub fn with_cache(mut self, cache: Arc<SnapshotCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Create a custom role.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_role(&self, input: NewRole) -> AdminResult<Role> {
        let name = input.name.trim().to_string();
        self.check_name(&name, None).await?;

        let role = NewRole { name, ..input }.into_role();
        let data = console_store::to_document(&role)?;
        self.store.set(collections::ROLES, &role.id, data).await?;

        info!(role_id = %role.id, "Role created");
        Ok(role)
    }

    /// Get a role by id. Store errors yield `None`.
    pub async fn get_role(&self, role_id: &str) -> Option<Role> {
        self.permissions.get_role(role_id).await.unwrap_or_else(|e| {
            warn!(role_id = %role_id, error = %e, "Failed to get role");
            None
        })
    }

    /// Get a role by name (case-insensitive). Store errors yield `None`.
    pub async fn get_role_by_name(&self, name: &str) -> Option<Role> {
        let wanted = name.trim();
        self.get_all_roles()
            .await
            .into_iter()
            .find(|r| r.name.eq_ignore_ascii_case(wanted))
    }

    /// All roles ordered by name. Store errors yield an empty list.
    pub async fn get_all_roles(&self) -> Vec<Role> {
        match self.load_all_roles().await {
            Ok(roles) => roles,
            Err(e) => {
                warn!(error = %e, "Failed to get roles");
                Vec::new()
            }
        }
    }

    /// Update a custom role.
    ///
    /// Refused for system roles.
    #[instrument(skip(self, update))]
    pub async fn update_role(&self, role_id: &str, update: RoleUpdate) -> AdminResult<Role> {
        let mut role = self.require_custom_role(role_id).await?;

        let update = RoleUpdate {
            name: update.name.map(|n| n.trim().to_string()),
            ..update
        };
        if let Some(ref name) = update.name {
            self.check_name(name, Some(role_id)).await?;
        }
        if update.is_empty() {
            return Ok(role);
        }

        update.apply(&mut role, Utc::now());
        let data = console_store::to_document(&role)?;
        self.store.set(collections::ROLES, &role.id, data).await?;

        info!("Role updated");
        Ok(role)
    }

    /// Replace the legacy permission list of a custom role.
    pub async fn assign_permissions_to_role<I, S>(&self, role_id: &str, permission_ids: I) -> AdminResult<Role>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.update_role(role_id, RoleUpdate::permissions(permission_ids)).await
    }

    /// Delete a custom role.
    ///
    /// With cascade deletion enabled the grants are deleted first, in as many
    /// batches as they need, and the role last; a failure part way leaves the
    /// role in place so the call can be retried. Otherwise grants stay behind
    /// as orphans.
    #[instrument(skip(self))]
    pub async fn delete_role(&self, role_id: &str) -> AdminResult<()> {
        self.require_custom_role(role_id).await?;

        let cascaded = if self.config.cascade_role_deletion {
            self.permissions.delete_role_permissions(role_id).await?
        } else {
            0
        };
        self.store.delete(collections::ROLES, role_id).await?;

        if let Some(cache) = &self.cache {
            cache.invalidate_role(role_id).await;
        }
        info!(cascaded, "Role deleted");
        Ok(())
    }

    /// Resolve a role's legacy permission list to catalog entries.
    ///
    /// Ids missing from the catalog are skipped. Store errors yield an empty list.
    pub async fn get_role_permissions(&self, role_id: &str) -> Vec<Permission> {
        let Some(role) = self.get_role(role_id).await else {
            return Vec::new();
        };

        let mut permissions = Vec::with_capacity(role.permission_ids.len());
        for id in &role.permission_ids {
            match self.store.get(collections::PERMISSIONS, id).await {
                Ok(Some(doc)) => match doc.parse::<Permission>() {
                    Ok(p) => permissions.push(p),
                    Err(e) => warn!(permission_id = %id, error = %e, "Skipping unreadable permission"),
                },
                Ok(None) => {}
                Err(e) => {
                    warn!(role_id = %role_id, error = %e, "Failed to get role permissions");
                    return Vec::new();
                }
            }
        }
        permissions
    }

    /// Seed the permission catalog and the system roles.
    ///
    /// Existing entries are left untouched, so this is safe to call on every
    /// start. Returns the number of documents created.
    #[instrument(skip(self))]
    pub async fn initialize_default_roles(&self) -> AdminResult<usize> {
        let existing_roles: HashSet<String> = self
            .store
            .list(collections::ROLES)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();
        let existing_permissions: HashSet<String> = self
            .store
            .list(collections::PERMISSIONS)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();

        let mut batch = WriteBatch::new();
        for permission in default_catalog() {
            if !existing_permissions.contains(&permission.id) {
                batch.set_entity(collections::PERMISSIONS, permission.id.clone(), &permission)?;
            }
        }
        for system in SystemRole::all() {
            let role = Role::system(system);
            if !existing_roles.contains(&role.id) {
                batch.set_entity(collections::ROLES, role.id.clone(), &role)?;
            }
        }

        let created = batch.len();
        if created > 0 {
            self.store.commit(batch).await?;
        }
        info!(created, "Default roles initialized");
        Ok(created)
    }

    async fn load_all_roles(&self) -> AdminResult<Vec<Role>> {
        let docs = self.store.list(collections::ROLES).await?;
        let mut roles: Vec<Role> = console_store::parse_documents(&docs)?;
        roles.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.id.cmp(&b.id)));
        Ok(roles)
    }

    async fn require_custom_role(&self, role_id: &str) -> AdminResult<Role> {
        let role = self
            .permissions
            .get_role(role_id)
            .await?
            .ok_or_else(|| AdminError::RoleNotFound(role_id.to_string()))?;
        if role.is_system_role {
            warn!(role_id = %role_id, "Refusing to modify system role");
            return Err(AdminError::SystemRoleProtected(role.name));
        }
        Ok(role)
    }

    async fn check_name(&self, name: &str, exclude_id: Option<&str>) -> AdminResult<()> {
        if name.is_empty() {
            return Err(AdminError::Validation("role name must not be empty".to_string()));
        }
        if is_super_role(name, &self.config.super_role_name) {
            return Err(AdminError::ReservedRoleName(name.to_string()));
        }
        if self.config.unique_role_names {
            let taken = self
                .load_all_roles()
                .await?
                .iter()
                .any(|r| Some(r.id.as_str()) != exclude_id && r.name.eq_ignore_ascii_case(name));
            if taken {
                return Err(AdminError::DuplicateRoleName(name.to_string()));
            }
        }
        Ok(())
    }
}

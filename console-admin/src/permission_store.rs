//! Permission store
//!
//! Persistent mapping of role to page grants and named-operation grants.
//! Rows use deterministic ids so each (role, page) and (role, operation) pair
//! has exactly one document; writes are merge-upserts and the last write wins.
//!
//! Bulk writes go through a single [`WriteBatch`] so a role's matrix is never
//! observed half-applied by a later read.

use crate::collections;
use crate::error::{AdminError, AdminResult};
use console_org::Role;
use console_rbac::{
    pages, OperationPermission, OperationPermissionInput, PagePermission, PagePermissionInput, RolePermissionMatrix,
};
use console_store::{DocumentStore, Filter, WriteBatch, MAX_BATCH_OPERATIONS};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Permission rows whose role no longer exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrphanedPermissions {
    /// Orphaned page rows.
    pub page_permissions: Vec<PagePermission>,
    /// Orphaned operation rows.
    pub operation_permissions: Vec<OperationPermission>,
}

impl OrphanedPermissions {
    /// Total number of orphaned rows.
    pub fn len(&self) -> usize {
        self.page_permissions.len() + self.operation_permissions.len()
    }

    /// Whether nothing is orphaned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Unknown names are stored anyway; nothing in the console checks them.
fn warn_unknown_operation(name: &str) {
    if !pages::is_known_operation(name) {
        warn!(operation = %name, "Granting an operation the console never checks");
    }
}

/// Store for page and operation grants.
pub struct PermissionStore {
    store: Arc<dyn DocumentStore>,
}

impl PermissionStore {
    /// Create a permission store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read a role entity, propagating store errors.
    pub async fn get_role(&self, role_id: &str) -> AdminResult<Option<Role>> {
        match self.store.get(collections::ROLES, role_id).await? {
            Some(doc) => Ok(Some(doc.parse()?)),
            None => Ok(None),
        }
    }

    /// The page row for one (role, page) pair.
    pub async fn get_page_permission(&self, role_id: &str, page_path: &str) -> AdminResult<Option<PagePermission>> {
        let id = PagePermission::row_id(role_id, page_path);
        let Some(doc) = self.store.get(collections::PAGE_PERMISSIONS, &id).await? else {
            return Ok(None);
        };
        let row: PagePermission = doc.parse()?;
        Ok(Some(row).filter(|r| r.role_id == role_id && r.page_path == page_path))
    }

    /// The operation row for one (role, operation) pair.
    pub async fn get_operation_permission(
        &self,
        role_id: &str,
        operation_name: &str,
    ) -> AdminResult<Option<OperationPermission>> {
        let id = OperationPermission::row_id(role_id, operation_name);
        let Some(doc) = self.store.get(collections::OPERATION_PERMISSIONS, &id).await? else {
            return Ok(None);
        };
        let row: OperationPermission = doc.parse()?;
        Ok(Some(row).filter(|r| r.role_id == role_id && r.operation_name == operation_name))
    }

    /// All page rows of a role, ordered by row id.
    pub async fn get_page_permissions_for_role(&self, role_id: &str) -> AdminResult<Vec<PagePermission>> {
        let docs = self
            .store
            .query(collections::PAGE_PERMISSIONS, &[Filter::eq("role_id", role_id)])
            .await?;
        Ok(console_store::parse_documents(&docs)?)
    }

    /// All operation rows of a role, ordered by row id.
    pub async fn get_operation_permissions_for_role(&self, role_id: &str) -> AdminResult<Vec<OperationPermission>> {
        let docs = self
            .store
            .query(collections::OPERATION_PERMISSIONS, &[Filter::eq("role_id", role_id)])
            .await?;
        Ok(console_store::parse_documents(&docs)?)
    }

    /// Upsert one page row, recomputing `can_access`.
    #[instrument(skip(self, input), fields(page_path = %input.page_path))]
    pub async fn set_page_permission(&self, role_id: &str, input: &PagePermissionInput) -> AdminResult<PagePermission> {
        let row = input.to_row(role_id);
        let data = console_store::to_document(&row)?;
        self.store.merge(collections::PAGE_PERMISSIONS, &row.id, data).await?;
        debug!(can_access = row.can_access, "Page permission set");
        Ok(row)
    }

    /// Upsert one operation row.
    #[instrument(skip(self, input), fields(operation = %input.operation_name))]
    pub async fn set_operation_permission(
        &self,
        role_id: &str,
        input: &OperationPermissionInput,
    ) -> AdminResult<OperationPermission> {
        warn_unknown_operation(&input.operation_name);
        let row = input.to_row(role_id);
        let data = console_store::to_document(&row)?;
        self.store.merge(collections::OPERATION_PERMISSIONS, &row.id, data).await?;
        debug!(allowed = row.allowed, "Operation permission set");
        Ok(row)
    }

    /// Upsert many page rows of one role as a single atomic batch.
    ///
    /// Later entries for the same page override earlier ones. More entries
    /// than one batch can carry are refused rather than split.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn bulk_set_page_permissions(&self, role_id: &str, inputs: &[PagePermissionInput]) -> AdminResult<()> {
        let mut batch = WriteBatch::new();
        for input in inputs {
            let row = input.to_row(role_id);
            let id = row.id.clone();
            batch.merge_entity(collections::PAGE_PERMISSIONS, id, &row)?;
        }
        self.store.commit(batch).await?;
        info!("Page permissions updated");
        Ok(())
    }

    /// Upsert many operation rows of one role as a single atomic batch.
    #[instrument(skip(self, inputs), fields(count = inputs.len()))]
    pub async fn bulk_set_operation_permissions(
        &self,
        role_id: &str,
        inputs: &[OperationPermissionInput],
    ) -> AdminResult<()> {
        let mut batch = WriteBatch::new();
        for input in inputs {
            warn_unknown_operation(&input.operation_name);
            let row = input.to_row(role_id);
            let id = row.id.clone();
            batch.merge_entity(collections::OPERATION_PERMISSIONS, id, &row)?;
        }
        self.store.commit(batch).await?;
        info!("Operation permissions updated");
        Ok(())
    }

    /// Join a role's page and operation rows into its matrix.
    pub async fn get_role_permission_matrix(&self, role_id: &str) -> AdminResult<RolePermissionMatrix> {
        let role = self
            .get_role(role_id)
            .await?
            .ok_or_else(|| AdminError::RoleNotFound(role_id.to_string()))?;
        let pages = self.get_page_permissions_for_role(role_id).await?;
        let operations = self.get_operation_permissions_for_role(role_id).await?;
        Ok(RolePermissionMatrix::from_rows(role_id, role.name, &pages, &operations))
    }

    /// Delete every row of a role. Returns the number deleted.
    ///
    /// Rows go in batches of at most [`MAX_BATCH_OPERATIONS`], so a role with
    /// any number of grants can be cleared.
    #[instrument(skip(self))]
    pub async fn delete_role_permissions(&self, role_id: &str) -> AdminResult<usize> {
        let pages = self.get_page_permissions_for_role(role_id).await?;
        let operations = self.get_operation_permissions_for_role(role_id).await?;
        let rows: Vec<(&str, &str)> = pages
            .iter()
            .map(|r| (collections::PAGE_PERMISSIONS, r.id.as_str()))
            .chain(operations.iter().map(|r| (collections::OPERATION_PERMISSIONS, r.id.as_str())))
            .collect();

        self.delete_rows(&rows).await?;
        if !rows.is_empty() {
            info!(count = rows.len(), "Role permissions deleted");
        }
        Ok(rows.len())
    }

    /// Find rows whose role no longer exists.
    pub async fn find_orphaned_permissions(&self) -> AdminResult<OrphanedPermissions> {
        let role_ids: HashSet<String> = self
            .store
            .list(collections::ROLES)
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect();

        let pages: Vec<PagePermission> =
            console_store::parse_documents(&self.store.list(collections::PAGE_PERMISSIONS).await?)?;
        let operations: Vec<OperationPermission> =
            console_store::parse_documents(&self.store.list(collections::OPERATION_PERMISSIONS).await?)?;

        Ok(OrphanedPermissions {
            page_permissions: pages.into_iter().filter(|r| !role_ids.contains(&r.role_id)).collect(),
            operation_permissions: operations
                .into_iter()
                .filter(|r| !role_ids.contains(&r.role_id))
                .collect(),
        })
    }

    /// Delete every orphaned row. Returns the number deleted.
    ///
    /// Orphans grant nothing reachable, so deleting them in several batches
    /// is safe.
    #[instrument(skip(self))]
    pub async fn reconcile_orphaned_permissions(&self) -> AdminResult<usize> {
        let orphans = self.find_orphaned_permissions().await?;
        let deletes: Vec<(&str, &str)> = orphans
            .page_permissions
            .iter()
            .map(|r| (collections::PAGE_PERMISSIONS, r.id.as_str()))
            .chain(
                orphans
                    .operation_permissions
                    .iter()
                    .map(|r| (collections::OPERATION_PERMISSIONS, r.id.as_str())),
            )
            .collect();

        self.delete_rows(&deletes).await?;
        if !deletes.is_empty() {
            info!(count = deletes.len(), "Orphaned permissions removed");
        }
        Ok(deletes.len())
    }

    async fn delete_rows(&self, rows: &[(&str, &str)]) -> AdminResult<()> {
        for chunk in rows.chunks(MAX_BATCH_OPERATIONS) {
            let mut batch = WriteBatch::new();
            for (collection, id) in chunk {
                batch.delete(*collection, *id);
            }
            self.store.commit(batch).await?;
        }
        Ok(())
    }
}

//! Permission catalog service
//!
//! CRUD over descriptive catalog entries. The catalog is display metadata;
//! deleting an entry never touches page or operation grants.

use crate::collections;
use crate::error::{AdminError, AdminResult};
use chrono::Utc;
use console_org::{NewPermission, Permission, PermissionCategory, PermissionUpdate};
use console_store::{DocumentStore, Filter};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Catalog of descriptive permissions.
pub struct PermissionCatalog {
    store: Arc<dyn DocumentStore>,
}

impl PermissionCatalog {
    /// Create a catalog service.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a catalog entry.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_permission(&self, input: NewPermission) -> AdminResult<Permission> {
        if input.name.trim().is_empty() {
            return Err(AdminError::Validation("permission name must not be empty".to_string()));
        }

        let permission = input.into_permission();
        let data = console_store::to_document(&permission)?;
        self.store.set(collections::PERMISSIONS, &permission.id, data).await?;

        info!(permission_id = %permission.id, "Permission created");
        Ok(permission)
    }

    /// Get an entry by id. Store errors yield `None`.
    pub async fn get_permission(&self, permission_id: &str) -> Option<Permission> {
        match self.load(permission_id).await {
            Ok(permission) => permission,
            Err(e) => {
                warn!(permission_id = %permission_id, error = %e, "Failed to get permission");
                None
            }
        }
    }

    /// All entries ordered by category then name. Store errors yield an empty list.
    pub async fn get_all_permissions(&self) -> Vec<Permission> {
        let result = async {
            let docs = self.store.list(collections::PERMISSIONS).await?;
            Ok::<_, AdminError>(console_store::parse_documents::<Permission>(&docs)?)
        }
        .await;

        match result {
            Ok(mut permissions) => {
                sort_permissions(&mut permissions);
                permissions
            }
            Err(e) => {
                warn!(error = %e, "Failed to get permissions");
                Vec::new()
            }
        }
    }

    /// Entries filed under one category. Store errors yield an empty list.
    pub async fn get_permissions_by_category(&self, category: PermissionCategory) -> Vec<Permission> {
        let filter = Filter::eq("category", category.as_str());
        let result = async {
            let docs = self.store.query(collections::PERMISSIONS, &[filter]).await?;
            Ok::<_, AdminError>(console_store::parse_documents::<Permission>(&docs)?)
        }
        .await;

        match result {
            Ok(mut permissions) => {
                sort_permissions(&mut permissions);
                permissions
            }
            Err(e) => {
                warn!(category = category.as_str(), error = %e, "Failed to get permissions by category");
                Vec::new()
            }
        }
    }

    /// Edit an entry.
    #[instrument(skip(self, update))]
    pub async fn update_permission(&self, permission_id: &str, update: PermissionUpdate) -> AdminResult<Permission> {
        let mut permission = self
            .load(permission_id)
            .await?
            .ok_or_else(|| AdminError::PermissionNotFound(permission_id.to_string()))?;

        if let Some(ref name) = update.name {
            if name.trim().is_empty() {
                return Err(AdminError::Validation("permission name must not be empty".to_string()));
            }
        }
        if update.is_empty() {
            return Ok(permission);
        }

        update.apply(&mut permission, Utc::now());
        let data = console_store::to_document(&permission)?;
        self.store.set(collections::PERMISSIONS, permission_id, data).await?;

        info!("Permission updated");
        Ok(permission)
    }

    /// Delete an entry. Grants referencing the same name are unaffected.
    #[instrument(skip(self))]
    pub async fn delete_permission(&self, permission_id: &str) -> AdminResult<()> {
        if self.load(permission_id).await?.is_none() {
            return Err(AdminError::PermissionNotFound(permission_id.to_string()));
        }
        self.store.delete(collections::PERMISSIONS, permission_id).await?;

        info!("Permission deleted");
        Ok(())
    }

    async fn load(&self, permission_id: &str) -> AdminResult<Option<Permission>> {
        match self.store.get(collections::PERMISSIONS, permission_id).await? {
            Some(doc) => Ok(Some(doc.parse()?)),
            None => Ok(None),
        }
    }
}

fn sort_permissions(permissions: &mut [Permission]) {
    permissions.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission_store::PermissionStore;
    use console_rbac::{ops, OperationPermissionInput};
    use console_store::MemoryDocumentStore;

    fn catalog() -> (Arc<MemoryDocumentStore>, PermissionCatalog) {
        let store = Arc::new(MemoryDocumentStore::new());
        (store.clone(), PermissionCatalog::new(store))
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let (_, catalog) = catalog();
        let export = catalog
            .create_permission(NewPermission::new("Export Users", "", PermissionCategory::Users))
            .await
            .unwrap();
        catalog
            .create_permission(NewPermission::new("View Reports", "", PermissionCategory::Analytics))
            .await
            .unwrap();

        assert_eq!(catalog.get_permission(&export.id).await, Some(export.clone()));
        assert_eq!(catalog.get_all_permissions().await.len(), 2);

        let users = catalog.get_permissions_by_category(PermissionCategory::Users).await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, export.id);
        assert!(catalog.get_permissions_by_category(PermissionCategory::System).await.is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_, catalog) = catalog();
        let perm = catalog
            .create_permission(NewPermission::new("Export", "", PermissionCategory::Users))
            .await
            .unwrap();

        let updated = catalog
            .update_permission(
                &perm.id,
                PermissionUpdate {
                    category: Some(PermissionCategory::System),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.category, PermissionCategory::System);
        assert_eq!(updated.name, "Export");

        catalog.delete_permission(&perm.id).await.unwrap();
        assert!(catalog.get_permission(&perm.id).await.is_none());
        assert!(matches!(
            catalog.delete_permission(&perm.id).await,
            Err(AdminError::PermissionNotFound(_))
        ));
        assert!(matches!(
            catalog.update_permission(&perm.id, PermissionUpdate::default()).await,
            Err(AdminError::PermissionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_does_not_touch_grants() {
        let (store, catalog) = catalog();
        let permissions = PermissionStore::new(store.clone());
        permissions
            .set_operation_permission("moderator", &OperationPermissionInput::new(ops::BAN_USER, true))
            .await
            .unwrap();

        let perm = catalog
            .create_permission(NewPermission::new(ops::BAN_USER, "", PermissionCategory::Users))
            .await
            .unwrap();
        catalog.delete_permission(&perm.id).await.unwrap();

        let grant = permissions
            .get_operation_permission("moderator", ops::BAN_USER)
            .await
            .unwrap();
        assert!(grant.map(|g| g.allowed).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_rejects_empty_name() {
        let (_, catalog) = catalog();
        assert!(matches!(
            catalog
                .create_permission(NewPermission::new(" ", "", PermissionCategory::Users))
                .await,
            Err(AdminError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_fail_soft() {
        let (store, catalog) = catalog();
        store.set_unavailable(collections::PERMISSIONS, true).await;
        assert!(catalog.get_all_permissions().await.is_empty());
        assert!(catalog.get_permissions_by_category(PermissionCategory::Users).await.is_empty());
        assert!(catalog.get_permission("view_dashboard").await.is_none());
    }
}

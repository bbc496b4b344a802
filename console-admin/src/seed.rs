//! First-run bootstrap
//!
//! Creates the initial administrator together with the admin role and its
//! full grant matrix, all in one batch.

use crate::collections;
use crate::error::{AdminError, AdminResult};
use console_auth::{PasswordCredential, PasswordHasher};
use console_org::{Role, SystemRole, UserRecord};
use console_rbac::{ops, pages, CrudOperation, OperationPermissionInput, PagePermissionInput};
use console_store::{DocumentStore, Filter, WriteBatch};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Seeds the first administrator.
pub struct Bootstrap {
    store: Arc<dyn DocumentStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl Bootstrap {
    /// Create a bootstrapper.
    pub fn new(store: Arc<dyn DocumentStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// Whether a user holding the admin role exists.
    pub async fn admin_exists(&self) -> AdminResult<bool> {
        let admins = self
            .store
            .query(collections::USERS, &[Filter::eq("role", SystemRole::Admin.as_str())])
            .await?;
        Ok(!admins.is_empty())
    }

    /// Create the initial administrator.
    ///
    /// Refused once any admin user exists. The admin role, full CRUD on every
    /// console page, every named operation, the user record and its password
    /// credential are written in one batch.
    #[instrument(skip(self, password, name))]
    pub async fn setup_initial_admin(&self, email: &str, password: &str, name: &str) -> AdminResult<UserRecord> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AdminError::Validation("email must not be empty".to_string()));
        }
        if password.is_empty() {
            return Err(AdminError::Validation("password must not be empty".to_string()));
        }
        if self.admin_exists().await? {
            warn!("Initial admin setup refused, an administrator already exists");
            return Err(AdminError::Validation("an administrator already exists".to_string()));
        }

        let role_id = SystemRole::Admin.as_str();
        let name = match name.trim() {
            "" => email,
            n => n,
        };
        let user = UserRecord::new(email, name, role_id);
        let credential = PasswordCredential::new(&user.id, password, self.hasher.as_ref())?;

        let mut batch = WriteBatch::new();
        if self.store.get(collections::ROLES, role_id).await?.is_none() {
            batch.set_entity(collections::ROLES, role_id, &Role::system(SystemRole::Admin))?;
        }
        for page in pages::CONSOLE_PAGES {
            let row = PagePermissionInput::new(*page, CrudOperation::all()).to_row(role_id);
            batch.merge_entity(collections::PAGE_PERMISSIONS, row.id.clone(), &row)?;
        }
        for operation in ops::ALL {
            let row = OperationPermissionInput::new(*operation, true).to_row(role_id);
            batch.merge_entity(collections::OPERATION_PERMISSIONS, row.id.clone(), &row)?;
        }
        batch.set_entity(collections::USERS, user.id.clone(), &user)?;
        batch.set_entity(collections::CREDENTIALS, user.id.clone(), &credential)?;
        self.store.commit(batch).await?;

        info!(user_id = %user.id, "Initial administrator created");
        Ok(user)
    }
}

//! Service wiring
//!
//! [`AdminConsole`] builds every console service over one document store and
//! one configuration, sharing the permission store and the snapshot cache.

use crate::actions::AdminService;
use crate::audit::{ActivityLog, AuditLog};
use crate::catalog::PermissionCatalog;
use crate::config::{ConfigError, ConsoleConfig};
use crate::error::AdminResult;
use crate::evaluator::{AccessEvaluator, SnapshotCache};
use crate::identity::IdentityResolver;
use crate::permission_store::PermissionStore;
use crate::registry::RoleRegistry;
use crate::seed::Bootstrap;
use crate::users::UserDirectory;
use console_auth::{Argon2PasswordHasher, CredentialStore, PasswordHasher, SessionDirectory};
use console_store::DocumentStore;
use std::sync::Arc;
use tracing::info;

/// Every console service, wired together.
pub struct AdminConsole {
    /// Active configuration.
    pub config: Arc<ConsoleConfig>,
    /// Page and operation grants.
    pub permissions: Arc<PermissionStore>,
    /// Access decisions.
    pub evaluator: Arc<AccessEvaluator>,
    /// Per-user permission snapshots.
    pub cache: Arc<SnapshotCache>,
    /// Role CRUD.
    pub registry: Arc<RoleRegistry>,
    /// Permission catalog CRUD.
    pub catalog: Arc<PermissionCatalog>,
    /// User records and admin reads.
    pub users: Arc<UserDirectory>,
    /// Admin audit trail.
    pub audit: Arc<AuditLog>,
    /// Per-user activity history.
    pub activity: Arc<ActivityLog>,
    /// Session directory.
    pub sessions: Arc<SessionDirectory>,
    /// Password credentials.
    pub credentials: Arc<CredentialStore>,
    /// Admin mutations.
    pub admin: Arc<AdminService>,
    /// Token to acting identity.
    pub identity: Arc<IdentityResolver>,
    /// First-run seeding.
    pub bootstrap: Arc<Bootstrap>,
}

impl AdminConsole {
    /// Build the services after validating `config`.
    pub fn new(store: Arc<dyn DocumentStore>, config: ConsoleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let session_ttl = chrono::Duration::from_std(config.session_ttl()).map_err(|e| ConfigError::InvalidValue {
            key: "CONSOLE_SESSION_TTL_SECS".to_string(),
            message: e.to_string(),
        })?;
        let config = Arc::new(config);

        let hasher: Arc<dyn PasswordHasher> = match config.password_key.as_deref() {
            Some(key) => Arc::new(Argon2PasswordHasher::with_secret(key)),
            None => Arc::new(Argon2PasswordHasher::new()),
        };

        let permissions = Arc::new(PermissionStore::new(store.clone()));
        let evaluator = Arc::new(AccessEvaluator::new(permissions.clone(), config.super_role_name.clone()));
        let cache = Arc::new(SnapshotCache::new(evaluator.clone()));
        let registry = Arc::new(
            RoleRegistry::new(store.clone(), permissions.clone(), config.clone()).with_cache(cache.clone()),
        );
        let catalog = Arc::new(PermissionCatalog::new(store.clone()));
        let users = Arc::new(UserDirectory::new(store.clone()));
        let audit = Arc::new(
            AuditLog::new(store.clone(), config.default_audit_limit).with_retention(config.audit_retention),
        );
        let activity = Arc::new(ActivityLog::new(store.clone()));
        let sessions = Arc::new(SessionDirectory::with_ttl(store.clone(), session_ttl));
        let credentials = Arc::new(CredentialStore::new(store.clone(), hasher.clone()));

        let admin = Arc::new(
            AdminService::new(
                users.clone(),
                registry.clone(),
                evaluator.clone(),
                audit.clone(),
                activity.clone(),
            )
            .with_sessions(sessions.clone())
            .with_credentials(credentials.clone())
            .with_cache(cache.clone()),
        );
        let identity = Arc::new(IdentityResolver::new(sessions.clone(), users.clone(), cache.clone()));
        let bootstrap = Arc::new(Bootstrap::new(store, hasher));

        Ok(Self {
            config,
            permissions,
            evaluator,
            cache,
            registry,
            catalog,
            users,
            audit,
            activity,
            sessions,
            credentials,
            admin,
            identity,
            bootstrap,
        })
    }

    /// Seed the permission catalog and system roles.
    pub async fn initialize(&self) -> AdminResult<usize> {
        let created = self.registry.initialize_default_roles().await?;
        info!(created, super_role = %self.config.super_role_name, "Admin console initialized");
        Ok(created)
    }
}

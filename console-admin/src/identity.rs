//! Identity resolution
//!
//! Turns a session token into the acting identity the console authorizes
//! against. The user id returned by the session directory is trusted as is;
//! credentials are not re-verified here.

use crate::actions::AdminActor;
use crate::error::AdminResult;
use crate::evaluator::SnapshotCache;
use crate::users::UserDirectory;
use chrono::{DateTime, Utc};
use console_auth::SessionResolver;
use console_rbac::PermissionSnapshot;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// An authenticated user with the permissions of their current role.
#[derive(Debug, Clone)]
pub struct ActingIdentity {
    /// User id.
    pub user_id: String,
    /// Email address.
    pub email: String,
    /// Role id the user currently holds.
    pub role_id: String,
    /// When the session backing this identity expires.
    pub expires_at: DateTime<Utc>,
    /// Grants of the role, for synchronous checks.
    pub snapshot: Arc<PermissionSnapshot>,
}

impl ActingIdentity {
    /// The identity as an actor for admin actions.
    pub fn actor(&self) -> AdminActor {
        AdminActor::new(&self.user_id, &self.role_id)
    }
}

/// Resolves session tokens to acting identities.
pub struct IdentityResolver {
    sessions: Arc<dyn SessionResolver>,
    users: Arc<UserDirectory>,
    cache: Arc<SnapshotCache>,
}

impl IdentityResolver {
    /// Create a resolver.
    pub fn new(sessions: Arc<dyn SessionResolver>, users: Arc<UserDirectory>, cache: Arc<SnapshotCache>) -> Self {
        Self { sessions, users, cache }
    }

    /// Resolve a token.
    ///
    /// Returns `None` for unknown or expired sessions, for sessions whose user
    /// no longer exists, and for banned or deleted users.
    #[instrument(skip(self, token))]
    pub async fn resolve(&self, token: &str) -> AdminResult<Option<ActingIdentity>> {
        let Some(session) = self.sessions.resolve_session(token).await? else {
            debug!("No live session for token");
            return Ok(None);
        };

        let Some(user) = self.users.find_user(&session.user_id).await? else {
            warn!(user_id = %session.user_id, "Session refers to a missing user");
            return Ok(None);
        };
        if !user.status.is_active_flag() {
            debug!(user_id = %user.id, status = %user.status, "User is locked out");
            return Ok(None);
        }

        let snapshot = self.cache.get_or_load(&user.id, &user.role).await;
        Ok(Some(ActingIdentity {
            user_id: user.id,
            email: user.email,
            role_id: user.role,
            expires_at: session.expires_at,
            snapshot,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections;
    use crate::evaluator::AccessEvaluator;
    use crate::permission_store::PermissionStore;
    use console_auth::{NewSession, SessionDirectory};
    use console_org::{Role, SystemRole, UserRecord, UserStatus};
    use console_rbac::{pages, CrudOperation, PagePermissionInput};
    use console_store::{DocumentStore, MemoryDocumentStore};

    struct Setup {
        store: Arc<MemoryDocumentStore>,
        sessions: Arc<SessionDirectory>,
        users: Arc<UserDirectory>,
        permissions: Arc<PermissionStore>,
        resolver: IdentityResolver,
    }

    fn setup() -> Setup {
        let store = Arc::new(MemoryDocumentStore::new());
        let sessions = Arc::new(SessionDirectory::new(store.clone()));
        let users = Arc::new(UserDirectory::new(store.clone()));
        let permissions = Arc::new(PermissionStore::new(store.clone()));
        let evaluator = Arc::new(AccessEvaluator::new(permissions.clone(), "super_admin"));
        let cache = Arc::new(SnapshotCache::new(evaluator));
        let resolver = IdentityResolver::new(sessions.clone(), users.clone(), cache);
        Setup {
            store,
            sessions,
            users,
            permissions,
            resolver,
        }
    }

    #[tokio::test]
    async fn test_resolves_live_session() {
        let s = setup();
        let user = s
            .users
            .create_user(UserRecord::new("ada@example.com", "Ada", "missing-role"))
            .await
            .unwrap();
        let issued = s
            .sessions
            .create_session(NewSession::new(&user.id, &user.email))
            .await
            .unwrap();

        let identity = s.resolver.resolve(&issued.token).await.unwrap().unwrap();
        assert_eq!(identity.user_id, user.id);
        assert_eq!(identity.role_id, "missing-role");
        assert_eq!(identity.actor(), AdminActor::new(&user.id, "missing-role"));
        assert!(!identity.snapshot.has_page_access(pages::ADMIN));

        assert!(s.resolver.resolve("not-a-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_carries_role_grants() {
        let s = setup();
        let role = Role::system(SystemRole::User);
        s.store
            .set(collections::ROLES, &role.id, console_store::to_document(&role).unwrap())
            .await
            .unwrap();
        s.permissions
            .set_page_permission("user", &PagePermissionInput::new(pages::PROFILE, [CrudOperation::Read]))
            .await
            .unwrap();

        let user = s
            .users
            .create_user(UserRecord::new("ada@example.com", "Ada", "user"))
            .await
            .unwrap();
        let issued = s
            .sessions
            .create_session(NewSession::new(&user.id, &user.email))
            .await
            .unwrap();

        let identity = s.resolver.resolve(&issued.token).await.unwrap().unwrap();
        assert!(identity.snapshot.can_read(pages::PROFILE));
        assert!(!identity.snapshot.can_update(pages::PROFILE));
    }

    #[tokio::test]
    async fn test_locked_out_users_do_not_resolve() {
        let s = setup();
        let banned = s
            .users
            .create_user(UserRecord::new("b@example.com", "B", "user").with_status(UserStatus::Banned))
            .await
            .unwrap();
        let issued = s
            .sessions
            .create_session(NewSession::new(&banned.id, &banned.email))
            .await
            .unwrap();
        assert!(s.resolver.resolve(&issued.token).await.unwrap().is_none());

        let orphan = s
            .sessions
            .create_session(NewSession::new("ghost", "ghost@example.com"))
            .await
            .unwrap();
        assert!(s.resolver.resolve(&orphan.token).await.unwrap().is_none());
    }
}

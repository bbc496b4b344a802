//! Session directory
//!
//! Maps opaque bearer tokens to user ids with an expiry. Tokens are random
//! and only their SHA-256 digest is stored, as the session id.
//!
//! ## Lifecycle
//!
//! ```text
//! create_session ─→ active ─┬─ expires_at passes ─→ deactivated on next read / sweep
//!                           └─ terminate_*        ─→ inactive
//! ```

use crate::error::{AuthError, AuthResult};
use async_trait::async_trait;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use console_store::{DocumentStore, Filter, StoreError, WriteBatch, MAX_BATCH_OPERATIONS};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Collection holding session documents.
pub const SESSIONS_COLLECTION: &str = "sessions";

/// Default session lifetime (24 hours).
pub const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;

/// A stored session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Session id (digest of the bearer token).
    pub id: String,
    /// User the session belongs to.
    pub user_id: String,
    /// User email at sign-in.
    pub user_email: String,
    /// User display name at sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session stops resolving.
    pub expires_at: DateTime<Utc>,
    /// Last recorded activity.
    pub last_activity_at: DateTime<Utc>,
    /// Client address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client user agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Whether the session is still usable.
    pub is_active: bool,
}

impl Session {
    /// Check if the session has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input for creating a session.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    /// User id.
    pub user_id: String,
    /// User email.
    pub user_email: String,
    /// User display name.
    pub user_name: Option<String>,
    /// Client address.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Lifetime override.
    pub ttl: Option<Duration>,
}

impl NewSession {
    /// Create the input for a user.
    pub fn new(user_id: impl Into<String>, user_email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_email: user_email.into(),
            ..Default::default()
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    /// Set client details.
    pub fn with_client(mut self, ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Override the directory's session lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A newly created session and its bearer token.
///
/// The token is only available here; the directory keeps its digest.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Bearer token to hand to the client.
    pub token: String,
    /// Stored session.
    pub session: Session,
}

/// What a valid token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSession {
    /// Session id.
    pub session_id: String,
    /// Acting user id.
    pub user_id: String,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

/// Session counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Sessions flagged active.
    pub total: usize,
    /// Active and not yet expired.
    pub active: usize,
    /// Flagged active but past expiry.
    pub expired: usize,
}

/// Token to session resolution.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolve a bearer token. Unknown, terminated and expired tokens yield `None`.
    async fn resolve_session(&self, token: &str) -> AuthResult<Option<ResolvedSession>>;
}

/// Session directory over a document store.
pub struct SessionDirectory {
    store: Arc<dyn DocumentStore>,
    ttl: Duration,
}

impl SessionDirectory {
    /// Create a directory with the default lifetime.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_ttl(store, Duration::seconds(DEFAULT_SESSION_TTL_SECS))
    }

    /// Create a directory with a custom lifetime.
    pub fn with_ttl(store: Arc<dyn DocumentStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Generate a random bearer token.
    fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Session id for a bearer token.
    pub fn session_id_for(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Create a session and issue its token.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn create_session(&self, input: NewSession) -> AuthResult<IssuedSession> {
        let token = Self::generate_token();
        let now = Utc::now();
        let session = Session {
            id: Self::session_id_for(&token),
            user_id: input.user_id,
            user_email: input.user_email,
            user_name: input.user_name,
            created_at: now,
            expires_at: now + input.ttl.unwrap_or(self.ttl),
            last_activity_at: now,
            ip_address: input.ip_address,
            user_agent: input.user_agent,
            is_active: true,
        };

        let data = console_store::to_document(&session)?;
        self.store.set(SESSIONS_COLLECTION, &session.id, data).await?;
        info!(session_id = %session.id, "Session created");

        Ok(IssuedSession { token, session })
    }

    /// Get session details by id.
    pub async fn get_session(&self, session_id: &str) -> AuthResult<Option<Session>> {
        match self.store.get(SESSIONS_COLLECTION, session_id).await? {
            Some(doc) => Ok(Some(doc.parse()?)),
            None => Ok(None),
        }
    }

    /// Active sessions of a user, newest first.
    ///
    /// Store errors yield an empty list.
    pub async fn get_user_sessions(&self, user_id: &str) -> Vec<Session> {
        let filters = [Filter::eq("user_id", user_id), Filter::eq("is_active", true)];
        self.query_sessions(&filters).await.unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "Failed to get user sessions");
            Vec::new()
        })
    }

    /// All active sessions, newest first.
    ///
    /// Store errors yield an empty list.
    pub async fn get_all_active_sessions(&self) -> Vec<Session> {
        self.query_sessions(&[Filter::eq("is_active", true)])
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to get active sessions");
                Vec::new()
            })
    }

    /// Record activity on a session.
    ///
    /// Terminated sessions fail with [`AuthError::SessionInvalidated`] and
    /// expired ones with [`AuthError::SessionExpired`].
    pub async fn touch_session(&self, session_id: &str) -> AuthResult<()> {
        let session = self
            .get_session(session_id)
            .await?
            .ok_or_else(|| AuthError::SessionNotFound(session_id.to_string()))?;
        if !session.is_active {
            return Err(AuthError::SessionInvalidated);
        }
        if session.is_expired() {
            return Err(AuthError::SessionExpired);
        }

        self.store
            .update(
                SESSIONS_COLLECTION,
                session_id,
                json!({ "last_activity_at": Utc::now() }),
            )
            .await
            .map_err(|e| Self::map_missing(e, session_id))
    }

    /// Terminate one session.
    #[instrument(skip(self))]
    pub async fn terminate_session(&self, session_id: &str) -> AuthResult<()> {
        self.store
            .update(SESSIONS_COLLECTION, session_id, json!({ "is_active": false }))
            .await
            .map_err(|e| Self::map_missing(e, session_id))?;
        info!("Session terminated");
        Ok(())
    }

    /// Terminate every active session of a user, optionally keeping one.
    ///
    /// Returns the number of sessions terminated.
    #[instrument(skip(self))]
    pub async fn terminate_all_user_sessions(&self, user_id: &str, except: Option<&str>) -> AuthResult<usize> {
        let filters = [Filter::eq("user_id", user_id), Filter::eq("is_active", true)];
        let ids: Vec<String> = self
            .query_sessions(&filters)
            .await?
            .into_iter()
            .map(|s| s.id)
            .filter(|id| Some(id.as_str()) != except)
            .collect();

        self.deactivate_all(&ids).await?;
        if !ids.is_empty() {
            info!(count = ids.len(), "User sessions terminated");
        }
        Ok(ids.len())
    }

    /// Deactivate every active session past its expiry.
    ///
    /// Returns the number of sessions deactivated.
    #[instrument(skip(self))]
    pub async fn cleanup_expired_sessions(&self) -> AuthResult<usize> {
        let now = Utc::now();
        let ids: Vec<String> = self
            .query_sessions(&[Filter::eq("is_active", true)])
            .await?
            .into_iter()
            .filter(|s| s.is_expired_at(now))
            .map(|s| s.id)
            .collect();

        self.deactivate_all(&ids).await?;
        debug!(count = ids.len(), "Expired sessions cleaned up");
        Ok(ids.len())
    }

    /// Count active and expired sessions.
    ///
    /// Store errors yield zero counts.
    pub async fn session_stats(&self) -> SessionStats {
        let now = Utc::now();
        match self.query_sessions(&[Filter::eq("is_active", true)]).await {
            Ok(sessions) => {
                let expired = sessions.iter().filter(|s| s.is_expired_at(now)).count();
                SessionStats {
                    total: sessions.len(),
                    active: sessions.len() - expired,
                    expired,
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to get session stats");
                SessionStats::default()
            }
        }
    }

    async fn query_sessions(&self, filters: &[Filter]) -> AuthResult<Vec<Session>> {
        let docs = self.store.query(SESSIONS_COLLECTION, filters).await?;
        let mut sessions: Vec<Session> = console_store::parse_documents(&docs)?;
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn deactivate_all(&self, ids: &[String]) -> AuthResult<()> {
        for chunk in ids.chunks(MAX_BATCH_OPERATIONS) {
            let mut batch = WriteBatch::new();
            for id in chunk {
                batch.merge(SESSIONS_COLLECTION, id.as_str(), json!({ "is_active": false }));
            }
            self.store.commit(batch).await?;
        }
        Ok(())
    }

    fn map_missing(error: StoreError, session_id: &str) -> AuthError {
        match error {
            StoreError::NotFound { .. } => AuthError::SessionNotFound(session_id.to_string()),
            other => AuthError::Store(other),
        }
    }
}

#[async_trait]
impl SessionResolver for SessionDirectory {
    async fn resolve_session(&self, token: &str) -> AuthResult<Option<ResolvedSession>> {
        let session_id = Self::session_id_for(token);
        let Some(session) = self.get_session(&session_id).await? else {
            debug!("Unknown session token");
            return Ok(None);
        };

        if !session.is_active {
            return Ok(None);
        }

        if session.is_expired() {
            // Expire on read; the sweep catches whatever this misses.
            if let Err(e) = self.terminate_session(&session_id).await {
                warn!(session_id = %session_id, error = %e, "Failed to deactivate expired session");
            }
            return Ok(None);
        }

        Ok(Some(ResolvedSession {
            session_id: session.id,
            user_id: session.user_id,
            expires_at: session.expires_at,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use console_store::MemoryDocumentStore;

    fn directory() -> (Arc<MemoryDocumentStore>, SessionDirectory) {
        let store = Arc::new(MemoryDocumentStore::new());
        let directory = SessionDirectory::new(store.clone());
        (store, directory)
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let (_, directory) = directory();
        let issued = directory
            .create_session(NewSession::new("u1", "u1@example.com").with_name("Ada"))
            .await
            .unwrap();

        assert_ne!(issued.token, issued.session.id);
        let resolved = directory.resolve_session(&issued.token).await.unwrap().unwrap();
        assert_eq!(resolved.user_id, "u1");
        assert_eq!(resolved.session_id, issued.session.id);

        assert!(directory.resolve_session("bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_deactivated_on_read() {
        let (_, directory) = directory();
        let issued = directory
            .create_session(NewSession::new("u1", "e").with_ttl(Duration::seconds(-1)))
            .await
            .unwrap();

        assert!(directory.resolve_session(&issued.token).await.unwrap().is_none());
        let stored = directory.get_session(&issued.session.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn test_terminate_all_except_current() {
        let (_, directory) = directory();
        let a = directory.create_session(NewSession::new("u1", "e")).await.unwrap();
        let b = directory.create_session(NewSession::new("u1", "e")).await.unwrap();
        let other = directory.create_session(NewSession::new("u2", "e")).await.unwrap();

        let count = directory
            .terminate_all_user_sessions("u1", Some(a.session.id.as_str()))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert!(directory.resolve_session(&a.token).await.unwrap().is_some());
        assert!(directory.resolve_session(&b.token).await.unwrap().is_none());
        assert!(directory.resolve_session(&other.token).await.unwrap().is_some());
        assert_eq!(directory.get_user_sessions("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_and_stats() {
        let (_, directory) = directory();
        directory.create_session(NewSession::new("u1", "e")).await.unwrap();
        directory
            .create_session(NewSession::new("u2", "e").with_ttl(Duration::seconds(-5)))
            .await
            .unwrap();

        assert_eq!(
            directory.session_stats().await,
            SessionStats { total: 2, active: 1, expired: 1 }
        );
        assert_eq!(directory.cleanup_expired_sessions().await.unwrap(), 1);
        assert_eq!(
            directory.session_stats().await,
            SessionStats { total: 1, active: 1, expired: 0 }
        );
        assert_eq!(directory.get_all_active_sessions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_session_errors() {
        let (_, directory) = directory();
        assert!(matches!(
            directory.terminate_session("nope").await,
            Err(AuthError::SessionNotFound(_))
        ));
        assert!(matches!(
            directory.touch_session("nope").await,
            Err(AuthError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_touch_rejects_terminated_and_expired_sessions() {
        let (_, directory) = directory();
        let live = directory.create_session(NewSession::new("u1", "e")).await.unwrap();
        directory.touch_session(&live.session.id).await.unwrap();

        directory.terminate_session(&live.session.id).await.unwrap();
        assert!(matches!(
            directory.touch_session(&live.session.id).await,
            Err(AuthError::SessionInvalidated)
        ));

        let stale = directory
            .create_session(NewSession::new("u2", "e").with_ttl(Duration::seconds(-5)))
            .await
            .unwrap();
        assert!(matches!(
            directory.touch_session(&stale.session.id).await,
            Err(AuthError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_reads_fail_soft() {
        let (store, directory) = directory();
        directory.create_session(NewSession::new("u1", "e")).await.unwrap();
        store.set_unavailable(SESSIONS_COLLECTION, true).await;

        assert!(directory.get_user_sessions("u1").await.is_empty());
        assert_eq!(directory.session_stats().await, SessionStats::default());
        assert!(directory.cleanup_expired_sessions().await.is_err());
    }
}

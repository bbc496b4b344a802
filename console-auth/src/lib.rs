//! # Console Authentication
//!
//! This crate provides the identity plumbing the admin console consumes:
//! bearer-token sessions and password credentials.
//!
//! ## Overview
//!
//! The console-auth crate handles:
//! - **Sessions**: Opaque token to user id mapping with expiry, termination and cleanup
//! - **Passwords**: A one-way hashing seam with an Argon2id implementation
//! - **Credentials**: Per-user password documents
//!
//! ## Usage
//!
//! ```rust,no_run
//! use console_auth::{NewSession, SessionDirectory, SessionResolver};
//! use console_store::MemoryDocumentStore;
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let sessions = SessionDirectory::new(Arc::new(MemoryDocumentStore::new()));
//!
//!     let issued = sessions
//!         .create_session(NewSession::new("user-1", "ada@example.com"))
//!         .await
//!         .unwrap();
//!
//!     let resolved = sessions.resolve_session(&issued.token).await.unwrap();
//!     assert_eq!(resolved.map(|r| r.user_id), Some("user-1".to_string()));
//! }
//! ```
//!
//! ## Trust Model
//!
//! A resolved session's user id is trusted as the acting identity. Nothing in
//! this crate re-verifies credentials on resolution.

pub mod error;
pub mod password;
pub mod session;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use password::{Argon2PasswordHasher, CredentialStore, PasswordCredential, PasswordHasher, CREDENTIALS_COLLECTION};
pub use session::{
    IssuedSession, NewSession, ResolvedSession, Session, SessionDirectory, SessionResolver, SessionStats,
    DEFAULT_SESSION_TTL_SECS, SESSIONS_COLLECTION,
};

//! Password hashing and stored credentials
//!
//! The console only needs `hash` and `verify`; the primitive sits behind the
//! [`PasswordHasher`] trait so deployments can swap it. The default is
//! Argon2id producing PHC strings with a random salt per hash.

use crate::error::{AuthError, AuthResult};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use console_store::{DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Collection holding one credential document per user id.
pub const CREDENTIALS_COLLECTION: &str = "credentials";

/// One-way password hash.
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password.
    fn hash(&self, plaintext: &str) -> AuthResult<String>;

    /// Check a plaintext password against a stored hash.
    ///
    /// Malformed hashes never verify.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// Argon2id password hasher.
///
/// An optional secret is mixed into every hash; hashes made with one secret
/// do not verify under another.
///
/// # Example
///
/// ```
/// use console_auth::{Argon2PasswordHasher, PasswordHasher};
///
/// let hasher = Argon2PasswordHasher::with_secret("pepper");
/// let hash = hasher.hash("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(hasher.verify("correct horse", &hash));
/// assert!(!hasher.verify("wrong", &hash));
/// ```
#[derive(Clone, Default)]
pub struct Argon2PasswordHasher {
    secret: Vec<u8>,
}

impl std::fmt::Debug for Argon2PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordHasher")
            .field("keyed", &!self.secret.is_empty())
            .finish()
    }
}

impl Argon2PasswordHasher {
    /// Create a hasher without a secret.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hasher keyed with a secret.
    pub fn with_secret(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    fn argon2(&self) -> AuthResult<Argon2<'_>> {
        if self.secret.is_empty() {
            return Ok(Argon2::default());
        }
        Argon2::new_with_secret(&self.secret, Algorithm::default(), Version::default(), Params::default())
            .map_err(|e| AuthError::Internal(format!("argon2 setup: {}", e)))
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("argon2 hash: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        match self.argon2() {
            Ok(argon2) => argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                warn!(error = %e, "Password verification unavailable");
                false
            }
        }
    }
}

/// Stored password credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PasswordCredential {
    /// Owning user id (also the document id).
    pub user_id: String,
    /// Hash produced by a [`PasswordHasher`].
    pub password_hash: String,
    /// When the password was last set.
    pub updated_at: DateTime<Utc>,
}

impl PasswordCredential {
    /// Hash a plaintext password into a credential.
    pub fn new(user_id: impl Into<String>, plaintext: &str, hasher: &dyn PasswordHasher) -> AuthResult<Self> {
        Ok(Self {
            user_id: user_id.into(),
            password_hash: hasher.hash(plaintext)?,
            updated_at: Utc::now(),
        })
    }
}

/// Reads and writes password credentials.
pub struct CredentialStore {
    store: Arc<dyn DocumentStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl CredentialStore {
    /// Create a credential store.
    pub fn new(store: Arc<dyn DocumentStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    /// The hasher used for new credentials.
    pub fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }

    /// Set or replace a user's password.
    pub async fn set_password(&self, user_id: &str, plaintext: &str) -> AuthResult<()> {
        let credential = PasswordCredential::new(user_id, plaintext, self.hasher.as_ref())?;
        let data = console_store::to_document(&credential)?;
        self.store.set(CREDENTIALS_COLLECTION, user_id, data).await?;
        debug!(user_id = %user_id, "Password updated");
        Ok(())
    }

    /// Verify a user's password.
    ///
    /// A missing credential and a wrong password both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn verify_password(&self, user_id: &str, plaintext: &str) -> AuthResult<()> {
        let doc = self
            .store
            .get(CREDENTIALS_COLLECTION, user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        let credential: PasswordCredential = doc.parse()?;

        if self.hasher.verify(plaintext, &credential.password_hash) {
            Ok(())
        } else {
            warn!(user_id = %user_id, "Password verification failed");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Remove a user's credential. Missing credentials are ignored.
    pub async fn delete_credential(&self, user_id: &str) -> AuthResult<()> {
        match self.store.delete(CREDENTIALS_COLLECTION, user_id).await {
            Ok(()) | Err(StoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

//! Error types for session and credential operations
//!
//! This module defines the errors that can occur while issuing, resolving and
//! terminating sessions or verifying password credentials.

use console_store::StoreError;
use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session with this id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session is past its expiry
    #[error("Session has expired")]
    SessionExpired,

    /// Session has been terminated
    #[error("Session invalidated")]
    SessionInvalidated,

    /// Invalid credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Underlying document store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Some errors (like invalid credentials) are expected and
    /// should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::SessionExpired | AuthError::SessionInvalidated | AuthError::InvalidCredentials => 401,
            AuthError::SessionNotFound(_) => 404,
            AuthError::Store(StoreError::NotFound { .. }) => 404,
            AuthError::Store(StoreError::Unavailable(_)) => 503,
            AuthError::Store(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            AuthError::SessionExpired => "SESSION_EXPIRED",
            AuthError::SessionInvalidated => "SESSION_INVALIDATED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::Store(_) => "STORE_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

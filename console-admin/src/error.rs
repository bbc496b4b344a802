//! Error types for console administration
//!
//! Single-entity mutations fail loudly with these errors. Access decisions
//! and list reads never surface them; they deny or degrade to empty instead.

use console_auth::AuthError;
use console_org::UserStatus;
use console_store::StoreError;
use thiserror::Error;

/// Administration error types.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Role does not exist
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// Role is a protected system role
    #[error("System role '{0}' cannot be modified or deleted")]
    SystemRoleProtected(String),

    /// Catalog permission does not exist
    #[error("Permission not found: {0}")]
    PermissionNotFound(String),

    /// Acting identity lacks the required grant
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// User does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// A role with this name already exists
    #[error("A role named '{0}' already exists")]
    DuplicateRoleName(String),

    /// Name is reserved for the super role
    #[error("Role name '{0}' is reserved")]
    ReservedRoleName(String),

    /// Transition is not allowed from the user's current status
    #[error("Cannot {transition} a user whose status is {from}")]
    InvalidTransition {
        /// Requested transition.
        transition: String,
        /// Current status.
        from: UserStatus,
    },

    /// Restore requested for a user that is not deleted
    #[error("User is not deleted: {0}")]
    UserNotDeleted(String),

    /// Unknown role name
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Underlying document store failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Session or credential failure
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type for administration operations.
pub type AdminResult<T> = Result<T, AdminError>;

impl AdminError {
    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AdminError::RoleNotFound(_) | AdminError::PermissionNotFound(_) | AdminError::UserNotFound(_) => 404,
            AdminError::SystemRoleProtected(_) | AdminError::PermissionDenied(_) => 403,
            AdminError::DuplicateRoleName(_)
            | AdminError::InvalidTransition { .. }
            | AdminError::UserNotDeleted(_) => 409,
            AdminError::ReservedRoleName(_) | AdminError::InvalidRole(_) | AdminError::Validation(_) => 400,
            AdminError::Store(StoreError::NotFound { .. }) => 404,
            AdminError::Store(StoreError::BatchTooLarge { .. }) => 400,
            AdminError::Store(StoreError::Unavailable(_)) => 503,
            AdminError::Store(_) => 500,
            AdminError::Auth(e) => e.status_code(),
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AdminError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            AdminError::SystemRoleProtected(_) => "SYSTEM_ROLE_PROTECTED",
            AdminError::PermissionNotFound(_) => "PERMISSION_NOT_FOUND",
            AdminError::PermissionDenied(_) => "PERMISSION_DENIED",
            AdminError::UserNotFound(_) => "USER_NOT_FOUND",
            AdminError::DuplicateRoleName(_) => "DUPLICATE_ROLE_NAME",
            AdminError::ReservedRoleName(_) => "RESERVED_ROLE_NAME",
            AdminError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AdminError::UserNotDeleted(_) => "USER_NOT_DELETED",
            AdminError::InvalidRole(_) => "INVALID_ROLE",
            AdminError::Validation(_) => "VALIDATION_ERROR",
            AdminError::Store(_) => "STORE_ERROR",
            AdminError::Auth(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AdminError::RoleNotFound("r".into()).status_code(), 404);
        assert_eq!(AdminError::SystemRoleProtected("admin".into()).status_code(), 403);
        assert_eq!(AdminError::PermissionDenied("banUser".into()).status_code(), 403);
        assert_eq!(AdminError::UserNotDeleted("u".into()).status_code(), 409);
        assert_eq!(
            AdminError::Store(StoreError::BatchTooLarge { size: 600, max: 500 }).status_code(),
            400
        );
        assert_eq!(AdminError::Auth(AuthError::InvalidCredentials).status_code(), 401);
    }

    #[test]
    fn test_messages() {
        let err = AdminError::InvalidTransition {
            transition: "unban".to_string(),
            from: UserStatus::Active,
        };
        assert_eq!(err.to_string(), "Cannot unban a user whose status is active");
        assert_eq!(err.error_code(), "INVALID_TRANSITION");

        let err = AdminError::SystemRoleProtected("moderator".to_string());
        assert_eq!(err.to_string(), "System role 'moderator' cannot be modified or deleted");
    }

    #[test]
    fn test_store_unavailable_is_server_error() {
        let err: AdminError = StoreError::Unavailable("roles".to_string()).into();
        assert!(err.is_server_error());
        assert!(!AdminError::UserNotFound("u".into()).is_server_error());
    }
}

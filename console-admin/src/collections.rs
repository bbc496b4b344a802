//! Collection names used by the console services.

pub use console_auth::{CREDENTIALS_COLLECTION as CREDENTIALS, SESSIONS_COLLECTION as SESSIONS};

/// Role entities.
pub const ROLES: &str = "roles";
/// Catalog permission entities.
pub const PERMISSIONS: &str = "permissions";
/// Page permission rows.
pub const PAGE_PERMISSIONS: &str = "page_permissions";
/// Operation permission rows.
pub const OPERATION_PERMISSIONS: &str = "operation_permissions";
/// Managed user records.
pub const USERS: &str = "users";
/// Admin audit trail.
pub const AUDIT_LOGS: &str = "audit_logs";
/// Per-user activity history.
pub const ACTIVITY_LOGS: &str = "activity_logs";

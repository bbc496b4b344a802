//! # Console RBAC (Role-Based Access Control)
//!
//! This crate provides the permission model of the admin console.
//!
//! ## Overview
//!
//! The console-rbac crate handles:
//! - **Operations**: The four CRUD operations a page grant can carry
//! - **Pages**: The console's page paths and named operations
//! - **Permissions**: Page and operation permission rows, the matrix view
//! - **Snapshots**: Synchronous evaluation over pre-fetched rows
//!
//! ## Architecture
//!
//! ```text
//! Role ──┬─ PagePermission(role, page_path) ─→ {CREATE, READ, UPDATE, DELETE}
//!        └─ OperationPermission(role, name)  ─→ allowed
//!
//! Examples:
//!   moderator  /admin/users  [READ]      - may view the user list
//!   moderator  banUser       true        - may ban users
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use console_rbac::{ops, CrudOperation, OperationPermission, PagePermission, PermissionSnapshot};
//!
//! let pages = vec![PagePermission::new("moderator", "/admin/users", [CrudOperation::Read])];
//! let grants = vec![OperationPermission::new("moderator", ops::BAN_USER, true)];
//!
//! let snapshot = PermissionSnapshot::from_rows("moderator", false, &pages, &grants);
//! assert!(snapshot.can_read("/admin/users"));
//! assert!(!snapshot.can_delete("/admin/users"));
//! assert!(snapshot.is_operation_allowed("banUser"));
//! ```
//!
//! ## No Implied Grants
//!
//! Operations do not imply each other and paths do not imply their children.
//! Every (role, exact path) and (role, operation name) pair is granted on its
//! own. The only exception is the super role, which bypasses every check.

pub mod operations;
pub mod pages;
pub mod permissions;
pub mod snapshot;

// Re-export main types for convenience
pub use operations::CrudOperation;
pub use pages::ops;
pub use permissions::{
    OperationPermission, OperationPermissionInput, PagePermission, PagePermissionInput,
    RolePermissionMatrix,
};
pub use snapshot::{is_super_role, PermissionSnapshot, DEFAULT_SUPER_ROLE};

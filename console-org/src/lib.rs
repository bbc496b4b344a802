//! # Console Organization Entities
//!
//! This crate provides the domain entities of the admin console.
//!
//! ## Overview
//!
//! The console-org crate handles:
//! - **Roles**: Role entities and the protected system roles
//! - **Catalog**: Descriptive permission entries grouped by category
//! - **Users**: Managed user records and their status state machine
//! - **Audit**: Admin audit entries and per-user activity entries
//!
//! ## Architecture
//!
//! ```text
//! UserRecord ─ role ─→ Role
//!                       ├─ permission_ids ─→ Permission (catalog, display only)
//!                       └─ id ─→ page / operation grants (console-rbac, enforced)
//!
//! admin mutation ─┬─→ AdminAuditLog    (admin trail)
//!                 └─→ ActivityLogEntry (target user's history)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use console_org::{Role, SystemRole, Transition, UserRecord, UserStatus};
//!
//! let moderator = Role::system(SystemRole::Moderator);
//! let mut user = UserRecord::new("ada@example.com", "Ada", moderator.id.clone());
//!
//! assert!(Transition::Ban.allowed_from(user.status));
//! user.apply(Transition::Ban, "admin-1", chrono::Utc::now());
//! assert_eq!(user.status, UserStatus::Banned);
//! assert!(!user.is_active);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialization support (enabled by default)

pub mod audit;
pub mod catalog;
pub mod roles;
pub mod users;

// Re-export main types for convenience
pub use audit::{ActivityAction, ActivityLogEntry, AdminAction, AdminAuditLog};
pub use catalog::{default_catalog, NewPermission, Permission, PermissionCategory, PermissionUpdate};
pub use roles::{NewRole, Role, RoleUpdate, SystemRole};
pub use users::{Transition, UserRecord, UserStatus};

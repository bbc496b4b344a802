//! # Console Admin
//!
//! This crate provides the RBAC administration services of the admin console.
//!
//! ## Overview
//!
//! The console-admin crate handles:
//! - **Permission Store**: Page and operation grants keyed by role
//! - **Access Evaluator**: Fail-closed decisions with a super-role bypass
//! - **Snapshot Cache**: Per-user grant snapshots for synchronous checks
//! - **Role Registry**: Role CRUD with protected system roles
//! - **Permission Catalog**: Descriptive permission entries
//! - **Admin Actions**: Gated user lifecycle transitions and bulk variants
//! - **Audit**: Best-effort admin audit trail and user activity history
//! - **Identity**: Session token to acting identity
//! - **Bootstrap**: First administrator seeding
//!
//! ## Error Policies
//!
//! | Call | On store failure |
//! |------|------------------|
//! | `can_access_page`, `can_perform_operation` | deny |
//! | list reads (`get_all_roles`, `get_all_users_for_admin`, ...) | empty |
//! | single-entity mutations | typed [`AdminError`] |
//! | audit and activity writes | logged, discarded |
//!
//! ## Usage
//!
//! ```rust
//! use console_admin::{AdminActor, AdminConsole, ConsoleConfig};
//! use console_org::UserRecord;
//! use console_store::MemoryDocumentStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let console = AdminConsole::new(Arc::new(MemoryDocumentStore::new()), ConsoleConfig::default())?;
//! console.initialize().await?;
//!
//! let user = console
//!     .users
//!     .create_user(UserRecord::new("ada@example.com", "Ada", "user"))
//!     .await?;
//!
//! let root = AdminActor::new("root", "super_admin");
//! console.admin.ban_user_as_admin(&root, &user.id, Some("spam")).await?;
//!
//! let moderator = AdminActor::new("mod-1", "moderator");
//! assert!(console.admin.unban_user_as_admin(&moderator, &user.id).await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod audit;
pub mod catalog;
pub mod collections;
pub mod config;
pub mod console;
pub mod error;
pub mod evaluator;
pub mod identity;
pub mod permission_store;
pub mod registry;
pub mod seed;
pub mod users;

// Re-export main types for convenience
pub use actions::{AdminActor, AdminService, BulkResult, DEFAULT_PERMANENT_DELETE_REASON};
pub use audit::{ActivityLog, AuditLog};
pub use catalog::PermissionCatalog;
pub use config::{ConfigError, ConsoleConfig};
pub use console::AdminConsole;
pub use error::{AdminError, AdminResult};
pub use evaluator::{AccessEvaluator, SnapshotCache};
pub use identity::{ActingIdentity, IdentityResolver};
pub use permission_store::{OrphanedPermissions, PermissionStore};
pub use registry::RoleRegistry;
pub use seed::Bootstrap;
pub use users::{UserDirectory, UserFilter, UserStats, EXPORT_HEADER};

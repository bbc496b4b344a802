//! # Permission Snapshots
//!
//! Synchronous evaluation over permissions fetched once per actor.
//!
//! A snapshot answers the same questions as the store-backed evaluator
//! without further I/O. It is only as fresh as the moment it was built;
//! holders rebuild it when the actor or the actor's role changes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::operations::CrudOperation;
use crate::permissions::{OperationPermission, PagePermission, RolePermissionMatrix};

/// Default identifier of the role that bypasses every check.
pub const DEFAULT_SUPER_ROLE: &str = "super_admin";

/// Check whether a role name designates the super role.
///
/// The comparison ignores ASCII case and surrounding whitespace of the
/// role name.
///
/// # Example
///
/// ```
/// use console_rbac::snapshot::{is_super_role, DEFAULT_SUPER_ROLE};
///
/// assert!(is_super_role("Super_Admin", DEFAULT_SUPER_ROLE));
/// assert!(!is_super_role("admin", DEFAULT_SUPER_ROLE));
/// ```
pub fn is_super_role(role_name: &str, super_role: &str) -> bool {
    !super_role.is_empty() && role_name.trim().eq_ignore_ascii_case(super_role)
}

/// Pre-fetched permissions of one role.
///
/// Only accessible page rows and allowed operation rows are kept, so lookups
/// mirror the store-backed checks exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionSnapshot {
    /// Role the snapshot was built for.
    pub role_id: String,
    /// Whether the role is the super role.
    pub bypass: bool,
    pages: HashMap<String, BTreeSet<CrudOperation>>,
    operations: BTreeSet<String>,
}

impl PermissionSnapshot {
    /// Build a snapshot from permission rows.
    ///
    /// # Arguments
    ///
    /// * `role_id` - Role the rows belong to
    /// * `bypass` - Whether the role is the super role
    /// * `pages` - Page permission rows of the role
    /// * `operations` - Operation permission rows of the role
    pub fn from_rows(
        role_id: impl Into<String>,
        bypass: bool,
        pages: &[PagePermission],
        operations: &[OperationPermission],
    ) -> Self {
        let role_id = role_id.into();
        let pages = pages
            .iter()
            .filter(|p| p.role_id == role_id && p.can_access)
            .map(|p| (p.page_path.clone(), p.operations.clone()))
            .collect();
        let operations = operations
            .iter()
            .filter(|o| o.role_id == role_id && o.allowed)
            .map(|o| o.operation_name.clone())
            .collect();

        Self {
            role_id,
            bypass,
            pages,
            operations,
        }
    }

    /// Build a snapshot from a matrix view.
    pub fn from_matrix(matrix: &RolePermissionMatrix, bypass: bool) -> Self {
        Self {
            role_id: matrix.role_id.clone(),
            bypass,
            pages: matrix
                .page_permissions
                .iter()
                .filter(|(_, ops)| !ops.is_empty())
                .map(|(path, ops)| (path.clone(), ops.clone()))
                .collect(),
            operations: matrix
                .operation_permissions
                .iter()
                .filter(|(_, allowed)| **allowed)
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }

    /// A snapshot that denies everything.
    ///
    /// Used when the role cannot be resolved.
    pub fn deny_all(role_id: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            ..Self::default()
        }
    }

    /// Whether the page is accessible at all.
    pub fn has_page_access(&self, page_path: &str) -> bool {
        self.bypass || self.pages.contains_key(page_path)
    }

    /// Whether every required operation is granted on the page.
    ///
    /// An empty requirement is satisfied by page access alone.
    pub fn can(&self, page_path: &str, required: &[CrudOperation]) -> bool {
        if self.bypass {
            return true;
        }
        match self.pages.get(page_path) {
            Some(granted) => required.iter().all(|op| granted.contains(op)),
            None => false,
        }
    }

    /// Whether `CREATE` is granted on the page.
    pub fn can_create(&self, page_path: &str) -> bool {
        self.can(page_path, &[CrudOperation::Create])
    }

    /// Whether `READ` is granted on the page.
    pub fn can_read(&self, page_path: &str) -> bool {
        self.can(page_path, &[CrudOperation::Read])
    }

    /// Whether `UPDATE` is granted on the page.
    pub fn can_update(&self, page_path: &str) -> bool {
        self.can(page_path, &[CrudOperation::Update])
    }

    /// Whether `DELETE` is granted on the page.
    pub fn can_delete(&self, page_path: &str) -> bool {
        self.can(page_path, &[CrudOperation::Delete])
    }

    /// Whether a named operation is allowed. Matching is exact.
    pub fn is_operation_allowed(&self, operation_name: &str) -> bool {
        self.bypass || self.operations.contains(operation_name)
    }

    /// Number of accessible pages (zero for the super role, which needs none).
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

//! # Permissions
//!
//! Permission rows stored per role and the matrix view built from them.
//!
//! Two kinds of grant exist:
//! - **Page permissions**: a set of CRUD operations on one exact page path
//! - **Operation permissions**: a boolean grant for one named operation
//!
//! Both are keyed by role id plus their key (path or operation name). The row
//! id is derived from that pair, so writing the same pair twice overwrites the
//! earlier row instead of adding a second one.
//!
//! Ids read `{role}_{key}_{kind}`. Inside each part `%` and `_` are
//! percent-escaped; `/` is escaped in role ids and operation names and written
//! as `_` in page paths. The first `_` therefore always ends the role part and
//! distinct pairs never share an id.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::operations::CrudOperation;

/// Grant of CRUD operations on one page to one role.
///
/// `can_access` is derived from `operations` but stored alongside it; every
/// constructor and mutator keeps `can_access == !operations.is_empty()`.
///
/// # Example
///
/// ```
/// use console_rbac::permissions::PagePermission;
/// use console_rbac::operations::CrudOperation;
///
/// let perm = PagePermission::new("moderator", "/admin/users", [CrudOperation::Read]);
/// assert!(perm.can_access);
/// assert_eq!(perm.id, "moderator__admin_users_page");
/// assert!(perm.allows(&[CrudOperation::Read]));
/// assert!(!perm.allows(&[CrudOperation::Delete]));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagePermission {
    /// Row id, derived from role id and page path.
    pub id: String,
    /// Role this grant belongs to.
    pub role_id: String,
    /// Exact page path. No prefix or parent matching is applied.
    pub page_path: String,
    /// Granted operations.
    pub operations: BTreeSet<CrudOperation>,
    /// Whether the page is reachable at all (`operations` non-empty).
    pub can_access: bool,
}

impl PagePermission {
    /// Create a page permission row.
    ///
    /// # Arguments
    ///
    /// * `role_id` - The role receiving the grant
    /// * `page_path` - The exact page path
    /// * `operations` - Operations granted on the page (duplicates collapse)
    pub fn new(
        role_id: impl Into<String>,
        page_path: impl Into<String>,
        operations: impl IntoIterator<Item = CrudOperation>,
    ) -> Self {
        let role_id = role_id.into();
        let page_path = page_path.into();
        let operations: BTreeSet<CrudOperation> = operations.into_iter().collect();
        Self {
            id: Self::row_id(&role_id, &page_path),
            can_access: !operations.is_empty(),
            role_id,
            page_path,
            operations,
        }
    }

    /// Derive the row id for a (role, page) pair.
    pub fn row_id(role_id: &str, page_path: &str) -> String {
        format!("{}_{}_page", escape_id_part(role_id, "%2F"), escape_id_part(page_path, "_"))
    }

    /// Replace the granted operations, recomputing `can_access`.
    pub fn set_operations(&mut self, operations: impl IntoIterator<Item = CrudOperation>) {
        self.operations = operations.into_iter().collect();
        self.can_access = !self.operations.is_empty();
    }

    /// Check whether this row satisfies a set of required operations.
    ///
    /// The page must be accessible. An empty requirement is satisfied by
    /// access alone; otherwise every required operation must be granted.
    pub fn allows(&self, required: &[CrudOperation]) -> bool {
        self.can_access && required.iter().all(|op| self.operations.contains(op))
    }

    /// Check the stored `can_access` flag against the operations.
    pub fn is_consistent(&self) -> bool {
        self.can_access == !self.operations.is_empty()
    }
}

/// Grant (or explicit refusal) of one named operation to one role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationPermission {
    /// Row id, derived from role id and operation name.
    pub id: String,
    /// Role this grant belongs to.
    pub role_id: String,
    /// Operation name. Open namespace, matched exactly.
    pub operation_name: String,
    /// Whether the operation is allowed.
    pub allowed: bool,
}

impl OperationPermission {
    /// Create an operation permission row.
    pub fn new(role_id: impl Into<String>, operation_name: impl Into<String>, allowed: bool) -> Self {
        let role_id = role_id.into();
        let operation_name = operation_name.into();
        Self {
            id: Self::row_id(&role_id, &operation_name),
            role_id,
            operation_name,
            allowed,
        }
    }

    /// Derive the row id for a (role, operation) pair.
    pub fn row_id(role_id: &str, operation_name: &str) -> String {
        format!("{}_{}_op", escape_id_part(role_id, "%2F"), escape_id_part(operation_name, "%2F"))
    }
}

fn escape_id_part(value: &str, slash: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            '/' => out.push_str(slash),
            c => out.push(c),
        }
    }
    out
}

/// One entry of a bulk page-permission write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PagePermissionInput {
    /// Exact page path.
    pub page_path: String,
    /// Operations to grant. Empty revokes access to the page.
    pub operations: Vec<CrudOperation>,
}

impl PagePermissionInput {
    /// Create a bulk entry.
    pub fn new(page_path: impl Into<String>, operations: impl IntoIterator<Item = CrudOperation>) -> Self {
        Self {
            page_path: page_path.into(),
            operations: operations.into_iter().collect(),
        }
    }

    /// Build the row this entry writes for a role.
    pub fn to_row(&self, role_id: &str) -> PagePermission {
        PagePermission::new(role_id, self.page_path.clone(), self.operations.iter().copied())
    }
}

/// One entry of a bulk operation-permission write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationPermissionInput {
    /// Operation name.
    pub operation_name: String,
    /// Whether the operation is allowed.
    pub allowed: bool,
}

impl OperationPermissionInput {
    /// Create a bulk entry.
    pub fn new(operation_name: impl Into<String>, allowed: bool) -> Self {
        Self {
            operation_name: operation_name.into(),
            allowed,
        }
    }

    /// Build the row this entry writes for a role.
    pub fn to_row(&self, role_id: &str) -> OperationPermission {
        OperationPermission::new(role_id, self.operation_name.clone(), self.allowed)
    }
}

/// Materialized view of every grant held by one role.
///
/// Not persisted. Built by joining the page and operation permission rows of
/// a role; every row appears, including pages whose operation set is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RolePermissionMatrix {
    /// Role id.
    pub role_id: String,
    /// Role display name.
    pub role_name: String,
    /// Page path to granted operations.
    pub page_permissions: BTreeMap<String, BTreeSet<CrudOperation>>,
    /// Operation name to allowed flag.
    pub operation_permissions: BTreeMap<String, bool>,
}

impl RolePermissionMatrix {
    /// Join permission rows into a matrix.
    ///
    /// Rows belonging to other roles are ignored.
    pub fn from_rows(
        role_id: impl Into<String>,
        role_name: impl Into<String>,
        pages: &[PagePermission],
        operations: &[OperationPermission],
    ) -> Self {
        let role_id = role_id.into();
        let page_permissions = pages
            .iter()
            .filter(|p| p.role_id == role_id)
            .map(|p| (p.page_path.clone(), p.operations.clone()))
            .collect();
        let operation_permissions = operations
            .iter()
            .filter(|o| o.role_id == role_id)
            .map(|o| (o.operation_name.clone(), o.allowed))
            .collect();

        Self {
            role_id,
            role_name: role_name.into(),
            page_permissions,
            operation_permissions,
        }
    }

    /// Operations granted on a page, if the role has a row for it.
    pub fn page_operations(&self, page_path: &str) -> Option<&BTreeSet<CrudOperation>> {
        self.page_permissions.get(page_path)
    }

    /// Whether a named operation is allowed.
    pub fn is_operation_allowed(&self, operation_name: &str) -> bool {
        self.operation_permissions
            .get(operation_name)
            .copied()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_permission_derives_can_access() {
        let granted = PagePermission::new("editor", "/admin/users", [CrudOperation::Read]);
        assert!(granted.can_access);
        assert!(granted.is_consistent());

        let revoked = PagePermission::new("editor", "/admin/users", []);
        assert!(!revoked.can_access);
        assert!(revoked.is_consistent());
    }

    #[test]
    fn test_set_operations_recomputes_can_access() {
        let mut perm = PagePermission::new("editor", "/admin/users", [CrudOperation::Read]);
        perm.set_operations([]);
        assert!(!perm.can_access);
        perm.set_operations([CrudOperation::Update, CrudOperation::Update]);
        assert!(perm.can_access);
        assert_eq!(perm.operations.len(), 1);
    }

    #[test]
    fn test_row_ids_are_deterministic() {
        assert_eq!(PagePermission::row_id("admin", "/admin/users"), "admin__admin_users_page");
        assert_eq!(OperationPermission::row_id("admin", "banUser"), "admin_banUser_op");

        let a = PagePermission::new("r1", "/dashboard", [CrudOperation::Read]);
        let b = PagePermission::new("r1", "/dashboard", [CrudOperation::Delete]);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_row_ids_keep_distinct_pairs_apart() {
        let underscore = PagePermission::row_id("moderator", "/admin/role_permissions");
        let nested = PagePermission::row_id("moderator", "/admin/role/permissions");
        assert_ne!(underscore, nested);
        assert_eq!(nested, "moderator__admin_role_permissions_page");

        assert_ne!(
            OperationPermission::row_id("a", "b_c"),
            OperationPermission::row_id("a_b", "c")
        );
        assert_ne!(
            PagePermission::row_id("a_b", "/c"),
            PagePermission::row_id("a", "_b/c")
        );
        assert_ne!(
            OperationPermission::row_id("a/b", "c"),
            OperationPermission::row_id("a", "b/c")
        );
        assert_ne!(
            OperationPermission::row_id("a", "%5F"),
            OperationPermission::row_id("a", "_")
        );
    }

    #[test]
    fn test_allows_has_no_implied_operations() {
        let perm = PagePermission::new("moderator", "/admin/users", [CrudOperation::Read]);
        assert!(perm.allows(&[]));
        assert!(perm.allows(&[CrudOperation::Read]));
        assert!(!perm.allows(&[CrudOperation::Create]));
        assert!(!perm.allows(&[CrudOperation::Read, CrudOperation::Update]));

        let empty = PagePermission::new("moderator", "/admin/users", []);
        assert!(!empty.allows(&[]));
    }

    #[test]
    fn test_page_permission_wire_format() {
        let perm = PagePermission::new("admin", "/profile", [CrudOperation::Update, CrudOperation::Read]);
        let value = serde_json::to_value(&perm).unwrap();
        assert_eq!(value["operations"], serde_json::json!(["READ", "UPDATE"]));
        assert_eq!(value["can_access"], serde_json::json!(true));

        let back: PagePermission = serde_json::from_value(value).unwrap();
        assert_eq!(back, perm);
    }

    #[test]
    fn test_matrix_from_rows() {
        let pages = vec![
            PagePermission::new("moderator", "/admin/users", [CrudOperation::Read]),
            PagePermission::new("moderator", "/admin/logs", []),
            PagePermission::new("admin", "/admin/roles", [CrudOperation::Read]),
        ];
        let ops = vec![
            OperationPermission::new("moderator", "banUser", true),
            OperationPermission::new("moderator", "deleteUser", false),
        ];

        let matrix = RolePermissionMatrix::from_rows("moderator", "Moderator", &pages, &ops);
        assert_eq!(matrix.page_permissions.len(), 2);
        assert!(matrix.page_operations("/admin/logs").unwrap().is_empty());
        assert!(matrix.page_operations("/admin/roles").is_none());
        assert!(matrix.is_operation_allowed("banUser"));
        assert!(!matrix.is_operation_allowed("deleteUser"));
        assert!(!matrix.is_operation_allowed("unknown"));
    }

    #[test]
    fn test_input_to_row() {
        let input = PagePermissionInput::new("/admin/users", [CrudOperation::Read, CrudOperation::Read]);
        let row = input.to_row("moderator");
        assert_eq!(row.role_id, "moderator");
        assert_eq!(row.operations.len(), 1);

        let op = OperationPermissionInput::new("banUser", true).to_row("moderator");
        assert_eq!(op.id, "moderator_banUser_op");
        assert!(op.allowed);
    }
}

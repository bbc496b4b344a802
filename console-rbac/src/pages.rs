//! # Pages and Named Operations
//!
//! Vocabulary of the console's protected surface: the page paths that carry
//! CRUD grants and the named operations that carry single boolean grants.
//!
//! Neither list is enforced. Grants may reference any path or operation name;
//! the lists exist so administration screens and bootstrap code agree on
//! spelling. A grant for a misspelled operation is stored but never matched.

/// Dashboard landing page.
pub const DASHBOARD: &str = "/dashboard";
/// Admin area root.
pub const ADMIN: &str = "/admin";
/// User management page.
pub const ADMIN_USERS: &str = "/admin/users";
/// Role management page.
pub const ADMIN_ROLES: &str = "/admin/roles";
/// Legacy permission catalog page.
pub const ADMIN_PERMISSIONS: &str = "/admin/permissions";
/// Role permission matrix editor.
pub const ADMIN_ROLE_PERMISSIONS: &str = "/admin/role-permissions";
/// Application settings page.
pub const ADMIN_SETTINGS: &str = "/admin/settings";
/// Audit and activity log viewer.
pub const ADMIN_LOGS: &str = "/admin/logs";
/// Own profile page.
pub const PROFILE: &str = "/profile";

/// All console pages that can carry page permissions.
pub const CONSOLE_PAGES: &[&str] = &[
    DASHBOARD,
    ADMIN,
    ADMIN_USERS,
    ADMIN_ROLES,
    ADMIN_PERMISSIONS,
    ADMIN_ROLE_PERMISSIONS,
    ADMIN_SETTINGS,
    ADMIN_LOGS,
    PROFILE,
];

/// Named operations used by the console.
pub mod ops {
    /// Soft delete, restore or permanently delete a user.
    pub const DELETE_USER: &str = "deleteUser";
    /// Ban a user.
    pub const BAN_USER: &str = "banUser";
    /// Lift a ban.
    pub const UNBAN_USER: &str = "unbanUser";
    /// Reset another user's password.
    pub const RESET_PASSWORD: &str = "resetPassword";
    /// Change another user's role.
    pub const CHANGE_ROLE: &str = "changeRole";
    /// Edit another user's profile.
    pub const EDIT_PROFILE: &str = "editProfile";
    /// Export user data.
    pub const EXPORT_DATA: &str = "exportData";
    /// Read audit and activity logs.
    pub const VIEW_LOGS: &str = "viewLogs";
    /// Create a role.
    pub const CREATE_ROLE: &str = "createRole";
    /// Edit a role.
    pub const EDIT_ROLE: &str = "editRole";
    /// Delete a role.
    pub const DELETE_ROLE: &str = "deleteRole";
    /// Create a catalog permission.
    pub const CREATE_PERMISSION: &str = "createPermission";
    /// Edit a catalog permission.
    pub const EDIT_PERMISSION: &str = "editPermission";
    /// Delete a catalog permission.
    pub const DELETE_PERMISSION: &str = "deletePermission";
    /// Edit a role's page permissions.
    pub const MANAGE_PAGE_PERMISSIONS: &str = "managePagePermissions";
    /// Edit a role's operation permissions.
    pub const MANAGE_OPERATION_PERMISSIONS: &str = "manageOperationPermissions";

    /// Every operation name the console knows about.
    pub const ALL: &[&str] = &[
        DELETE_USER,
        BAN_USER,
        UNBAN_USER,
        RESET_PASSWORD,
        CHANGE_ROLE,
        EDIT_PROFILE,
        EXPORT_DATA,
        VIEW_LOGS,
        CREATE_ROLE,
        EDIT_ROLE,
        DELETE_ROLE,
        CREATE_PERMISSION,
        EDIT_PERMISSION,
        DELETE_PERMISSION,
        MANAGE_PAGE_PERMISSIONS,
        MANAGE_OPERATION_PERMISSIONS,
    ];
}

/// Check if a page path is one of the console's pages.
pub fn is_known_page(path: &str) -> bool {
    CONSOLE_PAGES.contains(&path)
}

/// Check if an operation name is one the console checks somewhere.
///
/// Unknown names are still accepted as grants; callers use this to warn.
pub fn is_known_operation(name: &str) -> bool {
    ops::ALL.contains(&name)
}

//! Permission catalog entities
//!
//! Descriptive permission entries grouped by category. The catalog backs the
//! legacy `permission_ids` list on roles and is never consulted when access is
//! evaluated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category a catalog permission is filed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// User management.
    Users,
    /// Role management.
    Roles,
    /// Permission management.
    Permissions,
    /// Session management.
    Sessions,
    /// Application settings.
    Settings,
    /// Content and moderation.
    Content,
    /// Analytics and reports.
    Analytics,
    /// Everything else.
    System,
}

impl PermissionCategory {
    /// Get the string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Permissions => "permissions",
            Self::Sessions => "sessions",
            Self::Settings => "settings",
            Self::Content => "content",
            Self::Analytics => "analytics",
            Self::System => "system",
        }
    }

    /// Parse a category (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use console_org::PermissionCategory;
    ///
    /// assert_eq!(PermissionCategory::parse("Users"), Some(PermissionCategory::Users));
    /// assert_eq!(PermissionCategory::parse("moderation"), Some(PermissionCategory::Content));
    /// assert_eq!(PermissionCategory::parse("billing"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "users" | "user" => Some(Self::Users),
            "roles" | "role" => Some(Self::Roles),
            "permissions" | "permission" => Some(Self::Permissions),
            "sessions" | "session" => Some(Self::Sessions),
            "settings" => Some(Self::Settings),
            "content" | "moderation" => Some(Self::Content),
            "analytics" => Some(Self::Analytics),
            "system" | "dashboard" => Some(Self::System),
            _ => None,
        }
    }

    /// Get all categories.
    pub fn all() -> [Self; 8] {
        [
            Self::Users,
            Self::Roles,
            Self::Permissions,
            Self::Sessions,
            Self::Settings,
            Self::Content,
            Self::Analytics,
            Self::System,
        ]
    }
}

/// A descriptive catalog permission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    /// Permission id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Category.
    pub category: PermissionCategory,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Create a catalog entry with a fixed id.
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: PermissionCategory,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            category,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a catalog permission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPermission {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Category.
    pub category: PermissionCategory,
}

impl NewPermission {
    /// Create the input.
    pub fn new(name: impl Into<String>, description: impl Into<String>, category: PermissionCategory) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
        }
    }

    /// Build the entry with a generated UUID v7 id.
    pub fn into_permission(self) -> Permission {
        Permission::with_id(Uuid::now_v7().to_string(), self.name, self.description, self.category)
    }
}

/// Partial update of a catalog permission.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionUpdate {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PermissionCategory>,
}

impl PermissionUpdate {
    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.category.is_none()
    }

    /// Apply the update, bumping `updated_at`.
    pub fn apply(&self, permission: &mut Permission, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            permission.name = name.clone();
        }
        if let Some(ref description) = self.description {
            permission.description = description.clone();
        }
        if let Some(category) = self.category {
            permission.category = category;
        }
        permission.updated_at = now;
    }
}

/// The catalog entries seeded at initialization.
pub fn default_catalog() -> Vec<Permission> {
    vec![
        Permission::with_id("view_dashboard", "View Dashboard", "Access to dashboard", PermissionCategory::System),
        Permission::with_id("manage_users", "Manage Users", "Create, edit, delete users", PermissionCategory::Users),
        Permission::with_id("manage_roles", "Manage Roles", "Create and modify roles", PermissionCategory::Roles),
        Permission::with_id(
            "manage_permissions",
            "Manage Permissions",
            "Create and modify permissions",
            PermissionCategory::Permissions,
        ),
        Permission::with_id("manage_content", "Manage Content", "Create, edit, delete content", PermissionCategory::Content),
        Permission::with_id(
            "moderate_content",
            "Moderate Content",
            "Review and moderate user content",
            PermissionCategory::Content,
        ),
        Permission::with_id("view_analytics", "View Analytics", "Access analytics and reports", PermissionCategory::Analytics),
        Permission::with_id(
            "manage_settings",
            "Manage Settings",
            "Configure application settings",
            PermissionCategory::Settings,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::SystemRole;

    #[test]
    fn test_category_round_trip() {
        for category in PermissionCategory::all() {
            assert_eq!(PermissionCategory::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_default_catalog_covers_system_roles() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 8);
        for role in SystemRole::all() {
            for id in role.default_permission_ids() {
                assert!(catalog.iter().any(|p| p.id == *id), "missing {}", id);
            }
        }
    }

    #[test]
    fn test_permission_update_apply() {
        let mut perm = Permission::with_id("p", "Old", "", PermissionCategory::System);
        let update = PermissionUpdate {
            name: Some("New".to_string()),
            category: Some(PermissionCategory::Analytics),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut perm, Utc::now());
        assert_eq!(perm.name, "New");
        assert_eq!(perm.category, PermissionCategory::Analytics);
        assert!(PermissionUpdate::default().is_empty());
    }

    #[test]
    fn test_new_permission_generates_id() {
        let a = NewPermission::new("Export", "", PermissionCategory::Users).into_permission();
        let b = NewPermission::new("Export", "", PermissionCategory::Users).into_permission();
        assert_ne!(a.id, b.id);
        assert_eq!(a.category, PermissionCategory::Users);
    }
}

//! Role entities
//!
//! This module defines the Role entity, the system roles seeded at
//! initialization, and the inputs used to create and edit roles.
//!
//! A role carries a legacy `permission_ids` list that points into the
//! permission catalog. That list is display metadata only; enforcement reads
//! the page and operation permission tables keyed by the role id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Roles seeded at initialization.
///
/// System roles cannot be renamed, have their legacy permission list edited,
/// or be deleted. Their page and operation grants remain editable.
///
/// # Examples
///
/// ```
/// use console_org::SystemRole;
///
/// assert_eq!(SystemRole::parse("Moderator"), Some(SystemRole::Moderator));
/// assert_eq!(SystemRole::Admin.as_str(), "admin");
/// assert_eq!(SystemRole::SuperAdmin.default_name(), "super_admin");
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SystemRole {
    /// Distinguished role that bypasses every permission check.
    SuperAdmin,

    /// Full administrative access through explicit grants.
    Admin,

    /// Content moderation access.
    Moderator,

    /// Basic user access.
    User,
}

impl SystemRole {
    /// Get the role id this system role is stored under.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::User => "user",
        }
    }

    /// Parse a system role from its id (case-insensitive).
    ///
    /// # Returns
    ///
    /// `Some(SystemRole)` if valid, `None` otherwise
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "super_admin" | "superadmin" => Some(Self::SuperAdmin),
            "admin" => Some(Self::Admin),
            "moderator" => Some(Self::Moderator),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    /// Get all system roles.
    pub fn all() -> [Self; 4] {
        [Self::SuperAdmin, Self::Admin, Self::Moderator, Self::User]
    }

    /// Name the role is seeded with.
    ///
    /// The super role's name is its identifier, since the bypass rule
    /// matches on the role name.
    pub fn default_name(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "Administrator",
            Self::Moderator => "Moderator",
            Self::User => "User",
        }
    }

    /// Description the role is seeded with.
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "Unrestricted access, exempt from permission checks",
            Self::Admin => "Full system access",
            Self::Moderator => "Content moderation access",
            Self::User => "Basic user access",
        }
    }

    /// Legacy catalog permission ids the role is seeded with.
    pub fn default_permission_ids(&self) -> &'static [&'static str] {
        match self {
            Self::SuperAdmin | Self::Admin => &[
                "view_dashboard",
                "manage_users",
                "manage_roles",
                "manage_permissions",
                "manage_content",
                "moderate_content",
                "view_analytics",
                "manage_settings",
            ],
            Self::Moderator => &["view_dashboard", "moderate_content", "view_analytics"],
            Self::User => &["view_dashboard"],
        }
    }
}

/// A named bundle of access grants assigned to users.
///
/// # Examples
///
/// ```
/// use console_org::Role;
///
/// let role = Role::new("Support", "Answers tickets", ["view_dashboard"]);
/// assert!(!role.is_system_role);
/// assert!(role.permission_ids.contains("view_dashboard"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Role id. Generated for custom roles, fixed for system roles.
    pub id: String,

    /// Display name. Not required to be unique.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: String,

    /// Legacy catalog permission ids (display metadata only).
    #[serde(default)]
    pub permission_ids: BTreeSet<String>,

    /// Whether this role was seeded and is protected.
    #[serde(default)]
    pub is_system_role: bool,

    /// When the role was created.
    pub created_at: DateTime<Utc>,

    /// When the role was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates a new custom role with a generated UUID v7 id.
    pub fn new<I, S>(name: impl Into<String>, description: impl Into<String>, permission_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            description: description.into(),
            permission_ids: permission_ids.into_iter().map(Into::into).collect(),
            is_system_role: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the seeded entity for a system role.
    pub fn system(role: SystemRole) -> Self {
        let now = Utc::now();
        Self {
            id: role.as_str().to_string(),
            name: role.default_name().to_string(),
            description: role.default_description().to_string(),
            permission_ids: role
                .default_permission_ids()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            is_system_role: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The system role this entity represents, if any.
    pub fn system_role(&self) -> Option<SystemRole> {
        if self.is_system_role {
            SystemRole::parse(&self.id)
        } else {
            None
        }
    }
}

/// Input for creating a custom role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewRole {
    /// Display name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Legacy catalog permission ids.
    #[serde(default)]
    pub permission_ids: BTreeSet<String>,
}

impl NewRole {
    /// Create the input.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            permission_ids: BTreeSet::new(),
        }
    }

    /// Set the legacy permission ids.
    pub fn with_permissions<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permission_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Build the role entity.
    pub fn into_role(self) -> Role {
        Role::new(self.name, self.description, self.permission_ids)
    }
}

/// Partial edit of a role. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New legacy permission ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_ids: Option<BTreeSet<String>>,
}

impl RoleUpdate {
    /// Update only the name.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Update only the description.
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Update only the legacy permission ids.
    pub fn permissions<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permission_ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.permission_ids.is_none()
    }

    /// Apply the update to a role, bumping `updated_at`.
    pub fn apply(&self, role: &mut Role, now: DateTime<Utc>) {
        if let Some(ref name) = self.name {
            role.name = name.clone();
        }
        if let Some(ref description) = self.description {
            role.description = description.clone();
        }
        if let Some(ref ids) = self.permission_ids {
            role.permission_ids = ids.clone();
        }
        role.updated_at = now;
    }
}

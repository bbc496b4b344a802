//! User lifecycle models
//!
//! This module provides the managed user record and the status state machine
//! administrators drive it through.
//!
//! ```text
//! active   --deactivate--> inactive --activate--> active
//! active   --ban---------> banned   --unban-----> active
//! inactive --ban---------> banned
//! {active, inactive, banned} --delete--> deleted --restore--> active
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of a user. This is the authoritative field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Normal account.
    #[default]
    Active,
    /// Deactivated by an administrator or by the user.
    Inactive,
    /// Banned by an administrator.
    Banned,
    /// Soft deleted.
    Deleted,
}

impl UserStatus {
    /// Get the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Banned => "banned",
            Self::Deleted => "deleted",
        }
    }

    /// Parse a status (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "banned" => Some(Self::Banned),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Get all statuses.
    pub fn all() -> [Self; 4] {
        [Self::Active, Self::Inactive, Self::Banned, Self::Deleted]
    }

    /// Value of the denormalized `is_active` flag for this status.
    ///
    /// # Examples
    ///
    /// ```
    /// use console_org::UserStatus;
    ///
    /// assert!(UserStatus::Active.is_active_flag());
    /// assert!(UserStatus::Inactive.is_active_flag());
    /// assert!(!UserStatus::Banned.is_active_flag());
    /// assert!(!UserStatus::Deleted.is_active_flag());
    /// ```
    pub fn is_active_flag(&self) -> bool {
        !matches!(self, Self::Banned | Self::Deleted)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrative status transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Reactivate an inactive account.
    Activate,
    /// Deactivate an account.
    Deactivate,
    /// Ban an account.
    Ban,
    /// Lift a ban.
    Unban,
    /// Soft delete an account.
    Delete,
    /// Bring a soft-deleted account back.
    Restore,
}

impl Transition {
    /// Get the string representation of the transition.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Ban => "ban",
            Self::Unban => "unban",
            Self::Delete => "delete",
            Self::Restore => "restore",
        }
    }

    /// Status the user ends up in.
    pub fn target(&self) -> UserStatus {
        match self {
            Self::Activate | Self::Unban | Self::Restore => UserStatus::Active,
            Self::Deactivate => UserStatus::Inactive,
            Self::Ban => UserStatus::Banned,
            Self::Delete => UserStatus::Deleted,
        }
    }

    /// Whether the transition may start from `from`.
    ///
    /// Activate, deactivate and ban tolerate being applied to a user already
    /// in the target status. Unban requires a ban, restore requires a soft
    /// delete, and a deleted user can only be restored.
    ///
    /// # Examples
    ///
    /// ```
    /// use console_org::{Transition, UserStatus};
    ///
    /// assert!(Transition::Ban.allowed_from(UserStatus::Inactive));
    /// assert!(!Transition::Unban.allowed_from(UserStatus::Active));
    /// assert!(!Transition::Activate.allowed_from(UserStatus::Deleted));
    /// ```
    pub fn allowed_from(&self, from: UserStatus) -> bool {
        use UserStatus::*;
        match self {
            Self::Activate => matches!(from, Active | Inactive),
            Self::Deactivate => matches!(from, Active | Inactive),
            Self::Ban => matches!(from, Active | Inactive | Banned),
            Self::Unban => matches!(from, Banned),
            Self::Delete => matches!(from, Active | Inactive | Banned),
            Self::Restore => matches!(from, Deleted),
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

/// A user record with the management fields the console maintains.
///
/// # Examples
///
/// ```
/// use console_org::{UserRecord, UserStatus};
///
/// let user = UserRecord::new("ada@example.com", "Ada", "user");
/// assert_eq!(user.status, UserStatus::Active);
/// assert!(user.is_active);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    /// User id.
    pub id: String,

    /// Email address.
    pub email: String,

    /// Display name.
    pub name: String,

    /// Role id.
    pub role: String,

    /// Lifecycle status.
    #[serde(default)]
    pub status: UserStatus,

    /// Denormalized flag, kept equal to `status.is_active_flag()`.
    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Last successful sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,

    /// Number of successful sign-ins.
    #[serde(default)]
    pub login_count: u64,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last modified.
    pub updated_at: DateTime<Utc>,

    /// When the user was last banned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_at: Option<DateTime<Utc>>,

    /// When the user was soft deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Who soft deleted the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,

    /// When the user was restored from a soft delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_at: Option<DateTime<Utc>>,

    /// Who restored the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_by: Option<String>,
}

impl UserRecord {
    /// Creates a new active user with a generated UUID v7 id.
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            email: email.into(),
            name: name.into(),
            role: role.into(),
            status: UserStatus::Active,
            is_active: true,
            last_login: None,
            login_count: 0,
            created_at: now,
            updated_at: now,
            banned_at: None,
            deleted_at: None,
            deleted_by: None,
            restored_at: None,
            restored_by: None,
        }
    }

    /// Set the user id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the status, keeping `is_active` in step.
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self.is_active = status.is_active_flag();
        self
    }

    /// Apply a transition, stamping its timestamp fields.
    ///
    /// Does not validate `allowed_from`; callers decide whether the
    /// transition is legal.
    pub fn apply(&mut self, transition: Transition, actor_id: &str, now: DateTime<Utc>) {
        let status = transition.target();
        self.status = status;
        self.is_active = status.is_active_flag();
        self.updated_at = now;
        match transition {
            Transition::Ban => self.banned_at = Some(now),
            Transition::Delete => {
                self.deleted_at = Some(now);
                self.deleted_by = Some(actor_id.to_string());
            }
            Transition::Restore => {
                self.restored_at = Some(now);
                self.restored_by = Some(actor_id.to_string());
            }
            Transition::Activate | Transition::Deactivate | Transition::Unban => {}
        }
    }

    /// Record a successful sign-in.
    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login = Some(now);
        self.login_count += 1;
        self.updated_at = now;
    }

    /// Check whether the name or email contains a term (case-insensitive).
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.email.to_lowercase().contains(&term)
    }
}

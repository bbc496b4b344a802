//! Audit and activity entries
//!
//! Two separate trails are kept for every administrative mutation:
//! - **Admin audit log**: who did what to whom, queried by administrators
//! - **Activity log**: the affected user's own visible history
//!
//! Entries are append-only and never edited after they are written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Administrative actions recorded in the audit log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    /// A user's role was changed.
    UpdateRole,
    /// A user was deactivated.
    Deactivate,
    /// A user was activated or restored.
    Activate,
    /// A user was banned.
    Ban,
    /// A user's ban was lifted.
    Unban,
    /// A user was soft or permanently deleted.
    Delete,
}

impl AdminAction {
    /// Get the wire representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateRole => "UPDATE_ROLE",
            Self::Deactivate => "DEACTIVATE",
            Self::Activate => "ACTIVATE",
            Self::Ban => "BAN",
            Self::Unban => "UNBAN",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the admin audit trail.
///
/// # Examples
///
/// ```
/// use console_org::{AdminAction, AdminAuditLog};
///
/// let entry = AdminAuditLog::new("admin-1", AdminAction::Ban, "user-1", "u@example.com")
///     .with_change("status", "banned")
///     .with_reason(Some("spam"));
/// assert_eq!(entry.changes["status"], "banned");
/// assert_eq!(entry.reason.as_deref(), Some("spam"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminAuditLog {
    /// Entry id.
    pub id: String,
    /// Administrator who performed the action.
    pub admin_id: String,
    /// What was done.
    pub action: AdminAction,
    /// User the action was applied to.
    pub target_user_id: String,
    /// Email of the target at the time of the action.
    pub target_email: String,
    /// Field changes, e.g. `{"status": "banned"}` or `{"oldRole": .., "newRole": ..}`.
    #[serde(default)]
    pub changes: BTreeMap<String, serde_json::Value>,
    /// Free-text reason given by the administrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
}

impl AdminAuditLog {
    /// Create an entry stamped now with a UUID v7 id.
    pub fn new(
        admin_id: impl Into<String>,
        action: AdminAction,
        target_user_id: impl Into<String>,
        target_email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            admin_id: admin_id.into(),
            action,
            target_user_id: target_user_id.into(),
            target_email: target_email.into(),
            changes: BTreeMap::new(),
            reason: None,
            timestamp: Utc::now(),
        }
    }

    /// Add a field change.
    pub fn with_change(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.changes.insert(key.into(), value.into());
        self
    }

    /// Set the reason. Empty strings count as no reason.
    pub fn with_reason(mut self, reason: Option<impl Into<String>>) -> Self {
        self.reason = reason.map(Into::into).filter(|r: &String| !r.trim().is_empty());
        self
    }
}

/// Events recorded in a user's own activity history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    /// Role changed by an administrator.
    RoleChanged,
    /// Account deactivated.
    AccountDeactivated,
    /// Account activated.
    AccountActivated,
    /// Account banned.
    AccountBanned,
    /// Account unbanned.
    AccountUnbanned,
    /// Account soft deleted.
    AccountDeleted,
    /// Account restored from a soft delete.
    AccountRestored,
}

impl ActivityAction {
    /// Get the wire representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleChanged => "ROLE_CHANGED",
            Self::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            Self::AccountActivated => "ACCOUNT_ACTIVATED",
            Self::AccountBanned => "ACCOUNT_BANNED",
            Self::AccountUnbanned => "ACCOUNT_UNBANNED",
            Self::AccountDeleted => "ACCOUNT_DELETED",
            Self::AccountRestored => "ACCOUNT_RESTORED",
        }
    }
}

/// One entry of a user's activity history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityLogEntry {
    /// Entry id.
    pub id: String,
    /// User the entry belongs to.
    pub user_id: String,
    /// What happened.
    pub action: ActivityAction,
    /// Human-readable details.
    pub details: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

impl ActivityLogEntry {
    /// Create an entry stamped now with a UUID v7 id.
    pub fn new(user_id: impl Into<String>, action: ActivityAction, details: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            action,
            details: details.into(),
            timestamp: Utc::now(),
        }
    }
}

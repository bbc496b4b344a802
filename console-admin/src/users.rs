//! User directory
//!
//! Storage and admin-side reads of managed user records. List reads are
//! fail-soft and ordered newest account first.

use crate::collections;
use crate::error::{AdminError, AdminResult};
use chrono::{DateTime, Utc};
use console_org::{UserRecord, UserStatus};
use console_store::{DocumentStore, Filter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Header row of the user export.
pub const EXPORT_HEADER: &str = "ID,Name,Email,Role,Status,Login Count,Created At,Last Login";

/// Criteria for [`UserDirectory::advanced_search_users`]. Unset fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFilter {
    /// Substring of name or email (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    /// Role id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Lifecycle status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    /// Created at or after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
    /// Created at or before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,
    /// Last signed in at or after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_after: Option<DateTime<Utc>>,
    /// Last signed in at or before.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_before: Option<DateTime<Utc>>,
}

impl UserFilter {
    /// Check whether a user satisfies every set criterion.
    ///
    /// Users that never signed in fail any login bound.
    pub fn matches(&self, user: &UserRecord) -> bool {
        if let Some(term) = self.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            if !user.matches_term(term) {
                return false;
            }
        }
        if self.role.as_deref().is_some_and(|role| user.role != role) {
            return false;
        }
        if self.status.is_some_and(|status| user.status != status) {
            return false;
        }
        if self.created_after.is_some_and(|t| user.created_at < t) {
            return false;
        }
        if self.created_before.is_some_and(|t| user.created_at > t) {
            return false;
        }
        if let Some(after) = self.login_after {
            if !user.last_login.is_some_and(|t| t >= after) {
                return false;
            }
        }
        if let Some(before) = self.login_before {
            if !user.last_login.is_some_and(|t| t <= before) {
                return false;
            }
        }
        true
    }
}

/// User counts for the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserStats {
    /// All users, deleted included.
    pub total: usize,
    /// Users with status `active`.
    pub active: usize,
    /// Users with status `inactive`.
    pub inactive: usize,
    /// Users with status `banned`.
    pub banned: usize,
    /// Users with status `deleted`.
    pub deleted: usize,
    /// Users per role id.
    pub by_role: BTreeMap<String, usize>,
}

/// Directory of managed user records.
pub struct UserDirectory {
    store: Arc<dyn DocumentStore>,
}

impl UserDirectory {
    /// Create a directory.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Store a new user record.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn create_user(&self, user: UserRecord) -> AdminResult<UserRecord> {
        if user.email.trim().is_empty() {
            return Err(AdminError::Validation("email must not be empty".to_string()));
        }
        if user.role.trim().is_empty() {
            return Err(AdminError::Validation("role must not be empty".to_string()));
        }
        if self.store.get(collections::USERS, &user.id).await?.is_some() {
            return Err(AdminError::Validation(format!("user {} already exists", user.id)));
        }

        self.save_user(&user).await?;
        info!("User created");
        Ok(user)
    }

    /// Get a user by id.
    pub async fn get_user(&self, user_id: &str) -> AdminResult<UserRecord> {
        self.find_user(user_id)
            .await?
            .ok_or_else(|| AdminError::UserNotFound(user_id.to_string()))
    }

    /// Get a user by id, `None` when absent.
    pub async fn find_user(&self, user_id: &str) -> AdminResult<Option<UserRecord>> {
        match self.store.get(collections::USERS, user_id).await? {
            Some(doc) => Ok(Some(doc.parse()?)),
            None => Ok(None),
        }
    }

    /// Record a successful sign-in.
    pub async fn record_login(&self, user_id: &str) -> AdminResult<UserRecord> {
        let mut user = self.get_user(user_id).await?;
        user.record_login(Utc::now());
        self.save_user(&user).await?;
        debug!(user_id = %user_id, login_count = user.login_count, "Login recorded");
        Ok(user)
    }

    /// All users. Store errors yield an empty list.
    pub async fn get_all_users_for_admin(&self) -> Vec<UserRecord> {
        self.load_soft(&[], "Failed to get users").await
    }

    /// Users whose name or email contains `term`. A blank term lists everyone.
    pub async fn search_users_for_admin(&self, term: &str) -> Vec<UserRecord> {
        let term = term.trim();
        let users = self.get_all_users_for_admin().await;
        if term.is_empty() {
            return users;
        }
        users.into_iter().filter(|u| u.matches_term(term)).collect()
    }

    /// Users matching every criterion of `filter`.
    pub async fn advanced_search_users(&self, filter: &UserFilter) -> Vec<UserRecord> {
        self.get_all_users_for_admin()
            .await
            .into_iter()
            .filter(|u| filter.matches(u))
            .collect()
    }

    /// Users in one status.
    pub async fn get_users_by_status(&self, status: UserStatus) -> Vec<UserRecord> {
        self.load_soft(&[Filter::eq("status", status.as_str())], "Failed to get users by status")
            .await
    }

    /// Users assigned to one role id.
    pub async fn get_users_by_role(&self, role_id: &str) -> Vec<UserRecord> {
        self.load_soft(&[Filter::eq("role", role_id)], "Failed to get users by role")
            .await
    }

    /// Status and role counts. Store errors yield zeroed stats.
    pub async fn get_user_stats_for_admin(&self) -> UserStats {
        let users = self.get_all_users_for_admin().await;
        let mut stats = UserStats {
            total: users.len(),
            ..UserStats::default()
        };
        for user in &users {
            match user.status {
                UserStatus::Active => stats.active += 1,
                UserStatus::Inactive => stats.inactive += 1,
                UserStatus::Banned => stats.banned += 1,
                UserStatus::Deleted => stats.deleted += 1,
            }
            *stats.by_role.entry(user.role.clone()).or_default() += 1;
        }
        stats
    }

    /// Export users as CSV, optionally restricted to `user_ids`.
    ///
    /// Every cell is quoted; embedded quotes are doubled.
    #[instrument(skip(self, user_ids))]
    pub async fn export_users_data(&self, user_ids: Option<&[String]>) -> AdminResult<String> {
        let mut users = self.load(&[]).await?;
        if let Some(ids) = user_ids {
            let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
            users.retain(|u| wanted.contains(u.id.as_str()));
        }

        let mut lines = Vec::with_capacity(users.len() + 1);
        lines.push(EXPORT_HEADER.to_string());
        for user in &users {
            let last_login = user
                .last_login
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "Never".to_string());
            let cells = [
                user.id.clone(),
                user.name.clone(),
                user.email.clone(),
                user.role.clone(),
                user.status.as_str().to_string(),
                user.login_count.to_string(),
                user.created_at.to_rfc3339(),
                last_login,
            ];
            lines.push(cells.iter().map(|c| quote_cell(c)).collect::<Vec<_>>().join(","));
        }

        info!(rows = users.len(), "Users exported");
        Ok(lines.join("\n"))
    }

    pub(crate) async fn save_user(&self, user: &UserRecord) -> AdminResult<()> {
        let data = console_store::to_document(user)?;
        self.store.set(collections::USERS, &user.id, data).await?;
        Ok(())
    }

    pub(crate) async fn remove_user(&self, user_id: &str) -> AdminResult<()> {
        self.store.delete(collections::USERS, user_id).await?;
        Ok(())
    }

    async fn load(&self, filters: &[Filter]) -> AdminResult<Vec<UserRecord>> {
        let docs = if filters.is_empty() {
            self.store.list(collections::USERS).await?
        } else {
            self.store.query(collections::USERS, filters).await?
        };
        let mut users: Vec<UserRecord> = console_store::parse_documents(&docs)?;
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn load_soft(&self, filters: &[Filter], message: &str) -> Vec<UserRecord> {
        match self.load(filters).await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, "{}", message);
                Vec::new()
            }
        }
    }
}

fn quote_cell(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

//! Audit and activity trails
//!
//! Both trails are append-only and best-effort: write failures are logged and
//! discarded so they never fail the mutation they describe. Reads are
//! fail-soft and return entries newest first.

use crate::collections;
use crate::error::AdminResult;
use console_org::{ActivityAction, ActivityLogEntry, AdminAuditLog};
use console_store::{DocumentStore, Filter, WriteBatch, MAX_BATCH_OPERATIONS};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Admin audit trail.
pub struct AuditLog {
    store: Arc<dyn DocumentStore>,
    retention: Option<usize>,
    default_limit: usize,
}

impl AuditLog {
    /// Create an unbounded audit log.
    pub fn new(store: Arc<dyn DocumentStore>, default_limit: usize) -> Self {
        Self {
            store,
            retention: None,
            default_limit,
        }
    }

    /// Keep at most `max_entries`, pruning the oldest after each append.
    pub fn with_retention(mut self, max_entries: Option<usize>) -> Self {
        self.retention = max_entries;
        self
    }

    /// Append an entry. Failures are logged and discarded.
    pub async fn log_admin_action(&self, entry: AdminAuditLog) {
        let action = entry.action;
        if let Err(e) = self.append(&entry).await {
            error!(
                action = %action,
                admin_id = %entry.admin_id,
                target_user_id = %entry.target_user_id,
                error = %e,
                "Failed to write admin audit log"
            );
            return;
        }
        debug!(action = %action, target_user_id = %entry.target_user_id, "Admin action logged");

        if let Some(max) = self.retention {
            if let Err(e) = self.prune(max).await {
                warn!(error = %e, "Failed to prune admin audit log");
            }
        }
    }

    /// Entries newest first, optionally for one administrator.
    ///
    /// `limit` defaults to the configured audit limit. Store errors yield an
    /// empty list.
    pub async fn get_admin_audit_logs(&self, admin_id: Option<&str>, limit: Option<usize>) -> Vec<AdminAuditLog> {
        let filters: Vec<Filter> = admin_id.map(|id| Filter::eq("admin_id", id)).into_iter().collect();
        self.read(&filters, limit).await
    }

    /// Entries about one target user, newest first. Store errors yield an empty list.
    pub async fn get_audit_logs_for_user(&self, target_user_id: &str, limit: Option<usize>) -> Vec<AdminAuditLog> {
        self.read(&[Filter::eq("target_user_id", target_user_id)], limit).await
    }

    async fn read(&self, filters: &[Filter], limit: Option<usize>) -> Vec<AdminAuditLog> {
        match self.load(filters).await {
            Ok(mut entries) => {
                entries.truncate(limit.unwrap_or(self.default_limit));
                entries
            }
            Err(e) => {
                warn!(error = %e, "Failed to read admin audit log");
                Vec::new()
            }
        }
    }

    async fn append(&self, entry: &AdminAuditLog) -> AdminResult<()> {
        let data = console_store::to_document(entry)?;
        self.store.set(collections::AUDIT_LOGS, &entry.id, data).await?;
        Ok(())
    }

    async fn load(&self, filters: &[Filter]) -> AdminResult<Vec<AdminAuditLog>> {
        let docs = if filters.is_empty() {
            self.store.list(collections::AUDIT_LOGS).await?
        } else {
            self.store.query(collections::AUDIT_LOGS, filters).await?
        };
        let mut entries: Vec<AdminAuditLog> = console_store::parse_documents(&docs)?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn prune(&self, max: usize) -> AdminResult<usize> {
        let entries = self.load(&[]).await?;
        if entries.len() <= max {
            return Ok(0);
        }

        let expired: Vec<&AdminAuditLog> = entries.iter().skip(max).collect();
        for chunk in expired.chunks(MAX_BATCH_OPERATIONS) {
            let mut batch = WriteBatch::new();
            for entry in chunk {
                batch.delete(collections::AUDIT_LOGS, entry.id.as_str());
            }
            self.store.commit(batch).await?;
        }

        info!(pruned = expired.len(), retained = max, "Admin audit log pruned");
        Ok(expired.len())
    }
}

/// Per-user activity history.
pub struct ActivityLog {
    store: Arc<dyn DocumentStore>,
}

impl ActivityLog {
    /// Create an activity log.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append an entry. Failures are logged and discarded.
    pub async fn log_activity(&self, user_id: &str, action: ActivityAction, details: impl Into<String>) {
        let entry = ActivityLogEntry::new(user_id, action, details);
        let result = match console_store::to_document(&entry) {
            Ok(data) => self.store.set(collections::ACTIVITY_LOGS, &entry.id, data).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!(user_id = %user_id, action = action.as_str(), error = %e, "Failed to write activity log");
        }
    }

    /// A user's entries, newest first. Store errors yield an empty list.
    pub async fn get_user_activity(&self, user_id: &str, limit: usize) -> Vec<ActivityLogEntry> {
        let result = self
            .store
            .query(collections::ACTIVITY_LOGS, &[Filter::eq("user_id", user_id)])
            .await
            .and_then(|docs| console_store::parse_documents::<ActivityLogEntry>(&docs));

        match result {
            Ok(mut entries) => {
                entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
                entries.truncate(limit);
                entries
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to read activity log");
                Vec::new()
            }
        }
    }
}

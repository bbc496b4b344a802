//! Console configuration.
//!
//! Centralizes the policy switches of the RBAC services. Configuration is
//! loaded from environment variables with defaults that match the behavior of
//! a freshly installed console.

use console_rbac::DEFAULT_SUPER_ROLE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Policy configuration for the console services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Name of the role that bypasses every permission check (case-insensitive).
    pub super_role_name: String,

    /// Reject custom roles whose name matches an existing role.
    pub unique_role_names: bool,

    /// Delete a role's page and operation grants together with the role.
    pub cascade_role_deletion: bool,

    /// Maximum number of audit entries kept. `None` keeps everything.
    pub audit_retention: Option<usize>,

    /// Number of audit entries returned when the caller gives no limit.
    pub default_audit_limit: usize,

    /// Session lifetime in seconds.
    pub session_ttl_secs: u64,

    /// Secret mixed into password hashes.
    #[serde(default, skip_serializing)]
    pub password_key: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            super_role_name: DEFAULT_SUPER_ROLE.to_string(),
            unique_role_names: false,
            cascade_role_deletion: false,
            audit_retention: None,
            default_audit_limit: 100,
            session_ttl_secs: 86_400,
            password_key: None,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CONSOLE_SUPER_ROLE`: Super role name (default: super_admin)
    /// - `CONSOLE_UNIQUE_ROLE_NAMES`: Reject duplicate role names (default: false)
    /// - `CONSOLE_CASCADE_ROLE_DELETE`: Delete grants with their role (default: false)
    /// - `CONSOLE_AUDIT_RETENTION`: Maximum audit entries kept (default: unbounded)
    /// - `CONSOLE_AUDIT_LIMIT`: Default audit query limit (default: 100)
    /// - `CONSOLE_SESSION_TTL_SECS`: Session lifetime (default: 86400)
    /// - `CONSOLE_PASSWORD_KEY`: Password hashing secret
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            super_role_name: std::env::var("CONSOLE_SUPER_ROLE").unwrap_or(default.super_role_name),
            unique_role_names: std::env::var("CONSOLE_UNIQUE_ROLE_NAMES")
                .map(|s| parse_flag(&s))
                .unwrap_or(default.unique_role_names),
            cascade_role_deletion: std::env::var("CONSOLE_CASCADE_ROLE_DELETE")
                .map(|s| parse_flag(&s))
                .unwrap_or(default.cascade_role_deletion),
            audit_retention: std::env::var("CONSOLE_AUDIT_RETENTION")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(default.audit_retention),
            default_audit_limit: std::env::var("CONSOLE_AUDIT_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.default_audit_limit),
            session_ttl_secs: std::env::var("CONSOLE_SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.session_ttl_secs),
            password_key: std::env::var("CONSOLE_PASSWORD_KEY").ok(),
        }
    }

    /// Set the super role name.
    pub fn with_super_role(mut self, name: impl Into<String>) -> Self {
        self.super_role_name = name.into();
        self
    }

    /// Enable or disable unique role names.
    pub fn with_unique_role_names(mut self, enabled: bool) -> Self {
        self.unique_role_names = enabled;
        self
    }

    /// Enable or disable cascade deletion of grants.
    pub fn with_cascade_role_deletion(mut self, enabled: bool) -> Self {
        self.cascade_role_deletion = enabled;
        self
    }

    /// Set the audit retention.
    pub fn with_audit_retention(mut self, max_entries: usize) -> Self {
        self.audit_retention = Some(max_entries);
        self
    }

    /// Get the session lifetime as a Duration.
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Check the values for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.super_role_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "CONSOLE_SUPER_ROLE".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.audit_retention == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "CONSOLE_AUDIT_RETENTION".to_string(),
                message: "must keep at least one entry".to_string(),
            });
        }
        if self.default_audit_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CONSOLE_AUDIT_LIMIT".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CONSOLE_SESSION_TTL_SECS".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Validate that all required configuration is present for production.
    ///
    /// In production, the password hashing key must be configured.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        self.validate()?;
        match self.password_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(ConfigError::MissingEnvVar("CONSOLE_PASSWORD_KEY".to_string())),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConsoleConfig::default();
        assert_eq!(config.super_role_name, "super_admin");
        assert!(!config.unique_role_names);
        assert!(!config.cascade_role_deletion);
        assert_eq!(config.audit_retention, None);
        assert_eq!(config.default_audit_limit, 100);
        assert_eq!(config.session_ttl(), Duration::from_secs(86_400));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ConsoleConfig::default().with_super_role("  ");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let config = ConsoleConfig::default().with_audit_retention(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_for_production_requires_key() {
        let mut config = ConsoleConfig::default();
        assert!(matches!(
            config.validate_for_production(),
            Err(ConfigError::MissingEnvVar(_))
        ));

        config.password_key = Some("secret".to_string());
        assert!(config.validate_for_production().is_ok());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" YES "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("0"));
    }

    #[test]
    fn test_password_key_is_not_serialized() {
        let mut config = ConsoleConfig::default();
        config.password_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}

//! # CRUD Operations
//!
//! Defines the four page-level operations a role can be granted.
//! Operations are independent grants: none of them implies another.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations that can be granted on a console page.
///
/// Unlike coarse-grained action models there is no implication between
/// operations: a role holding `Read` on a page cannot create, update or delete
/// on it unless those operations are granted separately.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrudOperation {
    /// Create new records from the page.
    Create,

    /// View the page and its records.
    Read,

    /// Modify existing records from the page.
    Update,

    /// Remove records from the page.
    Delete,
}

impl CrudOperation {
    /// Get the wire representation of the operation.
    ///
    /// # Returns
    ///
    /// The upper-case name stored in permission rows (e.g. `"READ"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudOperation::Create => "CREATE",
            CrudOperation::Read => "READ",
            CrudOperation::Update => "UPDATE",
            CrudOperation::Delete => "DELETE",
        }
    }

    /// Parse an operation from its string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive, supports common aliases)
    ///
    /// # Returns
    ///
    /// `Some(CrudOperation)` if valid, `None` otherwise
    ///
    /// # Example
    ///
    /// ```
    /// use console_rbac::operations::CrudOperation;
    ///
    /// assert_eq!(CrudOperation::parse("READ"), Some(CrudOperation::Read));
    /// assert_eq!(CrudOperation::parse("view"), Some(CrudOperation::Read));
    /// assert_eq!(CrudOperation::parse("edit"), Some(CrudOperation::Update));
    /// assert_eq!(CrudOperation::parse("manage"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "create" | "add" | "new" => Some(CrudOperation::Create),
            "read" | "view" | "get" => Some(CrudOperation::Read),
            "update" | "edit" | "write" | "modify" => Some(CrudOperation::Update),
            "delete" | "remove" => Some(CrudOperation::Delete),
            _ => None,
        }
    }

    /// Get all operations in canonical order.
    pub fn all() -> [Self; 4] {
        [
            CrudOperation::Create,
            CrudOperation::Read,
            CrudOperation::Update,
            CrudOperation::Delete,
        ]
    }

    /// Check if this operation modifies data.
    pub fn is_write(&self) -> bool {
        !matches!(self, CrudOperation::Read)
    }
}

impl fmt::Display for CrudOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_parsing() {
        assert_eq!(CrudOperation::parse("CREATE"), Some(CrudOperation::Create));
        assert_eq!(CrudOperation::parse("create"), Some(CrudOperation::Create));
        assert_eq!(CrudOperation::parse("add"), Some(CrudOperation::Create));

        assert_eq!(CrudOperation::parse("Read"), Some(CrudOperation::Read));
        assert_eq!(CrudOperation::parse("view"), Some(CrudOperation::Read));

        assert_eq!(CrudOperation::parse("update"), Some(CrudOperation::Update));
        assert_eq!(CrudOperation::parse(" write "), Some(CrudOperation::Update));

        assert_eq!(CrudOperation::parse("delete"), Some(CrudOperation::Delete));
        assert_eq!(CrudOperation::parse("remove"), Some(CrudOperation::Delete));

        assert_eq!(CrudOperation::parse("manage"), None);
        assert_eq!(CrudOperation::parse(""), None);
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&CrudOperation::Delete).unwrap();
        assert_eq!(json, "\"DELETE\"");

        let parsed: CrudOperation = serde_json::from_str("\"UPDATE\"").unwrap();
        assert_eq!(parsed, CrudOperation::Update);
    }

    #[test]
    fn test_display_matches_as_str() {
        for op in CrudOperation::all() {
            assert_eq!(op.to_string(), op.as_str());
        }
    }

    #[test]
    fn test_is_write() {
        assert!(!CrudOperation::Read.is_write());
        assert!(CrudOperation::Create.is_write());
        assert!(CrudOperation::Update.is_write());
        assert!(CrudOperation::Delete.is_write());
    }
}

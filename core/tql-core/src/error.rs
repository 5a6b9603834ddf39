//! Error types for the TQL query layer.
//!
//! All public APIs return `TqlResult<T>` — no panics in library code.
//! Contract violations are raised locally; store failures pass through
//! unchanged inside [`TqlError::Store`].

use crate::storage::StoreError;
use thiserror::Error;

/// Unified error type for all TQL operations.
#[derive(Debug, Error)]
pub enum TqlError {
    /// Operation invoked on a transaction handle that is not active
    #[error("no active transaction context")]
    NoTransactionContext,

    /// Record field list does not match the table's attribute list
    #[error("schema mismatch for table '{table}': expected attributes {expected:?}, got {actual:?}")]
    SchemaMismatch {
        table: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    /// Tuple shape does not match the table (length or tag)
    #[error("malformed tuple for table '{table}': {reason}")]
    MalformedTuple { table: String, reason: String },

    /// Lock kind not allowed for the requested operation
    #[error("invalid lock '{lock}' for operation '{operation}'")]
    InvalidLock {
        operation: &'static str,
        lock: &'static str,
    },

    /// Guard or projection references an attribute bound to a plain wildcard
    #[error("attribute '{attribute}' of table '{table}' is not addressable (plain wildcard)")]
    UnboundGuardAttribute { table: String, attribute: String },

    /// Attribute name not declared by the table
    #[error("table '{table}' has no attribute '{attribute}'")]
    UnknownAttribute { table: String, attribute: String },

    /// Requested table is not registered
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// Table already registered
    #[error("table '{0}' already exists")]
    TableExists(String),

    /// Value kind differs from the field's Rust type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Schema definition error
    #[error("schema error: {0}")]
    Schema(String),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// Failure reported by the underlying store, unchanged
    #[error("store error: {source}")]
    Store {
        #[from]
        source: StoreError,
    },
}

impl TqlError {
    /// `true` when the transaction may succeed if the caller restarts it.
    ///
    /// Only store failures can be retryable; local contract violations never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            TqlError::Store { source } => source.is_retryable(),
            _ => false,
        }
    }
}

/// Result type alias for all TQL operations.
pub type TqlResult<T> = Result<T, TqlError>;

impl From<serde_json::Error> for TqlError {
    fn from(err: serde_json::Error) -> Self {
        TqlError::Config(err.to_string())
    }
}

impl From<std::io::Error> for TqlError {
    fn from(err: std::io::Error) -> Self {
        TqlError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_table_not_found() {
        let err = TqlError::TableNotFound("person".to_string());
        assert_eq!(err.to_string(), "table 'person' not found");
    }

    #[test]
    fn error_display_invalid_lock() {
        let err = TqlError::InvalidLock {
            operation: "write",
            lock: "read",
        };
        assert_eq!(err.to_string(), "invalid lock 'read' for operation 'write'");
    }

    #[test]
    fn error_display_unbound_guard() {
        let err = TqlError::UnboundGuardAttribute {
            table: "person".to_string(),
            attribute: "age".to_string(),
        };
        assert!(err.to_string().contains("'age'"));
        assert!(err.to_string().contains("plain wildcard"));
    }

    #[test]
    fn store_errors_keep_retryability() {
        let err: TqlError = StoreError::LockConflict {
            table: "person".to_string(),
            retryable: true,
        }
        .into();
        assert!(err.is_retryable());
        assert!(!TqlError::NoTransactionContext.is_retryable());
    }

    #[test]
    fn tql_result_err() {
        let result: TqlResult<i32> = Err(TqlError::NoTransactionContext);
        assert!(result.is_err());
    }
}

//! Connector error types.

use entity_connector_core::SchemaError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors returned by [`EntityConnector`](crate::EntityConnector).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// A store error that was not absorbed by table recovery.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid table schema: {0}")]
    Schema(#[from] SchemaError),

    /// At least one chunk of a batch write failed. The per-chunk causes are
    /// logged, not carried.
    #[error("Batch {operation} failed for table {table_name}")]
    BatchFailed {
        operation: &'static str,
        table_name: String,
    },

    #[error("Document conversion error: {0}")]
    Document(String),
}

impl ConnectorError {
    /// True when the error is the store reporting a missing table.
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_table_not_found())
    }
}

/// Result type for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_transparent() {
        let error = ConnectorError::from(StoreError::TableNotFound {
            table_name: "users".to_string(),
        });
        assert_eq!(error.to_string(), "Table 'users' not found");
        assert!(error.is_table_not_found());
    }

    #[test]
    fn test_batch_failed_display() {
        let error = ConnectorError::BatchFailed {
            operation: "store_items",
            table_name: "users".to_string(),
        };
        assert_eq!(error.to_string(), "Batch store_items failed for table users");
        assert!(!error.is_table_not_found());
    }

    #[test]
    fn test_schema_error_display() {
        let error = ConnectorError::from(SchemaError::EmptyTableName);
        assert_eq!(
            error.to_string(),
            "Invalid table schema: Table name must not be empty"
        );
    }

    #[test]
    fn test_document_error_display() {
        let error = ConnectorError::Document("expected an object".to_string());
        assert_eq!(
            error.to_string(),
            "Document conversion error: expected an object"
        );
    }
}

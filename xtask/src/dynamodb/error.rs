//! Error types for DynamoDB commands.

use entity_connector::ConnectorError;
use entity_connector_core::SchemaError;
use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur during DynamoDB commands.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Invalid import file: {0}")]
    InvalidImport(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Timeout waiting for table '{table_name}' to become active")]
    TableActivationTimeout { table_name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_import_display() {
        let error = DynamodbError::InvalidImport("expected a JSON array".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid import file: expected a JSON array"
        );
    }

    #[test]
    fn test_activation_timeout_display() {
        let error = DynamodbError::TableActivationTimeout {
            table_name: "users".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Timeout waiting for table 'users' to become active"
        );
    }
}

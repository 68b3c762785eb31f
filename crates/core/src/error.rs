use thiserror::Error;

/// Errors that can occur when building a table descriptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Table name must not be empty")]
    EmptyTableName,
    #[error("Key attribute name must not be empty")]
    EmptyKeyName,
    #[error("Sort key '{0}' must differ from the partition key")]
    DuplicateKeyName(String),
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

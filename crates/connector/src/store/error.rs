use thiserror::Error;

/// Errors reported by a [`TableStore`](super::TableStore).
///
/// `TableNotFound` is the only variant the connector recovers from; every
/// other variant crosses the connector boundary unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Table '{table_name}' not found")]
    TableNotFound { table_name: String },
    #[error("Table '{table_name}' is being created or deleted")]
    TableInUse { table_name: String },
    #[error("Throttled: {0}")]
    Throttled(String),
    #[error("Condition check failed: {0}")]
    ConditionFailed(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    /// True when the failure means the target table does not exist.
    pub fn is_table_not_found(&self) -> bool {
        matches!(self, Self::TableNotFound { .. })
    }

    pub fn is_table_in_use(&self) -> bool {
        matches!(self, Self::TableInUse { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_not_found_display() {
        let error = StoreError::TableNotFound {
            table_name: "users".to_string(),
        };
        assert_eq!(error.to_string(), "Table 'users' not found");
        assert!(error.is_table_not_found());
        assert!(!error.is_table_in_use());
    }

    #[test]
    fn test_service_display() {
        let error = StoreError::Service {
            operation: "GetItem",
            message: "access denied".to_string(),
        };
        assert_eq!(error.to_string(), "GetItem failed: access denied");
        assert!(!error.is_table_not_found());
    }

    #[test]
    fn test_throttled_display() {
        let error = StoreError::Throttled("Throughput exceeded, please retry".to_string());
        assert_eq!(
            error.to_string(),
            "Throttled: Throughput exceeded, please retry"
        );
    }
}

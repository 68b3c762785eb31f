//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to [`StoreError`]. A missing table always becomes
//! `StoreError::TableNotFound` so the connector can recover from it.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{BuildError, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::create_table::CreateTableError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::delete_table::DeleteTableError;
use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use crate::store::StoreError;

const THROUGHPUT_EXCEEDED: &str = "Throughput exceeded, please retry";
const REQUEST_LIMIT_EXCEEDED: &str = "Request limit exceeded, please retry";
const INTERNAL_SERVER_ERROR: &str = "DynamoDB internal server error";

fn table_not_found(table: &str) -> StoreError {
    StoreError::TableNotFound {
        table_name: table.to_string(),
    }
}

fn table_in_use(table: &str) -> StoreError {
    StoreError::TableInUse {
        table_name: table.to_string(),
    }
}

fn service(operation: &'static str, message: &str) -> StoreError {
    StoreError::Service {
        operation,
        message: message.to_string(),
    }
}

/// Classify an error the typed variants do not cover, using its error code.
fn classify<E: ProvideErrorMetadata + Debug>(operation: &'static str, err: E) -> StoreError {
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", err));

    match err.code() {
        Some("ValidationException") => StoreError::Validation(message),
        Some("ThrottlingException") => StoreError::Throttled(message),
        _ => StoreError::Service { operation, message },
    }
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => table_not_found(table),
        GetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        GetItemError::InternalServerError(_) => service("GetItem", INTERNAL_SERVER_ERROR),
        err => classify("GetItem", err),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        PutItemError::ResourceNotFoundException(_) => table_not_found(table),
        PutItemError::ConditionalCheckFailedException(e) => {
            StoreError::ConditionFailed(e.message().unwrap_or("PutItem").to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            service("PutItem", "Item collection size limit exceeded")
        }
        PutItemError::TransactionConflictException(_) => {
            service("PutItem", "Transaction conflict, please retry")
        }
        PutItemError::InternalServerError(_) => service("PutItem", INTERNAL_SERVER_ERROR),
        err => classify("PutItem", err),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => table_not_found(table),
        DeleteItemError::ConditionalCheckFailedException(e) => {
            StoreError::ConditionFailed(e.message().unwrap_or("DeleteItem").to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        DeleteItemError::TransactionConflictException(_) => {
            service("DeleteItem", "Transaction conflict, please retry")
        }
        DeleteItemError::InternalServerError(_) => service("DeleteItem", INTERNAL_SERVER_ERROR),
        err => classify("DeleteItem", err),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        UpdateItemError::ResourceNotFoundException(_) => table_not_found(table),
        UpdateItemError::ConditionalCheckFailedException(e) => {
            StoreError::ConditionFailed(e.message().unwrap_or("UpdateItem").to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
            service("UpdateItem", "Item collection size limit exceeded")
        }
        UpdateItemError::TransactionConflictException(_) => {
            service("UpdateItem", "Transaction conflict, please retry")
        }
        UpdateItemError::InternalServerError(_) => service("UpdateItem", INTERNAL_SERVER_ERROR),
        err => classify("UpdateItem", err),
    }
}

/// Map a BatchGetItem SDK error to StoreError.
pub fn map_batch_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        BatchGetItemError::ResourceNotFoundException(_) => table_not_found(table),
        BatchGetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        BatchGetItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        BatchGetItemError::InternalServerError(_) => {
            service("BatchGetItem", INTERNAL_SERVER_ERROR)
        }
        err => classify("BatchGetItem", err),
    }
}

/// Map a BatchWriteItem SDK error to StoreError.
pub fn map_batch_write_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(_) => table_not_found(table),
        BatchWriteItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        BatchWriteItemError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        BatchWriteItemError::ItemCollectionSizeLimitExceededException(_) => {
            service("BatchWriteItem", "Item collection size limit exceeded")
        }
        BatchWriteItemError::InternalServerError(_) => {
            service("BatchWriteItem", INTERNAL_SERVER_ERROR)
        }
        err => classify("BatchWriteItem", err),
    }
}

/// Map a Scan SDK error to StoreError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => table_not_found(table),
        ScanError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        ScanError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        ScanError::InternalServerError(_) => service("Scan", INTERNAL_SERVER_ERROR),
        err => classify("Scan", err),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => table_not_found(table),
        QueryError::ProvisionedThroughputExceededException(_) => {
            StoreError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            StoreError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        QueryError::InternalServerError(_) => service("Query", INTERNAL_SERVER_ERROR),
        err => classify("Query", err),
    }
}

/// Map a CreateTable SDK error to StoreError.
pub fn map_create_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<CreateTableError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        CreateTableError::ResourceInUseException(_) => table_in_use(table),
        CreateTableError::LimitExceededException(_) => {
            StoreError::Throttled("Table operation limit exceeded, please retry".to_string())
        }
        CreateTableError::InternalServerError(_) => service("CreateTable", INTERNAL_SERVER_ERROR),
        err => classify("CreateTable", err),
    }
}

/// Map a DeleteTable SDK error to StoreError.
pub fn map_delete_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteTableError, R>,
    table: &str,
) -> StoreError {
    match err.into_service_error() {
        DeleteTableError::ResourceNotFoundException(_) => table_not_found(table),
        DeleteTableError::ResourceInUseException(_) => table_in_use(table),
        DeleteTableError::LimitExceededException(_) => {
            StoreError::Throttled("Table operation limit exceeded, please retry".to_string())
        }
        DeleteTableError::InternalServerError(_) => service("DeleteTable", INTERNAL_SERVER_ERROR),
        err => classify("DeleteTable", err),
    }
}

/// Map a DescribeTable SDK error. A missing table is `Ok(None)`, not an error.
pub fn map_describe_table_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DescribeTableError, R>,
) -> Result<(), StoreError> {
    match err.into_service_error() {
        DescribeTableError::ResourceNotFoundException(_) => Ok(()),
        DescribeTableError::InternalServerError(_) => {
            Err(service("DescribeTable", INTERNAL_SERVER_ERROR))
        }
        err => Err(classify("DescribeTable", err)),
    }
}

/// Map a request builder error (missing required field) to StoreError.
pub fn map_build_error(err: BuildError) -> StoreError {
    StoreError::InvalidRequest(err.to_string())
}

//! Store backends behind the connector.
//!
//! [`TableStore`] is the call contract the connector needs from the managed
//! store. Backends are selected through feature flags:
//!
//! - `dynamodb` (default): AWS DynamoDB using `aws-sdk-dynamodb`
//! - `inmemory` (default): process-local tables for tests and local development

mod error;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub mod inmemory;

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use entity_connector_core::{TableDescription, TableDescriptor};

use crate::item::{Item, Key};

pub use error::{StoreError, StoreResult};

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;

/// One entry of a batch write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(Key),
}

/// One page of a scan or query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Cursor to pass back as the exclusive start key, `None` on the last page.
    pub last_evaluated_key: Option<Key>,
}

/// Result of a batch get.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchGetOutput {
    /// Items per table name.
    pub responses: HashMap<String, Vec<Item>>,
    pub unprocessed_keys: Vec<Key>,
}

/// Parameters of a full-table scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanRequest {
    pub index_name: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub consistent_read: Option<bool>,
    /// Total number of items to return across all pages.
    pub limit: Option<usize>,
}

impl ScanRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    pub fn projection(mut self, expression: impl Into<String>) -> Self {
        self.projection_expression = Some(expression.into());
        self
    }

    /// Binds an expression attribute name placeholder (`#name`).
    pub fn name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.expression_attribute_names
            .insert(placeholder.into(), attribute.into());
        self
    }

    /// Binds an expression attribute value placeholder (`:value`).
    pub fn value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.expression_attribute_values
            .insert(placeholder.into(), value);
        self
    }

    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = Some(consistent);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Parameters of a key-condition query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    pub key_condition_expression: String,
    pub index_name: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub consistent_read: Option<bool>,
    pub scan_index_forward: Option<bool>,
    /// Total number of items to return across all pages.
    pub limit: Option<usize>,
}

impl QueryRequest {
    pub fn new(key_condition_expression: impl Into<String>) -> Self {
        Self {
            key_condition_expression: key_condition_expression.into(),
            ..Self::default()
        }
    }

    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    pub fn projection(mut self, expression: impl Into<String>) -> Self {
        self.projection_expression = Some(expression.into());
        self
    }

    /// Binds an expression attribute name placeholder (`#name`).
    pub fn name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.expression_attribute_names
            .insert(placeholder.into(), attribute.into());
        self
    }

    /// Binds an expression attribute value placeholder (`:value`).
    pub fn value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.expression_attribute_values
            .insert(placeholder.into(), value);
        self
    }

    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = Some(consistent);
        self
    }

    /// Sort-key order; `false` reads in descending order.
    pub fn forward(mut self, forward: bool) -> Self {
        self.scan_index_forward = Some(forward);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Parameters of a partial update.
///
/// The expression syntax is the store's own; the connector passes it through.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateRequest {
    pub key: Key,
    pub update_expression: String,
    pub condition_expression: Option<String>,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

impl UpdateRequest {
    pub fn new(key: Key, update_expression: impl Into<String>) -> Self {
        Self {
            key,
            update_expression: update_expression.into(),
            ..Self::default()
        }
    }

    pub fn condition(mut self, expression: impl Into<String>) -> Self {
        self.condition_expression = Some(expression.into());
        self
    }

    pub fn name(mut self, placeholder: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.expression_attribute_names
            .insert(placeholder.into(), attribute.into());
        self
    }

    pub fn value(mut self, placeholder: impl Into<String>, value: AttributeValue) -> Self {
        self.expression_attribute_values
            .insert(placeholder.into(), value);
        self
    }

    pub fn values(mut self, values: HashMap<String, AttributeValue>) -> Self {
        self.expression_attribute_values.extend(values);
        self
    }
}

/// Request/response contract of the managed store.
///
/// Every operation addresses a physical table by name. Implementations must
/// report a missing table as [`StoreError::TableNotFound`] so the connector
/// can create it on demand.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetches one item by its full key.
    async fn get_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>>;

    /// Writes an item, replacing any item with the same key.
    async fn put_item(&self, table: &str, item: &Item) -> StoreResult<()>;

    /// Deletes an item and returns its attributes prior to deletion.
    async fn delete_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>>;

    /// Applies a partial update and returns the item after the update.
    async fn update_item(&self, table: &str, request: &UpdateRequest)
        -> StoreResult<Option<Item>>;

    /// Fetches several items of one table in a single request.
    async fn batch_get_item(&self, table: &str, keys: &[Key]) -> StoreResult<BatchGetOutput>;

    /// Sends one batch of puts and deletes; returns the requests the store
    /// did not process.
    async fn batch_write_item(
        &self,
        table: &str,
        requests: &[WriteRequest],
    ) -> StoreResult<Vec<WriteRequest>>;

    /// Reads one scan page of at most `page_limit` items.
    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        page_limit: Option<usize>,
        start_key: Option<&Key>,
    ) -> StoreResult<Page>;

    /// Reads one query page of at most `page_limit` items.
    async fn query(
        &self,
        table: &str,
        request: &QueryRequest,
        page_limit: Option<usize>,
        start_key: Option<&Key>,
    ) -> StoreResult<Page>;

    /// Creates a table from a descriptor whose name is the physical name.
    async fn create_table(&self, descriptor: &TableDescriptor) -> StoreResult<()>;

    async fn delete_table(&self, table: &str) -> StoreResult<()>;

    /// Describes a table, `None` when it does not exist.
    async fn describe_table(&self, table: &str) -> StoreResult<Option<TableDescription>>;
}

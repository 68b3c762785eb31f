//! The entity connector (Imperative Shell).
//!
//! Binds a [`TableStore`] to one table and exposes CRUD, batch, scan and
//! query operations. Every data-plane call goes through missing-table
//! recovery; schema management calls do not.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use entity_connector_core::{
    chunk, should_fetch_next, PageBudget, RecoveryPolicy, TableDescription, TableDescriptor,
    BATCH_GET_LIMIT, BATCH_WRITE_LIMIT,
};
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ConnectorConfig;
use crate::document::{from_item, to_item};
use crate::error::{ConnectorError, Result};
use crate::item::{normalize_item, string_key, Item, Key};
use crate::recovery::{create_and_wait, with_recovery};
use crate::store::{
    QueryRequest, ScanRequest, StoreError, TableStore, UpdateRequest, WriteRequest,
};

#[cfg(feature = "dynamodb")]
use crate::store::DynamoDbStore;

/// Entity-style access to a single table.
///
/// The connector owns its store handle for its whole lifetime and holds no
/// mutable state, so it can be shared across tasks behind an `Arc`.
#[derive(Debug, Clone)]
pub struct EntityConnector<S: TableStore> {
    store: S,
    /// Descriptor renamed to the physical table name.
    descriptor: TableDescriptor,
    recovery: RecoveryPolicy,
}

/// Connector backed by AWS DynamoDB.
#[cfg(feature = "dynamodb")]
pub type DynamoDbConnector = EntityConnector<DynamoDbStore>;

#[cfg(feature = "dynamodb")]
impl EntityConnector<DynamoDbStore> {
    /// Creates a DynamoDB client from `config` and binds it to `descriptor`.
    pub async fn connect(config: &ConnectorConfig, descriptor: TableDescriptor) -> Self {
        let store = DynamoDbStore::connect(config).await;
        Self::new(store, descriptor, config)
    }
}

impl<S: TableStore> EntityConnector<S> {
    /// Binds `store` to the table described by `descriptor`.
    ///
    /// The configured table prefix, if any, is applied to the table name.
    pub fn new(store: S, descriptor: TableDescriptor, config: &ConnectorConfig) -> Self {
        let descriptor = descriptor.with_prefix(config.table_prefix.as_deref());
        tracing::debug!(table = %descriptor.name(), "Entity connector created");
        Self {
            store,
            descriptor,
            recovery: config.recovery,
        }
    }

    /// Physical table name.
    pub fn table_name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.descriptor
    }

    /// Builds a key for this table from string values.
    pub fn key(&self, partition: impl Into<String>, sort: Option<&str>) -> Key {
        string_key(&self.descriptor, partition, sort)
    }

    pub async fn get_item(&self, key: &Key) -> Result<Option<Item>> {
        tracing::debug!(table = %self.table_name(), "GetItem");
        let item = with_recovery(&self.store, &self.descriptor, &self.recovery, || {
            self.store.get_item(self.table_name(), key)
        })
        .await?;
        Ok(item)
    }

    /// Deletes an item and returns its attributes prior to deletion.
    pub async fn delete_item(&self, key: &Key) -> Result<Option<Item>> {
        tracing::debug!(table = %self.table_name(), "DeleteItem");
        let item = with_recovery(&self.store, &self.descriptor, &self.recovery, || {
            self.store.delete_item(self.table_name(), key)
        })
        .await?;
        Ok(item)
    }

    /// Writes an item, replacing any item with the same key.
    ///
    /// Empty strings are stripped from the item before it is written.
    pub async fn store_item(&self, item: Item) -> Result<()> {
        let item = normalize_item(item);
        tracing::debug!(table = %self.table_name(), "PutItem");
        with_recovery(&self.store, &self.descriptor, &self.recovery, || {
            self.store.put_item(self.table_name(), &item)
        })
        .await?;
        Ok(())
    }

    /// Applies an update expression and returns the item after the update.
    pub async fn update_item(
        &self,
        key: Key,
        update_expression: &str,
        expression_values: HashMap<String, AttributeValue>,
    ) -> Result<Option<Item>> {
        let request = UpdateRequest::new(key, update_expression).values(expression_values);
        self.update_item_with(&request).await
    }

    /// Like [`update_item`](Self::update_item), with attribute names and an
    /// optional condition expression.
    pub async fn update_item_with(&self, request: &UpdateRequest) -> Result<Option<Item>> {
        tracing::debug!(table = %self.table_name(), "UpdateItem");
        let item = with_recovery(&self.store, &self.descriptor, &self.recovery, || {
            self.store.update_item(self.table_name(), request)
        })
        .await?;
        Ok(item)
    }

    /// Fetches several items by key.
    ///
    /// Keys are sent in groups of at most 100. Returns `None` when the store
    /// holds none of the requested items. Keys the store leaves unprocessed
    /// are logged and not retried, so a throttled call can return fewer items
    /// than exist.
    pub async fn batch_get(&self, keys: Vec<Key>) -> Result<Option<Vec<Item>>> {
        let mut items = Vec::new();

        for (index, keys) in chunk(keys, BATCH_GET_LIMIT).into_iter().enumerate() {
            tracing::debug!(
                table = %self.table_name(),
                chunk = index,
                keys = keys.len(),
                "BatchGetItem"
            );
            let output = with_recovery(&self.store, &self.descriptor, &self.recovery, || {
                self.store.batch_get_item(self.table_name(), &keys)
            })
            .await?;

            if !output.unprocessed_keys.is_empty() {
                tracing::warn!(
                    table = %self.table_name(),
                    chunk = index,
                    unprocessed = output.unprocessed_keys.len(),
                    "Store left keys unprocessed"
                );
            }

            if let Some(found) = output.responses.get(self.table_name()) {
                items.extend(found.iter().cloned());
            }
        }

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(items))
        }
    }

    /// Writes items in concurrent batches of at most 25.
    ///
    /// Fails with [`ConnectorError::BatchFailed`] when any batch fails. Write
    /// requests the store leaves unprocessed are logged and not retried, and
    /// do not fail the call.
    pub async fn store_items(&self, items: Vec<Item>) -> Result<()> {
        let requests = items
            .into_iter()
            .map(|item| WriteRequest::Put(normalize_item(item)))
            .collect();
        self.batch_write("store_items", requests).await
    }

    /// Deletes items in concurrent batches of at most 25.
    pub async fn delete_items(&self, keys: Vec<Key>) -> Result<()> {
        let requests = keys.into_iter().map(WriteRequest::Delete).collect();
        self.batch_write("delete_items", requests).await
    }

    async fn batch_write(
        &self,
        operation: &'static str,
        requests: Vec<WriteRequest>,
    ) -> Result<()> {
        let chunks = chunk(requests, BATCH_WRITE_LIMIT);
        if chunks.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            table = %self.table_name(),
            operation,
            chunks = chunks.len(),
            "BatchWriteItem"
        );

        let writes = chunks.iter().enumerate().map(|(index, requests)| async move {
            let result = with_recovery(&self.store, &self.descriptor, &self.recovery, || {
                self.store.batch_write_item(self.table_name(), requests)
            })
            .await;
            (index, result)
        });

        let mut failed = false;
        for (index, result) in join_all(writes).await {
            match result {
                Ok(unprocessed) if !unprocessed.is_empty() => {
                    tracing::warn!(
                        table = %self.table_name(),
                        operation,
                        chunk = index,
                        unprocessed = unprocessed.len(),
                        "Store left write requests unprocessed"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::error!(
                        table = %self.table_name(),
                        operation,
                        chunk = index,
                        error = %err,
                        "Batch chunk failed"
                    );
                    failed = true;
                }
            }
        }

        if failed {
            return Err(ConnectorError::BatchFailed {
                operation,
                table_name: self.table_name().to_string(),
            });
        }
        Ok(())
    }

    /// Scans the table, following pagination cursors.
    ///
    /// Stops at the last page or once `request.limit` items are collected.
    pub async fn scan(&self, request: &ScanRequest) -> Result<Vec<Item>> {
        let mut budget = PageBudget::new(request.limit);
        let mut items = Vec::new();
        let mut cursor: Option<Key> = None;

        while !budget.is_exhausted() {
            let page_limit = budget.next_page_limit();
            let start_key = cursor.as_ref();
            let page = with_recovery(&self.store, &self.descriptor, &self.recovery, || {
                self.store
                    .scan(self.table_name(), request, page_limit, start_key)
            })
            .await?;

            let accepted = budget.accept(page.items.len());
            tracing::debug!(
                table = %self.table_name(),
                page_items = page.items.len(),
                collected = budget.collected(),
                "Scan page"
            );
            items.extend(page.items.into_iter().take(accepted));

            cursor = page.last_evaluated_key;
            if !should_fetch_next(cursor.as_ref(), &budget) {
                break;
            }
        }

        Ok(items)
    }

    /// Queries the table, following pagination cursors.
    ///
    /// Stops at the last page or once `request.limit` items are collected.
    pub async fn query(&self, request: &QueryRequest) -> Result<Vec<Item>> {
        let mut budget = PageBudget::new(request.limit);
        let mut items = Vec::new();
        let mut cursor: Option<Key> = None;

        while !budget.is_exhausted() {
            let page_limit = budget.next_page_limit();
            let start_key = cursor.as_ref();
            let page = with_recovery(&self.store, &self.descriptor, &self.recovery, || {
                self.store
                    .query(self.table_name(), request, page_limit, start_key)
            })
            .await?;

            let accepted = budget.accept(page.items.len());
            tracing::debug!(
                table = %self.table_name(),
                page_items = page.items.len(),
                collected = budget.collected(),
                "Query page"
            );
            items.extend(page.items.into_iter().take(accepted));

            cursor = page.last_evaluated_key;
            if !should_fetch_next(cursor.as_ref(), &budget) {
                break;
            }
        }

        Ok(items)
    }

    /// Serializes `value` and stores it as an item.
    pub async fn store_document<T: Serialize>(&self, value: &T) -> Result<()> {
        self.store_item(to_item(value)?).await
    }

    pub async fn get_document<T: DeserializeOwned>(&self, key: &Key) -> Result<Option<T>> {
        match self.get_item(key).await? {
            Some(item) => from_item(item).map(Some),
            None => Ok(None),
        }
    }

    pub async fn store_documents<T: Serialize>(&self, values: &[T]) -> Result<()> {
        let items = values.iter().map(to_item).collect::<Result<Vec<_>>>()?;
        self.store_items(items).await
    }

    /// Creates the table with the descriptor's key schema.
    pub async fn create_table(&self) -> Result<()> {
        tracing::info!(table = %self.table_name(), "Creating table");
        self.store.create_table(&self.descriptor).await?;
        Ok(())
    }

    pub async fn delete_table(&self) -> Result<()> {
        tracing::info!(table = %self.table_name(), "Deleting table");
        self.store.delete_table(self.table_name()).await?;
        Ok(())
    }

    /// Describes the table, `None` when it does not exist.
    pub async fn describe_table(&self) -> Result<Option<TableDescription>> {
        Ok(self.store.describe_table(self.table_name()).await?)
    }

    /// Creates the table unless it exists, then waits until it is active.
    pub async fn ensure_table(&self) -> Result<()> {
        if create_and_wait(&self.store, &self.descriptor, &self.recovery).await {
            Ok(())
        } else {
            Err(StoreError::TableNotFound {
                table_name: self.table_name().to_string(),
            }
            .into())
        }
    }
}

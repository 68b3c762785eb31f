//! DynamoDB backend.
//!
//! Translates [`TableStore`] calls into AWS SDK requests. Requests are passed
//! through as given; normalization, chunking and paging live in the connector.

mod client;
mod error;

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode as SdkBillingMode, DeleteRequest, KeySchemaElement, KeyType,
    KeysAndAttributes, PutRequest, ReturnValue, ScalarAttributeType,
    WriteRequest as SdkWriteRequest,
};
use aws_sdk_dynamodb::Client;
use entity_connector_core::{
    AttributeType, BillingMode, KeyAttribute, TableDescription, TableDescriptor, TableStatus,
};

use crate::config::ConnectorConfig;
use crate::item::{Item, Key};
use crate::store::{
    BatchGetOutput, Page, QueryRequest, ScanRequest, StoreResult, TableStore, UpdateRequest,
    WriteRequest,
};

pub use client::create_client;
use error::{
    map_batch_get_item_error, map_batch_write_item_error, map_build_error, map_create_table_error,
    map_delete_item_error, map_delete_table_error, map_describe_table_error, map_get_item_error,
    map_put_item_error, map_query_error, map_scan_error, map_update_item_error,
};

/// DynamoDB implementation of [`TableStore`].
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a store from an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store with a client built from `config`.
    pub async fn connect(config: &ConnectorConfig) -> Self {
        Self::new(create_client(config).await)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Expression maps are omitted from the request when empty.
fn non_empty<V: Clone>(map: &HashMap<String, V>) -> Option<HashMap<String, V>> {
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}

fn to_sdk_limit(limit: Option<usize>) -> Option<i32> {
    limit.map(|limit| i32::try_from(limit).unwrap_or(i32::MAX))
}

fn to_scalar_type(attribute_type: AttributeType) -> ScalarAttributeType {
    match attribute_type {
        AttributeType::String => ScalarAttributeType::S,
    }
}

fn to_sdk_billing_mode(billing_mode: BillingMode) -> SdkBillingMode {
    match billing_mode {
        BillingMode::PayPerRequest => SdkBillingMode::PayPerRequest,
    }
}

fn key_schema_element(key: &KeyAttribute, key_type: KeyType) -> StoreResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(&key.name)
        .key_type(key_type)
        .build()
        .map_err(map_build_error)
}

fn attribute_definition(key: &KeyAttribute) -> StoreResult<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(&key.name)
        .attribute_type(to_scalar_type(key.attribute_type))
        .build()
        .map_err(map_build_error)
}

fn to_sdk_write_request(request: &WriteRequest) -> StoreResult<SdkWriteRequest> {
    let request = match request {
        WriteRequest::Put(item) => SdkWriteRequest::builder()
            .put_request(
                PutRequest::builder()
                    .set_item(Some(item.clone()))
                    .build()
                    .map_err(map_build_error)?,
            )
            .build(),
        WriteRequest::Delete(key) => SdkWriteRequest::builder()
            .delete_request(
                DeleteRequest::builder()
                    .set_key(Some(key.clone()))
                    .build()
                    .map_err(map_build_error)?,
            )
            .build(),
    };
    Ok(request)
}

fn from_sdk_write_request(request: SdkWriteRequest) -> Option<WriteRequest> {
    match (request.put_request, request.delete_request) {
        (Some(put), _) => Some(WriteRequest::Put(put.item)),
        (None, Some(delete)) => Some(WriteRequest::Delete(delete.key)),
        (None, None) => None,
    }
}

#[async_trait]
impl TableStore for DynamoDbStore {
    async fn get_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .set_key(Some(key.clone()))
            .send()
            .await
            .map_err(|e| map_get_item_error(e, table))?;

        Ok(output.item)
    }

    async fn put_item(&self, table: &str, item: &Item) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(item.clone()))
            .send()
            .await
            .map_err(|e| map_put_item_error(e, table))?;

        Ok(())
    }

    async fn delete_item(&self, table: &str, key: &Key) -> StoreResult<Option<Item>> {
        let output = self
            .client
            .delete_item()
            .table_name(table)
            .set_key(Some(key.clone()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| map_delete_item_error(e, table))?;

        Ok(output.attributes)
    }

    async fn update_item(
        &self,
        table: &str,
        request: &UpdateRequest,
    ) -> StoreResult<Option<Item>> {
        let output = self
            .client
            .update_item()
            .table_name(table)
            .set_key(Some(request.key.clone()))
            .update_expression(&request.update_expression)
            .set_condition_expression(request.condition_expression.clone())
            .set_expression_attribute_names(non_empty(&request.expression_attribute_names))
            .set_expression_attribute_values(non_empty(&request.expression_attribute_values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| map_update_item_error(e, table))?;

        Ok(output.attributes)
    }

    async fn batch_get_item(&self, table: &str, keys: &[Key]) -> StoreResult<BatchGetOutput> {
        let keys_and_attributes = KeysAndAttributes::builder()
            .set_keys(Some(keys.to_vec()))
            .build()
            .map_err(map_build_error)?;

        let output = self
            .client
            .batch_get_item()
            .request_items(table, keys_and_attributes)
            .send()
            .await
            .map_err(|e| map_batch_get_item_error(e, table))?;

        let unprocessed_keys = output
            .unprocessed_keys
            .unwrap_or_default()
            .into_values()
            .flat_map(|pending| pending.keys)
            .collect();

        Ok(BatchGetOutput {
            responses: output.responses.unwrap_or_default(),
            unprocessed_keys,
        })
    }

    async fn batch_write_item(
        &self,
        table: &str,
        requests: &[WriteRequest],
    ) -> StoreResult<Vec<WriteRequest>> {
        let write_requests = requests
            .iter()
            .map(to_sdk_write_request)
            .collect::<StoreResult<Vec<_>>>()?;

        let output = self
            .client
            .batch_write_item()
            .request_items(table, write_requests)
            .send()
            .await
            .map_err(|e| map_batch_write_item_error(e, table))?;

        Ok(output
            .unprocessed_items
            .unwrap_or_default()
            .into_values()
            .flatten()
            .filter_map(from_sdk_write_request)
            .collect())
    }

    async fn scan(
        &self,
        table: &str,
        request: &ScanRequest,
        page_limit: Option<usize>,
        start_key: Option<&Key>,
    ) -> StoreResult<Page> {
        let output = self
            .client
            .scan()
            .table_name(table)
            .set_index_name(request.index_name.clone())
            .set_filter_expression(request.filter_expression.clone())
            .set_projection_expression(request.projection_expression.clone())
            .set_expression_attribute_names(non_empty(&request.expression_attribute_names))
            .set_expression_attribute_values(non_empty(&request.expression_attribute_values))
            .set_consistent_read(request.consistent_read)
            .set_limit(to_sdk_limit(page_limit))
            .set_exclusive_start_key(start_key.cloned())
            .send()
            .await
            .map_err(|e| map_scan_error(e, table))?;

        Ok(Page {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    async fn query(
        &self,
        table: &str,
        request: &QueryRequest,
        page_limit: Option<usize>,
        start_key: Option<&Key>,
    ) -> StoreResult<Page> {
        let output = self
            .client
            .query()
            .table_name(table)
            .key_condition_expression(&request.key_condition_expression)
            .set_index_name(request.index_name.clone())
            .set_filter_expression(request.filter_expression.clone())
            .set_projection_expression(request.projection_expression.clone())
            .set_expression_attribute_names(non_empty(&request.expression_attribute_names))
            .set_expression_attribute_values(non_empty(&request.expression_attribute_values))
            .set_consistent_read(request.consistent_read)
            .set_scan_index_forward(request.scan_index_forward)
            .set_limit(to_sdk_limit(page_limit))
            .set_exclusive_start_key(start_key.cloned())
            .send()
            .await
            .map_err(|e| map_query_error(e, table))?;

        Ok(Page {
            items: output.items.unwrap_or_default(),
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        })
    }

    async fn create_table(&self, descriptor: &TableDescriptor) -> StoreResult<()> {
        let table = descriptor.name();

        let mut key_schema = vec![key_schema_element(
            descriptor.partition_key(),
            KeyType::Hash,
        )?];
        let mut attribute_definitions = vec![attribute_definition(descriptor.partition_key())?];

        if let Some(sk) = descriptor.sort_key() {
            key_schema.push(key_schema_element(sk, KeyType::Range)?);
            attribute_definitions.push(attribute_definition(sk)?);
        }

        self.client
            .create_table()
            .table_name(table)
            .set_key_schema(Some(key_schema))
            .set_attribute_definitions(Some(attribute_definitions))
            .billing_mode(to_sdk_billing_mode(descriptor.billing_mode()))
            .send()
            .await
            .map_err(|e| map_create_table_error(e, table))?;

        Ok(())
    }

    async fn delete_table(&self, table: &str) -> StoreResult<()> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map_err(|e| map_delete_table_error(e, table))?;

        Ok(())
    }

    async fn describe_table(&self, table: &str) -> StoreResult<Option<TableDescription>> {
        let output = match self.client.describe_table().table_name(table).send().await {
            Ok(output) => output,
            Err(e) => {
                map_describe_table_error(e)?;
                return Ok(None);
            }
        };

        Ok(output.table.map(|description| TableDescription {
            table_name: description
                .table_name()
                .map(str::to_string)
                .unwrap_or_else(|| table.to_string()),
            status: description
                .table_status()
                .map(|status| TableStatus::parse(status.as_str()))
                .unwrap_or_else(|| TableStatus::Unknown(String::new())),
            item_count: description.item_count(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;

    fn item(id: &str) -> Item {
        [("id".to_string(), AttributeValue::S(id.to_string()))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_non_empty_omits_empty_maps() {
        let empty: HashMap<String, String> = HashMap::new();
        assert!(non_empty(&empty).is_none());

        let mut names = HashMap::new();
        names.insert("#pk".to_string(), "id".to_string());
        assert_eq!(non_empty(&names), Some(names.clone()));
    }

    #[test]
    fn test_to_sdk_limit_saturates() {
        assert_eq!(to_sdk_limit(None), None);
        assert_eq!(to_sdk_limit(Some(25)), Some(25));
        assert_eq!(to_sdk_limit(Some(usize::MAX)), Some(i32::MAX));
    }

    #[test]
    fn test_write_request_conversion() {
        let put = to_sdk_write_request(&WriteRequest::Put(item("u1"))).unwrap();
        assert!(put.put_request().is_some());
        assert!(put.delete_request().is_none());
        assert_eq!(
            from_sdk_write_request(put),
            Some(WriteRequest::Put(item("u1")))
        );

        let delete = to_sdk_write_request(&WriteRequest::Delete(item("u2"))).unwrap();
        assert!(delete.delete_request().is_some());
        assert_eq!(
            from_sdk_write_request(delete),
            Some(WriteRequest::Delete(item("u2")))
        );
    }

    #[test]
    fn test_empty_sdk_write_request_is_skipped() {
        assert_eq!(from_sdk_write_request(SdkWriteRequest::builder().build()), None);
    }

    #[test]
    fn test_key_schema_for_composite_key() {
        let descriptor = TableDescriptor::new("events", "tenant", Some("at")).unwrap();

        let hash = key_schema_element(descriptor.partition_key(), KeyType::Hash).unwrap();
        assert_eq!(hash.attribute_name(), "tenant");
        assert_eq!(hash.key_type(), &KeyType::Hash);

        let range = attribute_definition(descriptor.sort_key().unwrap()).unwrap();
        assert_eq!(range.attribute_name(), "at");
        assert_eq!(range.attribute_type(), &ScalarAttributeType::S);
    }
}

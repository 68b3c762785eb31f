//! Integration tests against DynamoDB Local.
//!
//! Start DynamoDB Local on port 8000 and run:
//!
//! ```sh
//! AWS_ENDPOINT_URL=http://localhost:8000 cargo test -p entity_connector -- --ignored
//! ```

use entity_connector::{
    AttributeValue, ConnectorConfig, EntityConnector, Item, RecoveryPolicy, ScanRequest,
    StaticCredentials, TableDescriptor,
};
use entity_connector_core::TableStatus;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("entity_connector=debug"))
        .with_test_writer()
        .try_init();
}

fn local_config() -> ConnectorConfig {
    let endpoint = std::env::var("AWS_ENDPOINT_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());

    ConnectorConfig::default()
        .with_region("us-east-1")
        .with_endpoint_url(endpoint)
        .with_credentials(StaticCredentials {
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            session_token: None,
        })
        .with_recovery(RecoveryPolicy {
            initial_delay_ms: 100,
            poll_interval_ms: 250,
            max_polls: 40,
        })
}

async fn fresh_connector() -> EntityConnector<entity_connector::store::DynamoDbStore> {
    init_tracing();
    let table = format!("test-{}", Uuid::new_v4());
    let descriptor = TableDescriptor::new(table, "id", None).unwrap();
    EntityConnector::connect(&local_config(), descriptor).await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Nested {
    foo: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entity {
    id: String,
    foo: String,
    bar: Nested,
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_read_and_write_creates_table() {
    let connector = fresh_connector().await;
    let entity = Entity {
        id: format!("test-entity-{}", Uuid::new_v4()),
        foo: "bar".to_string(),
        bar: Nested { foo: true },
    };

    connector.store_document(&entity).await.unwrap();
    let read: Option<Entity> = connector
        .get_document(&connector.key(entity.id.clone(), None))
        .await
        .unwrap();

    assert_eq!(read, Some(entity));

    let description = connector.describe_table().await.unwrap().unwrap();
    assert_eq!(description.status, TableStatus::Active);

    connector.delete_table().await.unwrap();
}

#[tokio::test]
#[ignore = "requires DynamoDB Local"]
async fn test_batch_write_and_scan() {
    let connector = fresh_connector().await;
    let items: Vec<Item> = (0..60)
        .map(|i| {
            [
                ("id".to_string(), AttributeValue::S(format!("item-{i:02}"))),
                ("empty".to_string(), AttributeValue::S(String::new())),
            ]
            .into_iter()
            .collect()
        })
        .collect();

    connector.store_items(items).await.unwrap();

    let all = connector.scan(&ScanRequest::new()).await.unwrap();
    assert_eq!(all.len(), 60);
    assert!(all.iter().all(|item| !item.contains_key("empty")));

    let limited = connector.scan(&ScanRequest::new().limit(7)).await.unwrap();
    assert_eq!(limited.len(), 7);

    connector.delete_table().await.unwrap();
}

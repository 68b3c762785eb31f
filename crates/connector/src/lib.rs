//! Entity-style CRUD over DynamoDB with lazy table creation.
//!
//! An [`EntityConnector`] is bound to one table. When a data-plane call finds
//! the table missing, the connector creates it with the descriptor's key
//! schema, waits until it is active and runs the call once more.
//!
//! ```no_run
//! # async fn example() -> entity_connector::Result<()> {
//! use entity_connector::{ConnectorConfig, EntityConnector, TableDescriptor};
//!
//! let config = ConnectorConfig::from_env();
//! let users = TableDescriptor::new("users", "id", None)?;
//! let connector = EntityConnector::connect(&config, users).await;
//!
//! let item = connector.get_item(&connector.key("u1", None)).await?;
//! # let _ = item;
//! # Ok(())
//! # }
//! ```

mod config;
mod connector;
mod document;
mod error;
mod item;
mod recovery;
pub mod store;

pub use config::{ConnectorConfig, StaticCredentials};
pub use connector::EntityConnector;
#[cfg(feature = "dynamodb")]
pub use connector::DynamoDbConnector;
pub use document::{from_item, to_item};
pub use error::{ConnectorError, Result};
pub use item::{key_of, normalize_item, normalize_value, string_key, Item, Key};
pub use store::{
    BatchGetOutput, Page, QueryRequest, ScanRequest, StoreError, StoreResult, TableStore,
    UpdateRequest, WriteRequest,
};

pub use aws_sdk_dynamodb::types::AttributeValue;
pub use entity_connector_core::{RecoveryPolicy, TableDescription, TableDescriptor, TableStatus};

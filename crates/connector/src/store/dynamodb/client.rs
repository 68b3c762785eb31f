//! AWS SDK client setup (Imperative Shell).

use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::Client;

use crate::config::ConnectorConfig;

/// Provider name reported for explicitly configured credentials.
const CREDENTIALS_PROVIDER: &str = "entity-connector";

/// Creates a DynamoDB client with the given configuration.
///
/// Settings left unset in `config` fall back to the SDK default chain.
pub async fn create_client(config: &ConnectorConfig) -> Client {
    let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(region) = &config.region {
        sdk_config_loader = sdk_config_loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint_url {
        sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
    }

    if let Some(credentials) = &config.credentials {
        sdk_config_loader = sdk_config_loader.credentials_provider(Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            credentials.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        ));
    }

    let sdk_config = sdk_config_loader.load().await;
    tracing::debug!(target = %config.target_display(), "DynamoDB client configured");
    Client::new(&sdk_config)
}

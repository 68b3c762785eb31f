use std::env;

use entity_connector_core::RecoveryPolicy;

/// Static AWS credentials.
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Connector configuration.
///
/// Built once by the application and handed to the connector; the connector
/// itself never reads the environment.
#[derive(Debug, Clone, Default)]
pub struct ConnectorConfig {
    /// AWS region; the SDK default chain applies when unset.
    pub region: Option<String>,
    /// Custom endpoint URL (for local DynamoDB).
    pub endpoint_url: Option<String>,
    /// Explicit credentials; the SDK default chain applies when unset.
    pub credentials: Option<StaticCredentials>,
    /// Prefix prepended to every logical table name.
    pub table_prefix: Option<String>,
    /// Timing of the wait after an on-demand table creation.
    pub recovery: RecoveryPolicy,
}

impl ConnectorConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_REGION` - AWS region
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (e.g., http://localhost:8000)
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` - Static credentials (both required)
    /// - `AWS_SESSION_TOKEN` - Session token for temporary credentials
    /// - `DYNAMODB_TABLE_PREFIX` - Prefix applied to table names
    pub fn from_env() -> Self {
        let credentials = match (
            non_empty_var("AWS_ACCESS_KEY_ID"),
            non_empty_var("AWS_SECRET_ACCESS_KEY"),
        ) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                access_key_id,
                secret_access_key,
                session_token: non_empty_var("AWS_SESSION_TOKEN"),
            }),
            _ => None,
        };

        Self {
            region: non_empty_var("AWS_REGION"),
            endpoint_url: non_empty_var("AWS_ENDPOINT_URL"),
            credentials,
            table_prefix: non_empty_var("DYNAMODB_TABLE_PREFIX"),
            recovery: RecoveryPolicy::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = Some(prefix.into());
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryPolicy) -> Self {
        self.recovery = recovery;
        self
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match (&self.endpoint_url, &self.region) {
            (Some(url), _) => format!("Local DynamoDB ({})", url),
            (None, Some(region)) => format!("AWS DynamoDB (region: {})", region),
            (None, None) => "AWS DynamoDB (default region)".to_string(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let config = ConnectorConfig::default()
            .with_region("eu-west-1")
            .with_endpoint_url("http://localhost:8000")
            .with_table_prefix("test-")
            .with_recovery(RecoveryPolicy::immediate(3));

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.table_prefix.as_deref(), Some("test-"));
        assert_eq!(config.recovery.max_polls, 3);
        assert!(config.credentials.is_none());
    }

    #[test]
    fn test_default_uses_default_recovery_policy() {
        let config = ConnectorConfig::default();
        assert_eq!(config.recovery, RecoveryPolicy::default());
    }

    #[test]
    fn test_target_display() {
        let local = ConnectorConfig::default().with_endpoint_url("http://localhost:8000");
        assert_eq!(local.target_display(), "Local DynamoDB (http://localhost:8000)");

        let remote = ConnectorConfig::default().with_region("us-east-1");
        assert_eq!(remote.target_display(), "AWS DynamoDB (region: us-east-1)");
    }

    #[test]
    fn test_credentials_debug_is_redacted() {
        let credentials = StaticCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI".to_string(),
            session_token: Some("FwoGZXIvYXdzEXAMPLE".to_string()),
        };
        let debug = format!("{credentials:?}");

        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(!debug.contains("FwoGZXIvYXdzEXAMPLE"));
    }
}

//! DynamoDB table management commands.

mod error;
mod import;
mod planning;

pub use error::{DynamodbError, Result};

use std::path::PathBuf;

use crate::prelude::*;
use dialoguer::Confirm;
use entity_connector::store::{DynamoDbStore, TableStore};
use entity_connector::{
    from_item, ConnectorConfig, ConnectorError, DynamoDbConnector, ScanRequest,
};
use entity_connector_core::{
    chunk_count, qualified_table_name, TableDescriptor, BATCH_WRITE_LIMIT,
};

const ENVIRONMENT_HELP: &str = "Environment variables:
  AWS_ENDPOINT_URL       - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION             - AWS region
  AWS_ACCESS_KEY_ID      - Static credentials (with AWS_SECRET_ACCESS_KEY)
  DYNAMODB_TABLE_PREFIX  - Prefix applied to the table name";

/// DynamoDB table management commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Create a table and wait until it is active.
    Deploy(DeployCommand),

    /// Delete a table.
    Destroy(DestroyCommand),

    /// Show the status of a table.
    Describe(DescribeCommand),

    /// Store the objects of a JSON file as items.
    Import(ImportCommand),

    /// Print the items of a table as JSON lines.
    Scan(ScanCommand),
}

/// Table name and key schema.
#[derive(Debug, Clone, clap::Args)]
pub struct TableArgs {
    /// Table name, without prefix.
    #[arg(long)]
    pub table_name: String,

    /// Partition key attribute name.
    #[arg(long, default_value = "id")]
    pub partition_key: String,

    /// Sort key attribute name.
    #[arg(long)]
    pub sort_key: Option<String>,
}

impl TableArgs {
    fn descriptor(&self) -> Result<TableDescriptor> {
        Ok(TableDescriptor::new(
            &self.table_name,
            &self.partition_key,
            self.sort_key.as_deref(),
        )?)
    }
}

/// Create a DynamoDB table.
#[derive(Debug, clap::Parser)]
#[command(long_about = format!("Create a DynamoDB table and wait until it is active.

The table is created with string-typed partition (and sort) keys and
on-demand billing. Nothing is changed when the table already exists.

{}", ENVIRONMENT_HELP))]
pub struct DeployCommand {
    #[command(flatten)]
    pub table: TableArgs,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Delete a DynamoDB table.
#[derive(Debug, clap::Parser)]
#[command(long_about = format!("Delete a DynamoDB table and all of its items.

Asks for confirmation unless --force is given.

{}", ENVIRONMENT_HELP))]
pub struct DestroyCommand {
    /// Table name, without prefix.
    #[arg(long)]
    pub table_name: String,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Show the status of a DynamoDB table.
#[derive(Debug, clap::Parser)]
pub struct DescribeCommand {
    /// Table name, without prefix.
    #[arg(long)]
    pub table_name: String,
}

/// Import JSON documents into a table.
#[derive(Debug, clap::Parser)]
#[command(long_about = format!("Store every object of a JSON array as an item.

The table is created on demand when it does not exist. Items are written
in batches of 25 and empty strings are dropped.

{}", ENVIRONMENT_HELP))]
pub struct ImportCommand {
    #[command(flatten)]
    pub table: TableArgs,

    /// Path to a JSON file holding an array of objects.
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Print the items of a table.
#[derive(Debug, clap::Parser)]
pub struct ScanCommand {
    #[command(flatten)]
    pub table: TableArgs,

    /// Maximum number of items to print.
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    let config = ConnectorConfig::from_env();

    if !global.is_silent() && !matches!(command.action, DynamodbAction::Scan(_)) {
        aprintln!("{} {}", p_b("Target:"), config.target_display());
        aprintln!();
    }

    match command.action {
        DynamodbAction::Deploy(cmd) => run_deploy(cmd, &config, &global).await,
        DynamodbAction::Destroy(cmd) => run_destroy(cmd, &config, &global).await,
        DynamodbAction::Describe(cmd) => run_describe(cmd, &config).await,
        DynamodbAction::Import(cmd) => run_import(cmd, &config, &global).await,
        DynamodbAction::Scan(cmd) => run_scan(cmd, &config).await,
    }
}

fn physical_name(config: &ConnectorConfig, table_name: &str) -> String {
    qualified_table_name(table_name, config.table_prefix.as_deref())
}

fn confirm(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| DynamodbError::Prompt(e.to_string()))?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(
    cmd: DeployCommand,
    config: &ConnectorConfig,
    global: &crate::Global,
) -> Result<()> {
    let connector = DynamoDbConnector::connect(config, cmd.table.descriptor()?).await;
    let current = connector.describe_table().await?;
    let plan = planning::calculate_deploy_plan(current.as_ref(), connector.descriptor());

    if !global.is_silent() {
        aprintln!("{}", p_c("Deploy Plan:"));
        for line in planning::format_deploy_plan(&plan) {
            if line.starts_with('+') {
                aprintln!("  {}", p_g(&line));
            } else if line.starts_with('~') {
                aprintln!("  {}", p_y(&line));
            } else {
                aprintln!("  {}", line);
            }
        }
        aprintln!();
    }

    if matches!(plan, planning::DeployPlan::NoChanges { .. }) {
        if !global.is_silent() {
            aprintln!("{}", p_g("Table is up to date."));
        }
        return Ok(());
    }

    if matches!(plan, planning::DeployPlan::CreateTable { .. }) && !cmd.force {
        confirm("Create this table?", true)?;
    }

    if !global.is_silent() {
        aprintln!(
            "{} (up to {}s)",
            p_b("Waiting for table to become active..."),
            config.recovery.max_wait().as_secs()
        );
    }

    connector.ensure_table().await.map_err(|e| match e {
        e if e.is_table_not_found() => DynamodbError::TableActivationTimeout {
            table_name: connector.table_name().to_string(),
        },
        e => DynamodbError::Connector(e),
    })?;

    if !global.is_silent() {
        aprintln!("{}", p_g("Table deployed successfully."));
    }

    Ok(())
}

async fn run_destroy(
    cmd: DestroyCommand,
    config: &ConnectorConfig,
    global: &crate::Global,
) -> Result<()> {
    let store = DynamoDbStore::connect(config).await;
    let table_name = physical_name(config, &cmd.table_name);
    let current = store
        .describe_table(&table_name)
        .await
        .map_err(ConnectorError::from)?;
    let plan = planning::calculate_destroy_plan(current.as_ref(), &table_name);

    if !global.is_silent() {
        aprintln!("{}", p_y("Destroy Plan:"));
        for line in planning::format_destroy_plan(&plan) {
            aprintln!("  {}", p_r(&line));
        }
        aprintln!();
    }

    if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
        if !global.is_silent() {
            aprintln!("{}", p_g("Nothing to destroy."));
        }
        return Ok(());
    }

    if !cmd.force {
        confirm(
            "Are you sure you want to delete this table? ALL DATA WILL BE LOST",
            false,
        )?;
    }

    store
        .delete_table(&table_name)
        .await
        .map_err(ConnectorError::from)?;

    if !global.is_silent() {
        aprintln!("{}", p_g("Table destroyed successfully."));
    }

    Ok(())
}

async fn run_describe(cmd: DescribeCommand, config: &ConnectorConfig) -> Result<()> {
    let store = DynamoDbStore::connect(config).await;
    let table_name = physical_name(config, &cmd.table_name);

    match store
        .describe_table(&table_name)
        .await
        .map_err(ConnectorError::from)?
    {
        Some(description) => {
            for line in planning::format_description(&description) {
                aprintln!("{}", line);
            }
        }
        None => aprintln!("{}", p_y(&format!("Table {} does not exist", table_name))),
    }

    Ok(())
}

async fn run_import(
    cmd: ImportCommand,
    config: &ConnectorConfig,
    global: &crate::Global,
) -> Result<()> {
    let descriptor = cmd.table.descriptor()?;
    let contents = tokio::fs::read_to_string(&cmd.file).await?;
    let documents = import::parse_documents(&contents, &descriptor.key_names())?;

    let connector = DynamoDbConnector::connect(config, descriptor).await;

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Table:"), connector.table_name());
        aprintln!("{} {}", p_b("Documents:"), documents.len());
        aprintln!(
            "{} {}",
            p_b("Batches:"),
            chunk_count(documents.len(), BATCH_WRITE_LIMIT)
        );
        aprintln!();
    }

    if documents.is_empty() {
        if !global.is_silent() {
            aprintln!("{}", p_y("Nothing to import."));
        }
        return Ok(());
    }

    if !cmd.force {
        confirm(&format!("Import {} documents?", documents.len()), true)?;
    }

    connector.store_documents(&documents).await?;

    if !global.is_silent() {
        aprintln!("{} {} documents imported.", p_g("Success:"), documents.len());
    }

    Ok(())
}

async fn run_scan(cmd: ScanCommand, config: &ConnectorConfig) -> Result<()> {
    let connector = DynamoDbConnector::connect(config, cmd.table.descriptor()?).await;

    let mut request = ScanRequest::new();
    if let Some(limit) = cmd.limit {
        request = request.limit(limit);
    }

    for item in connector.scan(&request).await? {
        let document: serde_json::Value = from_item(item)?;
        aprintln!("{}", document);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_name_applies_prefix() {
        let config = ConnectorConfig::default().with_table_prefix("dev-");
        assert_eq!(physical_name(&config, "users"), "dev-users");
        assert_eq!(physical_name(&ConnectorConfig::default(), "users"), "users");
    }

    #[test]
    fn test_table_args_descriptor() {
        let args = TableArgs {
            table_name: "events".to_string(),
            partition_key: "tenant".to_string(),
            sort_key: Some("at".to_string()),
        };
        let descriptor = args.descriptor().unwrap();
        assert_eq!(descriptor.key_names(), vec!["tenant", "at"]);

        let invalid = TableArgs {
            table_name: String::new(),
            ..args
        };
        assert!(matches!(invalid.descriptor(), Err(DynamodbError::Schema(_))));
    }
}

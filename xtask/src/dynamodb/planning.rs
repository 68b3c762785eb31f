//! Pure functions for calculating table plans (Functional Core).

use entity_connector_core::{format_descriptor, TableDescription, TableDescriptor, TableStatus};

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { descriptor: TableDescriptor },
    /// Table exists but is not active yet; wait for it.
    WaitForActive {
        table_name: String,
        status: TableStatus,
    },
    /// Table is active, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Pure function: Calculate what is needed to reach an active table.
pub fn calculate_deploy_plan(
    current: Option<&TableDescription>,
    desired: &TableDescriptor,
) -> DeployPlan {
    match current {
        None => DeployPlan::CreateTable {
            descriptor: desired.clone(),
        },
        Some(description) if description.status == TableStatus::Active => DeployPlan::NoChanges {
            table_name: desired.name().to_string(),
        },
        Some(description) => DeployPlan::WaitForActive {
            table_name: desired.name().to_string(),
            status: description.status.clone(),
        },
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableDescription>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { descriptor } => {
            let mut lines = format_descriptor(descriptor);
            if let Some(first) = lines.first_mut() {
                *first = format!("+ Create {}", first.to_lowercase());
            }
            lines
        }
        DeployPlan::WaitForActive { table_name, status } => {
            vec![format!("~ Table {} is {}, waiting until active", table_name, status)]
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("  Table {} is up to date", table_name)]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!("- Delete table: {}", table_name)]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("  Table {} does not exist", table_name)]
        }
    }
}

/// Pure function: Format a table description for display.
pub fn format_description(description: &TableDescription) -> Vec<String> {
    let mut lines = vec![
        format!("Table: {}", description.table_name),
        format!("Status: {}", description.status),
    ];
    if let Some(count) = description.item_count {
        lines.push(format!("Items: {}", count));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDescriptor {
        TableDescriptor::new("users", "id", None).unwrap()
    }

    fn description(status: TableStatus) -> TableDescription {
        TableDescription {
            table_name: "users".to_string(),
            status,
            item_count: Some(3),
        }
    }

    #[test]
    fn test_deploy_plan_creates_missing_table() {
        let plan = calculate_deploy_plan(None, &users());
        assert!(matches!(plan, DeployPlan::CreateTable { .. }));
    }

    #[test]
    fn test_deploy_plan_no_changes_when_active() {
        let current = description(TableStatus::Active);
        let plan = calculate_deploy_plan(Some(&current), &users());
        assert_eq!(
            plan,
            DeployPlan::NoChanges {
                table_name: "users".to_string()
            }
        );
    }

    #[test]
    fn test_deploy_plan_waits_while_creating() {
        let current = description(TableStatus::Creating);
        let plan = calculate_deploy_plan(Some(&current), &users());
        assert!(matches!(
            plan,
            DeployPlan::WaitForActive {
                status: TableStatus::Creating,
                ..
            }
        ));
    }

    #[test]
    fn test_destroy_plan() {
        let current = description(TableStatus::Active);
        assert!(matches!(
            calculate_destroy_plan(Some(&current), "users"),
            DestroyPlan::DeleteTable { .. }
        ));
        assert!(matches!(
            calculate_destroy_plan(None, "users"),
            DestroyPlan::AlreadyGone { .. }
        ));
    }

    #[test]
    fn test_format_create_plan() {
        let descriptor = TableDescriptor::new("events", "tenant", Some("at")).unwrap();
        let lines = format_deploy_plan(&DeployPlan::CreateTable { descriptor });

        assert_eq!(lines[0], "+ Create table: events");
        assert!(lines.iter().any(|l| l.contains("Partition key: tenant (S)")));
        assert!(lines.iter().any(|l| l.contains("Sort key: at (S)")));
    }

    #[test]
    fn test_format_description() {
        let lines = format_description(&description(TableStatus::Active));
        assert_eq!(lines, vec!["Table: users", "Status: ACTIVE", "Items: 3"]);
    }
}

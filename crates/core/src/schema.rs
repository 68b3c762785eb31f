//! Table schema types (Functional Core - pure data).

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    /// Creates a string-typed key attribute.
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::String,
        }
    }
}

/// Scalar attribute types usable in a key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    String,
}

/// Billing mode for auto-created tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BillingMode {
    #[default]
    PayPerRequest,
}

/// Describes a logical table and its key schema.
///
/// The descriptor is immutable once built. It is the schema used when the
/// table has to be created on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    name: String,
    partition_key: KeyAttribute,
    sort_key: Option<KeyAttribute>,
    billing_mode: BillingMode,
}

impl TableDescriptor {
    /// Creates a descriptor with a partition key and an optional sort key.
    pub fn new(
        name: impl Into<String>,
        partition_key: impl Into<String>,
        sort_key: Option<&str>,
    ) -> Result<Self> {
        let name = name.into();
        let partition_key = partition_key.into();

        if name.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        if partition_key.trim().is_empty() {
            return Err(SchemaError::EmptyKeyName);
        }

        let sort_key = match sort_key {
            Some(sk) if sk.trim().is_empty() => return Err(SchemaError::EmptyKeyName),
            Some(sk) if sk == partition_key => {
                return Err(SchemaError::DuplicateKeyName(sk.to_string()))
            }
            Some(sk) => Some(KeyAttribute::string(sk)),
            None => None,
        };

        Ok(Self {
            name,
            partition_key: KeyAttribute::string(partition_key),
            sort_key,
            billing_mode: BillingMode::PayPerRequest,
        })
    }

    /// Table name as given at construction. Descriptors produced by
    /// [`with_prefix`](Self::with_prefix) carry the physical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partition_key(&self) -> &KeyAttribute {
        &self.partition_key
    }

    pub fn sort_key(&self) -> Option<&KeyAttribute> {
        self.sort_key.as_ref()
    }

    pub fn billing_mode(&self) -> BillingMode {
        self.billing_mode
    }

    /// Names of every key attribute, partition key first.
    pub fn key_names(&self) -> Vec<&str> {
        let mut names = vec![self.partition_key.name.as_str()];
        if let Some(sk) = &self.sort_key {
            names.push(sk.name.as_str());
        }
        names
    }

    /// Physical table name once the optional prefix is applied.
    pub fn qualified_name(&self, prefix: Option<&str>) -> String {
        qualified_table_name(&self.name, prefix)
    }

    /// Returns a copy of this descriptor renamed to its physical table name.
    pub fn with_prefix(&self, prefix: Option<&str>) -> Self {
        Self {
            name: self.qualified_name(prefix),
            ..self.clone()
        }
    }
}

/// Pure function: Physical name of table `name` under an optional prefix.
pub fn qualified_table_name(name: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}{name}"),
        None => name.to_string(),
    }
}

/// Pure function: Format a table descriptor for display.
pub fn format_descriptor(descriptor: &TableDescriptor) -> Vec<String> {
    let mut lines = vec![
        format!("Table: {}", descriptor.name()),
        format!("  Partition key: {} (S)", descriptor.partition_key().name),
    ];
    if let Some(sk) = descriptor.sort_key() {
        lines.push(format!("  Sort key: {} (S)", sk.name));
    }
    lines.push("  Billing: PAY_PER_REQUEST".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_with_partition_key_only() {
        let descriptor = TableDescriptor::new("users", "id", None).unwrap();

        assert_eq!(descriptor.name(), "users");
        assert_eq!(descriptor.partition_key().name, "id");
        assert_eq!(
            descriptor.partition_key().attribute_type,
            AttributeType::String
        );
        assert!(descriptor.sort_key().is_none());
        assert_eq!(descriptor.billing_mode(), BillingMode::PayPerRequest);
        assert_eq!(descriptor.key_names(), vec!["id"]);
    }

    #[test]
    fn test_descriptor_with_sort_key() {
        let descriptor = TableDescriptor::new("events", "tenant", Some("createdAt")).unwrap();

        assert_eq!(descriptor.sort_key().unwrap().name, "createdAt");
        assert_eq!(descriptor.key_names(), vec!["tenant", "createdAt"]);
    }

    #[test]
    fn test_descriptor_rejects_empty_names() {
        assert_eq!(
            TableDescriptor::new("", "id", None),
            Err(SchemaError::EmptyTableName)
        );
        assert_eq!(
            TableDescriptor::new("users", "  ", None),
            Err(SchemaError::EmptyKeyName)
        );
        assert_eq!(
            TableDescriptor::new("users", "id", Some("")),
            Err(SchemaError::EmptyKeyName)
        );
    }

    #[test]
    fn test_descriptor_rejects_sort_key_equal_to_partition_key() {
        assert_eq!(
            TableDescriptor::new("users", "id", Some("id")),
            Err(SchemaError::DuplicateKeyName("id".to_string()))
        );
    }

    #[test]
    fn test_qualified_name() {
        let descriptor = TableDescriptor::new("users", "id", None).unwrap();

        assert_eq!(descriptor.qualified_name(None), "users");
        assert_eq!(descriptor.qualified_name(Some("staging-")), "staging-users");
        assert_eq!(qualified_table_name("events", Some("dev-")), "dev-events");
    }

    #[test]
    fn test_with_prefix_keeps_key_schema() {
        let descriptor = TableDescriptor::new("users", "id", Some("sk")).unwrap();
        let prefixed = descriptor.with_prefix(Some("dev_"));

        assert_eq!(prefixed.name(), "dev_users");
        assert_eq!(prefixed.partition_key(), descriptor.partition_key());
        assert_eq!(prefixed.sort_key(), descriptor.sort_key());
    }

    #[test]
    fn test_format_descriptor() {
        let descriptor = TableDescriptor::new("users", "id", Some("sk")).unwrap();
        let lines = format_descriptor(&descriptor);

        assert_eq!(
            lines,
            vec![
                "Table: users".to_string(),
                "  Partition key: id (S)".to_string(),
                "  Sort key: sk (S)".to_string(),
                "  Billing: PAY_PER_REQUEST".to_string(),
            ]
        );
    }
}

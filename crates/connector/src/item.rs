//! Item and key shapes, and the store-time normalization of items.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use entity_connector_core::TableDescriptor;

/// A stored item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// An item holding only the key attributes of a table.
pub type Key = Item;

/// Strips empty strings from an item before it is written.
///
/// String attributes equal to `""` are dropped, nested maps and lists are
/// cleaned recursively, and empty strings are removed from string sets. A
/// string set left empty is dropped as well.
pub fn normalize_item(item: Item) -> Item {
    item.into_iter()
        .filter_map(|(name, value)| normalize_value(value).map(|value| (name, value)))
        .collect()
}

/// Normalizes one value, `None` when the value must be omitted.
pub fn normalize_value(value: AttributeValue) -> Option<AttributeValue> {
    match value {
        AttributeValue::S(s) if s.is_empty() => None,
        AttributeValue::M(map) => Some(AttributeValue::M(normalize_item(map))),
        AttributeValue::L(list) => Some(AttributeValue::L(
            list.into_iter().filter_map(normalize_value).collect(),
        )),
        AttributeValue::Ss(set) => {
            let set: Vec<String> = set.into_iter().filter(|s| !s.is_empty()).collect();
            if set.is_empty() {
                None
            } else {
                Some(AttributeValue::Ss(set))
            }
        }
        other => Some(other),
    }
}

/// Builds a key for `descriptor` from string key values.
///
/// The sort value is ignored when the table has no sort key.
pub fn string_key(
    descriptor: &TableDescriptor,
    partition: impl Into<String>,
    sort: Option<&str>,
) -> Key {
    let mut key = Key::new();
    key.insert(
        descriptor.partition_key().name.clone(),
        AttributeValue::S(partition.into()),
    );
    if let (Some(sk), Some(sort)) = (descriptor.sort_key(), sort) {
        key.insert(sk.name.clone(), AttributeValue::S(sort.to_string()));
    }
    key
}

/// Extracts the key attributes of `item` for `descriptor`.
///
/// Returns `None` when a key attribute is missing.
pub fn key_of(descriptor: &TableDescriptor, item: &Item) -> Option<Key> {
    descriptor
        .key_names()
        .into_iter()
        .map(|name| item.get(name).map(|value| (name.to_string(), value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    #[test]
    fn test_normalize_drops_empty_strings() {
        let item: Item = [
            ("id".to_string(), s("u1")),
            ("name".to_string(), s("Ann")),
            ("bio".to_string(), s("")),
        ]
        .into_iter()
        .collect();

        let normalized = normalize_item(item);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized.get("name"), Some(&s("Ann")));
        assert!(!normalized.contains_key("bio"));
    }

    #[test]
    fn test_normalize_is_recursive() {
        let nested: Item = [
            ("empty".to_string(), s("")),
            ("kept".to_string(), s("x")),
        ]
        .into_iter()
        .collect();
        let item: Item = [
            ("id".to_string(), s("u1")),
            ("profile".to_string(), AttributeValue::M(nested)),
            (
                "tags".to_string(),
                AttributeValue::L(vec![s("a"), s(""), s("b")]),
            ),
        ]
        .into_iter()
        .collect();

        let normalized = normalize_item(item);

        let profile = normalized.get("profile").unwrap().as_m().unwrap();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile.get("kept"), Some(&s("x")));

        let tags = normalized.get("tags").unwrap().as_l().unwrap();
        assert_eq!(tags, &vec![s("a"), s("b")]);
    }

    #[test]
    fn test_normalize_keeps_non_string_values() {
        let item: Item = [
            ("count".to_string(), AttributeValue::N("0".to_string())),
            ("flag".to_string(), AttributeValue::Bool(false)),
            ("nothing".to_string(), AttributeValue::Null(true)),
            ("empty_map".to_string(), AttributeValue::M(HashMap::new())),
        ]
        .into_iter()
        .collect();

        let normalized = normalize_item(item.clone());
        assert_eq!(normalized, item);
    }

    #[test]
    fn test_normalize_string_sets() {
        let item: Item = [
            (
                "mixed".to_string(),
                AttributeValue::Ss(vec!["a".to_string(), String::new()]),
            ),
            (
                "only_empty".to_string(),
                AttributeValue::Ss(vec![String::new()]),
            ),
        ]
        .into_iter()
        .collect();

        let normalized = normalize_item(item);

        assert_eq!(
            normalized.get("mixed"),
            Some(&AttributeValue::Ss(vec!["a".to_string()]))
        );
        assert!(!normalized.contains_key("only_empty"));
    }

    #[test]
    fn test_string_key_with_and_without_sort_key() {
        let simple = TableDescriptor::new("users", "id", None).unwrap();
        let key = string_key(&simple, "u1", Some("ignored"));
        assert_eq!(key.len(), 1);
        assert_eq!(key.get("id"), Some(&s("u1")));

        let composite = TableDescriptor::new("events", "tenant", Some("at")).unwrap();
        let key = string_key(&composite, "acme", Some("2024-01-01"));
        assert_eq!(key.len(), 2);
        assert_eq!(key.get("at"), Some(&s("2024-01-01")));
    }

    #[test]
    fn test_key_of() {
        let descriptor = TableDescriptor::new("events", "tenant", Some("at")).unwrap();
        let item: Item = [
            ("tenant".to_string(), s("acme")),
            ("at".to_string(), s("2024")),
            ("payload".to_string(), s("x")),
        ]
        .into_iter()
        .collect();

        let key = key_of(&descriptor, &item).unwrap();
        assert_eq!(key.len(), 2);
        assert!(!key.contains_key("payload"));

        let mut missing_sort = item.clone();
        missing_sort.remove("at");
        assert!(key_of(&descriptor, &missing_sort).is_none());
    }
}

//! Document marshalling.
//!
//! Any serde type that serializes to a map can be stored as an item. Numbers
//! are carried as decimal strings in both directions, so `u128` values and
//! 38-digit DynamoDB numbers keep their precision.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_dynamo::aws_sdk_dynamodb_1 as dynamo;

use crate::error::{ConnectorError, Result};
use crate::item::Item;

/// Serialize a value into an item. The value must serialize to a map.
pub fn to_item<T: Serialize>(value: &T) -> Result<Item> {
    dynamo::to_item(value).map_err(document_error)
}

/// Deserialize an item into a value.
pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T> {
    dynamo::from_item(item).map_err(document_error)
}

fn document_error(err: serde_dynamo::Error) -> ConnectorError {
    ConnectorError::Document(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::types::AttributeValue;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        age: u32,
        score: f64,
        active: bool,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ledger {
        id: String,
        balance: u128,
    }

    fn sample_user() -> User {
        User {
            id: "u1".to_string(),
            age: 42,
            score: 9.5,
            active: true,
            tags: vec!["admin".to_string()],
            nickname: None,
        }
    }

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    #[test]
    fn test_struct_through_item() {
        let user = sample_user();
        let item = to_item(&user).unwrap();

        assert_eq!(item.get("id"), Some(&s("u1")));
        assert_eq!(item.get("age"), Some(&AttributeValue::N("42".to_string())));
        assert_eq!(item.get("active"), Some(&AttributeValue::Bool(true)));
        assert_eq!(item.get("nickname"), Some(&AttributeValue::Null(true)));

        let parsed: User = from_item(item).unwrap();
        assert_eq!(parsed, user);
    }

    #[test]
    fn test_nested_json_document() {
        let item = to_item(&json!({"id": "u1", "bar": {"foo": true}, "list": ["a", "b"]})).unwrap();

        let bar = item.get("bar").unwrap().as_m().unwrap();
        assert_eq!(bar.get("foo"), Some(&AttributeValue::Bool(true)));
        assert_eq!(item.get("list").unwrap().as_l().unwrap().len(), 2);
    }

    #[test]
    fn test_item_to_json_value() {
        let item = Item::from([
            ("id".to_string(), s("u1")),
            (
                "bar".to_string(),
                AttributeValue::M([("foo".to_string(), AttributeValue::Bool(true))].into()),
            ),
        ]);

        let value: serde_json::Value = from_item(item).unwrap();
        assert_eq!(value, json!({"id": "u1", "bar": {"foo": true}}));
    }

    #[test]
    fn test_u128_beyond_u64_is_stored() {
        let ledger = Ledger {
            id: "acct".to_string(),
            balance: u128::from(u64::MAX) + 1,
        };
        let item = to_item(&ledger).unwrap();

        assert_eq!(
            item.get("balance"),
            Some(&AttributeValue::N("18446744073709551616".to_string()))
        );
        assert_eq!(from_item::<Ledger>(item).unwrap(), ledger);
    }

    #[test]
    fn test_wide_number_keeps_precision() {
        let item = Item::from([
            ("id".to_string(), s("acct")),
            (
                "balance".to_string(),
                AttributeValue::N("12345678901234567890123".to_string()),
            ),
        ]);

        let ledger: Ledger = from_item(item).unwrap();
        assert_eq!(ledger.balance, 12_345_678_901_234_567_890_123);
    }

    #[test]
    fn test_to_item_rejects_non_maps() {
        let result = to_item(&vec![1, 2, 3]);
        assert!(matches!(result, Err(ConnectorError::Document(_))));
    }

    #[test]
    fn test_invalid_number() {
        let item = Item::from([
            ("id".to_string(), s("acct")),
            ("balance".to_string(), AttributeValue::N("twelve".to_string())),
        ]);
        assert!(matches!(
            from_item::<Ledger>(item),
            Err(ConnectorError::Document(_))
        ));
    }
}

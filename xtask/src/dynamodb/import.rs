//! Import file parsing (Functional Core).

use serde_json::Value;

use super::error::{DynamodbError, Result};

/// Pure function: Parse an import file holding a JSON array of objects.
///
/// Every object must carry a string value for each of `key_names`.
pub fn parse_documents(contents: &str, key_names: &[&str]) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| DynamodbError::InvalidImport(e.to_string()))?;

    let Value::Array(documents) = value else {
        return Err(DynamodbError::InvalidImport(
            "expected a JSON array of objects".to_string(),
        ));
    };

    for (index, document) in documents.iter().enumerate() {
        let Some(object) = document.as_object() else {
            return Err(DynamodbError::InvalidImport(format!(
                "element {} is not an object",
                index
            )));
        };
        for key in key_names {
            match object.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => {}
                _ => {
                    return Err(DynamodbError::InvalidImport(format!(
                        "element {} has no string key '{}'",
                        index, key
                    )))
                }
            }
        }
    }

    Ok(documents)
}

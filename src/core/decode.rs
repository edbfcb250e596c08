//! Lenient field decoding
//!
//! Plugin blocks are hand-written YAML converted to JSON by the agent, so
//! `null` and wrong-typed values are common. Outside the union-shaped
//! fields, such a value counts as absent: the field keeps its default and a
//! warning is logged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Decode an optional field; `null` and wrong-typed values become `None`
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_or_warn(&value))
}

/// Decode an optional list field item by item
///
/// A value that is not a list is ignored. Items that cannot be decoded are
/// replaced by `T::default()` so the positions of the others are kept.
pub fn lenient_items<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Null => return Ok(None),
        Value::Array(items) => items,
        other => {
            warn!("Ignoring configuration value {}: expected a list", other);
            return Ok(None);
        }
    };

    Ok(Some(
        items
            .iter()
            .map(|item| decode_or_warn(item).unwrap_or_default())
            .collect(),
    ))
}

fn decode_or_warn<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if value.is_null() {
        return None;
    }

    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!("Ignoring configuration value {}: {}", value, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq, Deserialize)]
    #[serde(default)]
    struct Item {
        #[serde(deserialize_with = "lenient")]
        name: Option<String>,
    }

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct Holder {
        #[serde(deserialize_with = "lenient")]
        flag: Option<bool>,
        #[serde(deserialize_with = "lenient_items")]
        items: Option<Vec<Item>>,
    }

    fn holder(value: Value) -> Holder {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_absent_and_null_are_none() {
        assert_eq!(holder(json!({})).flag, None);
        assert_eq!(holder(json!({"flag": null})).flag, None);
        assert_eq!(holder(json!({"items": null})).items, None);
    }

    #[test]
    fn test_wrong_type_is_none() {
        assert_eq!(holder(json!({"flag": "yes"})).flag, None);
        assert_eq!(holder(json!({"items": "a"})).items, None);
    }

    #[test]
    fn test_valid_values_decode() {
        let decoded = holder(json!({"flag": true, "items": [{"name": "a"}]}));
        assert_eq!(decoded.flag, Some(true));
        assert_eq!(decoded.items, Some(vec![Item { name: Some("a".to_string()) }]));
    }

    #[test]
    fn test_bad_items_keep_their_position() {
        let decoded = holder(json!({"items": [{"name": "a"}, 3, null, {"name": 4}]}));
        assert_eq!(
            decoded.items,
            Some(vec![
                Item { name: Some("a".to_string()) },
                Item::default(),
                Item::default(),
                Item::default(),
            ])
        );
    }
}

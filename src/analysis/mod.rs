//! Reading the conversation: what the user wants now, and what came before.

mod context;
mod intent;

pub use context::ContextAnalyzer;
pub use intent::IntentClassifier;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Field decoder that never fails: a value of the wrong type decodes as the
/// field's default instead of rejecting the whole response.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a service response, defaulting every field that is missing or mistyped
pub(crate) fn decode_response<T>(value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_value(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "lenient")]
        count: Option<u32>,
        #[serde(default, deserialize_with = "lenient")]
        names: Vec<String>,
    }

    #[test]
    fn test_mistyped_fields_default() {
        let sample: Sample = decode_response(json!({"count": "three", "names": ["a", "b"]}));
        assert_eq!(sample.count, None);
        assert_eq!(sample.names, vec!["a", "b"]);
    }

    #[test]
    fn test_non_object_defaults_everything() {
        let sample: Sample = decode_response(json!("not an object"));
        assert_eq!(sample.count, None);
        assert!(sample.names.is_empty());
    }
}

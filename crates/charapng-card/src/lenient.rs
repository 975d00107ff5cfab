//! Type-tolerant field extraction for card JSON.
//!
//! Cards are hand-edited and written by many tools, so known keys often carry
//! an unexpected JSON type (`"character_version": 1`, `"enabled": null`).
//! A record must still decode. Optional fields that do not fit their type are
//! kept unchanged in the `extra` map and serialize back as they were read.
//! Required fields fall back to their default.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::debug;

/// A JSON object being split into typed fields and leftover keys.
pub(crate) struct Fields {
    map: Map<String, Value>,
    extra: Map<String, Value>,
}

impl Fields {
    /// Read a JSON object. Anything other than an object is an error.
    pub(crate) fn read<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            map: Map::deserialize(deserializer)?,
            extra: Map::new(),
        })
    }

    /// Take an optional field.
    ///
    /// `null` and mistyped values yield `None` and stay in the leftover map.
    pub(crate) fn optional<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.map.remove(key)?;
        if value.is_null() {
            self.extra.insert(key.to_string(), value);
            return None;
        }

        match T::deserialize(&value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!(field = key, error = %e, "keeping mistyped field as raw JSON");
                self.extra.insert(key.to_string(), value);
                None
            }
        }
    }

    /// Take a required field, using `default` when it is missing, `null` or mistyped.
    pub(crate) fn required<T: DeserializeOwned>(&mut self, key: &str, default: T) -> T {
        match self.map.remove(key) {
            None | Some(Value::Null) => default,
            Some(value) => T::deserialize(&value).unwrap_or_else(|e| {
                debug!(field = key, error = %e, "replacing mistyped field with default");
                default
            }),
        }
    }

    /// Take a list field, skipping elements that do not fit `T`.
    pub(crate) fn list<T: DeserializeOwned>(&mut self, key: &str) -> Vec<T> {
        match self.map.remove(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    T::deserialize(item)
                        .map_err(|e| debug!(field = key, error = %e, "skipping list element"))
                        .ok()
                })
                .collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                debug!(field = key, kind = json_kind(&other), "expected a list");
                Vec::new()
            }
        }
    }

    /// Every key not taken as a typed field, plus the mistyped optional ones.
    pub(crate) fn finish(mut self) -> Map<String, Value> {
        self.extra.append(&mut self.map);
        self.extra
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        Fields::read(value).unwrap()
    }

    #[test]
    fn test_optional_keeps_mistyped_raw() {
        let mut f = fields(json!({"version": 1, "name": "A", "note": null}));

        assert_eq!(f.optional::<String>("version"), None);
        assert_eq!(f.optional::<String>("name"), Some("A".to_string()));
        assert_eq!(f.optional::<String>("note"), None);
        assert_eq!(f.optional::<String>("missing"), None);

        let extra = f.finish();
        assert_eq!(extra["version"], json!(1));
        assert_eq!(extra["note"], Value::Null);
        assert!(!extra.contains_key("name"));
    }

    #[test]
    fn test_required_defaults() {
        let mut f = fields(json!({"enabled": null, "content": 5, "keys": ["a"]}));

        assert!(f.required("enabled", true));
        assert_eq!(f.required("content", String::new()), "");
        assert_eq!(f.required("keys", Vec::<String>::new()), vec!["a"]);
        assert!(f.finish().is_empty());
    }

    #[test]
    fn test_list_skips_bad_elements() {
        let mut f = fields(json!({"items": [1, "x", 2], "other": "nope"}));
        assert_eq!(f.list::<u32>("items"), vec![1, 2]);
        assert!(f.list::<u32>("other").is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Fields::read(json!([1, 2])).is_err());
        assert!(Fields::read(json!("text")).is_err());
    }
}

//! Hierarchical property bags for entity persistence
//!
//! Entities load from and save to a generic string-keyed bag. Saving is
//! "tidy": a field whose value equals its inherited default is omitted, so
//! saved bags describe only the diff against the prototype.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors raised when parsing a property bag
#[derive(Debug, Error)]
pub enum BagError {
    /// The input was not a valid bag document
    #[error("failed to parse property bag: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document root was not an object
    #[error("property bag root must be an object")]
    NotAnObject,
}

/// A hierarchical string-keyed property bag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    root: Map<String, Value>,
}

impl PropertyBag {
    /// Create a new empty bag
    pub fn new() -> Self {
        Self { root: Map::new() }
    }

    /// Parse a bag from a JSON document
    pub fn from_str(text: &str) -> Result<Self, BagError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(BagError::NotAnObject),
        }
    }

    /// Serialize the bag to a JSON document
    pub fn to_string_pretty(&self) -> String {
        serde_json::to_string_pretty(&Value::Object(self.root.clone()))
            .unwrap_or_else(|_| String::from("{}"))
    }

    /// View the bag as a JSON value
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Build a bag from a JSON value; the root must be an object
    pub fn from_value(value: Value) -> Result<Self, BagError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(BagError::NotAnObject),
        }
    }

    /// Get a typed value by key
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.root
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a typed value by key, or a fallback when absent
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        self.get(key).unwrap_or(fallback)
    }

    /// Set a value by key
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.root.insert(key.into(), v);
        }
    }

    /// Set a value only when it differs from its inherited default
    pub fn set_tidy<T: Serialize + PartialEq>(
        &mut self,
        key: impl Into<String>,
        value: &T,
        default: &T,
    ) {
        if value != default {
            self.set(key, value);
        }
    }

    /// Get a nested bag by key
    pub fn get_bag(&self, key: &str) -> Option<PropertyBag> {
        match self.root.get(key) {
            Some(Value::Object(map)) => Some(PropertyBag { root: map.clone() }),
            _ => None,
        }
    }

    /// Set a nested bag by key
    pub fn set_bag(&mut self, key: impl Into<String>, bag: &PropertyBag) {
        self.root
            .insert(key.into(), Value::Object(bag.root.clone()));
    }

    /// Get a homogeneous list by key; absent keys yield an empty list
    pub fn get_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match self.root.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Set a homogeneous list by key; empty lists are omitted
    pub fn set_list<T: Serialize>(&mut self, key: impl Into<String>, items: &[T]) {
        if items.is_empty() {
            return;
        }
        let values: Vec<Value> = items
            .iter()
            .filter_map(|v| serde_json::to_value(v).ok())
            .collect();
        self.root.insert(key.into(), Value::Array(values));
    }

    /// Check if a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Iterate over the keys of this bag
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Get the number of entries
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip() {
        let mut bag = PropertyBag::new();
        bag.set("speed", &2.5f32);
        bag.set("name", &"torch".to_string());

        assert_eq!(bag.get::<f32>("speed"), Some(2.5));
        assert_eq!(bag.get::<String>("name").as_deref(), Some("torch"));
        assert_eq!(bag.get::<f32>("missing"), None);
        assert_eq!(bag.get_or("missing", 7.0f32), 7.0);
    }

    #[test]
    fn test_tidy_omits_defaults() {
        let mut bag = PropertyBag::new();
        bag.set_tidy("solid", &true, &true);
        bag.set_tidy("speed", &3.0f32, &2.0f32);

        assert!(!bag.contains("solid"));
        assert_eq!(bag.get::<f32>("speed"), Some(3.0));
    }

    #[test]
    fn test_nested_bags_and_lists() {
        let mut inner = PropertyBag::new();
        inner.set_list("sounds", &["a.wav".to_string(), "b.wav".to_string()]);

        let mut bag = PropertyBag::new();
        bag.set_bag("trigger", &inner);

        let back = bag.get_bag("trigger").unwrap();
        let sounds: Vec<String> = back.get_list("sounds");
        assert_eq!(sounds, vec!["a.wav", "b.wav"]);
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(PropertyBag::from_str("[1, 2]").is_err());
        assert!(PropertyBag::from_str("{\"x\": 1}").is_ok());
    }
}

//! Opaque per-user documents.
//!
//! Users carry two free-form key/value documents: public data, which is
//! embedded verbatim in access tokens, and private data, which never leaves
//! storage. Keeping them schemaless lets downstream services attach claims
//! (an audience override, display names, roles) without storage changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// A JSON object document with explicit accessors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserData(Map<String, Value>);

impl UserData {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a document from its JSON text form.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDocument` if the text is not a JSON object.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CoreError::InvalidDocument(e.to_string()))
    }

    /// Render the document as compact JSON text.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Get a raw value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a value by key if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Set a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a value, returning it if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the top-level entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for UserData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<UserData> for Value {
    fn from(data: UserData) -> Self {
        Self::Object(data.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_get() {
        let mut data = UserData::new();
        assert!(data.is_empty());

        data.set("aud", "reports");
        data.set("level", 3);

        assert_eq!(data.get_str("aud"), Some("reports"));
        assert_eq!(data.get("level"), Some(&json!(3)));
        assert_eq!(data.get_str("level"), None);
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn set_replaces_previous_value() {
        let mut data = UserData::new();
        assert_eq!(data.set("aud", "a"), None);
        assert_eq!(data.set("aud", "b"), Some(json!("a")));
        assert_eq!(data.remove("aud"), Some(json!("b")));
        assert!(!data.contains_key("aud"));
    }

    #[test]
    fn json_text_form() {
        let data = UserData::from_json(r#"{"username":"testuser"}"#).unwrap();
        assert_eq!(data.get_str("username"), Some("testuser"));
        assert_eq!(data.to_json(), r#"{"username":"testuser"}"#);
    }

    #[test]
    fn rejects_non_object_documents() {
        assert!(UserData::from_json("[1, 2]").is_err());
        assert!(UserData::from_json("\"aud\"").is_err());
        assert!(UserData::from_json("{").is_err());
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut data = UserData::new();
        data.set("nested", json!({"a": [1, 2]}));
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, json!({"nested": {"a": [1, 2]}}));
    }
}

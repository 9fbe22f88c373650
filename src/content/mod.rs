//! Structured content values
//!
//! A `Content` is the tree a revision carries: arbitrary nesting of
//! mappings, ordered lists, and scalars (string, number, boolean, null).
//! It round-trips through JSON: `Content::from_json(&c.to_json()?) == c`.
//!
//! Access goes through an enumerated facade rather than dynamic attribute
//! lookup: `get`, `get_index`, `get_path`, `set`, `push`, `delete_field`,
//! plus typed scalar accessors.

mod errors;

pub use errors::{ContentError, ContentResult};

use serde_json::{Map, Value};

/// A structured content value: mapping, list, or scalar.
///
/// The in-memory representation is a `serde_json::Value` tree; `Content`
/// owns it and exposes the small operation set the store needs. Mapping
/// key order is irrelevant for equality; list order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Content(Value);

impl Content {
    /// Creates empty content (an empty mapping).
    pub fn new() -> Self {
        Content(Value::Object(Map::new()))
    }

    /// Wraps an existing JSON value.
    pub fn from_value(value: Value) -> Self {
        Content(value)
    }

    /// Parses content from a JSON string.
    pub fn from_json(json: &str) -> ContentResult<Self> {
        let value = serde_json::from_str(json)
            .map_err(|e| ContentError::Parse(e.to_string()))?;
        Ok(Content(value))
    }

    /// Serializes content to a JSON string.
    pub fn to_json(&self) -> ContentResult<String> {
        serde_json::to_string(&self.0)
            .map_err(|e| ContentError::InvalidContent(e.to_string()))
    }

    /// Borrows the underlying JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the content, returning the underlying JSON value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Child of a mapping by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Child of a list by position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Generic path accessor: dot-separated keys, numeric segments index
    /// into lists (`"authors.0.name"`).
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path.split('.') {
            current = match segment.parse::<usize>() {
                Ok(index) => current.get(index)?,
                Err(_) => current.get(segment)?,
            };
        }
        Some(current)
    }

    /// Sets a key on a mapping. Content that is not a mapping is replaced
    /// by one first.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        if let Some(map) = self.0.as_object_mut() {
            map.insert(key.to_string(), value.into());
        }
    }

    /// Appends to a list. Content that is not a list is replaced by one
    /// first.
    pub fn push(&mut self, value: impl Into<Value>) {
        if !self.0.is_array() {
            self.0 = Value::Array(Vec::new());
        }
        if let Some(list) = self.0.as_array_mut() {
            list.push(value.into());
        }
    }

    /// Removes a key from a mapping, returning the removed value.
    pub fn delete_field(&mut self, key: &str) -> Option<Value> {
        self.0.as_object_mut().and_then(|map| map.remove(key))
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.0.as_i64()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.0.as_f64()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.0.as_bool()
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn is_map(&self) -> bool {
        self.0.is_object()
    }

    pub fn is_list(&self) -> bool {
        self.0.is_array()
    }

    /// True for the empty mapping, empty list, or null.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Object(map) => map.is_empty(),
            Value::Array(list) => list.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Content::new()
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Content(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip_scalars() {
        for value in [json!("hi"), json!(42), json!(1.5), json!(true), json!(null)] {
            let content = Content::from_value(value);
            let parsed = Content::from_json(&content.to_json().unwrap()).unwrap();
            assert_eq!(parsed, content);
        }
    }

    #[test]
    fn test_round_trip_nested() {
        let content = Content::from_value(json!({
            "title": "hello",
            "tags": ["a", "b"],
            "meta": {"published": false, "views": 0},
        }));
        let parsed = Content::from_json(&content.to_json().unwrap()).unwrap();
        assert_eq!(parsed, content);
    }

    #[test]
    fn test_get_and_get_index() {
        let content = Content::from_value(json!({"tags": ["a", "b"]}));
        assert_eq!(content.get("tags").unwrap()[1], json!("b"));

        let list = Content::from_value(json!([1, 2, 3]));
        assert_eq!(list.get_index(2), Some(&json!(3)));
        assert_eq!(list.get_index(3), None);
    }

    #[test]
    fn test_get_path() {
        let content = Content::from_value(json!({
            "authors": [{"name": "A"}, {"name": "B"}],
        }));
        assert_eq!(content.get_path("authors.1.name"), Some(&json!("B")));
        assert_eq!(content.get_path("authors.2.name"), None);
        assert_eq!(content.get_path("missing"), None);
    }

    #[test]
    fn test_set_and_delete_field() {
        let mut content = Content::new();
        content.set("title", "hi");
        assert_eq!(content.get("title"), Some(&json!("hi")));

        let removed = content.delete_field("title");
        assert_eq!(removed, Some(json!("hi")));
        assert!(content.is_empty());
    }

    #[test]
    fn test_set_replaces_non_mapping() {
        let mut content = Content::from_value(json!("scalar"));
        content.set("key", 1);
        assert!(content.is_map());
        assert_eq!(content.get("key"), Some(&json!(1)));
    }

    #[test]
    fn test_push() {
        let mut content = Content::from_value(json!([]));
        content.push("a");
        content.push("b");
        assert_eq!(content.as_value(), &json!(["a", "b"]));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(Content::from_json("{not json").is_err());
    }

    #[test]
    fn test_default_is_empty_mapping() {
        let content = Content::default();
        assert!(content.is_map());
        assert!(content.is_empty());
        assert_eq!(content.to_json().unwrap(), "{}");
    }
}

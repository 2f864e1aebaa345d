//! Read-only view of a completed request.
//!
//! The host framework owns the request. The normalizer only needs three things
//! from it: the path, the attribute bag populated by upstream payment
//! verification, and whether a given header was present. [`RequestContext`]
//! is the seam for that; [`RequestInfo`] is a plain owned implementation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Untyped per-request store of records set by upstream middleware.
///
/// Keys follow producer conventions (`"payment"`, `"x402"`) and record shapes
/// vary by producer. Nothing about the contents is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag {
    entries: HashMap<String, Value>,
}

impl AttributeBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record, replacing any previous record under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    /// Returns the record stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns `true` if a record is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes and returns the record stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Returns `true` if no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// What the normalizer may read from a completed request.
pub trait RequestContext {
    /// URL path of the request, without query.
    fn path(&self) -> &str;

    /// Attributes recorded by upstream payment verification.
    fn attributes(&self) -> &AttributeBag;

    /// Returns `true` if the request carried a header named `name`.
    ///
    /// Header names are compared case-insensitively.
    fn has_header(&self, name: &str) -> bool;
}

/// Owned [`RequestContext`] for hosts that are not `tower` services.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    path: String,
    attributes: AttributeBag,
    header_names: Vec<String>,
}

impl RequestInfo {
    /// Creates a context for `path` with no attributes or headers.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Sets the attribute bag.
    #[must_use]
    pub fn with_attributes(mut self, attributes: AttributeBag) -> Self {
        self.attributes = attributes;
        self
    }

    /// Records that a header named `name` was present.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>) -> Self {
        self.header_names.push(name.into().to_ascii_lowercase());
        self
    }
}

impl RequestContext for RequestInfo {
    fn path(&self) -> &str {
        &self.path
    }

    fn attributes(&self) -> &AttributeBag {
        &self.attributes
    }

    fn has_header(&self, name: &str) -> bool {
        self.header_names
            .iter()
            .any(|h| h.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bag_insert_replaces() {
        let mut bag = AttributeBag::new();
        assert!(bag.insert("payment", json!({"payer": "0xA"})).is_none());
        let previous = bag.insert("payment", json!({"payer": "0xB"}));
        assert_eq!(previous, Some(json!({"payer": "0xA"})));
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("payment").unwrap()["payer"], "0xB");
    }

    #[test]
    fn test_bag_from_iter() {
        let bag: AttributeBag = [("x402", json!({}))].into_iter().collect();
        assert!(bag.contains("x402"));
        assert!(!bag.contains("payment"));
    }

    #[test]
    fn test_request_info_headers_case_insensitive() {
        let info = RequestInfo::new("/a").with_header("X-Payment-Proof");
        assert!(info.has_header("x-payment-proof"));
        assert!(!info.has_header("x-payment"));
    }
}

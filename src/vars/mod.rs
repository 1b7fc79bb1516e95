//! Site variables: the per-page `ConfigMap` and everything that fills it.
//!
//! # Pipeline
//!
//! ```text
//! load_configuration()          collect_facts()             substitute()
//!   {origin}/config/              PageScan + clock            "$company:name"
//!   variables.json                      │                          │
//!         │                             │                          ▼
//!         ▼                             ▼                        "Acme"
//!   ConfigMap (rows) ──clone──► ConfigMap (rows + facts) ──► JSON-LD, byline
//! ```
//!
//! Keys are namespaced tokens (`$company:name`, `$page:wordcount`,
//! `$system:date`, `$meta:description`, `$og:title`). Later writes win.

pub mod facts;
pub mod remote;
pub mod substitute;
pub mod system;

pub use facts::collect_facts;
pub use remote::load_configuration;
pub use substitute::{substitute, substitute_json};

use serde::Serialize;
use std::collections::{BTreeMap, btree_map};
use url::Url;

/// Flat map of site and page facts used for token substitution.
///
/// Iteration is sorted by key, so anything derived from a map is
/// deterministic regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, String>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn merge(&mut self, other: ConfigMap) {
        self.0.extend(other.0);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for ConfigMap {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Everything known about the page currently being processed.
///
/// Created fresh for each document and dropped once it is written, so no
/// state leaks between pages.
#[derive(Debug, Clone)]
pub struct PageContext {
    /// Site origin (`scheme://host[:port]/`)
    pub origin: Url,
    /// Public URL of the page
    pub url: Url,
    pub vars: ConfigMap,
}

impl PageContext {
    pub fn new(origin: Url, url: Url, vars: ConfigMap) -> Self {
        Self { origin, url, vars }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_last_write_wins() {
        let mut map = ConfigMap::new();
        map.insert("$page:author", "remote");
        map.insert("$page:author", "local");
        assert_eq!(map.get("$page:author"), Some("local"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_merge_prefers_incoming() {
        let mut rows: ConfigMap = [("$company:name", "Acme"), ("$system:date", "stale")]
            .into_iter()
            .collect();
        let facts: ConfigMap = [("$system:date", "2026-10-16")].into_iter().collect();

        rows.merge(facts);
        assert_eq!(rows.get("$system:date"), Some("2026-10-16"));
        assert_eq!(rows.get("$company:name"), Some("Acme"));
    }

    #[test]
    fn test_iteration_is_sorted() {
        let map: ConfigMap = [("$b", "2"), ("$a", "1"), ("$c", "3")].into_iter().collect();
        let keys: Vec<_> = map.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["$a", "$b", "$c"]);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let map: ConfigMap = [("$company:name", "Acme")].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"$company:name":"Acme"}"#);
    }
}

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type StringSet = BTreeSet<String>;

/// String-keyed sets of strings. Merging is a per-key union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sets(BTreeMap<String, StringSet>);

impl Sets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().insert(value.into());
    }

    pub fn add_all<I, S>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = self.0.entry(key.into()).or_default();
        set.extend(values.into_iter().map(Into::into));
    }

    pub fn lookup(&self, key: &str) -> Option<&StringSet> {
        self.0.get(key)
    }

    /// Values under `key`, empty when absent.
    pub fn values(&self, key: &str) -> impl Iterator<Item = &str> {
        self.0.get(key).into_iter().flatten().map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<StringSet> {
        self.0.remove(key)
    }

    /// Keeps only the listed keys.
    pub fn retain_keys(&mut self, keys: &[&str]) {
        self.0.retain(|key, _| keys.contains(&key.as_str()));
    }

    pub fn merge(&mut self, other: &Sets) {
        for (key, values) in &other.0 {
            self.0
                .entry(key.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeSet::is_empty)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestEntry {
    pub timestamp: DateTime<Utc>,
    pub value: String,
}

impl LatestEntry {
    /// Later timestamp wins; ties are broken on the value so merging stays commutative.
    fn supersedes(&self, other: &LatestEntry) -> bool {
        (self.timestamp, &self.value) > (other.timestamp, &other.value)
    }
}

/// Point-in-time scalar attributes of a node, keeping the most recent value per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LatestMap(BTreeMap<String, LatestEntry>);

impl LatestMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `key` unless a newer entry is already present.
    pub fn set(&mut self, key: impl Into<String>, timestamp: DateTime<Utc>, value: impl Into<String>) {
        let entry = LatestEntry {
            timestamp,
            value: value.into(),
        };
        match self.0.entry(key.into()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            btree_map::Entry::Occupied(mut slot) => {
                if entry.supersedes(slot.get()) {
                    slot.insert(entry);
                }
            }
        }
    }

    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|entry| entry.value.as_str())
    }

    pub fn lookup_entry(&self, key: &str) -> Option<&LatestEntry> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn merge(&mut self, other: &LatestMap) {
        for (key, entry) in &other.0 {
            match self.0.get_mut(key) {
                Some(existing) => {
                    if entry.supersedes(existing) {
                        *existing = entry.clone();
                    }
                }
                None => {
                    self.0.insert(key.clone(), entry.clone());
                }
            }
        }
    }

    /// Copies the given keys from `other`, keeping timestamps.
    pub fn propagate(&mut self, other: &LatestMap, keys: &[&str]) {
        for key in keys {
            if let Some(entry) = other.0.get(*key) {
                self.set(*key, entry.timestamp, entry.value.clone());
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LatestEntry)> {
        self.0.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

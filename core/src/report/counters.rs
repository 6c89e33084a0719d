use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many underlying nodes of each topology were folded into a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counters(BTreeMap<String, u64>);

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: u64) {
        *self.0.entry(key.into()).or_insert(0) += value;
    }

    pub fn lookup(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn merge(&mut self, other: &Counters) {
        for (key, value) in &other.0 {
            self.add(key.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

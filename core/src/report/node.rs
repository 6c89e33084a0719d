use super::counters::Counters;
use super::edge_metadata::{EdgeMetadata, EdgeMetadatas};
use super::id_list::IdList;
use super::ids::parse_host_node_id;
use super::keys;
use super::latest::LatestMap;
use super::sets::Sets;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entity of a topology (host, process, container, ...) together with the
/// outbound edges observed from it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub topology: String,
    #[serde(default, skip_serializing_if = "LatestMap::is_empty")]
    pub latest: LatestMap,
    #[serde(default, skip_serializing_if = "Sets::is_empty")]
    pub sets: Sets,
    #[serde(default, skip_serializing_if = "Counters::is_empty")]
    pub counters: Counters,
    #[serde(default, skip_serializing_if = "IdList::is_empty")]
    pub adjacency: IdList,
    #[serde(default, skip_serializing_if = "EdgeMetadatas::is_empty")]
    pub edges: EdgeMetadatas,
    #[serde(default, skip_serializing_if = "Sets::is_empty")]
    pub parents: Sets,
    /// Child node IDs keyed by the child's topology.
    #[serde(default, skip_serializing_if = "Sets::is_empty")]
    pub children: Sets,
}

/// Picks one of two values regardless of argument order.
fn merge_label(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => a.min(b).to_string(),
    }
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_topology(mut self, topology: impl Into<String>) -> Self {
        self.topology = topology.into();
        self
    }

    pub fn with_latest(
        mut self,
        key: impl Into<String>,
        timestamp: DateTime<Utc>,
        value: impl Into<String>,
    ) -> Self {
        self.latest.set(key, timestamp, value);
        self
    }

    pub fn with_latests(mut self, timestamp: DateTime<Utc>, entries: &[(&str, &str)]) -> Self {
        for (key, value) in entries {
            self.latest.set(*key, timestamp, *value);
        }
        self
    }

    pub fn with_set<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets.add_all(key, values);
        self
    }

    pub fn with_counter(mut self, key: impl Into<String>, value: u64) -> Self {
        self.counters.add(key, value);
        self
    }

    pub fn with_adjacent(mut self, id: impl Into<String>) -> Self {
        self.adjacency.add(id);
        self
    }

    /// Adds an outbound edge together with its traffic counters.
    pub fn with_edge(mut self, remote_id: impl Into<String>, metadata: EdgeMetadata) -> Self {
        let remote_id = remote_id.into();
        self.adjacency.add(remote_id.clone());
        self.edges.add(remote_id, metadata);
        self
    }

    pub fn with_parent(mut self, topology: impl Into<String>, parent_id: impl Into<String>) -> Self {
        self.parents.add(topology, parent_id);
        self
    }

    pub fn with_parents(mut self, parents: &Sets) -> Self {
        self.parents.merge(parents);
        self
    }

    pub fn with_child(mut self, child: &Node) -> Self {
        self.add_child(child);
        self
    }

    /// Records `child` as folded into this node, crediting its topology counter.
    pub fn add_child(&mut self, child: &Node) {
        self.children.add(child.topology.clone(), child.id.clone());
        self.children.merge(&child.children);
        if !child.topology.is_empty() {
            self.counters.add(child.topology.clone(), 1);
        }
    }

    pub fn is_pseudo(&self) -> bool {
        self.topology == keys::PSEUDO
    }

    /// The host this node was observed on, if known.
    pub fn host_id(&self) -> Option<&str> {
        if let Some(host_node_id) = self.latest.lookup(keys::HOST_NODE_ID) {
            return parse_host_node_id(host_node_id).or(Some(host_node_id));
        }
        self.parents
            .values(keys::HOST)
            .next()
            .and_then(parse_host_node_id)
    }

    /// Field-wise merge. Commutative and associative for nodes sharing an ID.
    pub fn merge(&mut self, other: &Node) {
        self.id = merge_label(&self.id, &other.id);
        self.topology = merge_label(&self.topology, &other.topology);
        self.latest.merge(&other.latest);
        self.sets.merge(&other.sets);
        self.counters.merge(&other.counters);
        self.adjacency.merge(&other.adjacency);
        self.edges.merge(&other.edges);
        self.parents.merge(&other.parents);
        self.children.merge(&other.children);
    }

    pub fn merged(mut self, other: &Node) -> Self {
        self.merge(other);
        self
    }
}

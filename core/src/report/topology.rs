use super::node::Node;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// A set of nodes keyed by ID. Adding a node whose ID is already present
/// merges the two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Node>", into = "BTreeMap<String, Node>")]
pub struct Nodes(BTreeMap<String, Node>);

impl Nodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) {
        match self.0.entry(node.id.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(node);
            }
            btree_map::Entry::Occupied(mut slot) => slot.get_mut().merge(&node),
        }
    }

    /// Replaces any existing node with the same ID.
    pub fn insert(&mut self, node: Node) {
        self.0.insert(node.id.clone(), node);
    }

    pub fn merge(&mut self, other: &Nodes) {
        for node in other.0.values() {
            match self.0.get_mut(&node.id) {
                Some(existing) => existing.merge(node),
                None => {
                    self.0.insert(node.id.clone(), node.clone());
                }
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.0.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.0.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Node> {
        self.0.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.0.values_mut()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Node) -> bool) {
        self.0.retain(|_, node| keep(node));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Node> for Nodes {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut nodes = Nodes::new();
        for node in iter {
            nodes.add(node);
        }
        nodes
    }
}

/// Re-keys decoded nodes by their own ID; a node without one takes its map key.
impl From<BTreeMap<String, Node>> for Nodes {
    fn from(entries: BTreeMap<String, Node>) -> Self {
        entries
            .into_iter()
            .map(|(key, mut node)| {
                if node.id.is_empty() {
                    node.id = key;
                }
                node
            })
            .collect()
    }
}

impl From<Nodes> for BTreeMap<String, Node> {
    fn from(nodes: Nodes) -> Self {
        nodes.0
    }
}

impl IntoIterator for Nodes {
    type Item = Node;
    type IntoIter = btree_map::IntoValues<String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

impl<'a> IntoIterator for &'a Nodes {
    type Item = &'a Node;
    type IntoIter = btree_map::Values<'a, String, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.values()
    }
}

/// All nodes of one domain (hosts, processes, ...) within a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub nodes: Nodes,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `node`, merging it into any node already stored under its ID.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.add(node);
        self
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.add(node);
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

use serde::{Deserialize, Serialize};
use topoview_core::report::{Node, Nodes};

/// Delta between two renderings of the same view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diff {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.update.is_empty() && self.remove.is_empty()
    }

    /// Replays the delta on top of `previous`.
    pub fn apply(&self, previous: &Nodes) -> Nodes {
        let mut nodes = previous.clone();
        for id in &self.remove {
            nodes.remove(id);
        }
        for node in self.add.iter().chain(&self.update) {
            nodes.insert(node.clone());
        }
        nodes
    }
}

/// Computes what changed from `previous` to `current`. Unchanged nodes
/// appear in none of the lists.
pub fn diff(previous: &Nodes, current: &Nodes) -> Diff {
    let mut result = Diff::default();

    for node in current.iter() {
        match previous.get(&node.id) {
            None => result.add.push(node.clone()),
            Some(old) if old != node => result.update.push(node.clone()),
            Some(_) => {}
        }
    }
    for id in previous.ids() {
        if !current.contains(id) {
            result.remove.push(id.to_string());
        }
    }
    result
}

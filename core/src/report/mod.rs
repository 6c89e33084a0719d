//! The report data model: an immutable snapshot of every observed topology.

pub mod counters;
pub mod edge_metadata;
pub mod id_list;
pub mod ids;
pub mod keys;
pub mod latest;
pub mod networks;
pub mod node;
pub mod sets;
pub mod topology;

pub use counters::Counters;
pub use edge_metadata::{EdgeMetadata, EdgeMetadatas};
pub use id_list::IdList;
pub use latest::{LatestEntry, LatestMap};
pub use networks::Networks;
pub use node::Node;
pub use sets::{Sets, StringSet};
pub use topology::{Nodes, Topology};

use crate::error::ReportError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sampling rate of the reporters that produced a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sampling {
    pub count: u64,
    pub total: u64,
}

impl Sampling {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.count as f64 / self.total as f64
        }
    }
}

/// Declares `Report` and its by-name topology lookups from one field table.
macro_rules! report_topologies {
    ($($field:ident => $name:path),+ $(,)?) => {
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct Report {
            /// Unique per snapshot; used as the render cache key.
            pub id: String,
            #[serde(default)]
            pub timestamp: DateTime<Utc>,
            #[serde(default)]
            pub window_secs: u64,
            #[serde(default)]
            pub sampling: Sampling,
            $(
                #[serde(default)]
                pub $field: Topology,
            )+
        }

        impl Report {
            pub fn topology(&self, name: &str) -> Option<&Topology> {
                match name {
                    $($name => Some(&self.$field),)+
                    _ => None,
                }
            }

            pub fn topology_mut(&mut self, name: &str) -> Option<&mut Topology> {
                match name {
                    $($name => Some(&mut self.$field),)+
                    _ => None,
                }
            }

            pub fn topologies(&self) -> Vec<(&'static str, &Topology)> {
                vec![$(($name, &self.$field)),+]
            }
        }
    };
}

report_topologies! {
    endpoint => keys::ENDPOINT,
    process => keys::PROCESS,
    container => keys::CONTAINER,
    container_image => keys::CONTAINER_IMAGE,
    host => keys::HOST,
    pod => keys::POD,
    service => keys::SERVICE,
    deployment => keys::DEPLOYMENT,
    daemon_set => keys::DAEMON_SET,
    stateful_set => keys::STATEFUL_SET,
    cron_job => keys::CRON_JOB,
    job => keys::JOB,
    ecs_task => keys::ECS_TASK,
    ecs_service => keys::ECS_SERVICE,
    overlay => keys::OVERLAY,
    persistent_volume => keys::PERSISTENT_VOLUME,
    persistent_volume_claim => keys::PERSISTENT_VOLUME_CLAIM,
    storage_class => keys::STORAGE_CLASS,
    volume_snapshot => keys::VOLUME_SNAPSHOT,
    volume_snapshot_data => keys::VOLUME_SNAPSHOT_DATA,
}

impl Report {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn from_json(raw: &str) -> Result<Self, ReportError> {
        let report: Report = serde_json::from_str(raw)?;
        if report.id.trim().is_empty() {
            return Err(ReportError::MissingId);
        }
        Ok(report)
    }

    /// True if any Kubernetes topology carries nodes.
    pub fn has_kubernetes_data(&self) -> bool {
        [
            &self.pod,
            &self.service,
            &self.deployment,
            &self.daemon_set,
            &self.stateful_set,
            &self.cron_job,
            &self.job,
            &self.persistent_volume,
            &self.persistent_volume_claim,
            &self.storage_class,
        ]
        .iter()
        .any(|topology| !topology.is_empty())
    }

    pub fn node_count(&self) -> usize {
        self.topologies().iter().map(|(_, t)| t.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_lookup_by_name() {
        let mut report = Report::new("r1");
        report
            .topology_mut(keys::HOST)
            .expect("host topology")
            .add_node(Node::new("h1;<host>").with_topology(keys::HOST));

        assert_eq!(report.topology(keys::HOST).map(Topology::len), Some(1));
        assert!(report.topology("no_such_topology").is_none());
        assert_eq!(report.node_count(), 1);
    }

    #[test]
    fn from_json_requires_id() {
        let err = Report::from_json(r#"{"id": " "}"#).expect_err("blank id");
        assert!(matches!(err, ReportError::MissingId));

        let err = Report::from_json("{not json").expect_err("bad json");
        assert!(matches!(err, ReportError::Decode(_)));
    }

    #[test]
    fn from_json_decodes_nodes() {
        let raw = r#"{
            "id": "report-7",
            "process": {"nodes": {"h1;42": {"id": "h1;42", "topology": "process",
                "latest": {"pid": {"timestamp": "2024-01-01T00:00:00Z", "value": "42"}}}}}
        }"#;
        let report = Report::from_json(raw).expect("decode");
        let node = report.process.get("h1;42").expect("process node");
        assert_eq!(node.latest.lookup(keys::PID), Some("42"));
    }

    #[test]
    fn from_json_normalises_adjacency() {
        let raw = r#"{
            "id": "report-8",
            "endpoint": {"nodes": {"a": {"id": "a", "adjacency": ["c", "a", "c"]}}}
        }"#;
        let report = Report::from_json(raw).expect("decode");
        let decoded = report.endpoint.get("a").expect("endpoint a").clone();
        assert!(decoded.adjacency.contains("c"));

        let merged = decoded.merged(&Node::new("a").with_adjacent("a"));
        assert_eq!(merged.adjacency.iter().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn kubernetes_data_spans_controllers_and_volumes() {
        let mut report = Report::new("k8s");
        assert!(!report.has_kubernetes_data());
        report.storage_class.add_node(Node::new("gold;<storage_class>"));
        assert!(report.has_kubernetes_data());
        assert_eq!(report.topologies().len(), 20);
    }

    #[test]
    fn sampling_rate_defaults_to_one() {
        assert_eq!(Sampling::default().rate(), 1.0);
        assert_eq!(Sampling { count: 1, total: 4 }.rate(), 0.25);
    }
}

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use topoview_core::report::ids::{make_endpoint_node_id, make_host_node_id, make_pod_node_id, make_process_node_id};
use topoview_core::report::{keys, EdgeMetadata, Node, Report};

pub const LOCAL_CIDR: &str = "10.0.0.0/8";

pub fn ts() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
}

/// Small report builder for view tests.
pub struct ReportBuilder {
    report: Report,
}

impl ReportBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            report: Report::new(id).with_timestamp(ts()),
        }
    }

    /// Adds a host node advertising `cidrs` as local networks.
    pub fn host(mut self, host: &str, cidrs: &[&str]) -> Self {
        let node = Node::new(make_host_node_id(host))
            .with_topology(keys::HOST)
            .with_latest(keys::HOST_NAME, ts(), host)
            .with_set(keys::HOST_LOCAL_NETWORKS, cidrs.iter().copied());
        self.report.host.add_node(node);
        self
    }

    pub fn process(mut self, host: &str, pid: &str, name: &str) -> Self {
        self.report.process.add_node(process(host, pid, name));
        self
    }

    pub fn node(mut self, topology: &str, node: Node) -> Self {
        if let Some(t) = self.report.topology_mut(topology) {
            t.add_node(node);
        }
        self
    }

    pub fn build(self) -> Report {
        self.report
    }
}

pub fn process(host: &str, pid: &str, name: &str) -> Node {
    let host_node_id = make_host_node_id(host);
    Node::new(make_process_node_id(host, pid))
        .with_topology(keys::PROCESS)
        .with_latests(
            ts(),
            &[
                (keys::HOST_NODE_ID, host_node_id.as_str()),
                (keys::PID, pid),
                (keys::NAME, name),
            ],
        )
}

/// An endpoint attributed to `pid` on `host`.
pub fn local_endpoint(addr: &str, port: &str, host: &str, pid: &str) -> Node {
    let host_node_id = make_host_node_id(host);
    Node::new(make_endpoint_node_id("", addr, port))
        .with_topology(keys::ENDPOINT)
        .with_latests(
            ts(),
            &[
                (keys::HOST_NODE_ID, host_node_id.as_str()),
                (keys::PID, pid),
                (keys::PROCSPIED, "true"),
            ],
        )
}

/// An endpoint seen only from the far side of a connection.
pub fn remote_endpoint(addr: &str, port: &str) -> Node {
    Node::new(make_endpoint_node_id("", addr, port)).with_topology(keys::ENDPOINT)
}

pub fn bytes(egress: u64) -> EdgeMetadata {
    EdgeMetadata::default().with_egress_bytes(egress)
}

pub fn pod(uid: &str, namespace: &str, services: &str) -> Node {
    Node::new(make_pod_node_id(uid))
        .with_topology(keys::POD)
        .with_latests(
            ts(),
            &[
                (keys::KUBERNETES_NAMESPACE, namespace),
                (keys::KUBERNETES_SERVICE_IDS, services),
            ],
        )
}

//! Per-view mapping functions, including pseudo node synthesis.
//!
//! Each function turns one node into zero or more nodes of another
//! topology. Derived nodes record their source as a child, which credits
//! the source's topology counter, and keep only the attributes later
//! stages need to identify them.

use crate::filters::{is_pause_container, is_running};
use crate::known_services::is_known_service;
use std::collections::BTreeSet;
use std::net::IpAddr;
use topoview_core::report::ids::{
    make_container_image_node_id, make_container_node_id, make_host_node_id, make_process_node_id,
    make_pseudo_node_id, make_service_node_id, parse_endpoint_node_id, parse_process_node_id,
    INCOMING_INTERNET_ID, OUTGOING_INTERNET_ID, SERVICE_NODE_ID_PREFIX,
};
use topoview_core::report::{keys, Networks, Node};

pub const UNCONTAINED_ID: &str = "uncontained";
pub const UNMANAGED_ID: &str = "unmanaged";

fn derived(id: impl Into<String>, topology: &str, source: &Node) -> Node {
    Node::new(id).with_topology(topology).with_child(source)
}

fn pseudo(id: impl Into<String>, source: &Node) -> Node {
    derived(id, keys::PSEUDO, source)
}

fn passthrough(node: &Node) -> Vec<Node> {
    vec![node.clone()]
}

/// Address of an endpoint, from its `addr` attribute or its ID.
pub fn endpoint_address(node: &Node) -> Option<&str> {
    node.latest
        .lookup(keys::ADDR)
        .or_else(|| parse_endpoint_node_id(&node.id).map(|(_, addr, _)| addr))
}

/// Inbound internet node if `node` has outbound adjacency (the remote side
/// opened the connection), outbound internet node otherwise.
pub fn internet_node(node: &Node) -> Node {
    let id = if node.adjacency.is_empty() {
        OUTGOING_INTERNET_ID
    } else {
        INCOMING_INTERNET_ID
    };
    pseudo(id, node)
}

fn known_service_hostname(node: &Node) -> Option<&str> {
    for key in [keys::SNOOPED_DNS_NAMES, keys::REVERSE_DNS_NAMES] {
        let names: BTreeSet<&str> = node.sets.values(key).collect();
        if let Some(hostname) = names.into_iter().find(|name| is_known_service(name)) {
            return Some(hostname);
        }
    }
    None
}

/// Classifies an endpoint observed without a host identity.
pub fn endpoint_to_pseudo(node: &Node, local: &Networks) -> Vec<Node> {
    let Some(ip) = endpoint_address(node).and_then(|addr| addr.parse::<IpAddr>().ok()) else {
        return Vec::new();
    };
    if local.contains(ip) {
        // Local but unattributed: there is nothing to render it as.
        return Vec::new();
    }
    if let Some(hostname) = known_service_hostname(node) {
        return vec![pseudo(format!("{SERVICE_NODE_ID_PREFIX}{hostname}"), node)];
    }
    vec![internet_node(node)]
}

pub fn endpoint_to_process(node: &Node, local: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    if !node.latest.contains_key(keys::HOST_NODE_ID) {
        return endpoint_to_pseudo(node, local);
    }
    let (Some(host), Some(pid)) = (node.host_id(), node.latest.lookup(keys::PID)) else {
        return Vec::new();
    };
    let mut process = derived(make_process_node_id(host, pid), keys::PROCESS, node);
    process
        .latest
        .propagate(&node.latest, &[keys::HOST_NODE_ID, keys::PID]);
    vec![process]
}

/// Processes outside any container fold into one pseudo node per host.
pub fn process_to_container(node: &Node, _: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    if let Some(container_id) = node.latest.lookup(keys::DOCKER_CONTAINER_ID) {
        let mut container = derived(make_container_node_id(container_id), keys::CONTAINER, node);
        container.latest.propagate(
            &node.latest,
            &[keys::DOCKER_CONTAINER_ID, keys::HOST_NODE_ID, keys::IS_CONNECTED],
        );
        return vec![container];
    }
    let host = parse_process_node_id(&node.id)
        .map(|(host, _)| host)
        .or_else(|| node.host_id())
        .unwrap_or_default();
    vec![pseudo(make_pseudo_node_id(&[UNCONTAINED_ID, host]), node)]
}

pub fn process_to_name(node: &Node, _: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    let Some(name) = node.latest.lookup(keys::NAME) else {
        return Vec::new();
    };
    let mut group = derived(name, keys::PROCESS_NAME, node);
    group.latest.propagate(&node.latest, &[keys::NAME]);
    vec![group]
}

pub fn container_to_image(node: &Node, _: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    let Some(image_id) = node.latest.lookup(keys::DOCKER_IMAGE_ID) else {
        return Vec::new();
    };
    let mut image = derived(make_container_image_node_id(image_id), keys::CONTAINER_IMAGE, node);
    image
        .latest
        .propagate(&node.latest, &[keys::DOCKER_IMAGE_ID, keys::DOCKER_IMAGE_NAME]);
    vec![image]
}

pub fn container_to_hostname(node: &Node, _: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    let Some(hostname) = node.latest.lookup(keys::DOCKER_CONTAINER_HOSTNAME) else {
        return Vec::new();
    };
    let mut group = derived(hostname, keys::CONTAINER_HOSTNAME, node);
    group
        .latest
        .propagate(&node.latest, &[keys::DOCKER_CONTAINER_HOSTNAME]);
    vec![group]
}

/// Kubernetes controllers a pod can belong to.
pub const CONTROLLER_TOPOLOGIES: [&str; 5] = [
    keys::DEPLOYMENT,
    keys::DAEMON_SET,
    keys::STATEFUL_SET,
    keys::CRON_JOB,
    keys::JOB,
];

/// Folds a node into its parents in `topologies`. Nodes without one, and
/// uncontained processes, fold into a per-host unmanaged pseudo node.
fn to_parents(node: &Node, topologies: &[&str]) -> Vec<Node> {
    if node.is_pseudo() {
        let uncontained_prefix = make_pseudo_node_id(&[UNCONTAINED_ID, ""]);
        if let Some(host) = node.id.strip_prefix(&uncontained_prefix) {
            return vec![pseudo(make_pseudo_node_id(&[UNMANAGED_ID, host]), node)];
        }
        return passthrough(node);
    }

    let parents: Vec<Node> = topologies
        .iter()
        .flat_map(|&topology| {
            node.parents
                .values(topology)
                .map(move |parent_id| derived(parent_id, topology, node))
        })
        .collect();
    if !parents.is_empty() {
        return parents;
    }
    let host = node.host_id().unwrap_or_default();
    vec![pseudo(make_pseudo_node_id(&[UNMANAGED_ID, host]), node)]
}

/// Like [`to_parents`], for running containers only.
fn container_to_parent(node: &Node, parent_topology: &str) -> Vec<Node> {
    if !node.is_pseudo() && (!is_running(node) || is_pause_container(node)) {
        return Vec::new();
    }
    to_parents(node, &[parent_topology])
}

/// Pods take the host of the containers folded into them.
pub fn container_to_pod(node: &Node, _: &Networks) -> Vec<Node> {
    let mut pods = container_to_parent(node, keys::POD);
    if node.is_pseudo() {
        return pods;
    }
    if let Some(host) = node.host_id() {
        let host_id = make_host_node_id(host);
        for pod in pods.iter_mut().filter(|pod| pod.topology == keys::POD) {
            pod.parents.add(keys::HOST, host_id.clone());
        }
    }
    pods
}

/// Folds pods into their controllers, or into the unmanaged node of their
/// host when no controller owns them.
pub fn pod_to_controller(node: &Node, _: &Networks) -> Vec<Node> {
    if !node.is_pseudo() && node.topology != keys::POD {
        return Vec::new();
    }
    to_parents(node, &CONTROLLER_TOPOLOGIES)
}

pub fn container_to_ecs_task(node: &Node, _: &Networks) -> Vec<Node> {
    container_to_parent(node, keys::ECS_TASK)
}

pub fn ecs_task_to_ecs_service(node: &Node, _: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    node.parents
        .values(keys::ECS_SERVICE)
        .map(|service_id| derived(service_id, keys::ECS_SERVICE, node))
        .collect()
}

/// One service node per ID in the pod's service list.
pub fn pod_to_service(node: &Node, _: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    let Some(service_ids) = node.latest.lookup(keys::KUBERNETES_SERVICE_IDS) else {
        return Vec::new();
    };
    let uids: BTreeSet<&str> = service_ids.split_whitespace().collect();
    uids.into_iter()
        .map(|uid| derived(make_service_node_id(uid), keys::SERVICE, node))
        .collect()
}

pub fn x_to_host(node: &Node, _: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return Vec::new();
    }
    match node.host_id() {
        Some(host) => vec![derived(make_host_node_id(host), keys::HOST, node)],
        None => Vec::new(),
    }
}

pub fn endpoint_to_host(node: &Node, local: &Networks) -> Vec<Node> {
    if node.is_pseudo() {
        return passthrough(node);
    }
    if !node.latest.contains_key(keys::HOST_NODE_ID) {
        return endpoint_to_pseudo(node, local);
    }
    x_to_host(node, local)
}

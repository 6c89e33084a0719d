//! Attribution of connections without a PID to containers and pods, by IP
//! address.
//!
//! Owners and endpoints both map into a shared IP topology whose node IDs are
//! `scope;addr;` or `scope;addr;port`; the reduced IP graph is then mapped
//! back to the owners.

use crate::mapping::internet_node;
use crate::renderer::{MapFunc, Renderer};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use topoview_core::report::ids::{is_loopback, make_endpoint_node_id, parse_address_node_id, parse_endpoint_node_id, THE_INTERNET_ID};
use topoview_core::report::{keys, Networks, Node};

static PORT_MAPPING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}):([0-9]+)->([0-9]+)/tcp")
        .expect("port mapping pattern is valid")
});

/// An IP node owned by `owner`, recorded as its parent.
fn ip_node(id: String, owner: &Node) -> Node {
    let mut node = Node::new(id)
        .with_topology(keys::IP)
        .with_counter(keys::IPS_COUNTER, 1)
        .with_parent(owner.topology.clone(), owner.id.clone());
    node.latest.propagate(&owner.latest, &[keys::HOST_NODE_ID]);
    node
}

/// One IP node per scoped container address and per published host port.
pub fn container_to_ips(node: &Node, _: &Networks) -> Vec<Node> {
    let latest = &node.latest;
    if latest.contains_key(keys::DOES_NOT_MAKE_CONNECTIONS) || latest.contains_key(keys::DOCKER_IS_IN_HOST_NETWORK) {
        return Vec::new();
    }

    let mut result = Vec::new();
    for scoped in node.sets.values(keys::DOCKER_CONTAINER_IPS_WITH_SCOPES) {
        let Some((scope, addr)) = parse_address_node_id(scoped) else {
            continue;
        };
        if is_loopback(addr) {
            continue;
        }
        result.push(ip_node(make_endpoint_node_id(scope, addr, ""), node));
    }

    // host ports map to the host's own addresses, which carry no scope
    for mapping in node.sets.values(keys::DOCKER_CONTAINER_PORTS) {
        if let Some(captures) = PORT_MAPPING.captures(mapping) {
            let (ip, port) = (&captures[1], &captures[2]);
            result.push(ip_node(make_endpoint_node_id("", ip, port), node));
        }
    }
    result
}

/// IP nodes for endpoints not already attributed through a process.
pub fn endpoint_to_ips(node: &Node, local: &Networks) -> Vec<Node> {
    if node.latest.contains_key(keys::PROCSPIED) || node.latest.contains_key(keys::PID) {
        return Vec::new();
    }
    let Some((scope, addr, port)) = parse_endpoint_node_id(&node.id) else {
        return Vec::new();
    };
    if let Ok(ip) = addr.parse::<IpAddr>() {
        if !local.contains(ip) {
            return vec![internet_node(node)];
        }
    }

    // Container traffic is identified by address alone, traffic to a
    // published host port only with the port.
    vec![
        Node::new(make_endpoint_node_id(scope, addr, "")).with_topology(keys::IP),
        Node::new(make_endpoint_node_id(scope, addr, port)).with_topology(keys::IP),
    ]
}

/// The pod's own address, unless it shares the host's network namespace.
pub fn pod_to_ips(node: &Node, _: &Networks) -> Vec<Node> {
    if node.latest.contains_key(keys::KUBERNETES_IS_IN_HOST_NETWORK) {
        return Vec::new();
    }
    match node.latest.lookup(keys::KUBERNETES_IP) {
        Some(ip) if !ip.is_empty() => vec![ip_node(make_endpoint_node_id("", ip, ""), node)],
        _ => Vec::new(),
    }
}

/// Maps an IP node back to its single owner in `topology`. Addresses
/// claimed by more than one owner are ambiguous and dropped.
fn ip_to_owner(node: &Node, topology: &str) -> Vec<Node> {
    if node.counters.lookup(keys::IPS_COUNTER).unwrap_or(0) > 1 {
        return Vec::new();
    }
    if node.id.ends_with(THE_INTERNET_ID) {
        return vec![node.clone()];
    }
    let Some(owner_id) = node.parents.values(topology).next() else {
        return Vec::new();
    };
    let mut owner = Node::new(owner_id).with_topology(topology);
    owner.latest.propagate(&node.latest, &[keys::HOST_NODE_ID]);
    vec![owner]
}

/// Nodes of `topology` connected by connections that were only seen at the
/// IP level. `to_ips` yields the IP nodes each owner claims.
pub fn connection_join(topology: &'static str, to_ips: MapFunc) -> Renderer {
    let ips = Renderer::reduce(vec![
        Renderer::map(to_ips, Renderer::select(topology)),
        Renderer::map(
            MapFunc::new("endpoint_to_ips", endpoint_to_ips),
            Renderer::select(keys::ENDPOINT),
        ),
    ]);
    let back = MapFunc::new("ip_to_owner", move |node: &Node, _: &Networks| ip_to_owner(node, topology));
    Renderer::filter_unconnected(Renderer::map(back, ips))
}

pub fn container_connection_join() -> Renderer {
    connection_join(keys::CONTAINER, MapFunc::new("container_to_ips", container_to_ips))
}

pub fn pod_connection_join() -> Renderer {
    connection_join(keys::POD, MapFunc::new("pod_to_ips", pod_to_ips))
}

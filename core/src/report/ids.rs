//! Node ID construction and parsing.
//!
//! IDs are scoped so that the same entity is addressed identically by every
//! reporter: an endpoint is `scope;addr;port`, a process `host;pid`, and the
//! remaining topologies carry a `;<topology>` suffix so that an ID from one
//! topology can never be mistaken for one from another.

use std::net::IpAddr;

pub const SCOPE_DELIM: char = ';';

/// ID of the pseudo node representing inbound internet traffic.
pub const INCOMING_INTERNET_ID: &str = "in-theinternet";
/// ID of the pseudo node representing outbound internet traffic.
pub const OUTGOING_INTERNET_ID: &str = "out-theinternet";
pub const THE_INTERNET_ID: &str = "theinternet";
/// Prefix of the known-service pseudo nodes, followed by the matched hostname.
pub const SERVICE_NODE_ID_PREFIX: &str = "service-";

pub fn make_endpoint_node_id(scope: &str, address: &str, port: &str) -> String {
    format!("{scope};{address};{port}")
}

pub fn parse_endpoint_node_id(id: &str) -> Option<(&str, &str, &str)> {
    let mut fields = id.splitn(3, SCOPE_DELIM);
    let scope = fields.next()?;
    let address = fields.next()?;
    let port = fields.next()?;
    Some((scope, address, port))
}

pub fn make_address_node_id(scope: &str, address: &str) -> String {
    format!("{scope};{address}")
}

pub fn parse_address_node_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(SCOPE_DELIM)
}

pub fn make_process_node_id(host_id: &str, pid: &str) -> String {
    format!("{host_id};{pid}")
}

pub fn parse_process_node_id(id: &str) -> Option<(&str, &str)> {
    id.split_once(SCOPE_DELIM)
}

fn make_single_component_id(tag: &str, id: &str) -> String {
    format!("{id};<{tag}>")
}

fn parse_single_component_id<'a>(tag: &str, id: &'a str) -> Option<&'a str> {
    let (value, suffix) = id.rsplit_once(SCOPE_DELIM)?;
    let inner = suffix.strip_prefix('<')?.strip_suffix('>')?;
    (inner == tag).then_some(value)
}

pub fn make_host_node_id(host_id: &str) -> String {
    make_single_component_id("host", host_id)
}

pub fn parse_host_node_id(id: &str) -> Option<&str> {
    parse_single_component_id("host", id)
}

pub fn make_container_node_id(container_id: &str) -> String {
    make_single_component_id("container", container_id)
}

pub fn parse_container_node_id(id: &str) -> Option<&str> {
    parse_single_component_id("container", id)
}

pub fn make_container_image_node_id(image_id: &str) -> String {
    make_single_component_id("container_image", image_id)
}

pub fn make_pod_node_id(uid: &str) -> String {
    make_single_component_id("pod", uid)
}

pub fn make_service_node_id(uid: &str) -> String {
    make_single_component_id("service", uid)
}

pub fn make_ecs_task_node_id(arn: &str) -> String {
    make_single_component_id("ecs_task", arn)
}

pub fn make_ecs_service_node_id(name: &str) -> String {
    make_single_component_id("ecs_service", name)
}

pub fn make_deployment_node_id(uid: &str) -> String {
    make_single_component_id("deployment", uid)
}

pub fn make_daemon_set_node_id(uid: &str) -> String {
    make_single_component_id("daemonset", uid)
}

pub fn make_stateful_set_node_id(uid: &str) -> String {
    make_single_component_id("statefulset", uid)
}

pub fn make_cron_job_node_id(uid: &str) -> String {
    make_single_component_id("cronjob", uid)
}

pub fn make_job_node_id(uid: &str) -> String {
    make_single_component_id("job", uid)
}

pub fn make_persistent_volume_node_id(uid: &str) -> String {
    make_single_component_id("persistent_volume", uid)
}

pub fn make_persistent_volume_claim_node_id(uid: &str) -> String {
    make_single_component_id("persistent_volume_claim", uid)
}

pub fn make_storage_class_node_id(uid: &str) -> String {
    make_single_component_id("storage_class", uid)
}

pub fn make_volume_snapshot_node_id(uid: &str) -> String {
    make_single_component_id("volume_snapshot", uid)
}

pub fn make_volume_snapshot_data_node_id(uid: &str) -> String {
    make_single_component_id("volume_snapshot_data", uid)
}

pub fn make_pseudo_node_id(parts: &[&str]) -> String {
    let mut id = String::from("pseudo");
    for part in parts {
        id.push(SCOPE_DELIM);
        id.push_str(part);
    }
    id
}

pub fn is_loopback(address: &str) -> bool {
    address
        .parse::<IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

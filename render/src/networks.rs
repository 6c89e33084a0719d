use std::net::{IpAddr, Ipv4Addr};
use topoview_core::report::networks::containing_ipv4_network;
use topoview_core::report::{keys, Networks, Report, Topology};
use tracing::debug;

/// Networks considered local to the report: every CIDR advertised by host
/// and overlay nodes, plus the smallest network holding all Kubernetes
/// service IPs.
pub fn local_networks(report: &Report) -> Networks {
    let mut networks = Networks::new();

    for topology in [&report.host, &report.overlay] {
        for node in topology.nodes.iter() {
            for cidr in node.sets.values(keys::HOST_LOCAL_NETWORKS) {
                if let Err(err) = networks.add_cidr(cidr) {
                    debug!(node = %node.id, error = %err, "skipping local network");
                }
            }
        }
    }

    if let Some(services) = kube_service_network(&report.service) {
        networks.add(services.into());
    }
    networks
}

fn kube_service_network(services: &Topology) -> Option<ipnetwork::Ipv4Network> {
    let ips: Vec<Ipv4Addr> = services
        .nodes
        .iter()
        .filter_map(|node| node.latest.lookup(keys::KUBERNETES_IP))
        .filter_map(|ip| match ip.parse::<IpAddr>() {
            Ok(IpAddr::V4(v4)) => Some(v4),
            _ => None,
        })
        .collect();
    containing_ipv4_network(&ips)
}

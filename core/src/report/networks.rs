use crate::error::ReportError;
use ipnetwork::{IpNetwork, Ipv4Network};
use std::net::{IpAddr, Ipv4Addr};

/// A set of subnets, used to decide whether an address is local to the
/// observed infrastructure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Networks {
    nets: Vec<IpNetwork>,
}

impl Networks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, net: IpNetwork) {
        if !self.nets.contains(&net) {
            self.nets.push(net);
        }
    }

    pub fn add_cidr(&mut self, cidr: &str) -> Result<(), ReportError> {
        let net = cidr
            .parse::<IpNetwork>()
            .map_err(|err| ReportError::InvalidCidr(format!("{cidr}: {err}")))?;
        self.add(net);
        Ok(())
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        self.nets.iter().any(|net| net.contains(ip))
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }
}

/// Smallest IPv4 network containing every address, `None` when there are none.
pub fn containing_ipv4_network(ips: &[Ipv4Addr]) -> Option<Ipv4Network> {
    let (first, rest) = ips.split_first()?;
    let base = u32::from(*first);
    let mut prefix = 32u8;
    for ip in rest {
        let common = (base ^ u32::from(*ip)).leading_zeros() as u8;
        prefix = prefix.min(common);
    }
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
    Ipv4Network::new(Ipv4Addr::from(base & mask), prefix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_checks_every_network() {
        let mut nets = Networks::new();
        nets.add_cidr("10.0.0.0/8").expect("valid cidr");
        nets.add_cidr("192.168.1.0/24").expect("valid cidr");

        assert!(nets.contains("10.32.0.7".parse().expect("ip")));
        assert!(nets.contains("192.168.1.200".parse().expect("ip")));
        assert!(!nets.contains("8.8.8.8".parse().expect("ip")));
    }

    #[test]
    fn invalid_cidr_is_rejected() {
        let mut nets = Networks::new();
        assert!(matches!(nets.add_cidr("10.0.0.0/99"), Err(ReportError::InvalidCidr(_))));
        assert!(nets.is_empty());
    }

    #[test]
    fn containing_network_of_service_ips() {
        let ips: Vec<Ipv4Addr> = ["10.0.0.1", "10.0.0.200", "10.0.1.3"]
            .iter()
            .map(|s| s.parse().expect("ip"))
            .collect();
        let net = containing_ipv4_network(&ips).expect("network");
        assert_eq!(net.to_string(), "10.0.0.0/23");
        assert_eq!(containing_ipv4_network(&[]), None);
    }

    #[test]
    fn containing_network_of_single_ip_is_host_route() {
        let ip: Ipv4Addr = "172.16.4.4".parse().expect("ip");
        let net = containing_ipv4_network(&[ip]).expect("network");
        assert_eq!(net.prefix(), 32);
        assert!(net.contains(ip));
    }
}

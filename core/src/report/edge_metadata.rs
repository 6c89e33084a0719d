use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Traffic counters for one directed edge. `None` means "not counted", which is
/// distinct from a counted zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_packet_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_packet_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_byte_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_byte_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_conn_count_tcp: Option<u64>,
}

fn combine(dst: Option<u64>, src: Option<u64>, op: fn(u64, u64) -> u64) -> Option<u64> {
    match (dst, src) {
        (Some(a), Some(b)) => Some(op(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

impl EdgeMetadata {
    pub fn with_egress_bytes(mut self, bytes: u64) -> Self {
        self.egress_byte_count = Some(bytes);
        self
    }

    pub fn with_ingress_bytes(mut self, bytes: u64) -> Self {
        self.ingress_byte_count = Some(bytes);
        self
    }

    pub fn with_egress_packets(mut self, packets: u64) -> Self {
        self.egress_packet_count = Some(packets);
        self
    }

    pub fn with_ingress_packets(mut self, packets: u64) -> Self {
        self.ingress_packet_count = Some(packets);
        self
    }

    pub fn with_max_conn_count_tcp(mut self, count: u64) -> Self {
        self.max_conn_count_tcp = Some(count);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == EdgeMetadata::default()
    }

    /// Direction-swapped copy.
    pub fn reversed(&self) -> Self {
        Self {
            egress_packet_count: self.ingress_packet_count,
            ingress_packet_count: self.egress_packet_count,
            egress_byte_count: self.ingress_byte_count,
            ingress_byte_count: self.egress_byte_count,
            max_conn_count_tcp: self.max_conn_count_tcp,
        }
    }

    /// Combines two observations of the same edge: counts add up, the
    /// connection maximum keeps the larger value.
    pub fn merge(&self, other: &EdgeMetadata) -> Self {
        Self {
            egress_packet_count: combine(self.egress_packet_count, other.egress_packet_count, u64::saturating_add),
            ingress_packet_count: combine(self.ingress_packet_count, other.ingress_packet_count, u64::saturating_add),
            egress_byte_count: combine(self.egress_byte_count, other.egress_byte_count, u64::saturating_add),
            ingress_byte_count: combine(self.ingress_byte_count, other.ingress_byte_count, u64::saturating_add),
            max_conn_count_tcp: combine(self.max_conn_count_tcp, other.max_conn_count_tcp, u64::max),
        }
    }

    /// Sums two different edges into one aggregate, connection counts included.
    pub fn flatten(&self, other: &EdgeMetadata) -> Self {
        Self {
            max_conn_count_tcp: combine(self.max_conn_count_tcp, other.max_conn_count_tcp, u64::saturating_add),
            ..self.merge(other)
        }
    }
}

/// Edge metadata keyed by the remote node ID, alongside a node's adjacency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeMetadatas(BTreeMap<String, EdgeMetadata>);

impl EdgeMetadatas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, remote_id: impl Into<String>, metadata: EdgeMetadata) {
        let slot = self.0.entry(remote_id.into()).or_default();
        *slot = slot.merge(&metadata);
    }

    pub fn lookup(&self, remote_id: &str) -> Option<&EdgeMetadata> {
        self.0.get(remote_id)
    }

    pub fn merge(&mut self, other: &EdgeMetadatas) {
        for (remote_id, metadata) in &other.0 {
            self.add(remote_id.clone(), *metadata);
        }
    }

    pub fn flatten(&self) -> EdgeMetadata {
        self.0
            .values()
            .fold(EdgeMetadata::default(), |acc, metadata| acc.flatten(metadata))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

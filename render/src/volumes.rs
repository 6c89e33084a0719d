//! Kubernetes storage: pods, persistent volume claims, persistent volumes,
//! storage classes and volume snapshots, linked by name.
//!
//! A node is linked to a target by adjacency and by recording the target as
//! a child. Names only match when both sides carry them.

use crate::renderer::{RenderContext, Rendered, Renderer};
use topoview_core::report::{keys, Node, Nodes, Topology};

fn latest<'n>(node: &'n Node, key: &str) -> Option<&'n str> {
    node.latest.lookup(key).filter(|value| !value.is_empty())
}

fn same(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn stamped(node: &Node, topology: &str) -> Node {
    let mut node = node.clone();
    if node.topology.is_empty() {
        node.topology = topology.to_string();
    }
    node
}

fn link(node: &mut Node, target: &Node) {
    node.adjacency.add(target.id.clone());
    node.add_child(target);
}

/// Links every upstream node to the nodes of `targets` that `matches`.
fn linked<F>(name: &'static str, source: &'static str, targets: &'static str, matches: F) -> Renderer
where
    F: Fn(&Node, &Node) -> bool + Send + Sync + 'static,
{
    Renderer::custom(name, Renderer::select(source), move |ctx, upstream| {
        let mut rendered = upstream.render_in(ctx);
        let Some(found) = ctx.report().topology(targets).map(|t| candidates(t, targets)) else {
            return rendered;
        };
        for node in rendered.nodes.iter_mut() {
            let matched: Vec<&Node> = found.iter().filter(|target| matches(node, target)).collect();
            for target in matched {
                link(node, target);
            }
        }
        rendered
    })
}

fn candidates(topology: &Topology, name: &str) -> Vec<Node> {
    topology.nodes.iter().map(|node| stamped(node, name)).collect()
}

/// Claims linked to the volume bound to them.
pub fn volumes() -> Renderer {
    linked(
        "volumes",
        keys::PERSISTENT_VOLUME_CLAIM,
        keys::PERSISTENT_VOLUME,
        |claim, volume| same(latest(claim, keys::KUBERNETES_VOLUME_NAME), latest(volume, keys::KUBERNETES_NAME)),
    )
}

/// Pods that mount claims, linked to each claim of the same namespace.
/// Pods without claims are left out.
pub fn pod_to_volumes() -> Renderer {
    Renderer::custom("pod_to_volumes", Renderer::select(keys::POD), |ctx: &RenderContext<'_>, upstream| {
        let rendered = upstream.render_in(ctx);
        let claims = candidates(&ctx.report().persistent_volume_claim, keys::PERSISTENT_VOLUME_CLAIM);

        let mut nodes = Nodes::new();
        for mut pod in rendered.nodes.into_iter() {
            let Some(claim_names) = pod.latest.lookup(keys::KUBERNETES_VOLUME_CLAIM).map(str::to_string) else {
                continue;
            };
            let namespace = pod.latest.lookup(keys::KUBERNETES_NAMESPACE).map(str::to_string);
            for claim_name in claim_names.split(';').filter(|name| !name.is_empty()) {
                let claim = claims.iter().find(|claim| {
                    latest(claim, keys::KUBERNETES_NAME) == Some(claim_name)
                        && claim.latest.lookup(keys::KUBERNETES_NAMESPACE) == namespace.as_deref()
                });
                if let Some(claim) = claim {
                    link(&mut pod, claim);
                }
            }
            nodes.add(pod);
        }
        Rendered {
            nodes,
            filtered: rendered.filtered,
        }
    })
}

/// Storage classes linked to the claims provisioned from them.
pub fn pvc_to_storage_class() -> Renderer {
    linked(
        "pvc_to_storage_class",
        keys::STORAGE_CLASS,
        keys::PERSISTENT_VOLUME_CLAIM,
        |class, claim| same(latest(class, keys::KUBERNETES_NAME), latest(claim, keys::KUBERNETES_STORAGE_CLASS_NAME)),
    )
}

/// Volumes linked to the snapshots taken of them.
pub fn pv_to_snapshot() -> Renderer {
    linked(
        "pv_to_snapshot",
        keys::PERSISTENT_VOLUME,
        keys::VOLUME_SNAPSHOT,
        |volume, snapshot| same(latest(volume, keys::KUBERNETES_NAME), latest(snapshot, keys::KUBERNETES_VOLUME_NAME)),
    )
}

/// Snapshots linked to their data. Snapshot data is only rendered while
/// some snapshot exists.
pub fn volume_snapshot() -> Renderer {
    let snapshots = linked(
        "volume_snapshot",
        keys::VOLUME_SNAPSHOT,
        keys::VOLUME_SNAPSHOT_DATA,
        |snapshot, data| same(latest(snapshot, keys::KUBERNETES_SNAPSHOT_DATA), latest(data, keys::KUBERNETES_NAME)),
    );
    Renderer::custom("volume_snapshot_data", snapshots, |ctx: &RenderContext<'_>, upstream| {
        let mut rendered = upstream.render_in(ctx);
        if !rendered.nodes.is_empty() {
            for data in candidates(&ctx.report().volume_snapshot_data, keys::VOLUME_SNAPSHOT_DATA) {
                rendered.nodes.add(data);
            }
        }
        rendered
    })
}

/// Every storage renderer, reduced.
pub fn kubernetes_volumes() -> Renderer {
    Renderer::reduce(vec![
        volumes(),
        pod_to_volumes(),
        pvc_to_storage_class(),
        pv_to_snapshot(),
        volume_snapshot(),
    ])
}

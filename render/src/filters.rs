//! Node predicates used by the filtering renderers.

use std::sync::Arc;
use topoview_core::report::{keys, Node};

pub type FilterFunc = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

const K8S_NAMESPACE_LABEL: &str = "io.kubernetes.pod.namespace";
const K8S_POD_NAME_LABEL: &str = "io.kubernetes.pod.name";
const SWARM_NAMESPACE_LABEL: &str = "com.docker.stack.namespace";
const ROLE_LABEL: &str = "works.weave.role";
const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";
/// Namespace matched by containers that carry no namespace at all.
pub const DEFAULT_NAMESPACE: &str = "default";

const SYSTEM_CONTAINER_NAMES: &[&str] = &[
    "weavescope",
    "weavedns",
    "weave",
    "weaveproxy",
    "weaveexec",
    "ecs-agent",
];

const SYSTEM_IMAGE_PREFIXES: &[&str] = &[
    "swarm",
    "weaveworks/scope",
    "weaveworks/weavedns",
    "weaveworks/weave",
    "weaveworks/weaveproxy",
    "weaveworks/weaveexec",
    "amazon/amazon-ecs-agent",
    "openshift/origin-pod",
    "docker.io/openshift/origin-pod",
];

pub fn any_of(fs: Vec<FilterFunc>) -> FilterFunc {
    Arc::new(move |node: &Node| fs.iter().any(|f| f(node)))
}

pub fn all_of(fs: Vec<FilterFunc>) -> FilterFunc {
    Arc::new(move |node: &Node| fs.iter().all(|f| f(node)))
}

pub fn complement(f: FilterFunc) -> FilterFunc {
    Arc::new(move |node: &Node| !f(node))
}

/// True unless the node is a container in a non-running state.
pub fn is_running(node: &Node) -> bool {
    match node.latest.lookup(keys::DOCKER_CONTAINER_STATE) {
        None => true,
        Some(state) => matches!(
            state,
            keys::STATE_RUNNING | keys::STATE_RESTARTING | keys::STATE_PAUSED
        ),
    }
}

pub fn is_stopped(node: &Node) -> bool {
    !is_running(node)
}

pub fn is_pause_image(image_name: &str) -> bool {
    image_name.contains("google_containers/pause")
        || image_name.contains("k8s.gcr.io/pause")
        || image_name.contains("registry.k8s.io/pause")
}

pub fn is_pause_container(node: &Node) -> bool {
    node.latest
        .lookup(keys::DOCKER_IMAGE_NAME)
        .is_some_and(is_pause_image)
}

/// False for infrastructure containers: the monitoring stack itself,
/// orchestrator agents, pause containers and anything in `kube-system`.
pub fn is_application(node: &Node) -> bool {
    let latest = &node.latest;
    if let Some(name) = latest.lookup(keys::DOCKER_CONTAINER_NAME) {
        if SYSTEM_CONTAINER_NAMES.contains(&name) {
            return false;
        }
    }

    let image_name = latest.lookup(keys::DOCKER_IMAGE_NAME).unwrap_or_default();
    let image_prefix = image_name.split(':').next().unwrap_or_default();
    if SYSTEM_IMAGE_PREFIXES.contains(&image_prefix) || is_pause_image(image_prefix) {
        return false;
    }

    let role_keys = [
        format!("{}{}", keys::DOCKER_LABEL_PREFIX, ROLE_LABEL),
        format!("{}{}", keys::DOCKER_IMAGE_LABEL_PREFIX, ROLE_LABEL),
    ];
    if role_keys.iter().any(|key| latest.lookup(key) == Some("system")) {
        return false;
    }

    let namespace_key = format!("{}{}", keys::DOCKER_LABEL_PREFIX, K8S_NAMESPACE_LABEL);
    if latest.lookup(&namespace_key) == Some(KUBE_SYSTEM_NAMESPACE) {
        return false;
    }
    let pod_name_key = format!("{}{}", keys::DOCKER_LABEL_PREFIX, K8S_POD_NAME_LABEL);
    if latest
        .lookup(&pod_name_key)
        .is_some_and(|pod| pod.starts_with("kube-system/"))
    {
        return false;
    }
    true
}

pub fn is_system(node: &Node) -> bool {
    !is_application(node)
}

/// Matches nodes carrying the docker label `key=value`.
pub fn has_label(key: &str, value: &str) -> FilterFunc {
    let label_key = format!("{}{}", keys::DOCKER_LABEL_PREFIX, key);
    let value = value.to_string();
    Arc::new(move |node: &Node| node.latest.lookup(&label_key) == Some(value.as_str()))
}

/// Matches pods, services and containers in `namespace`. Nodes with no
/// namespace information belong to [`DEFAULT_NAMESPACE`].
pub fn is_namespace(namespace: &str) -> FilterFunc {
    let namespace = namespace.to_string();
    let try_keys = [
        keys::KUBERNETES_NAMESPACE.to_string(),
        format!("{}{}", keys::DOCKER_LABEL_PREFIX, K8S_NAMESPACE_LABEL),
        format!("{}{}", keys::DOCKER_LABEL_PREFIX, SWARM_NAMESPACE_LABEL),
    ];
    Arc::new(move |node: &Node| {
        let found = try_keys.iter().find_map(|key| node.latest.lookup(key));
        match found {
            Some(value) => value == namespace,
            None => namespace == DEFAULT_NAMESPACE,
        }
    })
}

pub fn is_topology(topology: &str) -> FilterFunc {
    let topology = topology.to_string();
    Arc::new(move |node: &Node| node.topology == topology)
}

pub fn is_pseudo(node: &Node) -> bool {
    node.is_pseudo()
}

/// True for real nodes, and for the internet and known-service pseudo nodes
/// which stand for something a viewer cares about.
pub fn is_not_pseudo(node: &Node) -> bool {
    !node.is_pseudo()
        || node.id.ends_with(topoview_core::report::ids::THE_INTERNET_ID)
        || node
            .id
            .starts_with(topoview_core::report::ids::SERVICE_NODE_ID_PREFIX)
}

pub fn is_connected(node: &Node) -> bool {
    node.latest.contains_key(keys::IS_CONNECTED)
}

/// Matches nodes that folded at least one child of `topology`.
pub fn has_children(topology: &str) -> FilterFunc {
    let topology = topology.to_string();
    Arc::new(move |node: &Node| node.children.values(&topology).next().is_some())
}

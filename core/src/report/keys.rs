//! Topology names and the metadata keys reporters attach to nodes.

// topology names
pub const ENDPOINT: &str = "endpoint";
pub const PROCESS: &str = "process";
pub const CONTAINER: &str = "container";
pub const CONTAINER_IMAGE: &str = "container_image";
pub const HOST: &str = "host";
pub const POD: &str = "pod";
pub const SERVICE: &str = "service";
pub const DEPLOYMENT: &str = "deployment";
pub const DAEMON_SET: &str = "daemonset";
pub const STATEFUL_SET: &str = "statefulset";
pub const CRON_JOB: &str = "cronjob";
pub const JOB: &str = "job";
pub const ECS_TASK: &str = "ecs_task";
pub const ECS_SERVICE: &str = "ecs_service";
pub const OVERLAY: &str = "overlay";
pub const PERSISTENT_VOLUME: &str = "persistent_volume";
pub const PERSISTENT_VOLUME_CLAIM: &str = "persistent_volume_claim";
pub const STORAGE_CLASS: &str = "storage_class";
pub const VOLUME_SNAPSHOT: &str = "volume_snapshot";
pub const VOLUME_SNAPSHOT_DATA: &str = "volume_snapshot_data";
pub const PSEUDO: &str = "pseudo";

// derived topologies that exist only in rendered output
pub const PROCESS_NAME: &str = "process_name";
pub const CONTAINER_HOSTNAME: &str = "container_hostname";
pub const IP: &str = "ip";

// shared
pub const HOST_NODE_ID: &str = "host_node_id";

// endpoint
pub const ADDR: &str = "addr";
pub const PORT: &str = "port";
pub const PROCSPIED: &str = "procspied";
pub const REVERSE_DNS_NAMES: &str = "reverse_dns_names";
pub const SNOOPED_DNS_NAMES: &str = "snooped_dns_names";

// process
pub const PID: &str = "pid";
pub const NAME: &str = "name";
pub const CMDLINE: &str = "cmdline";

// docker
pub const DOCKER_CONTAINER_ID: &str = "docker_container_id";
pub const DOCKER_CONTAINER_NAME: &str = "docker_container_name";
pub const DOCKER_CONTAINER_STATE: &str = "docker_container_state";
pub const DOCKER_CONTAINER_HOSTNAME: &str = "docker_container_hostname";
pub const DOCKER_CONTAINER_IPS_WITH_SCOPES: &str = "docker_container_ips_with_scopes";
pub const DOCKER_CONTAINER_PORTS: &str = "docker_container_ports";
pub const DOCKER_IS_IN_HOST_NETWORK: &str = "docker_is_in_host_network";
pub const DOCKER_IMAGE_ID: &str = "docker_image_id";
pub const DOCKER_IMAGE_NAME: &str = "docker_image_name";
pub const DOCKER_LABEL_PREFIX: &str = "docker_label_";
pub const DOCKER_IMAGE_LABEL_PREFIX: &str = "docker_image_label_";
pub const DOES_NOT_MAKE_CONNECTIONS: &str = "does_not_make_connections";

pub const STATE_RUNNING: &str = "running";
pub const STATE_RESTARTING: &str = "restarting";
pub const STATE_PAUSED: &str = "paused";
pub const STATE_STOPPED: &str = "stopped";
pub const STATE_DELETED: &str = "deleted";
pub const STATE_FAILED: &str = "failed";

// host
pub const HOST_NAME: &str = "host_name";
pub const HOST_LOCAL_NETWORKS: &str = "local_networks";

// kubernetes
pub const KUBERNETES_NAMESPACE: &str = "kubernetes_namespace";
pub const KUBERNETES_NAME: &str = "kubernetes_name";
pub const KUBERNETES_STATE: &str = "kubernetes_state";
pub const KUBERNETES_IP: &str = "kubernetes_ip";
pub const KUBERNETES_SERVICE_IDS: &str = "kubernetes_service_ids";
pub const KUBERNETES_IS_IN_HOST_NETWORK: &str = "kubernetes_is_in_host_network";
/// Claim names mounted by a pod, separated by `;`.
pub const KUBERNETES_VOLUME_CLAIM: &str = "kubernetes_volume_claim";
pub const KUBERNETES_VOLUME_NAME: &str = "kubernetes_volume_name";
pub const KUBERNETES_STORAGE_CLASS_NAME: &str = "kubernetes_storage_class_name";
pub const KUBERNETES_SNAPSHOT_DATA: &str = "kubernetes_snapshot_data";

// ecs
pub const ECS_CLUSTER: &str = "ecs_cluster";
pub const ECS_TASK_FAMILY: &str = "ecs_task_family";

// render-time markers
pub const IS_CONNECTED: &str = "is_connected";

// counters written by the ip join
pub const IPS_COUNTER: &str = "ips";

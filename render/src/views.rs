//! The named views a transport layer can serve.

use crate::filters::{self, FilterFunc};
use crate::join::{container_connection_join, pod_connection_join};
use crate::known_services;
use crate::mapping;
use crate::memoise::RenderCache;
use crate::renderer::{MapFunc, Renderer};
use crate::volumes::kubernetes_volumes;
use std::collections::BTreeMap;
use std::sync::Arc;
use topoview_core::config::AppConfig;
use topoview_core::report::{keys, Networks, Node, Report};

pub const ENDPOINTS: &str = "endpoints";
pub const PROCESSES: &str = "processes";
pub const PROCESSES_BY_NAME: &str = "processes-by-name";
pub const CONTAINERS: &str = "containers";
pub const CONTAINERS_BY_IMAGE: &str = "containers-by-image";
pub const CONTAINERS_BY_HOSTNAME: &str = "containers-by-hostname";
pub const PODS: &str = "pods";
pub const SERVICES: &str = "services";
pub const KUBE_CONTROLLERS: &str = "kube-controllers";
pub const HOSTS: &str = "hosts";
pub const ECS_TASKS: &str = "ecs-tasks";
pub const ECS_SERVICES: &str = "ecs-services";
pub const PERSISTENT_VOLUME_CLAIMS: &str = "persistent-volume-claims";
pub const OVERLAY: &str = "overlay";

fn map(name: &'static str, f: fn(&Node, &Networks) -> Vec<Node>, upstream: Renderer) -> Renderer {
    Renderer::map(MapFunc::new(name, f), upstream)
}

fn not_in_state(key: &'static str, states: &'static [&'static str]) -> FilterFunc {
    Arc::new(move |node: &Node| match node.latest.lookup(key) {
        Some(state) => !states.contains(&state),
        None => true,
    })
}

/// Registry of composed renderers sharing one render cache.
pub struct Views {
    cache: RenderCache,
    renderers: BTreeMap<&'static str, Renderer>,
}

impl Views {
    pub fn new(cache: RenderCache) -> Self {
        let select = Renderer::select;

        let processes = Renderer::reduce(vec![
            map("endpoint_to_process", mapping::endpoint_to_process, select(keys::ENDPOINT)),
            select(keys::PROCESS),
        ]);

        let in_container: FilterFunc =
            Arc::new(|node: &Node| node.latest.contains_key(keys::DOCKER_CONTAINER_ID));
        let connected: FilterFunc = Arc::new(filters::is_connected);
        let in_container_or_connected = filters::any_of(vec![in_container, connected]);
        let containers = Renderer::memoise(
            &cache,
            Renderer::filter(
                not_in_state(keys::DOCKER_CONTAINER_STATE, &[keys::STATE_DELETED]),
                Renderer::reduce(vec![
                    Renderer::filter(
                        in_container_or_connected,
                        map(
                            "process_to_container",
                            mapping::process_to_container,
                            Renderer::color_connected(processes.clone()),
                        ),
                    ),
                    container_connection_join(),
                    select(keys::CONTAINER),
                ]),
            ),
        );

        let pods = Renderer::memoise(
            &cache,
            Renderer::conditional(
                Report::has_kubernetes_data,
                Renderer::filter(
                    not_in_state(keys::KUBERNETES_STATE, &[keys::STATE_DELETED, keys::STATE_FAILED]),
                    Renderer::reduce(vec![
                        map("container_to_pod", mapping::container_to_pod, containers.clone()),
                        select(keys::POD),
                        pod_connection_join(),
                        kubernetes_volumes(),
                    ]),
                ),
            ),
        );

        let services = Renderer::conditional(
            Report::has_kubernetes_data,
            Renderer::reduce(vec![
                map("pod_to_service", mapping::pod_to_service, pods.clone()),
                select(keys::SERVICE),
            ]),
        );

        let mut controllers: Vec<Renderer> = mapping::CONTROLLER_TOPOLOGIES.iter().map(|&t| select(t)).collect();
        controllers.push(map("pod_to_controller", mapping::pod_to_controller, pods.clone()));
        let kube_controllers = Renderer::conditional(Report::has_kubernetes_data, Renderer::reduce(controllers));

        let hosts = Renderer::memoise(
            &cache,
            Renderer::reduce(vec![
                map("endpoint_to_host", mapping::endpoint_to_host, select(keys::ENDPOINT)),
                map("x_to_host", mapping::x_to_host, select(keys::PROCESS)),
                map("x_to_host", mapping::x_to_host, select(keys::CONTAINER)),
                select(keys::HOST),
            ]),
        );

        let ecs_tasks = Renderer::reduce(vec![
            map("container_to_ecs_task", mapping::container_to_ecs_task, containers.clone()),
            select(keys::ECS_TASK),
        ]);
        let ecs_services = Renderer::reduce(vec![
            map("ecs_task_to_ecs_service", mapping::ecs_task_to_ecs_service, ecs_tasks.clone()),
            select(keys::ECS_SERVICE),
        ]);

        let containers_by_image = Renderer::memoise(
            &cache,
            Renderer::reduce(vec![
                map("container_to_image", mapping::container_to_image, containers.clone()),
                select(keys::CONTAINER_IMAGE),
            ]),
        );
        let containers_by_hostname = map(
            "container_to_hostname",
            mapping::container_to_hostname,
            containers.clone(),
        );
        let processes_by_name = map("process_to_name", mapping::process_to_name, processes.clone());

        let renderers = BTreeMap::from([
            (ENDPOINTS, select(keys::ENDPOINT)),
            (PROCESSES, processes),
            (PROCESSES_BY_NAME, processes_by_name),
            (CONTAINERS, containers),
            (CONTAINERS_BY_IMAGE, containers_by_image),
            (CONTAINERS_BY_HOSTNAME, containers_by_hostname),
            (PODS, pods),
            (SERVICES, services),
            (KUBE_CONTROLLERS, kube_controllers),
            (HOSTS, hosts),
            (ECS_TASKS, ecs_tasks),
            (ECS_SERVICES, ecs_services),
            (PERSISTENT_VOLUME_CLAIMS, select(keys::PERSISTENT_VOLUME_CLAIM)),
            (OVERLAY, select(keys::OVERLAY)),
        ]);

        Self { cache, renderers }
    }

    /// Builds the views from settings, resizing the known-service cache too.
    pub fn from_config(config: &AppConfig) -> Self {
        known_services::set_known_service_cache_capacity(config.cache.known_service_capacity);
        Self::new(RenderCache::from_config(&config.cache))
    }

    pub fn get(&self, id: &str) -> Option<&Renderer> {
        self.renderers.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.renderers.keys().copied()
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Flushes the render and known-service caches.
    pub fn reset(&self) {
        self.cache.reset();
        known_services::purge_known_service_cache();
    }
}

impl Default for Views {
    fn default() -> Self {
        Self::new(RenderCache::default())
    }
}

mod common;

use common::{bytes, local_endpoint, pod, remote_endpoint, ts, ReportBuilder, LOCAL_CIDR};
use pretty_assertions::assert_eq;
use topoview_core::config::AppConfig;
use topoview_core::report::ids::{
    make_container_node_id, make_deployment_node_id, make_host_node_id, make_persistent_volume_claim_node_id,
    make_persistent_volume_node_id, make_pod_node_id, make_process_node_id, make_pseudo_node_id,
    make_storage_class_node_id, INCOMING_INTERNET_ID, OUTGOING_INTERNET_ID,
};
use topoview_core::report::{keys, Node, Report};
use topoview_render::mapping::{UNCONTAINED_ID, UNMANAGED_ID};
use topoview_render::views::{self, Views};
use topoview_render::{RenderCache, RenderCacheConfig};

fn view(views: &Views, id: &str) -> topoview_render::Renderer {
    views.get(id).unwrap().clone()
}

#[test]
fn test_uncontained_processes_fold_per_host() {
    let report = ReportBuilder::new("uncontained")
        .host("h1", &[LOCAL_CIDR])
        .host("h2", &[LOCAL_CIDR])
        .process("h1", "1", "nginx")
        .process("h1", "2", "sshd")
        .process("h2", "3", "nginx")
        .build();

    let views = Views::default();
    let rendered = view(&views, views::CONTAINERS).render(&report);

    let h1 = rendered
        .nodes
        .get(&make_pseudo_node_id(&[UNCONTAINED_ID, "h1"]))
        .unwrap();
    let h2 = rendered
        .nodes
        .get(&make_pseudo_node_id(&[UNCONTAINED_ID, "h2"]))
        .unwrap();
    assert_eq!(h1.topology, keys::PSEUDO);
    assert_eq!(h1.counters.lookup(keys::PROCESS), Some(2));
    assert_eq!(h2.counters.lookup(keys::PROCESS), Some(1));
    assert_eq!(rendered.nodes.len(), 2);
}

#[test]
fn test_uncontained_becomes_unmanaged_in_pods_view() {
    let report = ReportBuilder::new("unmanaged")
        .host("h1", &[LOCAL_CIDR])
        .process("h1", "1", "kubelet")
        .node(keys::POD, pod("p1", "default", ""))
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PODS).render(&report);

    let unmanaged = rendered
        .nodes
        .get(&make_pseudo_node_id(&[UNMANAGED_ID, "h1"]))
        .unwrap();
    assert!(unmanaged.is_pseudo());
    assert!(rendered.nodes.contains("p1;<pod>"));
}

#[test]
fn test_inbound_internet_traffic() {
    let report = ReportBuilder::new("inbound")
        .host("h1", &[LOCAL_CIDR])
        .node(keys::ENDPOINT, local_endpoint("10.0.0.5", "80", "h1", "1"))
        .node(
            keys::ENDPOINT,
            remote_endpoint("8.8.8.8", "44321").with_adjacent(";10.0.0.5;80"),
        )
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PROCESSES).render(&report);

    let process_id = make_process_node_id("h1", "1");
    let internet = rendered.nodes.get(INCOMING_INTERNET_ID).unwrap();
    assert!(internet.is_pseudo());
    assert_eq!(internet.adjacency.iter().collect::<Vec<_>>(), vec![process_id.as_str()]);
    assert!(!rendered.nodes.contains(OUTGOING_INTERNET_ID));
}

#[test]
fn test_outbound_internet_traffic() {
    let report = ReportBuilder::new("outbound")
        .host("h1", &[LOCAL_CIDR])
        .node(
            keys::ENDPOINT,
            local_endpoint("10.0.0.5", "40000", "h1", "1").with_adjacent(";1.2.3.4;443"),
        )
        .node(keys::ENDPOINT, remote_endpoint("1.2.3.4", "443"))
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PROCESSES).render(&report);

    let process = rendered.nodes.get(&make_process_node_id("h1", "1")).unwrap();
    assert_eq!(process.adjacency.iter().collect::<Vec<_>>(), vec![OUTGOING_INTERNET_ID]);
    assert!(rendered.nodes.get(OUTGOING_INTERNET_ID).unwrap().is_pseudo());
}

#[test]
fn test_known_service_gets_its_own_node() {
    let report = ReportBuilder::new("known-service")
        .host("h1", &[LOCAL_CIDR])
        .node(
            keys::ENDPOINT,
            local_endpoint("10.0.0.5", "40000", "h1", "1").with_adjacent(";52.1.2.3;443"),
        )
        .node(
            keys::ENDPOINT,
            remote_endpoint("52.1.2.3", "443")
                .with_set(keys::SNOOPED_DNS_NAMES, ["bucket.s3.amazonaws.com"]),
        )
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PROCESSES).render(&report);

    assert!(rendered.nodes.contains("service-bucket.s3.amazonaws.com"));
    assert!(!rendered.nodes.contains(OUTGOING_INTERNET_ID));
}

// Endpoints on a local network that no reporter claimed are dropped rather
// than rendered as internet traffic.
#[test]
fn test_local_endpoint_without_host_is_dropped() {
    let report = ReportBuilder::new("unattributed")
        .host("h1", &[LOCAL_CIDR])
        .node(keys::ENDPOINT, local_endpoint("10.0.0.5", "80", "h1", "1"))
        .node(
            keys::ENDPOINT,
            remote_endpoint("10.0.0.9", "51000").with_adjacent(";10.0.0.5;80"),
        )
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PROCESSES).render(&report);

    assert_eq!(
        rendered.nodes.ids().collect::<Vec<_>>(),
        vec![make_process_node_id("h1", "1").as_str()]
    );
    assert!(rendered.nodes.iter().all(|node| !node.is_pseudo()));
}

#[test]
fn test_pod_fans_out_to_services() {
    let report = ReportBuilder::new("services")
        .host("h1", &[LOCAL_CIDR])
        .node(keys::POD, pod("p1", "prod", "svc-a svc-b"))
        .node(
            keys::POD,
            pod("p2", "prod", "svc-a").with_latest(keys::KUBERNETES_STATE, ts(), keys::STATE_DELETED),
        )
        .build();

    let views = Views::default();
    let rendered = view(&views, views::SERVICES).render(&report);

    let ids: Vec<&str> = rendered.nodes.ids().collect();
    assert_eq!(ids, vec!["svc-a;<service>", "svc-b;<service>"]);
    for id in ids {
        let service = rendered.nodes.get(id).unwrap();
        assert_eq!(service.counters.lookup(keys::POD), Some(1));
    }
}

#[test]
fn test_repeated_service_ids_credit_pod_once() {
    let report = ReportBuilder::new("repeated-services")
        .host("h1", &[LOCAL_CIDR])
        .node(keys::POD, pod("p1", "prod", "svc-a svc-a"))
        .build();

    let views = Views::default();
    let rendered = view(&views, views::SERVICES).render(&report);
    let service = rendered.nodes.get("svc-a;<service>").unwrap();
    assert_eq!(service.counters.lookup(keys::POD), Some(1));
    assert_eq!(service.children.values(keys::POD).collect::<Vec<_>>(), vec!["p1;<pod>"]);
}

fn running_container(id: &str, host: &str, pod_uid: &str) -> Node {
    let host_node_id = make_host_node_id(host);
    Node::new(make_container_node_id(id))
        .with_topology(keys::CONTAINER)
        .with_latests(
            ts(),
            &[(keys::DOCKER_CONTAINER_ID, id), (keys::HOST_NODE_ID, host_node_id.as_str())],
        )
        .with_parent(keys::POD, make_pod_node_id(pod_uid))
}

#[test]
fn test_pods_take_the_host_of_their_containers() {
    let report = ReportBuilder::new("pod-host")
        .host("h1", &[LOCAL_CIDR])
        .node(keys::CONTAINER, running_container("c1", "h1", "p1"))
        .node(keys::POD, pod("p1", "prod", ""))
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PODS).render(&report);
    let p1 = rendered.nodes.get("p1;<pod>").unwrap();
    assert_eq!(p1.parents.values(keys::HOST).collect::<Vec<_>>(), vec![make_host_node_id("h1").as_str()]);
    assert_eq!(p1.counters.lookup(keys::CONTAINER), Some(1));
}

#[test]
fn test_kube_controllers_group_pods() {
    let deployment = make_deployment_node_id("web");
    let report = ReportBuilder::new("controllers")
        .host("h1", &[LOCAL_CIDR])
        .node(
            keys::DEPLOYMENT,
            Node::new(deployment.clone()).with_latest(keys::KUBERNETES_NAME, ts(), "web"),
        )
        .node(keys::POD, pod("p1", "prod", "").with_parent(keys::DEPLOYMENT, deployment.clone()))
        .node(keys::CONTAINER, running_container("c2", "h1", "p2"))
        .node(keys::POD, pod("p2", "prod", ""))
        .build();

    let views = Views::default();
    let rendered = view(&views, views::KUBE_CONTROLLERS).render(&report);

    let unmanaged = make_pseudo_node_id(&[UNMANAGED_ID, "h1"]);
    assert_eq!(rendered.nodes.ids().collect::<Vec<_>>(), vec![unmanaged.as_str(), deployment.as_str()]);
    let web = rendered.nodes.get(&deployment).unwrap();
    assert_eq!(web.topology, keys::DEPLOYMENT);
    assert_eq!(web.counters.lookup(keys::POD), Some(1));
    assert_eq!(web.latest.lookup(keys::KUBERNETES_NAME), Some("web"));
    assert_eq!(rendered.nodes.get(&unmanaged).unwrap().counters.lookup(keys::POD), Some(1));

    let plain = ReportBuilder::new("no-controllers").host("h1", &[LOCAL_CIDR]).build();
    assert!(view(&views, views::KUBE_CONTROLLERS).render(&plain).nodes.is_empty());
}

#[test]
fn test_pods_connect_through_their_ips() {
    let report = ReportBuilder::new("pod-ips")
        .host("h1", &[LOCAL_CIDR])
        .node(keys::POD, pod("p1", "prod", "").with_latest(keys::KUBERNETES_IP, ts(), "10.0.0.5"))
        .node(keys::POD, pod("p2", "prod", "").with_latest(keys::KUBERNETES_IP, ts(), "10.0.0.6"))
        .node(
            keys::POD,
            pod("p3", "prod", "")
                .with_latest(keys::KUBERNETES_IP, ts(), "10.0.0.6")
                .with_latest(keys::KUBERNETES_IS_IN_HOST_NETWORK, ts(), "true"),
        )
        .node(keys::ENDPOINT, remote_endpoint("10.0.0.5", "40000").with_adjacent(";10.0.0.6;80"))
        .node(keys::ENDPOINT, remote_endpoint("10.0.0.6", "80"))
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PODS).render(&report);
    let p1 = rendered.nodes.get("p1;<pod>").unwrap();
    assert_eq!(p1.adjacency.iter().collect::<Vec<_>>(), vec!["p2;<pod>"]);
    assert!(rendered.nodes.get("p3;<pod>").unwrap().adjacency.is_empty());
}

#[test]
fn test_pods_view_links_storage() {
    let claim = make_persistent_volume_claim_node_id("c1");
    let volume = make_persistent_volume_node_id("v1");
    let class = make_storage_class_node_id("fast");
    let report = ReportBuilder::new("storage")
        .host("h1", &[LOCAL_CIDR])
        .node(keys::POD, pod("p1", "prod", "").with_latest(keys::KUBERNETES_VOLUME_CLAIM, ts(), "data"))
        .node(
            keys::PERSISTENT_VOLUME_CLAIM,
            Node::new(claim.clone()).with_latests(
                ts(),
                &[
                    (keys::KUBERNETES_NAME, "data"),
                    (keys::KUBERNETES_NAMESPACE, "prod"),
                    (keys::KUBERNETES_VOLUME_NAME, "pv-1"),
                    (keys::KUBERNETES_STORAGE_CLASS_NAME, "fast"),
                ],
            ),
        )
        .node(
            keys::PERSISTENT_VOLUME,
            Node::new(volume.clone()).with_latest(keys::KUBERNETES_NAME, ts(), "pv-1"),
        )
        .node(
            keys::STORAGE_CLASS,
            Node::new(class.clone()).with_latest(keys::KUBERNETES_NAME, ts(), "fast"),
        )
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PODS).render(&report);
    let adjacency = |id: &str| rendered.nodes.get(id).unwrap().adjacency.iter().map(str::to_string).collect::<Vec<_>>();
    assert_eq!(adjacency("p1;<pod>"), vec![claim.clone()]);
    assert_eq!(adjacency(claim.as_str()), vec![volume.clone()]);
    assert_eq!(adjacency(class.as_str()), vec![claim.clone()]);
    assert_eq!(rendered.nodes.get(&volume).unwrap().topology, keys::PERSISTENT_VOLUME);
}

#[test]
fn test_kubernetes_views_empty_without_kubernetes_data() {
    let report = ReportBuilder::new("no-k8s")
        .host("h1", &[LOCAL_CIDR])
        .process("h1", "1", "nginx")
        .build();

    let views = Views::default();
    assert!(view(&views, views::PODS).render(&report).nodes.is_empty());
    assert!(view(&views, views::SERVICES).render(&report).nodes.is_empty());
}

#[test]
fn test_edge_metadata_sums_folded_connections() {
    let report = ReportBuilder::new("edges")
        .host("h1", &[LOCAL_CIDR])
        .host("h2", &[LOCAL_CIDR])
        .node(
            keys::ENDPOINT,
            local_endpoint("10.0.0.5", "40000", "h1", "1").with_edge(";10.0.0.6;80", bytes(5)),
        )
        .node(
            keys::ENDPOINT,
            local_endpoint("10.0.0.5", "40001", "h1", "1").with_edge(";10.0.0.6;80", bytes(7)),
        )
        .node(keys::ENDPOINT, local_endpoint("10.0.0.6", "80", "h2", "2"))
        .build();

    let views = Views::default();
    let processes = view(&views, views::PROCESSES);
    let metadata = processes.edge_metadata(
        &report,
        &make_process_node_id("h1", "1"),
        &make_process_node_id("h2", "2"),
    );
    assert_eq!(metadata.egress_byte_count, Some(12));
    assert_eq!(metadata.ingress_byte_count, None);

    let hosts = view(&views, views::HOSTS);
    let metadata = hosts.edge_metadata(&report, &make_host_node_id("h1"), &make_host_node_id("h2"));
    assert_eq!(metadata.egress_byte_count, Some(12));
}

#[test]
fn test_stats_count_deleted_containers() {
    let report = ReportBuilder::new("stats")
        .host("h1", &[LOCAL_CIDR])
        .node(
            keys::CONTAINER,
            Node::new(make_container_node_id("c1"))
                .with_latest(keys::DOCKER_CONTAINER_ID, ts(), "c1")
                .with_latest(keys::DOCKER_CONTAINER_STATE, ts(), keys::STATE_DELETED),
        )
        .node(
            keys::CONTAINER,
            Node::new(make_container_node_id("c2")).with_latest(keys::DOCKER_CONTAINER_ID, ts(), "c2"),
        )
        .build();

    let views = Views::default();
    let containers = view(&views, views::CONTAINERS);
    let rendered = containers.render(&report);
    assert_eq!(rendered.nodes.ids().collect::<Vec<_>>(), vec!["c2;<container>"]);
    assert_eq!(containers.stats(&report).filtered_nodes, 1);
}

#[test]
fn test_memoised_view_is_idempotent_until_reset() {
    let report = ReportBuilder::new("memo")
        .host("h1", &[LOCAL_CIDR])
        .process("h1", "1", "nginx")
        .build();

    let views = Views::default();
    let containers = view(&views, views::CONTAINERS);

    let cold = containers.render(&report);
    let warm = containers.render(&report);
    assert_eq!(cold, warm);
    assert_eq!(views.cache().len(), 1);

    let snapshot = views.cache().metrics().snapshot();
    assert_eq!(snapshot.total_renders, 2);
    assert_eq!(snapshot.cache_hits, 1);

    views.reset();
    assert!(views.cache().is_empty());
    assert_eq!(containers.render(&report), cold);
}

fn containers_report(id: &str, processes: &[(&str, &str)]) -> Report {
    let mut builder = ReportBuilder::new(id).host("h1", &[LOCAL_CIDR]);
    for (pid, name) in processes {
        builder = builder.process("h1", pid, name);
    }
    builder
        .node(
            keys::CONTAINER,
            Node::new(make_container_node_id(id)).with_latest(keys::DOCKER_CONTAINER_ID, ts(), id),
        )
        .build()
}

#[test]
fn test_concurrent_renders_match_cold_renders() {
    let reports = [
        containers_report("a", &[("1", "nginx")]),
        containers_report("b", &[("1", "nginx"), ("2", "redis"), ("3", "sshd")]),
    ];
    let uncached = Views::new(RenderCache::new(RenderCacheConfig {
        max_entries: 4,
        enabled: false,
    }));
    let cold: Vec<_> = reports
        .iter()
        .map(|report| view(&uncached, views::CONTAINERS).render(report))
        .collect();
    assert_ne!(cold[0], cold[1]);

    let shared = Views::default();
    let containers = view(&shared, views::CONTAINERS);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let (containers, report) = (&containers, &reports[i % 2]);
                scope.spawn(move || (i % 2, containers.render(report)))
            })
            .collect();
        for handle in handles {
            let (idx, rendered) = handle.join().unwrap();
            assert_eq!(rendered, cold[idx]);
        }
    });
    assert_eq!(shared.cache().len(), 2);
}

#[test]
fn test_disabled_cache_still_renders() {
    let cache = RenderCache::new(RenderCacheConfig {
        max_entries: 4,
        enabled: false,
    });
    let views = Views::new(cache);
    let report = ReportBuilder::new("nocache")
        .host("h1", &[LOCAL_CIDR])
        .process("h1", "1", "nginx")
        .build();

    let hosts = view(&views, views::HOSTS);
    let rendered = hosts.render(&report);
    assert!(rendered.nodes.contains(&make_host_node_id("h1")));
    assert!(views.cache().is_empty());
}

#[test]
fn test_views_registry_lookup() {
    let views = Views::from_config(&AppConfig::default());
    let ids: Vec<&str> = views.ids().collect();

    assert_eq!(ids.len(), 14);
    for id in [
        views::ENDPOINTS,
        views::PROCESSES,
        views::PROCESSES_BY_NAME,
        views::CONTAINERS,
        views::CONTAINERS_BY_IMAGE,
        views::CONTAINERS_BY_HOSTNAME,
        views::PODS,
        views::SERVICES,
        views::KUBE_CONTROLLERS,
        views::HOSTS,
        views::ECS_TASKS,
        views::ECS_SERVICES,
        views::PERSISTENT_VOLUME_CLAIMS,
        views::OVERLAY,
    ] {
        assert!(views.get(id).is_some(), "missing view {id}");
    }
    assert!(views.get("weave-net").is_none());
    assert!(views.cache().is_enabled());
}

#[test]
fn test_processes_by_name_groups_across_hosts() {
    let report = ReportBuilder::new("by-name")
        .host("h1", &[LOCAL_CIDR])
        .host("h2", &[LOCAL_CIDR])
        .process("h1", "1", "nginx")
        .process("h2", "7", "nginx")
        .process("h2", "8", "redis")
        .build();

    let views = Views::default();
    let rendered = view(&views, views::PROCESSES_BY_NAME).render(&report);

    assert_eq!(rendered.nodes.ids().collect::<Vec<_>>(), vec!["nginx", "redis"]);
    let nginx = rendered.nodes.get("nginx").unwrap();
    assert_eq!(nginx.counters.lookup(keys::PROCESS), Some(2));
}

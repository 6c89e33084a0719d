//! Algorithms behind the structural renderers.

use crate::filters::FilterFunc;
use crate::renderer::{MapFunc, RenderContext, Rendered, Renderer};
use std::collections::{BTreeMap, HashMap, HashSet};
use topoview_core::report::{keys, EdgeMetadata, Node, Nodes};
use tracing::debug;

pub(crate) fn select(ctx: &RenderContext<'_>, topology: &str) -> Rendered {
    let Some(source) = ctx.report().topology(topology) else {
        debug!(topology, "unknown topology selected");
        return Rendered::default();
    };
    let nodes = source
        .nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if node.topology.is_empty() {
                node.topology = topology.to_string();
            }
            node
        })
        .collect();
    Rendered::new(nodes)
}

/// Applies `func` to every upstream node, merging outputs that share an ID
/// and rewriting adjacency into the output ID space.
pub(crate) fn map(ctx: &RenderContext<'_>, func: &MapFunc, upstream: &Renderer) -> Rendered {
    let span = tracing::debug_span!("map", func = func.name());
    let _enter = span.enter();

    let input = upstream.render_in(ctx);
    let local = ctx.local_networks();

    let mut output = Nodes::new();
    // input ID -> output IDs it produced
    let mut mapped: HashMap<&str, Vec<String>> = HashMap::new();
    // output ID -> input IDs that produced it
    let mut sources: BTreeMap<String, Vec<&str>> = BTreeMap::new();

    for node in input.nodes.iter() {
        let mut produced: HashSet<String> = HashSet::new();
        for mut out in func.apply(node, local) {
            // an input is credited once per output ID
            if out.id.is_empty() || !produced.insert(out.id.clone()) {
                continue;
            }
            out.adjacency.clear();
            out.edges.clear();
            mapped.entry(node.id.as_str()).or_default().push(out.id.clone());
            sources.entry(out.id.clone()).or_default().push(node.id.as_str());
            output.add(out);
        }
    }

    for out in output.iter_mut() {
        let Some(contributors) = sources.get(&out.id) else {
            continue;
        };
        for source_id in contributors {
            let Some(source) = input.nodes.get(source_id) else {
                continue;
            };
            for target in source.adjacency.iter() {
                if let Some(targets) = mapped.get(target) {
                    for target_id in targets {
                        out.adjacency.add(target_id.clone());
                    }
                }
            }
        }
    }

    debug!(input = input.nodes.len(), output = output.len(), "rendered");
    Rendered::new(output)
}

/// Metadata of each rendered edge in `pairs`, summing every input edge folded
/// into it. The upstream is rendered once and queried once for all pairs.
pub(crate) fn map_edge_metadata(
    ctx: &RenderContext<'_>,
    func: &MapFunc,
    upstream: &Renderer,
    pairs: &[(String, String)],
) -> Vec<EdgeMetadata> {
    let input = upstream.render_in(ctx);
    let local = ctx.local_networks();

    let wanted: HashSet<&str> = pairs
        .iter()
        .flat_map(|(a, b)| [a.as_str(), b.as_str()])
        .collect();
    // output ID -> input IDs that produced it
    let mut sources: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in input.nodes.iter() {
        let mut produced: HashSet<&str> = HashSet::new();
        for out in func.apply(node, local) {
            if let Some(&id) = wanted.get(out.id.as_str()) {
                if produced.insert(id) {
                    sources.entry(id).or_default().push(node.id.as_str());
                }
            }
        }
    }

    let mut upstream_pairs = Vec::new();
    let mut groups = Vec::with_capacity(pairs.len());
    for (a, b) in pairs {
        let start = upstream_pairs.len();
        let locals = sources.get(a.as_str()).map(Vec::as_slice).unwrap_or_default();
        let remotes = sources.get(b.as_str()).map(Vec::as_slice).unwrap_or_default();
        for x in locals {
            for y in remotes {
                upstream_pairs.push((x.to_string(), y.to_string()));
            }
        }
        groups.push(start..upstream_pairs.len());
    }

    let metadata = if upstream_pairs.is_empty() {
        Vec::new()
    } else {
        upstream.edge_metadatas_in(ctx, &upstream_pairs)
    };
    groups
        .into_iter()
        .map(|range| {
            metadata[range]
                .iter()
                .fold(EdgeMetadata::default(), |acc, md| acc.flatten(md))
        })
        .collect()
}

pub(crate) fn reduce(ctx: &RenderContext<'_>, renderers: &[Renderer]) -> Rendered {
    let span = tracing::debug_span!("reduce", children = renderers.len());
    let _enter = span.enter();

    let mut result = Rendered::default();
    for renderer in renderers {
        result.merge(&renderer.render_in(ctx));
    }
    debug!(output = result.nodes.len(), "rendered");
    result
}

/// Keeps nodes satisfying `predicate`, prunes edges into dropped nodes and
/// removes pseudo nodes that lost every edge they had.
pub(crate) fn filter(ctx: &RenderContext<'_>, predicate: &FilterFunc, upstream: &Renderer) -> Rendered {
    let span = tracing::debug_span!("filter");
    let _enter = span.enter();

    let input = upstream.render_in(ctx);
    let mut filtered = input.filtered;

    let mut had_edges: HashSet<String> = HashSet::new();
    for node in input.nodes.iter() {
        if !node.adjacency.is_empty() {
            had_edges.insert(node.id.clone());
            had_edges.extend(node.adjacency.iter().map(str::to_string));
        }
    }

    let input_len = input.nodes.len();
    let mut output: Nodes = input
        .nodes
        .into_iter()
        .filter(|node| predicate(node))
        .collect();
    filtered += input_len - output.len();

    let kept: HashSet<String> = output.ids().map(str::to_string).collect();
    let mut in_degree: HashMap<String, usize> = HashMap::new();
    for node in output.iter_mut() {
        node.adjacency.retain(|id| kept.contains(id));
        for target in node.adjacency.iter() {
            *in_degree.entry(target.to_string()).or_default() += 1;
        }
    }

    let before_cleanup = output.len();
    output.retain(|node| {
        !(node.is_pseudo()
            && node.adjacency.is_empty()
            && !in_degree.contains_key(&node.id)
            && had_edges.contains(&node.id))
    });
    filtered += before_cleanup - output.len();

    debug!(input = input_len, output = output.len(), filtered, "rendered");
    Rendered {
        nodes: output,
        filtered,
    }
}

/// IDs of nodes with at least one edge to or from another node.
fn connected(nodes: &Nodes) -> HashSet<&str> {
    let mut ids = HashSet::new();
    for node in nodes.iter() {
        for target in node.adjacency.iter() {
            if target != node.id {
                ids.insert(node.id.as_str());
                ids.insert(target);
            }
        }
    }
    ids
}

pub(crate) fn color_connected(ctx: &RenderContext<'_>, input: Rendered) -> Rendered {
    let connected: HashSet<String> = connected(&input.nodes)
        .into_iter()
        .map(str::to_string)
        .collect();
    let timestamp = ctx.report().timestamp;

    let mut nodes = input.nodes;
    for node in nodes.iter_mut() {
        if connected.contains(&node.id) {
            node.latest.set(keys::IS_CONNECTED, timestamp, "true");
        }
    }
    Rendered {
        nodes,
        filtered: input.filtered,
    }
}

use crate::combinators;
use crate::filters::{self, FilterFunc};
use crate::memoise::{Memoise, RenderCache};
use crate::networks::local_networks;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;
use topoview_core::report::{EdgeMetadata, Networks, Node, Nodes, Report};

type MapFn = dyn Fn(&Node, &Networks) -> Vec<Node> + Send + Sync;

/// Per-node transformation used by [`Renderer::map`]. Returning an empty
/// vector drops the node.
#[derive(Clone)]
pub struct MapFunc {
    name: &'static str,
    f: Arc<MapFn>,
}

impl MapFunc {
    pub fn new<F>(name: &'static str, f: F) -> Self
    where
        F: Fn(&Node, &Networks) -> Vec<Node> + Send + Sync + 'static,
    {
        Self { name, f: Arc::new(f) }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, node: &Node, local: &Networks) -> Vec<Node> {
        (self.f)(node, local)
    }
}

/// Whole-report predicate used by [`Renderer::conditional`].
pub type Condition = Arc<dyn Fn(&Report) -> bool + Send + Sync>;

/// Renders the upstream renderer itself, then post-processes the result.
pub type CustomFn = Arc<dyn Fn(&RenderContext<'_>, &Renderer) -> Rendered + Send + Sync>;

#[derive(Clone)]
pub struct Custom {
    pub(crate) name: &'static str,
    pub(crate) upstream: Arc<Renderer>,
    pub(crate) render: CustomFn,
}

/// State shared by every renderer taking part in one top-level call.
pub struct RenderContext<'a> {
    report: &'a Report,
    local_networks: OnceCell<Networks>,
}

impl<'a> RenderContext<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            local_networks: OnceCell::new(),
        }
    }

    pub fn report(&self) -> &'a Report {
        self.report
    }

    /// Computed on first use and reused for the rest of the call.
    pub fn local_networks(&self) -> &Networks {
        self.local_networks
            .get_or_init(|| local_networks(self.report))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub nodes: Nodes,
    /// Input nodes dropped by filters in the renderer's subtree.
    pub filtered: usize,
}

impl Rendered {
    pub fn new(nodes: Nodes) -> Self {
        Self { nodes, filtered: 0 }
    }

    pub fn merge(&mut self, other: &Rendered) {
        self.nodes.merge(&other.nodes);
        self.filtered += other.filtered;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub filtered_nodes: usize,
}

impl std::ops::Add for Stats {
    type Output = Stats;

    fn add(self, other: Stats) -> Stats {
        Stats {
            filtered_nodes: self.filtered_nodes + other.filtered_nodes,
        }
    }
}

/// A composable, pure function from a [`Report`] to a node set.
///
/// The set of renderer kinds is closed; views are built by nesting
/// selectors inside the `Map`, `Reduce`, `Filter`, `Memoise` and `Custom`
/// combinators. Cloning is cheap since every child is shared.
#[derive(Clone)]
pub enum Renderer {
    Select(String),
    Map {
        func: MapFunc,
        upstream: Arc<Renderer>,
    },
    Reduce(Arc<Vec<Renderer>>),
    Filter {
        predicate: FilterFunc,
        upstream: Arc<Renderer>,
    },
    Memoise(Memoise),
    Custom(Custom),
}

impl Renderer {
    pub fn select(topology: impl Into<String>) -> Self {
        Renderer::Select(topology.into())
    }

    pub fn map(func: MapFunc, upstream: Renderer) -> Self {
        Renderer::Map {
            func,
            upstream: Arc::new(upstream),
        }
    }

    pub fn reduce(renderers: Vec<Renderer>) -> Self {
        Renderer::Reduce(Arc::new(renderers))
    }

    /// Drops non-pseudo nodes failing `predicate`; pseudo nodes always pass
    /// the predicate step.
    pub fn filter(predicate: FilterFunc, upstream: Renderer) -> Self {
        let predicate: FilterFunc = Arc::new(move |node: &Node| node.is_pseudo() || predicate(node));
        Self::filter_pseudo(predicate, upstream)
    }

    /// Like [`Renderer::filter`], but pseudo nodes are subject to the predicate too.
    pub fn filter_pseudo(predicate: FilterFunc, upstream: Renderer) -> Self {
        Renderer::Filter {
            predicate,
            upstream: Arc::new(upstream),
        }
    }

    /// Drops nodes that folded no children of `topology`.
    pub fn filter_empty(topology: &str, upstream: Renderer) -> Self {
        Self::filter(filters::has_children(topology), upstream)
    }

    pub fn memoise(cache: &RenderCache, upstream: Renderer) -> Self {
        Renderer::Memoise(Memoise::new(cache.clone(), upstream))
    }

    pub fn custom<F>(name: &'static str, upstream: Renderer, render: F) -> Self
    where
        F: Fn(&RenderContext<'_>, &Renderer) -> Rendered + Send + Sync + 'static,
    {
        Renderer::Custom(Custom {
            name,
            upstream: Arc::new(upstream),
            render: Arc::new(render),
        })
    }

    /// Renders nothing unless `condition` holds for the report.
    pub fn conditional<C>(condition: C, upstream: Renderer) -> Self
    where
        C: Fn(&Report) -> bool + Send + Sync + 'static,
    {
        let condition: Condition = Arc::new(condition);
        Self::custom("conditional", upstream, move |ctx, upstream| {
            if condition(ctx.report()) {
                upstream.render_in(ctx)
            } else {
                Rendered::default()
            }
        })
    }

    /// Marks every node with a non-self edge in either direction.
    pub fn color_connected(upstream: Renderer) -> Self {
        Self::custom("color_connected", upstream, |ctx, upstream| {
            combinators::color_connected(ctx, upstream.render_in(ctx))
        })
    }

    /// Drops every node, pseudo or not, that has no edges.
    pub fn filter_unconnected(upstream: Renderer) -> Self {
        Self::filter_pseudo(Arc::new(filters::is_connected), Self::color_connected(upstream))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Renderer::Select(_) => "select",
            Renderer::Map { .. } => "map",
            Renderer::Reduce(_) => "reduce",
            Renderer::Filter { .. } => "filter",
            Renderer::Memoise(_) => "memoise",
            Renderer::Custom(custom) => custom.name,
        }
    }

    pub fn render(&self, report: &Report) -> Rendered {
        let ctx = RenderContext::new(report);
        self.render_in(&ctx)
    }

    pub fn render_in(&self, ctx: &RenderContext<'_>) -> Rendered {
        match self {
            Renderer::Select(topology) => combinators::select(ctx, topology),
            Renderer::Map { func, upstream } => combinators::map(ctx, func, upstream),
            Renderer::Reduce(renderers) => combinators::reduce(ctx, renderers),
            Renderer::Filter { predicate, upstream } => combinators::filter(ctx, predicate, upstream),
            Renderer::Memoise(memoise) => memoise.render_in(ctx),
            Renderer::Custom(custom) => (custom.render)(ctx, &custom.upstream),
        }
    }

    /// Aggregate metadata of the rendered edge `local -> remote`.
    pub fn edge_metadata(&self, report: &Report, local_id: &str, remote_id: &str) -> EdgeMetadata {
        let ctx = RenderContext::new(report);
        self.edge_metadata_in(&ctx, local_id, remote_id)
    }

    pub fn edge_metadata_in(&self, ctx: &RenderContext<'_>, local_id: &str, remote_id: &str) -> EdgeMetadata {
        self.edge_metadatas_in(ctx, &[(local_id.to_string(), remote_id.to_string())])
            .pop()
            .unwrap_or_default()
    }

    /// Batch form of [`Renderer::edge_metadata_in`]: one result per
    /// `(local, remote)` pair, in order.
    pub fn edge_metadatas_in(&self, ctx: &RenderContext<'_>, pairs: &[(String, String)]) -> Vec<EdgeMetadata> {
        match self {
            Renderer::Select(topology) => {
                let source = ctx.report().topology(topology);
                pairs
                    .iter()
                    .map(|(local_id, remote_id)| {
                        source
                            .and_then(|t| t.get(local_id))
                            .and_then(|node| node.edges.lookup(remote_id))
                            .copied()
                            .unwrap_or_default()
                    })
                    .collect()
            }
            Renderer::Map { func, upstream } => combinators::map_edge_metadata(ctx, func, upstream, pairs),
            Renderer::Reduce(renderers) => {
                let mut merged = vec![EdgeMetadata::default(); pairs.len()];
                for renderer in renderers.iter() {
                    for (slot, metadata) in merged.iter_mut().zip(renderer.edge_metadatas_in(ctx, pairs)) {
                        *slot = slot.merge(&metadata);
                    }
                }
                merged
            }
            Renderer::Filter { upstream, .. } => upstream.edge_metadatas_in(ctx, pairs),
            Renderer::Memoise(memoise) => memoise.upstream().edge_metadatas_in(ctx, pairs),
            Renderer::Custom(custom) => custom.upstream.edge_metadatas_in(ctx, pairs),
        }
    }

    pub fn stats(&self, report: &Report) -> Stats {
        let ctx = RenderContext::new(report);
        self.stats_in(&ctx)
    }

    pub fn stats_in(&self, ctx: &RenderContext<'_>) -> Stats {
        match self {
            Renderer::Select(_) | Renderer::Map { .. } => Stats::default(),
            Renderer::Reduce(renderers) => renderers
                .iter()
                .fold(Stats::default(), |acc, renderer| acc + renderer.stats_in(ctx)),
            Renderer::Filter { .. } | Renderer::Memoise(_) | Renderer::Custom(_) => Stats {
                filtered_nodes: self.render_in(ctx).filtered,
            },
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::Select(topology) => f.debug_tuple("Select").field(topology).finish(),
            Renderer::Map { func, upstream } => f
                .debug_struct("Map")
                .field("func", &func.name())
                .field("upstream", upstream)
                .finish(),
            Renderer::Reduce(renderers) => f.debug_tuple("Reduce").field(renderers).finish(),
            Renderer::Filter { upstream, .. } => {
                f.debug_struct("Filter").field("upstream", upstream).finish()
            }
            Renderer::Memoise(memoise) => f
                .debug_struct("Memoise")
                .field("upstream", memoise.upstream())
                .finish(),
            Renderer::Custom(custom) => f
                .debug_struct("Custom")
                .field("name", &custom.name)
                .field("upstream", &custom.upstream)
                .finish(),
        }
    }
}

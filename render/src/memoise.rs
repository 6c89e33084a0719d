use crate::renderer::{RenderContext, Rendered, Renderer};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use topoview_core::config::CacheConfig;
use topoview_core::metrics::RenderMetrics;
use tracing::{debug, trace};

static NEXT_MEMOISE_ID: AtomicU64 = AtomicU64::new(1);

/// Configuration for the render cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCacheConfig {
    /// Maximum number of rendered views to keep.
    pub max_entries: usize,
    /// Whether the cache is enabled. If false, every render is cold.
    pub enabled: bool,
}

impl Default for RenderCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 64,
            enabled: true,
        }
    }
}

impl From<&CacheConfig> for RenderCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.render_capacity,
            enabled: config.enabled,
        }
    }
}

/// Memoised renderer identity plus report ID.
type CacheKey = (u64, String);

/// Bounded LRU of rendered views keyed by report identity, shared by every
/// memoised renderer built against it.
#[derive(Clone)]
pub struct RenderCache {
    entries: Arc<Mutex<LruCache<CacheKey, Arc<Rendered>>>>,
    enabled: bool,
    metrics: RenderMetrics,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(RenderCacheConfig::default())
    }
}

impl RenderCache {
    pub fn new(config: RenderCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            enabled: config.enabled,
            metrics: RenderMetrics::default(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(RenderCacheConfig::from(config))
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Arc<Rendered>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Rendered>> {
        if !self.enabled {
            return None;
        }
        self.lock().get(key).cloned()
    }

    fn put(&self, key: CacheKey, value: Arc<Rendered>) {
        if self.enabled {
            self.lock().put(key, value);
        }
    }

    /// Drops every cached rendering, forcing the next render to be cold.
    pub fn reset(&self) {
        let mut entries = self.lock();
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "render cache reset");
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }
}

/// Caches the upstream rendering of each report, keyed by the report ID.
#[derive(Clone)]
pub struct Memoise {
    id: u64,
    cache: RenderCache,
    upstream: Arc<Renderer>,
}

impl Memoise {
    pub(crate) fn new(cache: RenderCache, upstream: Renderer) -> Self {
        Self {
            id: NEXT_MEMOISE_ID.fetch_add(1, Ordering::Relaxed),
            cache,
            upstream: Arc::new(upstream),
        }
    }

    pub fn upstream(&self) -> &Renderer {
        &self.upstream
    }

    pub(crate) fn render_in(&self, ctx: &RenderContext<'_>) -> Rendered {
        let started = Instant::now();
        let key = (self.id, ctx.report().id.clone());

        if let Some(hit) = self.cache.get(&key) {
            trace!(memoise = self.id, report = %key.1, "render cache hit");
            self.record(started, true);
            return hit.as_ref().clone();
        }

        trace!(memoise = self.id, report = %key.1, "render cache miss");
        // Rendered outside the lock; racing callers may compute the same entry twice.
        let rendered = self.upstream.render_in(ctx);
        self.cache.put(key, Arc::new(rendered.clone()));
        self.record(started, false);
        rendered
    }

    fn record(&self, started: Instant, is_cache_hit: bool) {
        let latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.cache.metrics.record_render(latency_us, is_cache_hit);
    }
}

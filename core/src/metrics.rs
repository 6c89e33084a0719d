use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct RenderStats {
    total_renders: u64,
    cache_hits: u64,
    latencies: VecDeque<u64>, // microseconds
}

struct MetricsState {
    renders: RenderStats,
    max_history: usize,
}

/// Counts memoised renders and keeps a bounded latency history.
#[derive(Clone)]
pub struct RenderMetrics {
    state: Arc<Mutex<MetricsState>>,
}

impl Default for RenderMetrics {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl RenderMetrics {
    pub fn new(max_history: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(MetricsState {
                renders: RenderStats::default(),
                max_history,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record_render(&self, latency_us: u64, is_cache_hit: bool) {
        let mut state = self.lock();
        let max_history = state.max_history;
        let renders = &mut state.renders;
        renders.total_renders += 1;
        if is_cache_hit {
            renders.cache_hits += 1;
        }
        renders.latencies.push_back(latency_us);
        while renders.latencies.len() > max_history {
            renders.latencies.pop_front();
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.lock();
        let r = &state.renders;

        let mut sorted_latencies: Vec<u64> = r.latencies.iter().copied().collect();
        sorted_latencies.sort_unstable();

        let hit_rate = if r.total_renders > 0 {
            r.cache_hits as f32 / r.total_renders as f32
        } else {
            0.0
        };

        MetricsSnapshot {
            total_renders: r.total_renders,
            cache_hits: r.cache_hits,
            hit_rate,
            p50: percentile(&sorted_latencies, 50.0),
            p95: percentile(&sorted_latencies, 95.0),
            p99: percentile(&sorted_latencies, 99.0),
            history_count: r.latencies.len(),
        }
    }
}

fn percentile(sorted: &[u64], p: f32) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = ((p / 100.0) * (sorted.len() as f32)).ceil() as usize;
    sorted[idx.saturating_sub(1).min(sorted.len() - 1)]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_renders: u64,
    pub cache_hits: u64,
    pub hit_rate: f32,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub history_count: usize,
}

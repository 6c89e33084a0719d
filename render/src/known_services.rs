//! Recognition of well-known cloud service hostnames.

use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const DEFAULT_CAPACITY: usize = 10_000;

static KNOWN_SERVICE_MATCHER: Lazy<Regex> = Lazy::new(|| {
    let suffixes = [
        r"amazonaws\.com",
        r"googleapis\.com",
        r"weave\.works",
        r"core\.windows\.net",
        r"servicebus\.windows\.net",
        r"azure-api\.net",
        r"onmicrosoft\.com",
        r"cloudapp\.azure\.com",
        r"database\.windows\.net",
        r"documents\.azure\.com",
    ];
    Regex::new(&format!(r"^.+\.({})$", suffixes.join("|"))).expect("known service pattern is valid")
});

// ec2 hosts are too generic to be worth a node of their own
static KNOWN_SERVICE_EXCLUDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(ec2.*\.amazonaws\.com)$").expect("excluder pattern is valid"));

static KNOWN_SERVICE_CACHE: Lazy<Mutex<LruCache<String, bool>>> =
    Lazy::new(|| Mutex::new(LruCache::new(capacity(DEFAULT_CAPACITY))));

fn capacity(entries: usize) -> NonZeroUsize {
    NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN)
}

fn cache() -> MutexGuard<'static, LruCache<String, bool>> {
    KNOWN_SERVICE_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Whether `hostname` belongs to a recognised external service. Results are
/// memoised per hostname.
pub fn is_known_service(hostname: &str) -> bool {
    if let Some(known) = cache().get(hostname) {
        return *known;
    }
    let known = KNOWN_SERVICE_MATCHER.is_match(hostname) && !KNOWN_SERVICE_EXCLUDER.is_match(hostname);
    cache().put(hostname.to_string(), known);
    known
}

pub fn set_known_service_cache_capacity(entries: usize) {
    cache().resize(capacity(entries));
}

pub fn purge_known_service_cache() {
    let mut cache = cache();
    let dropped = cache.len();
    cache.clear();
    debug!(dropped, "known service cache purged");
}

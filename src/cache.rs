//! Memoization of analysis results by content hash.
//!
//! [`AnalysisCache`] is an explicit service object shared through an `Arc`.
//! Each key owns a slot with a [`OnceLock`]: concurrent callers for the same
//! key block on the slot while one of them computes, then all reuse that
//! result. Distinct keys only contend on the short map lookup.
//!
//! Entries may carry a time-to-live. Expired entries are evicted lazily when
//! looked up; nothing scans the map in the background. Capacity is
//! unbounded.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, OnceLock, PoisonError,
        atomic::{AtomicU64, Ordering}
    },
    time::{Duration, Instant}
};

use serde::Serialize;
use tracing::debug;

use crate::{document::Dialect, synthesis::AnalysisResult};

/// Identity of one analysis: the text digest and the dialect hint it ran
/// with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub content_hash: String,
    pub dialect:      Option<Dialect>
}

impl CacheKey {
    pub fn new(content_hash: impl Into<String>, dialect: Option<Dialect>) -> Self {
        Self {
            content_hash: content_hash.into(),
            dialect
        }
    }

    fn short(&self) -> &str {
        self.content_hash
            .get(..12)
            .unwrap_or(&self.content_hash)
    }
}

struct Slot {
    created_at: Instant,
    cell:       OnceLock<Arc<AnalysisResult>>
}

impl Slot {
    fn new() -> Self {
        Self {
            created_at: Instant::now(),
            cell:       OnceLock::new()
        }
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.created_at.elapsed() >= ttl)
    }
}

/// Counters reported by [`AnalysisCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits:    u64,
    pub misses:  u64
}

/// Compute-once cache of [`AnalysisResult`]s.
pub struct AnalysisCache {
    entries: Mutex<HashMap<CacheKey, Arc<Slot>>>,
    ttl:     Option<Duration>,
    hits:    AtomicU64,
    misses:  AtomicU64
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AnalysisCache {
    /// Create an empty cache; `None` keeps entries forever.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0)
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Slot for `key`, replacing it first when it has expired.
    fn slot(&self, key: &CacheKey) -> Arc<Slot> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = entries
            .get(key)
            .is_some_and(|slot| slot.is_expired(self.ttl));
        if expired {
            debug!(hash = key.short(), "cache entry expired");
            entries.remove(key);
        }
        Arc::clone(
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Slot::new()))
        )
    }

    /// Return the stored result for `key`, computing it on a miss.
    ///
    /// At most one `compute` runs to completion per key; concurrent callers
    /// for the same key wait for it and share the result.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Arc<AnalysisResult>
    where
        F: FnOnce() -> AnalysisResult
    {
        let slot = self.slot(&key);
        let mut computed = false;
        let result = slot.cell.get_or_init(|| {
            computed = true;
            Arc::new(compute())
        });
        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!(hash = key.short(), "cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(hash = key.short(), "cache hit");
        }
        Arc::clone(result)
    }

    /// Look up a finished result without computing anything.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<AnalysisResult>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.get(key)?.is_expired(self.ttl) {
            entries.remove(key);
            return None;
        }
        entries.get(key).and_then(|slot| slot.cell.get().cloned())
    }

    /// Number of stored entries, expired ones included until looked up.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits:    self.hits.load(Ordering::Relaxed),
            misses:  self.misses.load(Ordering::Relaxed)
        }
    }
}

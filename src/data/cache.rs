//! Process-lifetime memoization of fetched datasets.
//!
//! Entries are write-once: a dataset is built on the first request for its
//! `RequestKey` and never mutated afterwards, so the concurrent map is the only
//! synchronization needed. Concurrent first requests for the same key run the
//! loader once and share its result.
//!
//! The default policy keeps everything for the life of the process. That is
//! fine for a single-user dashboard but grows without bound in a long-lived
//! multi-session host; set a capacity or TTL there.

use std::time::Duration;

use moka::sync::Cache;
use tracing::debug;

use crate::domain::{IndicatorDataset, RequestKey};

/// Eviction knobs for [`DatasetCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CachePolicy {
    /// Maximum number of datasets kept; `None` means unbounded.
    pub max_entries: Option<u64>,
    /// Age after which a dataset is refetched; `None` means never.
    pub time_to_live: Option<Duration>,
}

impl CachePolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_entries.is_none() && self.time_to_live.is_none()
    }
}

#[derive(Clone)]
pub struct DatasetCache {
    inner: Cache<RequestKey, IndicatorDataset>,
    policy: CachePolicy,
}

impl DatasetCache {
    pub fn new(policy: CachePolicy) -> Self {
        let mut builder = Cache::<RequestKey, IndicatorDataset>::builder();
        if let Some(max) = policy.max_entries {
            builder = builder.max_capacity(max);
        }
        if let Some(ttl) = policy.time_to_live {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
            policy,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn get(&self, key: &RequestKey) -> Option<IndicatorDataset> {
        self.inner.get(key)
    }

    pub fn contains(&self, key: &RequestKey) -> bool {
        self.inner.contains_key(key)
    }

    /// Return the cached dataset for `key`, running `load` on a miss.
    pub fn get_or_load(&self, key: &RequestKey, load: impl FnOnce() -> IndicatorDataset) -> IndicatorDataset {
        if let Some(hit) = self.inner.get(key) {
            debug!(%key, rows = hit.len(), "dataset cache hit");
            return hit;
        }
        debug!(%key, "dataset cache miss");
        self.inner.get_with(key.clone(), load)
    }

    /// Drop every entry (explicit user refresh).
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new(CachePolicy::unbounded())
    }
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("policy", &self.policy)
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

//! Cache store — the single source of truth for entry state.
//!
//! [`CoreState`] holds the key→entry map and the [`TagIndex`] and is the
//! only place fetch results are applied. Everything lives behind one
//! `std::sync::Mutex` in the client; the lock is never held across an
//! await, so fetch completion, invalidation, subscribe/unsubscribe and
//! GC sweeps are atomic with respect to each other — in particular, an
//! entry's tag-set replacement and the index update are never observable
//! half-done.

mod entry;
mod tag_index;

pub use entry::{QuerySnapshot, QueryStatus};
pub use tag_index::TagIndex;

pub(crate) use entry::CacheEntry;

use std::collections::HashMap;
use std::time::SystemTime;

use serde_json::Value;

use crate::key::CacheKey;
use crate::tag::TagRef;
use crate::{telemetry, StockpileError};

pub(crate) struct CoreState {
    pub entries: HashMap<CacheKey, CacheEntry>,
    pub tags: TagIndex,
}

impl CoreState {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            tags: TagIndex::new(),
        }
    }

    /// Apply a successful fetch result.
    ///
    /// Returns `false` (without touching the entry) when the response
    /// belongs to a superseded epoch or the entry is gone — the cache
    /// must converge to the most recently *initiated* fetch, not the most
    /// recently completed one.
    pub fn apply_success(
        &mut self,
        key: &CacheKey,
        epoch: u64,
        response: Value,
        tags: Vec<TagRef>,
    ) -> bool {
        let Self { entries, tags: index } = self;
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };
        if entry.epoch != epoch {
            metrics::counter!(telemetry::STALE_DISCARDS_TOTAL).increment(1);
            tracing::debug!(%key, epoch, current = entry.epoch, "discarding superseded response");
            return false;
        }

        let new_tags = tags.into_iter().collect();
        index.detach(key, &entry.tags);
        index.attach(key, &new_tags);
        entry.tags = new_tags;

        entry.status = QueryStatus::Fulfilled;
        entry.data = Some(response);
        entry.error = None;
        entry.fetching = false;
        entry.last_fetched_at = Some(SystemTime::now());
        entry.publish();
        true
    }

    /// Apply a failed fetch. Previous data is retained as
    /// stale-but-displayable; superseded epochs are dropped like successes.
    pub fn apply_failure(&mut self, key: &CacheKey, epoch: u64, error: StockpileError) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.epoch != epoch {
            metrics::counter!(telemetry::STALE_DISCARDS_TOTAL).increment(1);
            return false;
        }

        entry.status = QueryStatus::Rejected;
        entry.error = Some(error);
        entry.fetching = false;
        entry.publish();
        true
    }

    /// Remove an entry and its tag associations.
    pub fn evict(&mut self, key: &CacheKey) {
        if let Some(entry) = self.entries.remove(key) {
            self.tags.detach(key, &entry.tags);
        }
    }
}

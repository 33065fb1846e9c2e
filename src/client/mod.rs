//! The owned cache instance and its public surface.

mod builder;

pub use builder::StockpileBuilder;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::endpoint::{MutationEndpoint, QueryEndpoint};
use crate::key::CacheKey;
use crate::registry::QuerySubscription;
use crate::session::SessionStore;
use crate::store::{CoreState, QuerySnapshot};
use crate::tag::TagRef;
use crate::transport::Transport;
use crate::Result;

/// Client-side entity cache with tag-based invalidation.
///
/// An owned, self-contained instance: construct one per API (or one per
/// test) via [`Stockpile::builder()`]. Clones share the same cache.
#[derive(Clone)]
pub struct Stockpile {
    pub(crate) inner: Arc<Inner>,
}

impl Stockpile {
    /// Create a new builder for configuring a cache instance.
    pub fn builder() -> StockpileBuilder {
        StockpileBuilder::new()
    }

    /// Subscribe to a query, fetching it if this is the first subscriber.
    ///
    /// The returned handle pins the entry against garbage collection for
    /// its lifetime and exposes the current [`QuerySnapshot`] plus every
    /// future transition. A stale entry is served immediately from its
    /// retained data while a refetch runs in the background.
    pub fn subscribe(&self, endpoint: QueryEndpoint, args: Value) -> QuerySubscription {
        self.inner.subscribe(endpoint, args)
    }

    /// Peek at a key's snapshot without subscribing.
    pub fn snapshot(&self, endpoint: QueryEndpoint, args: &Value) -> Option<QuerySnapshot> {
        let key = CacheKey::new(&endpoint.name(), args);
        let state = self.inner.lock_state();
        state.entries.get(&key).map(|entry| entry.snapshot())
    }

    /// Force a new fetch for a cached key, superseding any in-flight one.
    ///
    /// Returns `false` if the key has never been subscribed. This is the
    /// manual retry path; the cache itself never retries.
    pub fn refetch(&self, endpoint: QueryEndpoint, args: &Value) -> bool {
        let key = CacheKey::new(&endpoint.name(), args);
        let mut state = self.inner.lock_state();
        if !state.entries.contains_key(&key) {
            return false;
        }
        self.inner.start_fetch(&mut state, &key, "refetch");
        true
    }

    /// Execute a write and, on success, invalidate the affected tags.
    ///
    /// A failed mutation returns the transport error untouched and leaves
    /// the cache exactly as it was.
    pub async fn mutate(&self, endpoint: MutationEndpoint, args: Value) -> Result<Value> {
        self.inner.mutate(endpoint, args).await
    }

    /// Mark every entry carrying any of the given tags stale, refetching
    /// those that still have subscribers.
    pub fn invalidate(&self, tags: &[TagRef]) {
        self.inner.invalidate(tags);
    }

    /// The persisted session slice.
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }
}

/// Shared state behind every clone and subscription.
pub(crate) struct Inner {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) state: Mutex<CoreState>,
    pub(crate) gc_grace: Duration,
    pub(crate) session: SessionStore,
    pub(crate) reaper: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    /// Lock the store. Poisoning is ignored: state updates are small and
    /// never leave the maps inconsistent mid-operation.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(mut reaper) = self.reaper.lock() {
            if let Some(handle) = reaper.take() {
                handle.abort();
            }
        }
    }
}

//! Query subscriptions and entry lifecycle.
//!
//! Subscribing creates (or joins) a cache entry, pins it against garbage
//! collection, and hands back a [`QuerySubscription`] whose `Drop`
//! releases the pin. Entries that sit subscriber-free past the configured
//! grace period are removed — together with their tag-index associations
//! — by a background reaper task.

use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Stream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::wrappers::WatchStream;

use crate::client::Inner;
use crate::endpoint::QueryEndpoint;
use crate::key::CacheKey;
use crate::store::{CacheEntry, QuerySnapshot, QueryStatus};
use crate::{telemetry, Result, StockpileError};

use serde_json::Value;

/// Live handle to a subscribed query.
///
/// Dropping it decrements the entry's subscriber count; the underlying
/// network call (if any) keeps running and may still populate the cache
/// for a future subscriber.
pub struct QuerySubscription {
    rx: watch::Receiver<QuerySnapshot>,
    release: Release,
}

impl QuerySubscription {
    pub fn key(&self) -> &CacheKey {
        &self.release.key
    }

    /// The entry's current state.
    pub fn snapshot(&self) -> QuerySnapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next state transition and return the new snapshot.
    pub async fn changed(&mut self) -> Result<QuerySnapshot> {
        self.rx.changed().await.map_err(|_| StockpileError::Closed)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Wait until the entry settles (fulfilled or rejected).
    ///
    /// Returns immediately if it already has. Note that after an
    /// invalidation the entry re-settles once the refetch completes; use
    /// [`changed`](Self::changed) to observe the intermediate stale state.
    pub async fn settled(&mut self) -> Result<QuerySnapshot> {
        loop {
            let snapshot = self.rx.borrow_and_update().clone();
            match snapshot.status {
                QueryStatus::Fulfilled | QueryStatus::Rejected => return Ok(snapshot),
                _ => {
                    self.rx.changed().await.map_err(|_| StockpileError::Closed)?;
                }
            }
        }
    }

    /// Turn the subscription into a stream of snapshots.
    ///
    /// The stream yields the current snapshot first, then one item per
    /// transition. It keeps the entry pinned until dropped.
    pub fn into_stream(self) -> SnapshotStream {
        SnapshotStream {
            stream: WatchStream::new(self.rx),
            _release: self.release,
        }
    }
}

/// Stream adapter over a subscription's snapshot transitions.
pub struct SnapshotStream {
    stream: WatchStream<QuerySnapshot>,
    _release: Release,
}

impl Stream for SnapshotStream {
    type Item = QuerySnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

/// Decrements the subscriber count exactly once, when dropped.
struct Release {
    inner: Arc<Inner>,
    key: CacheKey,
}

impl Drop for Release {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();
        if let Some(entry) = state.entries.get_mut(&self.key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
            if entry.subscribers == 0 {
                entry.idle_since = Some(Instant::now());
            }
        }
    }
}

impl Inner {
    pub(crate) fn subscribe(self: &Arc<Self>, endpoint: QueryEndpoint, args: Value) -> QuerySubscription {
        let key = CacheKey::new(&endpoint.name(), &args);
        let mut state = self.lock_state();

        let entry = state
            .entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(endpoint, args));
        entry.subscribers += 1;
        entry.idle_since = None;
        let rx = entry.watch();
        let status = entry.status;
        let fetching = entry.fetching;

        match status {
            QueryStatus::Uninitialized => {
                self.start_fetch(&mut state, &key, "subscribe");
            }
            // Stale or failed and nobody refetching: serve the retained
            // data (if any) immediately, refresh in the background.
            QueryStatus::Stale | QueryStatus::Rejected if !fetching => {
                self.start_fetch(&mut state, &key, "subscribe");
            }
            QueryStatus::Loading => {
                metrics::counter!(
                    telemetry::DEDUP_JOINS_TOTAL,
                    "endpoint" => endpoint.name()
                )
                .increment(1);
            }
            QueryStatus::Fulfilled => {
                metrics::counter!(
                    telemetry::CACHE_HITS_TOTAL,
                    "endpoint" => endpoint.name()
                )
                .increment(1);
            }
            _ => {}
        }

        QuerySubscription {
            rx,
            release: Release {
                inner: Arc::clone(self),
                key,
            },
        }
    }

    /// Remove entries that have been subscriber-free past the grace period.
    pub(crate) fn sweep(&self, grace: Duration) {
        let now = Instant::now();
        let mut state = self.lock_state();

        let expired: Vec<CacheKey> = state
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers == 0
                    && entry
                        .idle_since
                        .is_some_and(|idle| now.duration_since(idle) >= grace)
            })
            .map(|(key, _)| key.clone())
            .collect();

        for key in expired {
            state.evict(&key);
            metrics::counter!(telemetry::GC_EVICTIONS_TOTAL).increment(1);
            tracing::debug!(%key, "evicted idle cache entry");
        }
    }
}

/// Spawn the background GC task.
///
/// Holds only a weak reference so the cache can shut down while the
/// reaper is parked; the task exits when the instance is gone.
pub(crate) fn spawn_reaper(inner: &Arc<Inner>) -> JoinHandle<()> {
    let weak: Weak<Inner> = Arc::downgrade(inner);
    let grace = inner.gc_grace;
    let tick = (grace / 4).max(Duration::from_millis(25));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let Some(inner) = weak.upgrade() else {
                break;
            };
            inner.sweep(grace);
        }
    })
}

//! Cache entries and the snapshots published to subscribers.

use std::collections::HashSet;
use std::time::SystemTime;

use serde_json::Value;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::endpoint::QueryEndpoint;
use crate::tag::TagRef;
use crate::StockpileError;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Created but no fetch started yet.
    Uninitialized,
    /// First fetch in flight, no data to show.
    Loading,
    /// Last fetch succeeded; data is current.
    Fulfilled,
    /// Last fetch failed; previous data (if any) is retained.
    Rejected,
    /// Data may be outdated; a refetch may be in flight.
    Stale,
}

/// Point-in-time view of a cache entry, re-emitted on every transition.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub status: QueryStatus,
    /// Last successful payload, retained while stale or re-loading to
    /// avoid UI flicker.
    pub data: Option<Value>,
    pub error: Option<StockpileError>,
    pub last_fetched_at: Option<SystemTime>,
}

impl QuerySnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Rejected
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&StockpileError> {
        self.error.as_ref()
    }

    fn uninitialized() -> Self {
        Self {
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            last_fetched_at: None,
        }
    }
}

/// Stored state for one cache key.
///
/// Mutated only by [`CoreState`](super::CoreState) methods while the
/// store lock is held, so every observable update is atomic.
pub(crate) struct CacheEntry {
    pub endpoint: QueryEndpoint,
    pub args: Value,
    pub status: QueryStatus,
    pub data: Option<Value>,
    pub error: Option<StockpileError>,
    pub tags: HashSet<TagRef>,
    pub subscribers: usize,
    /// Bumped on every fetch start; responses from older epochs are dropped.
    pub epoch: u64,
    pub fetching: bool,
    /// Set when the subscriber count hits zero; cleared on resubscribe.
    pub idle_since: Option<Instant>,
    pub last_fetched_at: Option<SystemTime>,
    tx: watch::Sender<QuerySnapshot>,
}

impl CacheEntry {
    pub fn new(endpoint: QueryEndpoint, args: Value) -> Self {
        let (tx, _rx) = watch::channel(QuerySnapshot::uninitialized());
        Self {
            endpoint,
            args,
            status: QueryStatus::Uninitialized,
            data: None,
            error: None,
            tags: HashSet::new(),
            subscribers: 0,
            epoch: 0,
            fetching: false,
            idle_since: None,
            last_fetched_at: None,
            tx,
        }
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        QuerySnapshot {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            last_fetched_at: self.last_fetched_at,
        }
    }

    /// Push the current state to all subscribers.
    pub fn publish(&self) {
        self.tx.send_replace(self.snapshot());
    }

    pub fn watch(&self) -> watch::Receiver<QuerySnapshot> {
        self.tx.subscribe()
    }
}

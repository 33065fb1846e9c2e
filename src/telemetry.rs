//! Telemetry metric name constants.
//!
//! Centralised metric names for stockpile operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `stockpile_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `endpoint` — query or mutation endpoint name (e.g. "salesOrder.list")
//! - `trigger` — what started a fetch: "subscribe" | "invalidate" | "refetch"
//! - `entity` — entity type of an invalidated tag (e.g. "Customer")
//! - `status` — outcome: "ok" or "error"

/// Total network fetches started (one per epoch).
///
/// Labels: `endpoint`, `trigger` ("subscribe" | "invalidate" | "refetch").
pub const FETCHES_TOTAL: &str = "stockpile_fetches_total";

/// Subscriptions served immediately from a fulfilled entry.
///
/// Labels: `endpoint`.
pub const CACHE_HITS_TOTAL: &str = "stockpile_cache_hits_total";

/// Subscriptions that joined an already in-flight fetch instead of
/// issuing their own network call.
///
/// Labels: `endpoint`.
pub const DEDUP_JOINS_TOTAL: &str = "stockpile_dedup_joins_total";

/// Responses discarded because a newer fetch epoch superseded them.
pub const STALE_DISCARDS_TOTAL: &str = "stockpile_stale_responses_discarded_total";

/// Tags dispatched for invalidation.
///
/// Labels: `entity`.
pub const INVALIDATIONS_TOTAL: &str = "stockpile_invalidations_total";

/// Mutations executed.
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const MUTATIONS_TOTAL: &str = "stockpile_mutations_total";

/// Idle entries removed by the garbage collector.
pub const GC_EVICTIONS_TOTAL: &str = "stockpile_gc_evictions_total";

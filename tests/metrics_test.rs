//! Telemetry counters under a debugging recorder.
//!
//! Only counters incremented on the calling thread are asserted here
//! (subscribe, mutate, invalidate); completions emitted from spawned
//! fetch tasks land outside the thread-local recorder's scope.

mod support;

use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use metrics_util::MetricKind;
use serde_json::json;
use stockpile::{telemetry, EntityType, MutationEndpoint, QueryEndpoint};
use support::{build_cache, rows, MockTransport};

fn counter_sum(snapshotter: &Snapshotter, name: &str) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter && key.key().name() == name
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(c) => *c,
            _ => 0,
        })
        .sum()
}

#[tokio::test]
async fn metrics_are_noops_without_recorder() {
    let transport = Arc::new(MockTransport::new(|_req, _seq| async { Ok(rows(&["p1"])) }));
    let (cache, _dir) = build_cache(transport);

    let mut sub = cache.subscribe(QueryEndpoint::List(EntityType::Product), json!(null));
    sub.settled().await.unwrap();
    cache
        .mutate(MutationEndpoint::Create(EntityType::Product), json!({"name": "bolt"}))
        .await
        .unwrap();
}

/// Runs cache operations within a local recorder scope.
///
/// Uses `block_in_place` + `block_on` to keep `with_local_recorder` on
/// the same thread (it's a thread-local recorder).
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn subscribe_and_mutate_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let transport = Arc::new(MockTransport::new(|req, _seq| async move {
                    match (req.method.as_str(), req.path.as_str()) {
                        ("GET", "/api/products") => Ok(rows(&["p1"])),
                        ("POST", "/api/products") => Ok(json!({"id": "p2"})),
                        other => panic!("unexpected request {other:?}"),
                    }
                }));
                let (cache, _dir) = build_cache(transport);

                // First subscribe: one fetch.
                let mut first = cache.subscribe(QueryEndpoint::List(EntityType::Product), json!(null));
                first.settled().await.unwrap();

                // Second subscribe on the fulfilled entry: a cache hit.
                let _second = cache.subscribe(QueryEndpoint::List(EntityType::Product), json!(null));

                // Successful mutation invalidates Product:LIST, which
                // refetches the subscribed list (a second fetch).
                cache
                    .mutate(MutationEndpoint::Create(EntityType::Product), json!({"name": "nut"}))
                    .await
                    .unwrap();
            })
        })
    });

    assert_eq!(counter_sum(&snapshotter, telemetry::CACHE_HITS_TOTAL), 1);
    assert_eq!(counter_sum(&snapshotter, telemetry::MUTATIONS_TOTAL), 1);
    assert_eq!(counter_sum(&snapshotter, telemetry::INVALIDATIONS_TOTAL), 1);
    assert_eq!(counter_sum(&snapshotter, telemetry::FETCHES_TOTAL), 2);
}

//! Garbage collection of unsubscribed entries (paused time).

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use stockpile::{EntityType, QueryEndpoint, QueryStatus, TagRef};
use support::{build_cache_with_grace, MockTransport};

const GRACE: Duration = Duration::from_millis(200);

fn stock_transport() -> Arc<MockTransport> {
    Arc::new(MockTransport::new(|_req, _seq| async {
        Ok(json!({"id": "s1", "quantity": 7}))
    }))
}

#[tokio::test(start_paused = true)]
async fn idle_entry_collected_after_grace() {
    let transport = stock_transport();
    let (cache, _dir) = build_cache_with_grace(Arc::clone(&transport), GRACE);

    let endpoint = QueryEndpoint::GetById(EntityType::Stock);
    let mut sub = cache.subscribe(endpoint, json!({"id": "s1"}));
    sub.settled().await.unwrap();
    drop(sub);

    tokio::time::sleep(GRACE * 4).await;
    assert!(
        cache.snapshot(endpoint, &json!({"id": "s1"})).is_none(),
        "entry removed from the store"
    );

    // Its tag association is gone too: invalidating the record no longer
    // resolves to anything, so no fetch is issued.
    cache.invalidate(&[TagRef::id(EntityType::Stock, "s1")]);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn subscribed_entry_survives_gc() {
    let transport = stock_transport();
    let (cache, _dir) = build_cache_with_grace(transport, GRACE);

    let endpoint = QueryEndpoint::GetById(EntityType::Stock);
    let mut sub = cache.subscribe(endpoint, json!({"id": "s1"}));
    sub.settled().await.unwrap();

    tokio::time::sleep(GRACE * 10).await;
    let snapshot = cache.snapshot(endpoint, &json!({"id": "s1"}));
    assert_eq!(snapshot.unwrap().status, QueryStatus::Fulfilled);
}

#[tokio::test(start_paused = true)]
async fn resubscribe_within_grace_cancels_collection() {
    let transport = stock_transport();
    let (cache, _dir) = build_cache_with_grace(Arc::clone(&transport), GRACE);

    let endpoint = QueryEndpoint::GetById(EntityType::Stock);
    {
        let mut sub = cache.subscribe(endpoint, json!({"id": "s1"}));
        sub.settled().await.unwrap();
    }

    tokio::time::sleep(GRACE / 2).await;
    let sub = cache.subscribe(endpoint, json!({"id": "s1"}));
    assert_eq!(sub.snapshot().status, QueryStatus::Fulfilled);
    assert_eq!(transport.calls(), 1, "served from cache, no refetch");

    // Pinned again: survives well past the grace period.
    tokio::time::sleep(GRACE * 10).await;
    assert!(cache.snapshot(endpoint, &json!({"id": "s1"})).is_some());
}

#[tokio::test(start_paused = true)]
async fn one_remaining_subscriber_keeps_entry_pinned() {
    let transport = stock_transport();
    let (cache, _dir) = build_cache_with_grace(transport, GRACE);

    let endpoint = QueryEndpoint::GetById(EntityType::Stock);
    let mut first = cache.subscribe(endpoint, json!({"id": "s1"}));
    first.settled().await.unwrap();
    let second = cache.subscribe(endpoint, json!({"id": "s1"}));

    drop(first);
    tokio::time::sleep(GRACE * 10).await;
    assert!(
        cache.snapshot(endpoint, &json!({"id": "s1"})).is_some(),
        "second subscriber still pins the entry"
    );

    drop(second);
    tokio::time::sleep(GRACE * 4).await;
    assert!(cache.snapshot(endpoint, &json!({"id": "s1"})).is_none());
}

//! Shared test helpers: a scriptable in-memory transport and cache setup.
#![allow(dead_code)]

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use stockpile::transport::{ApiRequest, Transport};
use stockpile::Stockpile;
use tempfile::TempDir;

type BoxedResponse = Pin<Box<dyn Future<Output = stockpile::Result<Value>> + Send>>;

/// Scriptable transport: the handler receives the request and a
/// zero-based call sequence number, so tests can vary responses per call
/// or park a specific call on a gate.
pub struct MockTransport {
    handler: Box<dyn Fn(ApiRequest, usize) -> BoxedResponse + Send + Sync>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(ApiRequest, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = stockpile::Result<Value>> + Send + 'static,
    {
        Self {
            handler: Box::new(move |request, seq| Box::pin(handler(request, seq))),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Total calls seen so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls matching a method and path, e.g. `("GET", "/api/customers/42")`.
    pub fn calls_to(&self, method: &str, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    async fn handle(&self, request: ApiRequest) -> stockpile::Result<Value> {
        let seq = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((request.method.to_string(), request.path.clone()));
        (self.handler)(request, seq).await
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> stockpile::Result<Value> {
        self.handle(request).await
    }
}

/// Newtype so a shared `Arc<MockTransport>` can be handed to the builder
/// (a direct `impl Transport for Arc<MockTransport>` trips the orphan rule).
struct SharedTransport(Arc<MockTransport>);

#[async_trait]
impl Transport for SharedTransport {
    async fn execute(&self, request: ApiRequest) -> stockpile::Result<Value> {
        self.0.handle(request).await
    }
}

/// Build a cache over the given transport with an isolated session file
/// and a long GC grace (GC tests pick their own).
pub fn build_cache(transport: Arc<MockTransport>) -> (Stockpile, TempDir) {
    build_cache_with_grace(transport, Duration::from_secs(60))
}

pub fn build_cache_with_grace(
    transport: Arc<MockTransport>,
    grace: Duration,
) -> (Stockpile, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let cache = Stockpile::builder()
        .transport(SharedTransport(transport))
        .gc_grace(grace)
        .session_path(dir.path().join("session.json"))
        .build()
        .unwrap();
    (cache, dir)
}

/// A list response of rows with the given ids.
pub fn rows(ids: &[&str]) -> Value {
    json!(ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>())
}

//! Fetch execution and epoch handling.
//!
//! A fetch is identified by the (key, epoch) pair captured when it
//! starts. Deduplication falls out of the structure: subscribers join an
//! entry's watch channel rather than starting their own call, so at most
//! one fetch per key is started per epoch, and [`CoreState`] drops any
//! completion whose epoch has been superseded.

use std::sync::Arc;

use crate::client::Inner;
use crate::key::CacheKey;
use crate::store::{CoreState, QueryStatus};
use crate::telemetry;

impl Inner {
    /// Begin a new fetch epoch for `key` and spawn the network call.
    ///
    /// Caller holds the state lock. Any fetch already in flight for the
    /// key keeps running but its result will be discarded on completion.
    /// Entries with retained data stay readable (`Stale`) while the fetch
    /// runs; entries without data go to `Loading`.
    pub(crate) fn start_fetch(
        self: &Arc<Self>,
        state: &mut CoreState,
        key: &CacheKey,
        trigger: &'static str,
    ) {
        let Some(entry) = state.entries.get_mut(key) else {
            return;
        };

        entry.epoch += 1;
        entry.fetching = true;
        entry.status = if entry.data.is_some() {
            QueryStatus::Stale
        } else {
            QueryStatus::Loading
        };
        entry.publish();

        let epoch = entry.epoch;
        let endpoint = entry.endpoint;
        let args = entry.args.clone();

        metrics::counter!(
            telemetry::FETCHES_TOTAL,
            "endpoint" => endpoint.name(),
            "trigger" => trigger
        )
        .increment(1);
        tracing::debug!(%key, epoch, trigger, "starting fetch");

        let inner = Arc::clone(self);
        let key = key.clone();
        tokio::spawn(async move {
            let result = match endpoint.request(&args) {
                Ok(request) => inner.transport.execute(request).await,
                Err(err) => Err(err),
            };

            let mut state = inner.lock_state();
            match result {
                Ok(response) => {
                    let tags = endpoint.provides(&args, &response);
                    if state.apply_success(&key, epoch, response, tags) {
                        tracing::debug!(%key, epoch, "fetch fulfilled");
                    }
                }
                Err(err) => {
                    tracing::warn!(%key, epoch, error = %err, "fetch failed");
                    state.apply_failure(&key, epoch, err);
                }
            }
        });
    }
}

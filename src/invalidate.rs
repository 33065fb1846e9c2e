//! Tag resolution and invalidation dispatch.

use std::sync::Arc;

use crate::client::Inner;
use crate::store::QueryStatus;
use crate::tag::TagRef;
use crate::telemetry;

impl Inner {
    /// Mark every entry carrying any of the given tags stale.
    ///
    /// Entries with active subscribers are refetched immediately under a
    /// fresh epoch, so any response still in flight for the old epoch is
    /// discarded on arrival. Entries without subscribers are left stale
    /// and refetched lazily by the next subscribe.
    pub(crate) fn invalidate(self: &Arc<Self>, tags: &[TagRef]) {
        if tags.is_empty() {
            return;
        }

        let mut state = self.lock_state();
        let keys = state.tags.resolve(tags);

        for tag in tags {
            metrics::counter!(
                telemetry::INVALIDATIONS_TOTAL,
                "entity" => tag.entity.as_str()
            )
            .increment(1);
        }
        tracing::debug!(tags = tags.len(), matched = keys.len(), "dispatching invalidation");

        for key in keys {
            let subscribed = match state.entries.get_mut(&key) {
                Some(entry) => {
                    entry.status = QueryStatus::Stale;
                    entry.subscribers > 0
                }
                None => continue,
            };

            if subscribed {
                self.start_fetch(&mut state, &key, "invalidate");
            } else if let Some(entry) = state.entries.get(&key) {
                entry.publish();
            }
        }
    }
}

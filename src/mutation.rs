//! Mutation execution and its cache side-effects.

use std::sync::Arc;

use serde_json::Value;

use crate::client::Inner;
use crate::endpoint::MutationEndpoint;
use crate::telemetry;
use crate::Result;

impl Inner {
    /// Run a write operation.
    ///
    /// On success, the endpoint's invalidation rule is evaluated against
    /// the arguments and response, and the resulting tags are dispatched —
    /// strictly after the mutation's own response has resolved, so the
    /// refetches it triggers are separate epochs. On failure nothing in
    /// the cache changes and the error is returned verbatim.
    pub(crate) async fn mutate(self: &Arc<Self>, endpoint: MutationEndpoint, args: Value) -> Result<Value> {
        let request = endpoint.request(&args)?;

        match self.transport.execute(request).await {
            Ok(response) => {
                metrics::counter!(
                    telemetry::MUTATIONS_TOTAL,
                    "endpoint" => endpoint.name(),
                    "status" => "ok"
                )
                .increment(1);

                let tags = endpoint.invalidates(&args, &response);
                tracing::debug!(endpoint = %endpoint, invalidates = tags.len(), "mutation succeeded");
                self.invalidate(&tags);
                Ok(response)
            }
            Err(err) => {
                metrics::counter!(
                    telemetry::MUTATIONS_TOTAL,
                    "endpoint" => endpoint.name(),
                    "status" => "error"
                )
                .increment(1);
                tracing::warn!(endpoint = %endpoint, error = %err, "mutation failed");
                Err(err)
            }
        }
    }
}

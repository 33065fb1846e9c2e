//! Stockpile — client-side entity cache with tag-based invalidation.
//!
//! Backs data-fetching UI layers talking to a REST inventory/order API.
//! Many independently fetched, overlapping views of server-owned entities
//! (products, customers, suppliers, orders, invoices, stock) stay
//! mutually consistent: a successful mutation invalidates the tags its
//! descriptor declares, every cached view carrying one of those tags goes
//! stale, and views with live subscribers are refetched immediately.
//! Concurrent subscribers to the same key share one network call, and
//! out-of-order responses are discarded by fetch epoch, so each key
//! converges to the most recently initiated fetch.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use stockpile::{EntityType, MutationEndpoint, QueryEndpoint, Stockpile};
//!
//! #[tokio::main]
//! async fn main() -> stockpile::Result<()> {
//!     let cache = Stockpile::builder()
//!         .base_url("https://api.example.test")
//!         .build()?;
//!
//!     // First subscriber triggers the fetch; later ones share it.
//!     let mut orders = cache.subscribe(
//!         QueryEndpoint::List(EntityType::SalesOrder),
//!         json!(null),
//!     );
//!     let snapshot = orders.settled().await?;
//!     println!("{} orders", snapshot.data().and_then(|d| d.as_array()).map_or(0, Vec::len));
//!
//!     // Creating an order stales the order list and the customer's
//!     // cached views; subscribed entries refetch automatically.
//!     cache
//!         .mutate(
//!             MutationEndpoint::Create(EntityType::SalesOrder),
//!             json!({"customerId": "42", "items": []}),
//!         )
//!         .await?;
//!
//!     let refreshed = orders.changed().await?;
//!     println!("now {} orders", refreshed.data().and_then(|d| d.as_array()).map_or(0, Vec::len));
//!     Ok(())
//! }
//! ```

mod client;
pub mod endpoint;
pub mod error;
mod fetch;
mod invalidate;
pub mod key;
mod mutation;
mod registry;
pub mod session;
pub mod store;
pub mod tag;
pub mod telemetry;
pub mod transport;

// Re-export main types at crate root
pub use client::{Stockpile, StockpileBuilder};
pub use endpoint::{MutationEndpoint, QueryEndpoint};
pub use error::{Result, StockpileError};
pub use key::CacheKey;
pub use registry::{QuerySubscription, SnapshotStream};
pub use session::{AuthSession, SessionState, SessionStore};
pub use store::{QuerySnapshot, QueryStatus, TagIndex};
pub use tag::{EntityType, TagId, TagRef};
pub use transport::{ApiRequest, HttpTransport, Transport};

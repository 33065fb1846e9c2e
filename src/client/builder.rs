//! Builder for configuring cache instances.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{Inner, Stockpile};
use crate::registry::spawn_reaper;
use crate::session::SessionStore;
use crate::store::CoreState;
use crate::transport::{HttpTransport, Transport};
use crate::{Result, StockpileError};

/// Default grace period before an unsubscribed entry is collected.
const DEFAULT_GC_GRACE: Duration = Duration::from_secs(60);

/// Builder for configuring cache instances.
///
/// ```rust,no_run
/// # use stockpile::Stockpile;
/// # use std::time::Duration;
/// # #[tokio::main] async fn main() -> stockpile::Result<()> {
/// let cache = Stockpile::builder()
///     .base_url("https://api.example.test")
///     .gc_grace(Duration::from_secs(30))
///     .build()?;
/// # Ok(()) }
/// ```
pub struct StockpileBuilder {
    transport: Option<Arc<dyn Transport>>,
    base_url: Option<String>,
    gc_grace: Duration,
    session_path: Option<PathBuf>,
}

impl StockpileBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            base_url: None,
            gc_grace: DEFAULT_GC_GRACE,
            session_path: None,
        }
    }

    /// Use a custom transport (takes precedence over [`base_url`](Self::base_url)).
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build an [`HttpTransport`] against this API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// How long an entry may sit without subscribers before it is
    /// garbage-collected. Default: 60 seconds.
    pub fn gc_grace(mut self, grace: Duration) -> Self {
        self.gc_grace = grace;
        self
    }

    /// Where the persisted session slice lives. Defaults to
    /// `stockpile/session.json` under the platform data directory.
    pub fn session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_path = Some(path.into());
        self
    }

    /// Build the cache instance.
    ///
    /// Hydrates the session slice from disk (absence is not an error) and
    /// spawns the GC reaper task, so this must be called within a tokio
    /// runtime.
    pub fn build(self) -> Result<Stockpile> {
        let transport = match (self.transport, self.base_url) {
            (Some(transport), _) => transport,
            (None, Some(url)) => Arc::new(HttpTransport::new(url)) as Arc<dyn Transport>,
            (None, None) => {
                return Err(StockpileError::Configuration(
                    "either a transport or a base URL is required".into(),
                ));
            }
        };

        let session_path = self.session_path.unwrap_or_else(SessionStore::default_path);
        let session = SessionStore::open(session_path);

        let inner = Arc::new(Inner {
            transport,
            state: Mutex::new(CoreState::new()),
            gc_grace: self.gc_grace,
            session,
            reaper: Mutex::new(None),
        });

        let handle = spawn_reaper(&inner);
        if let Ok(mut reaper) = inner.reaper.lock() {
            *reaper = Some(handle);
        }

        Ok(Stockpile { inner })
    }
}

impl Default for StockpileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

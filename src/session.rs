//! Persisted session slice (hydration store).
//!
//! Only this explicitly whitelisted slice survives across runs — query
//! caches are never persisted and always start cold, which trades a
//! little startup traffic for the absence of staleness-after-reload
//! bugs. A missing or unreadable file hydrates to defaults.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::{Result, StockpileError};

/// The whitelisted state that survives across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub auth: Option<AuthSession>,
}

/// Authenticated session, as handed over by the login flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(default)]
    pub account: Option<String>,
}

/// Durable store for the session slice.
pub struct SessionStore {
    path: PathBuf,
    state: Mutex<SessionState>,
}

impl SessionStore {
    /// Open the store, hydrating from `path` if a previous run left state
    /// there. Absence is not an error; defaults apply.
    pub fn open(path: PathBuf) -> Self {
        let state = hydrate(&path);
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    pub(crate) fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stockpile")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory session state.
    pub fn get(&self) -> SessionState {
        self.lock().clone()
    }

    /// Replace the session state and persist it.
    pub fn set(&self, next: SessionState) -> Result<()> {
        *self.lock() = next.clone();
        self.write(&next)
    }

    /// Modify the session state in place and persist the result.
    pub fn update(&self, f: impl FnOnce(&mut SessionState)) -> Result<()> {
        let next = {
            let mut guard = self.lock();
            f(&mut guard);
            guard.clone()
        };
        self.write(&next)
    }

    /// Reset to defaults and persist (e.g. on logout).
    pub fn clear(&self) -> Result<()> {
        self.set(SessionState::default())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| StockpileError::Io(err.to_string()))?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        fs::write(&self.path, bytes).map_err(|err| StockpileError::Io(err.to_string()))
    }
}

fn hydrate(path: &Path) -> SessionState {
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "session file unreadable, starting fresh");
                SessionState::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => SessionState::default(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "session file inaccessible, starting fresh");
            SessionState::default()
        }
    }
}

//! Stockpile error types

use std::collections::BTreeMap;

/// Stockpile error types
///
/// Errors are cloneable because the cache retains the last failure on an
/// entry and republishes it in every snapshot until a newer fetch settles.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StockpileError {
    // Transport errors
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },

    /// 400-class response carrying per-field messages from the server.
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    // Data errors
    #[error("JSON error: {0}")]
    Json(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// The cache instance was dropped while a caller was waiting on it.
    #[error("cache instance closed")]
    Closed,
}

impl From<serde_json::Error> for StockpileError {
    fn from(err: serde_json::Error) -> Self {
        StockpileError::Json(err.to_string())
    }
}

impl StockpileError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            StockpileError::Http { status, .. } => Some(*status),
            StockpileError::Validation { .. } => Some(400),
            _ => None,
        }
    }
}

/// Result type alias for stockpile operations
pub type Result<T> = std::result::Result<T, StockpileError>;

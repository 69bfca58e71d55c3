//! Error types for history-state operations.
//!
//! The public store and binding operations are total: they log these errors
//! and degrade instead of returning them. The `try_*` variants hand them back
//! to callers that want to react.

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur while moving values in and out of host state.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Failed to serialize value for key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored value for key {key} has an unexpected shape: {source}")]
    Deserialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl HistoryError {
    /// The namespace key the failed operation was addressing.
    pub fn key(&self) -> &str {
        match self {
            HistoryError::Serialize { key, .. } | HistoryError::Deserialize { key, .. } => key,
        }
    }
}

/// Result type alias for history-state operations.
pub type Result<T> = std::result::Result<T, HistoryError>;

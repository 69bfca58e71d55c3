//! Configuration loading.
//!
//! Controls where in the host state values live and what title accompanies
//! each replace. Missing or malformed configuration falls back to defaults.

use std::path::Path;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level field of the host state that holds the keyed values.
pub const DEFAULT_NAMESPACE: &str = "page";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStateConfig {
    /// Field of the host state that holds the keyed values.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Title passed along with every replace.
    #[serde(default)]
    pub title: String,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for HistoryStateConfig {
    fn default() -> Self {
        HistoryStateConfig {
            namespace: default_namespace(),
            title: String::new(),
        }
    }
}

impl HistoryStateConfig {
    /// Parses JSON configuration, returning defaults if it is malformed.
    pub fn from_json_str(content: &str) -> Self {
        if content.trim().is_empty() {
            return HistoryStateConfig::default();
        }
        match serde_json::from_str::<HistoryStateConfig>(content) {
            Ok(config) if config.namespace.is_empty() => {
                warn!("Empty namespace in history state config, using default");
                HistoryStateConfig {
                    namespace: default_namespace(),
                    ..config
                }
            }
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Failed to parse history state config, using defaults");
                HistoryStateConfig::default()
            }
        }
    }

    /// Loads configuration from a JSON file, returning defaults if it doesn't exist.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return HistoryStateConfig::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => HistoryStateConfig::from_json_str(&content),
            Err(e) => {
                warn!(error = %e, "Failed to read history state config, using defaults");
                HistoryStateConfig::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = HistoryStateConfig::default();
        assert_eq!(config.namespace, "page");
        assert_eq!(config.title, "");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = HistoryStateConfig::from_json_str(r#"{"title": "App"}"#);
        assert_eq!(config.namespace, "page");
        assert_eq!(config.title, "App");
    }

    #[test]
    fn test_malformed_json_returns_defaults() {
        let config = HistoryStateConfig::from_json_str("{not json");
        assert_eq!(config, HistoryStateConfig::default());
    }

    #[test]
    fn test_empty_namespace_is_replaced() {
        let config = HistoryStateConfig::from_json_str(r#"{"namespace": ""}"#);
        assert_eq!(config.namespace, "page");
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("history-state.json");
        std::fs::write(&file, r#"{"namespace": "view"}"#).unwrap();

        let config = HistoryStateConfig::load(&file);
        assert_eq!(config.namespace, "view");
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let temp = tempdir().unwrap();
        let config = HistoryStateConfig::load(&temp.path().join("missing.json"));
        assert_eq!(config, HistoryStateConfig::default());
    }
}

//! Configuration handling for the form builder

use crate::autosave::{AutoSaveSettings, DEFAULT_DEBOUNCE, DEFAULT_MIN_INTERVAL};
use crate::state::{StoreSettings, DEFAULT_HISTORY_LIMIT};
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// User configuration; every value is optional and falls back to a default
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuilderConfig {
    /// Save automatically after edits
    pub auto_save_enabled: Option<bool>,
    /// Quiet period before an auto-save, in milliseconds
    pub auto_save_debounce_ms: Option<u64>,
    /// Minimum time between two auto-saves, in milliseconds
    pub auto_save_min_interval_ms: Option<u64>,
    /// Number of undo steps kept
    pub history_limit: Option<usize>,
    /// Directory holding the saved form
    pub data_dir: Option<PathBuf>,
    /// Default directory for exports
    pub export_dir: Option<PathBuf>,
}

impl BuilderConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("io", "formsmith", "formsmith")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path)?;
                let config: BuilderConfig = serde_json::from_str(&content)?;
                tracing::debug!("Loaded config from {}", path.display());
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    pub fn auto_save_settings(&self) -> AutoSaveSettings {
        AutoSaveSettings {
            debounce: self
                .auto_save_debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DEBOUNCE),
            min_interval: self
                .auto_save_min_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_MIN_INTERVAL),
        }
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            history_limit: self.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            auto_save_enabled: self.auto_save_enabled.unwrap_or(true),
            auto_save: self.auto_save_settings(),
        }
    }

    /// Export directory, defaulting to the current directory
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BuilderConfig::default();
        assert!(config.auto_save_enabled.is_none());
        assert!(config.auto_save_debounce_ms.is_none());
        assert!(config.auto_save_min_interval_ms.is_none());
        assert!(config.history_limit.is_none());
        assert!(config.data_dir.is_none());
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_defaults_resolve() {
        let settings = BuilderConfig::default().store_settings();
        assert_eq!(settings.history_limit, DEFAULT_HISTORY_LIMIT);
        assert!(settings.auto_save_enabled);
        assert_eq!(settings.auto_save.debounce, Duration::from_millis(1000));
        assert_eq!(settings.auto_save.min_interval, Duration::from_millis(2000));
    }

    #[test]
    fn test_overrides_resolve() {
        let config = BuilderConfig {
            auto_save_enabled: Some(false),
            auto_save_debounce_ms: Some(250),
            auto_save_min_interval_ms: Some(5000),
            history_limit: Some(10),
            ..Default::default()
        };
        let settings = config.store_settings();
        assert!(!settings.auto_save_enabled);
        assert_eq!(settings.history_limit, 10);
        assert_eq!(settings.auto_save.debounce, Duration::from_millis(250));
        assert_eq!(settings.auto_save.min_interval, Duration::from_millis(5000));
    }

    #[test]
    fn test_serialization() {
        let config = BuilderConfig {
            auto_save_enabled: Some(true),
            auto_save_debounce_ms: Some(1500),
            auto_save_min_interval_ms: Some(3000),
            history_limit: Some(50),
            data_dir: Some(PathBuf::from("/tmp/forms")),
            export_dir: Some(PathBuf::from("/tmp/exports")),
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: BuilderConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.auto_save_enabled, Some(true));
        assert_eq!(parsed.auto_save_debounce_ms, Some(1500));
        assert_eq!(parsed.auto_save_min_interval_ms, Some(3000));
        assert_eq!(parsed.history_limit, Some(50));
        assert_eq!(parsed.data_dir, Some(PathBuf::from("/tmp/forms")));
        assert_eq!(parsed.export_dir(), PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: BuilderConfig = serde_json::from_str("{}").unwrap();
        assert!(parsed.history_limit.is_none());
        assert_eq!(parsed.export_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Should ignore unknown fields
        let json = r#"{"history_limit": 5, "theme": "dark"}"#;
        let parsed: BuilderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.history_limit, Some(5));
    }

    #[test]
    fn test_load_returns_ok() {
        let result = BuilderConfig::load();
        assert!(result.is_ok());
    }
}

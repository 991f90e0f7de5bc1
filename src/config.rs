//! Runtime configuration.
//!
//! Settings live in an optional JSON file. Every field has a default, so a
//! partial file only overrides what it names. Command line flags are applied
//! on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Timing knobs of a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Minimum delay before the computer's reply is played
    pub thinking_delay_ms: u64,
    /// Clock tick cadence in timed games
    pub tick_interval_ms: u64,
    /// Seconds on each clock in a timed game
    pub timed_budget_secs: f64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            thinking_delay_ms: 2000,
            tick_interval_ms: 1000,
            timed_budget_secs: 300.0,
        }
    }
}

impl SessionSettings {
    #[inline]
    pub fn thinking_delay(&self) -> Duration {
        Duration::from_millis(self.thinking_delay_ms)
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Top-level settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionSettings,
    /// Directory for persisted session records; in-memory only when unset
    pub store_dir: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session: SessionSettings::default(),
            store_dir: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Read settings if a path is given, falling back to defaults on any
    /// failure.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(path) {
            Ok(settings) => {
                info!(path = %path.display(), "loaded settings");
                settings
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load settings, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.session.thinking_delay(), Duration::from_secs(2));
        assert_eq!(settings.session.tick_interval(), Duration::from_secs(1));
        assert_eq!(settings.session.timed_budget_secs, 300.0);
        assert_eq!(settings.log_filter, "info");
        assert!(settings.store_dir.is_none());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"session":{"thinking_delay_ms":500}}"#).unwrap();
        assert_eq!(settings.session.thinking_delay_ms, 500);
        assert_eq!(settings.session.tick_interval_ms, 1000);
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn test_load_reports_errors_and_fallback_recovers() {
        let dir = std::env::temp_dir().join(format!("greedychess-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse(_))));
        assert_eq!(Settings::load_or_default(Some(&path)), Settings::default());

        fs::write(&path, r#"{"log_filter":"debug"}"#).unwrap();
        assert_eq!(Settings::load(&path).unwrap().log_filter, "debug");

        assert!(matches!(
            Settings::load(&dir.join("missing.json")),
            Err(ConfigError::Io(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}

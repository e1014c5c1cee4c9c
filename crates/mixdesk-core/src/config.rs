//! Application configuration.
//!
//! Read from `<config dir>/mixdesk/config.json`; every field is optional in
//! the file and falls back to its default. A handful of `MIXDESK_*`
//! environment variables override the file.

use crate::error::{MixdeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Application name used for directory paths.
const APP_NAME: &str = "mixdesk";

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.json";

/// Tunables for a mixdesk session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixdeskConfig {
    /// Root directory of the JSON project store.
    pub store_dir: PathBuf,
    /// Meter refresh interval in milliseconds.
    pub meter_interval_ms: u64,
    /// Random display jitter added to simulated meters (0..=1).
    pub meter_jitter: f32,
    /// Per-tick multiplier applied to held meter peaks (0..=1).
    pub peak_decay: f32,
    /// Maximum number of undo steps kept.
    pub undo_depth: usize,
    /// Maximum number of pending user notices.
    pub notice_capacity: usize,
}

impl Default for MixdeskConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            meter_interval_ms: 50,
            meter_jitter: 0.08,
            peak_decay: 0.92,
            undo_depth: 100,
            notice_capacity: 32,
        }
    }
}

impl MixdeskConfig {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&default_config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&data).map_err(|e| {
            MixdeskError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        info!(path = %path.display(), "Loaded config");
        config.validate()?;
        Ok(config)
    }

    /// Apply `MIXDESK_*` overrides from the given variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("MIXDESK_STORE_DIR") {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(ms) = lookup("MIXDESK_METER_INTERVAL_MS") {
            self.meter_interval_ms = parse_var("MIXDESK_METER_INTERVAL_MS", &ms)?;
        }
        if let Some(depth) = lookup("MIXDESK_UNDO_DEPTH") {
            self.undo_depth = parse_var("MIXDESK_UNDO_DEPTH", &depth)?;
        }
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.meter_interval_ms == 0 {
            return Err(MixdeskError::Config(
                "meter_interval_ms must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.meter_jitter) {
            return Err(MixdeskError::Config(format!(
                "meter_jitter {} is outside 0..=1",
                self.meter_jitter
            )));
        }
        if !(0.0..=1.0).contains(&self.peak_decay) {
            return Err(MixdeskError::Config(format!(
                "peak_decay {} is outside 0..=1",
                self.peak_decay
            )));
        }
        Ok(())
    }

    /// Meter refresh interval.
    pub fn meter_interval(&self) -> Duration {
        Duration::from_millis(self.meter_interval_ms)
    }

    /// Write this config as pretty JSON.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| MixdeskError::Serialization(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| MixdeskError::Config(format!("{name}='{value}' is not a valid number")))
}

/// Returns the user-specific data directory used by the project store.
pub fn default_store_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the user config file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(CONFIG_FILE)
}

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

use crate::error::ConfigWarning;

/// Development key substituted when no key is configured.
pub const DEFAULT_API_KEY: &str = "3fddc2962950afe300ee107b202bd736";

/// Lower bound for the refresh interval, in minutes.
pub const MIN_REFRESH_MINUTES: u32 = 10;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Poller configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// refresh_minutes = 15
/// latitude = 35.0
/// longitude = 139.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollerConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u32,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    /// Scheme and host of the weather API, without the `/data/2.5` path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for a single fetch, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_refresh_minutes() -> u32 {
    MIN_REFRESH_MINUTES
}

const fn default_latitude() -> f64 {
    35.0
}

const fn default_longitude() -> f64 {
    139.0
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            refresh_minutes: default_refresh_minutes(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PollerConfig {
    /// Apply the start-time corrections and log one warning per correction.
    ///
    /// An empty key falls back to [`DEFAULT_API_KEY`], a refresh interval
    /// under [`MIN_REFRESH_MINUTES`] is clamped up and a zero fetch timeout
    /// is reset to the default. None of these is fatal.
    pub fn validate(mut self) -> (Self, Vec<ConfigWarning>) {
        let mut warnings = Vec::new();

        if self.api_key.trim().is_empty() {
            self.api_key = DEFAULT_API_KEY.to_string();
            warnings.push(ConfigWarning::EmptyApiKey);
        }

        if self.refresh_minutes < MIN_REFRESH_MINUTES {
            warnings.push(ConfigWarning::RefreshTooLow { requested: self.refresh_minutes });
            self.refresh_minutes = MIN_REFRESH_MINUTES;
        }

        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
            warnings.push(ConfigWarning::TimeoutTooLow);
        }

        for warning in &warnings {
            warn!("{warning}");
        }

        (self, warnings)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_minutes) * 60)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from disk, or return the defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: PollerConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherwatch", "weatherwatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

//! TOML-based application configuration.
//!
//! Stores the remote backend endpoint and retention settings.
//! Configuration lives at `~/.config/ecotrack/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;

/// Remote backend (Supabase project) configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`. Empty means the
    /// app runs local-only (anonymous mode).
    #[serde(default)]
    pub url: String,
    /// Publishable anon key for REST and auth calls.
    #[serde(default)]
    pub anon_key: String,
}

/// Local data retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Days to keep anonymous per-date daily-task completion lists before
    /// pruning them from the local store.
    #[serde(default = "default_completion_retention_days")]
    pub completion_retention_days: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/ecotrack/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

fn default_completion_retention_days() -> u32 {
    7
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            completion_retention_days: default_completion_retention_days(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Whether a remote backend is configured at all.
    pub fn has_backend(&self) -> bool {
        !self.backend.url.is_empty() && !self.backend.anon_key.is_empty()
    }
}

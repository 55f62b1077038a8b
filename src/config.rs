// Wallmix - Runtime configuration
//
// Resolution order for each value:
// 1) Explicit override (CLI flag)
// 2) Environment variable (WALLMIX_RELAY_URL, etc.)
// 3) Built-in default

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DATA_FOLDER, DB_FILENAME, DEFAULT_RELAY_URL, DEFAULT_TIMEOUT_SECS};

pub const ENV_RELAY_URL: &str = "WALLMIX_RELAY_URL";
pub const ENV_DATA_DIR: &str = "WALLMIX_DATA_DIR";
pub const ENV_TIMEOUT_SECS: &str = "WALLMIX_TIMEOUT_SECS";
pub const ENV_PLACEHOLDER_POPULARITY: &str = "WALLMIX_PLACEHOLDER_POPULARITY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Relay prefix; the percent-encoded target URL is appended to it
    pub relay_url: String,
    pub timeout_secs: u64,
    pub data_dir: PathBuf,
    /// Fill views/favorites with random numbers for providers that expose none
    pub placeholder_popularity: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: default_data_dir(),
            placeholder_popularity: false,
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(relay) = env_value(ENV_RELAY_URL) {
            config.relay_url = relay;
        }
        if let Some(dir) = env_value(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = env_value(ENV_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => log::warn!("Ignoring invalid {}={}", ENV_TIMEOUT_SECS, raw),
            }
        }
        if let Some(raw) = env_value(ENV_PLACEHOLDER_POPULARITY) {
            config.placeholder_popularity = parse_flag(&raw);
        }

        config
    }

    pub fn with_relay_url(mut self, relay_url: Option<String>) -> Self {
        if let Some(relay) = relay_url.filter(|r| !r.trim().is_empty()) {
            self.relay_url = relay;
        }
        self
    }

    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    /// Path of the SQLite key-value store
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILENAME)
    }
}

/// ~/.wallmix, or ./.wallmix when no home directory can be found
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(DATA_FOLDER))
        .unwrap_or_else(|| PathBuf::from(DATA_FOLDER))
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

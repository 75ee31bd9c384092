// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Settings persist as TOML through `confy`. Every field has a serde default,
//! so older or partial files load cleanly. Command-line flags override the
//! stored values for a single run without rewriting the file.

use std::path::PathBuf;
use std::time::Duration;

use janela_client::{IndexPolicy, DEFAULT_ROTATION_PERIOD};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "janela-board";
const CONFIG_NAME: &str = "config";

/// Default pilot table file name, placed under the user's data directory.
pub const DEFAULT_RECORDS_FILE: &str = "pilots.json";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Pilot table to display (JSON array or CSV with header)
    #[serde(default = "default_records_path")]
    pub records_path: PathBuf,

    /// Rotation interval for upcoming windows, in milliseconds
    #[serde(default = "default_rotation_period_ms")]
    pub rotation_period_ms: u64,

    /// How often the pilot table is checked for changes, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Visible index handling when the queue changes: "restart" or "preserve"
    #[serde(default)]
    pub index_policy: IndexPolicy,

    /// Color window cards by category on the console
    #[serde(default = "default_true")]
    pub use_color: bool,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_records_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(DEFAULT_RECORDS_FILE)
}

fn default_rotation_period_ms() -> u64 {
    u64::try_from(DEFAULT_ROTATION_PERIOD.as_millis()).unwrap_or(10_000)
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            records_path: default_records_path(),
            rotation_period_ms: default_rotation_period_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            index_policy: IndexPolicy::default(),
            use_color: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    pub fn rotation_period(&self) -> Duration {
        Duration::from_millis(self.rotation_period_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.rotation_period_ms, 10_000);
        assert_eq!(config.rotation_period(), Duration::from_secs(10));
        assert_eq!(config.index_policy, IndexPolicy::Restart);
        assert!(config.records_path.ends_with(DEFAULT_RECORDS_FILE));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"rotation_period_ms": 5000, "index_policy": "preserve"}"#)
            .unwrap();
        assert_eq!(config.rotation_period(), Duration::from_secs(5));
        assert_eq!(config.index_policy, IndexPolicy::Preserve);
        assert_eq!(config.poll_interval_ms, 1_000);
        assert!(config.use_color);
        assert_eq!(config.config_version, 1);
    }
}

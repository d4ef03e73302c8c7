// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigPathScope;

pub const WATCHLIST_CONFIG_FILE: &str = "watchlist.toml";

pub const DEFAULT_API_VERSION: &str = "2023-02-01";
pub const DEFAULT_PROVIDER: &str = "bijux-watchlist";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 5_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REPORT_SAMPLE_SIZE: usize = 10;
pub const DEFAULT_MAX_CELL_LENGTH: usize = 8_000;

#[must_use]
pub fn resolve_bijux_config_path(scope: ConfigPathScope) -> PathBuf {
    match scope {
        ConfigPathScope::User => {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                let trimmed = xdg_config_home.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed)
                        .join("bijux")
                        .join(WATCHLIST_CONFIG_FILE);
                }
            }
            if let Ok(home) = std::env::var("HOME") {
                let trimmed = home.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed)
                        .join(".config")
                        .join("bijux")
                        .join(WATCHLIST_CONFIG_FILE);
                }
            }
            PathBuf::from(".bijux").join(WATCHLIST_CONFIG_FILE)
        }
        ConfigPathScope::Workspace => PathBuf::from(".bijux").join(WATCHLIST_CONFIG_FILE),
    }
}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Settings shared by every command. Values come from the built-in defaults,
/// then the TOML file, then the environment; CLI flags are applied last by
/// the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchlistConfig {
    pub base_url: Option<String>,
    pub api_version: String,
    pub provider: String,
    pub source_name: Option<String>,
    pub settle_delay_ms: u64,
    pub request_timeout_ms: u64,
    pub report_sample_size: usize,
    pub max_cell_length: usize,
    #[serde(skip)]
    pub bearer_token: Option<String>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            source_name: None,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            report_sample_size: DEFAULT_REPORT_SAMPLE_SIZE,
            max_cell_length: DEFAULT_MAX_CELL_LENGTH,
            bearer_token: None,
        }
    }
}

impl WatchlistConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError(format!("invalid watchlist config: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("read {} failed: {e}", path.display())))?;
        Self::from_toml_str(&raw)
            .map_err(|e| ConfigError(format!("{}: {}", path.display(), e.0)))
    }

    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(base_url) = crate::env_string(crate::ENV_WATCHLIST_BASE_URL) {
            self.base_url = Some(base_url);
        }
        if let Some(token) = crate::env_string(crate::ENV_WATCHLIST_TOKEN) {
            self.bearer_token = Some(token);
        }
        if let Some(delay) = crate::env_u64(crate::ENV_WATCHLIST_SETTLE_DELAY_MS) {
            self.settle_delay_ms = delay;
        }
        self
    }
}

/// Loads the effective configuration.
///
/// An explicit path must exist. Without one, the workspace file wins over the
/// user file and a missing file simply yields the defaults.
pub fn load_watchlist_config(explicit: Option<&Path>) -> Result<WatchlistConfig, ConfigError> {
    let base = match explicit {
        Some(path) => WatchlistConfig::from_file(path)?,
        None => {
            let candidates = [
                resolve_bijux_config_path(ConfigPathScope::Workspace),
                resolve_bijux_config_path(ConfigPathScope::User),
            ];
            match candidates.iter().find(|p| p.is_file()) {
                Some(path) => WatchlistConfig::from_file(path)?,
                None => WatchlistConfig::default(),
            }
        }
    };
    Ok(base.with_env_overrides())
}

// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod domain;
pub mod errors;

pub use domain::canonical::{self, sha256_hex};
pub use domain::config::{
    load_watchlist_config, resolve_bijux_config_path, ConfigError, WatchlistConfig,
    WATCHLIST_CONFIG_FILE,
};
pub use domain::env::{env_bool, env_string, env_u64};
pub use errors::{ConfigPathScope, ErrorContext, ExitCode, MachineError, ResultExt};

pub const CRATE_NAME: &str = "bijux-watchlist-core";

pub const ENV_BIJUX_LOG_LEVEL: &str = "BIJUX_LOG_LEVEL";
pub const ENV_BIJUX_LOG_JSON: &str = "BIJUX_LOG_JSON";
pub const ENV_WATCHLIST_BASE_URL: &str = "BIJUX_WATCHLIST_BASE_URL";
pub const ENV_WATCHLIST_TOKEN: &str = "BIJUX_WATCHLIST_TOKEN";
pub const ENV_WATCHLIST_SETTLE_DELAY_MS: &str = "BIJUX_WATCHLIST_SETTLE_DELAY_MS";

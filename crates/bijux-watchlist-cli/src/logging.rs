// SPDX-License-Identifier: Apache-2.0

use bijux_watchlist_core::{env_bool, env_string, ENV_BIJUX_LOG_JSON, ENV_BIJUX_LOG_LEVEL};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::LogFlags;

const DEFAULT_FILTER: &str = "warn";

fn filter_for(flags: LogFlags) -> EnvFilter {
    let explicit = if flags.quiet {
        Some("off")
    } else if flags.trace {
        Some("trace")
    } else {
        match flags.verbose {
            0 => None,
            1 => Some("info"),
            _ => Some("debug"),
        }
    };
    if let Some(directive) = explicit {
        return EnvFilter::new(directive);
    }
    if let Some(level) = env_string(ENV_BIJUX_LOG_LEVEL) {
        if let Ok(filter) = EnvFilter::try_new(level) {
            return filter;
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Logs go to stderr so stdout carries only
/// command output.
pub(crate) fn init_tracing(flags: LogFlags) {
    let filter = filter_for(flags);
    let log_json = flags.json || env_bool(ENV_BIJUX_LOG_JSON, false);
    let result = if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing already initialized: {err}");
    }
}

// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Watchlist reconciliation.
//!
//! A run validates the CSV, reads the deployed watchlist, compares schema and
//! search key, diffs items when the schema is stable, picks a strategy and
//! applies it. Any failed remote call ends the run; nothing is retried.

mod analyze;
mod compare;
mod log;
mod reconcile;
mod report;
mod strategy;

use std::path::PathBuf;
use std::time::Duration;

use bijux_watchlist_core::domain::config::{DEFAULT_REPORT_SAMPLE_SIZE, DEFAULT_SETTLE_DELAY_MS};
use bijux_watchlist_core::ExitCode;
use bijux_watchlist_ingest::ValidationOptions;
use bijux_watchlist_model::{DeployStage, DeploymentReport, ValidationResult, WatchlistTarget};
use bijux_watchlist_store::StoreError;

pub const CRATE_NAME: &str = "bijux-watchlist-deploy";
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(DEFAULT_SETTLE_DELAY_MS);

pub use analyze::analyze_changes;
pub use compare::{compare_schema, resolve_search_key};
pub use log::DeployLog;
pub use reconcile::{deploy, plan, DeploymentPlan};
pub use report::{render_text, sample_keys, write_report, REPORT_SCHEMA_VERSION};
pub use strategy::select_strategy;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("csv validation failed: {summary}")]
    Validation {
        summary: String,
        result: Box<ValidationResult>,
    },
    #[error("search key `{key}` is not a dataset column (columns: {available})")]
    SearchKeyNotFound { key: String, available: String },
    #[error("target {target} not found: {source}")]
    TargetNotFound {
        target: String,
        #[source]
        source: StoreError,
    },
    #[error("remote {stage} failed: {source}")]
    Remote {
        stage: DeployStage,
        #[source]
        source: StoreError,
    },
    #[error("watchlist {alias} was deleted but recreating it failed, manual recreation required: {source}")]
    PartialRecreate {
        alias: String,
        #[source]
        source: StoreError,
        report: Box<DeploymentReport>,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl DeployError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Validation { .. } | Self::SearchKeyNotFound { .. } => ExitCode::Validation,
            Self::TargetNotFound { .. } => ExitCode::TargetNotFound,
            Self::Remote { .. } => ExitCode::RemoteFailure,
            Self::PartialRecreate { .. } => ExitCode::PartialRecreate,
            Self::Internal(_) => ExitCode::Internal,
        }
    }

    /// Machine-readable error code used in structured CLI output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_failed",
            Self::SearchKeyNotFound { .. } => "search_key_not_found",
            Self::TargetNotFound { .. } => "target_not_found",
            Self::Remote { .. } => "remote_failure",
            Self::PartialRecreate { .. } => "partial_recreate",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Everything one reconciliation run needs besides the store.
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub csv_path: PathBuf,
    pub target: WatchlistTarget,
    pub description: String,
    /// Defaults to the alias.
    pub display_name: Option<String>,
    /// Defaults to the first dataset column.
    pub search_key: Option<String>,
    pub provider: String,
    /// Defaults to the CSV file name.
    pub source_name: Option<String>,
    pub validation: ValidationOptions,
    /// Wait between delete and recreate while the remote removal propagates.
    pub settle_delay: Duration,
    pub report_sample_size: usize,
}

impl DeployRequest {
    #[must_use]
    pub fn new(csv_path: PathBuf, target: WatchlistTarget, provider: impl Into<String>) -> Self {
        Self {
            csv_path,
            target,
            description: String::new(),
            display_name: None,
            search_key: None,
            provider: provider.into(),
            source_name: None,
            validation: ValidationOptions::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            report_sample_size: DEFAULT_REPORT_SAMPLE_SIZE,
        }
    }
}

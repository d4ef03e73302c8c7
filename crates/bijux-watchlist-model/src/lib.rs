// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Watchlist model SSOT.
//!
//! Every value here is produced once per reconciliation run and consumed by
//! the next stage; nothing is persisted between runs.

mod dataset;
mod deployment;
mod validation;
mod watchlist;

pub use dataset::{Dataset, Delimiter, Row};
pub use deployment::{
    ChangeSet, DeployEvent, DeployStage, DeploymentDecision, DeploymentReport, RecreateReason,
    SchemaComparison,
};
pub use validation::{
    ColumnType, IssueCode, ValidationIssue, ValidationResult, ValidationStatistics,
};
pub use watchlist::{
    ModelError, RemoteIdentifiers, WatchlistAlias, WatchlistPayload, WatchlistResource,
    WatchlistTarget, ALIAS_MAX_LEN, CONTENT_TYPE_CSV, SOURCE_TYPE_LOCAL_FILE,
};

pub const CRATE_NAME: &str = "bijux-watchlist-model";

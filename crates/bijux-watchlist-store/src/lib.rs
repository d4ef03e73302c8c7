// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod envelope;
mod http;
mod instrumentation;
mod memory;
mod paths;
mod wire;

use bijux_watchlist_model::{RemoteIdentifiers, WatchlistPayload, WatchlistResource, WatchlistTarget};
use std::fmt::{Display, Formatter};

pub const CRATE_NAME: &str = "bijux-watchlist-store";

pub use envelope::{remote_error_message, unwrap_error_envelope};
pub use http::HttpWatchlistStore;
pub use instrumentation::{
    NoopInstrumentation, StoreInstrumentation, StoreMetrics, StoreMetricsCollector,
};
pub use memory::{InMemoryWatchlistStore, StoreOperation};
pub use paths::{watchlist_items_path, watchlist_path, watchlists_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum StoreErrorCode {
    NotFound,
    Unauthorized,
    Validation,
    Conflict,
    Network,
    Remote,
    Decode,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::Validation => "validation_error",
            Self::Conflict => "conflict",
            Self::Network => "network_error",
            Self::Remote => "remote_error",
            Self::Decode => "decode_error",
            Self::Internal => "internal_error",
        }
    }

    /// Maps a non-success HTTP status onto the error taxonomy.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            409 | 412 => Self::Conflict,
            400 | 422 => Self::Validation,
            _ => Self::Remote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    /// HTTP status when the error came from a response.
    pub status: Option<u16>,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (http {status}): {}", self.code.as_str(), self.message),
            None => write!(f, "{}: {}", self.code.as_str(), self.message),
        }
    }
}

impl std::error::Error for StoreError {}

/// Single-request operations against a remote watchlist. Implementations never
/// retry; a failed call is returned to the caller as is.
pub trait WatchlistStore {
    /// Confirms the container that holds watchlists exists and is reachable.
    fn check_container(&self, target: &WatchlistTarget) -> Result<(), StoreError>;

    /// Reads the watchlist and all of its items; `None` when it does not exist.
    fn fetch(&self, target: &WatchlistTarget) -> Result<Option<WatchlistResource>, StoreError>;

    /// Deletes the watchlist. Deleting a missing watchlist succeeds. Removal is
    /// asynchronous on the remote side.
    fn delete(&self, target: &WatchlistTarget) -> Result<(), StoreError>;

    /// Creates or updates the watchlist. Items of an existing watchlist are
    /// merged, never removed.
    fn upsert(
        &self,
        target: &WatchlistTarget,
        payload: &WatchlistPayload,
    ) -> Result<RemoteIdentifiers, StoreError>;

    fn exists(&self, target: &WatchlistTarget) -> Result<bool, StoreError> {
        Ok(self.fetch(target)?.is_some())
    }
}

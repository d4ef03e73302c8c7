// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod classify;
mod delimiter;
mod encode;
mod headers;
mod profile;
mod structure;
mod validate;

use bijux_watchlist_core::sha256_hex;
use bijux_watchlist_model::{Dataset, Delimiter, ValidationResult};
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::warn;

pub const CRATE_NAME: &str = "bijux-watchlist-ingest";
pub use bijux_watchlist_core::domain::config::DEFAULT_MAX_CELL_LENGTH;

pub use classify::ValueClassifier;
pub use delimiter::detect_delimiter;
pub use encode::encode_comma_separated;

#[derive(Debug)]
pub struct IngestError(pub String);
impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for IngestError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Forces a delimiter instead of detecting it from the header line.
    pub delimiter: Option<Delimiter>,
    pub max_cell_length: usize,
    pub fail_on_warn: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_cell_length: DEFAULT_MAX_CELL_LENGTH,
            fail_on_warn: false,
        }
    }
}

/// Parsed rows plus the comma-separated text that gets uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedCsv {
    pub dataset: Dataset,
    pub raw_content: String,
}

impl LoadedCsv {
    #[must_use]
    pub fn content_sha256(&self) -> String {
        sha256_hex(self.raw_content.as_bytes())
    }
}

/// Outcome of validating one CSV input. `loaded` is present only when the
/// result is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedInput {
    pub result: ValidationResult,
    pub loaded: Option<LoadedCsv>,
}

/// Validates CSV text. Malformed input is reported through the result; the
/// error path is reserved for internal failures.
pub fn validate_csv_text(
    text: &str,
    options: &ValidationOptions,
) -> Result<ValidatedInput, IngestError> {
    validate::validate_text(text, options)
}

/// Reads and validates a CSV file. A missing or non-UTF-8 file is reported as
/// an `unreadable` validation error.
pub fn validate_csv_file(
    path: &Path,
    options: &ValidationOptions,
) -> Result<ValidatedInput, IngestError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "csv input unreadable");
            return Ok(validate::unreadable(format!(
                "cannot read {}: {err}",
                path.display()
            )));
        }
    };
    match String::from_utf8(bytes) {
        Ok(text) => validate_csv_text(&text, options),
        Err(err) => Ok(validate::unreadable(format!(
            "{} is not valid UTF-8: {err}",
            path.display()
        ))),
    }
}

// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use bijux_watchlist_model::{IssueCode, ValidationIssue};
use regex::Regex;

use crate::IngestError;

pub(crate) const HEADER_MAX_LEN: usize = 100;

pub(crate) struct HeaderFindings {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

pub(crate) fn check_headers(headers: &[String], line: usize) -> Result<HeaderFindings, IngestError> {
    let non_word = Regex::new(r"\W")
        .map_err(|e| IngestError(format!("invalid header pattern: {e}")))?;
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();

    for (idx, name) in headers.iter().enumerate() {
        if name.is_empty() {
            errors.push(
                ValidationIssue::new(
                    IssueCode::EmptyHeader,
                    format!("header at position {} is empty", idx + 1),
                )
                .at_line(line),
            );
            continue;
        }
        if !seen.insert(name.as_str()) && reported.insert(name.as_str()) {
            errors.push(
                ValidationIssue::new(IssueCode::DuplicateHeader, "duplicate header name")
                    .at_line(line)
                    .in_column(name.as_str()),
            );
        }
        if non_word.is_match(name) {
            warnings.push(
                ValidationIssue::new(
                    IssueCode::HeaderNonWordCharacters,
                    "header contains characters outside [A-Za-z0-9_]",
                )
                .at_line(line)
                .in_column(name.as_str()),
            );
        }
        if name.chars().count() > HEADER_MAX_LEN {
            warnings.push(
                ValidationIssue::new(
                    IssueCode::HeaderTooLong,
                    format!("header is longer than {HEADER_MAX_LEN} characters"),
                )
                .at_line(line)
                .in_column(name.as_str()),
            );
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            warnings.push(
                ValidationIssue::new(IssueCode::HeaderStartsWithDigit, "header starts with a digit")
                    .at_line(line)
                    .in_column(name.as_str()),
            );
        }
    }

    Ok(HeaderFindings { errors, warnings })
}

// SPDX-License-Identifier: Apache-2.0

use std::net::Ipv4Addr;

use bijux_watchlist_model::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::IngestError;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%d-%b-%Y"];
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Classifies cell values into the [`ColumnType`] taxonomy.
///
/// Patterns are compiled once per classifier; build one per validation run.
#[derive(Debug, Clone)]
pub struct ValueClassifier {
    guid: Regex,
    email: Regex,
    url: Regex,
    integer: Regex,
    decimal: Regex,
}

impl ValueClassifier {
    pub fn new() -> Result<Self, IngestError> {
        Ok(Self {
            guid: compile(
                r"^\{?[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}\}?$",
            )?,
            email: compile(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$")?,
            url: compile(r"(?i)^(https?|ftp)://[^\s/$.?#][^\s]*$")?,
            integer: compile(r"^[+-]?\d+$")?,
            decimal: compile(r"^[+-]?(\d+\.\d*|\.\d+)$")?,
        })
    }

    /// First match wins, in [`ColumnType`] declaration order.
    #[must_use]
    pub fn classify(&self, raw: &str) -> ColumnType {
        let value = raw.trim();
        if value.is_empty() {
            ColumnType::Empty
        } else if self.guid.is_match(value) {
            ColumnType::Guid
        } else if self.email.is_match(value) {
            ColumnType::Email
        } else if value.parse::<Ipv4Addr>().is_ok() {
            ColumnType::Ipv4
        } else if self.url.is_match(value) {
            ColumnType::Url
        } else if self.integer.is_match(value) {
            ColumnType::Integer
        } else if self.decimal.is_match(value) {
            ColumnType::Decimal
        } else if is_boolean(value) {
            ColumnType::Boolean
        } else if is_date_time(value) {
            ColumnType::DateTime
        } else {
            ColumnType::String
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, IngestError> {
    Regex::new(pattern).map_err(|e| IngestError(format!("invalid classifier pattern: {e}")))
}

fn is_boolean(value: &str) -> bool {
    value.len() <= 5
        && matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "1" | "0"
        )
}

fn is_date_time(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || DateTime::parse_from_rfc2822(value).is_ok()
        || DATE_TIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(value, fmt).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ValueClassifier {
        ValueClassifier::new().expect("classifier")
    }

    #[test]
    fn reference_values_classify_deterministically() {
        let c = classifier();
        let cases = [
            ("123e4567-e89b-12d3-a456-426614174000", ColumnType::Guid),
            ("user@example.com", ColumnType::Email),
            ("192.168.1.1", ColumnType::Ipv4),
            ("42", ColumnType::Integer),
            ("3.14", ColumnType::Decimal),
            ("true", ColumnType::Boolean),
            ("2024-01-01", ColumnType::DateTime),
            ("hello", ColumnType::String),
        ];
        for (value, expected) in cases {
            assert_eq!(c.classify(value), expected, "value {value}");
        }
    }

    #[test]
    fn precedence_resolves_overlapping_patterns() {
        let c = classifier();
        // digits match Integer before Boolean
        assert_eq!(c.classify("1"), ColumnType::Integer);
        assert_eq!(c.classify("FALSE"), ColumnType::Boolean);
        assert_eq!(c.classify("https://example.com/a?b=c"), ColumnType::Url);
        assert_eq!(c.classify("256.1.1.1"), ColumnType::String);
        assert_eq!(c.classify("   "), ColumnType::Empty);
        assert_eq!(c.classify("2024-01-01T10:20:30Z"), ColumnType::DateTime);
        assert_eq!(c.classify("2024-01-01 10:20:30"), ColumnType::DateTime);
        assert_eq!(c.classify("-7"), ColumnType::Integer);
        assert_eq!(c.classify(".5"), ColumnType::Decimal);
    }
}

// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::Delimiter;

/// Detected type of a single cell value.
///
/// Variant order is the classification precedence: the first matching
/// variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Empty,
    Guid,
    Email,
    Ipv4,
    Url,
    Integer,
    Decimal,
    Boolean,
    DateTime,
    String,
}

impl ColumnType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Guid => "guid",
            Self::Email => "email",
            Self::Ipv4 => "ipv4",
            Self::Url => "url",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::DateTime => "date_time",
            Self::String => "string",
        }
    }

    /// Identifier-like types whose values are expected to be unique per column.
    #[must_use]
    pub const fn is_identifier(self) -> bool {
        matches!(self, Self::Guid | Self::Email)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IssueCode {
    // errors
    EmptyFile,
    NoDataRows,
    Unreadable,
    ParseFailure,
    ConsecutiveDelimiters,
    LeadingDelimiter,
    TrailingDelimiter,
    ColumnCountMismatch,
    DuplicateHeader,
    EmptyHeader,
    CellTooLong,
    // warnings
    HeaderNonWordCharacters,
    HeaderTooLong,
    HeaderStartsWithDigit,
    CsvInjectionRisk,
    TypeInconsistency,
    DuplicateIdentifierValues,
    DuplicateRows,
    EmptyRow,
    PromotedWarning,
}

impl IssueCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyFile => "empty_file",
            Self::NoDataRows => "no_data_rows",
            Self::Unreadable => "unreadable",
            Self::ParseFailure => "parse_failure",
            Self::ConsecutiveDelimiters => "consecutive_delimiters",
            Self::LeadingDelimiter => "leading_delimiter",
            Self::TrailingDelimiter => "trailing_delimiter",
            Self::ColumnCountMismatch => "column_count_mismatch",
            Self::DuplicateHeader => "duplicate_header",
            Self::EmptyHeader => "empty_header",
            Self::CellTooLong => "cell_too_long",
            Self::HeaderNonWordCharacters => "header_non_word_characters",
            Self::HeaderTooLong => "header_too_long",
            Self::HeaderStartsWithDigit => "header_starts_with_digit",
            Self::CsvInjectionRisk => "csv_injection_risk",
            Self::TypeInconsistency => "type_inconsistency",
            Self::DuplicateIdentifierValues => "duplicate_identifier_values",
            Self::DuplicateRows => "duplicate_rows",
            Self::EmptyRow => "empty_row",
            Self::PromotedWarning => "promoted_warning",
        }
    }
}

/// A single finding with enough location context to act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationIssue {
    pub code: IssueCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    #[must_use]
    pub fn new(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            code,
            line: None,
            column: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    #[must_use]
    pub fn in_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.line, self.column.as_deref()) {
            (Some(line), Some(column)) => write!(f, "line {line}, column '{column}': {}", self.message),
            (Some(line), None) => write!(f, "line {line}: {}", self.message),
            (None, Some(column)) => write!(f, "column '{column}': {}", self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationStatistics {
    pub row_count: usize,
    pub column_count: usize,
    pub empty_field_count: usize,
    pub duplicate_row_count: usize,
    pub data_type_inconsistency_count: usize,
}

/// Outcome of one validation run. Built once by the validator and read-only
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationResult {
    is_valid: bool,
    delimiter: Option<Delimiter>,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    statistics: ValidationStatistics,
    column_type_profile: BTreeMap<String, BTreeMap<ColumnType, usize>>,
}

impl ValidationResult {
    /// Validity is derived from `errors`: a result is valid iff it has none.
    #[must_use]
    pub fn new(
        delimiter: Option<Delimiter>,
        errors: Vec<ValidationIssue>,
        warnings: Vec<ValidationIssue>,
        statistics: ValidationStatistics,
        column_type_profile: BTreeMap<String, BTreeMap<ColumnType, usize>>,
    ) -> Self {
        Self {
            is_valid: errors.is_empty(),
            delimiter,
            errors,
            warnings,
            statistics,
            column_type_profile,
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.is_valid
    }

    #[must_use]
    pub const fn delimiter(&self) -> Option<Delimiter> {
        self.delimiter
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    #[must_use]
    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    #[must_use]
    pub const fn statistics(&self) -> &ValidationStatistics {
        &self.statistics
    }

    #[must_use]
    pub fn column_type_profile(&self) -> &BTreeMap<String, BTreeMap<ColumnType, usize>> {
        &self.column_type_profile
    }

    #[must_use]
    pub fn has_error(&self, code: IssueCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    #[must_use]
    pub fn has_warning(&self, code: IssueCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Returns a copy in which every warning also counts as an error.
    #[must_use]
    pub fn with_warnings_as_errors(&self) -> Self {
        let mut errors = self.errors.clone();
        errors.extend(self.warnings.iter().map(|w| ValidationIssue {
            code: IssueCode::PromotedWarning,
            line: w.line,
            column: w.column.clone(),
            message: format!("{} (warning promoted: {})", w.message, w.code.as_str()),
        }));
        Self::new(
            self.delimiter,
            errors,
            self.warnings.clone(),
            self.statistics,
            self.column_type_profile.clone(),
        )
    }
}

// SPDX-License-Identifier: Apache-2.0

use std::collections::HashSet;

use bijux_watchlist_model::{
    Dataset, Delimiter, IssueCode, ValidationIssue, ValidationResult, ValidationStatistics,
};
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::classify::ValueClassifier;
use crate::delimiter::detect_delimiter;
use crate::encode::encode_comma_separated;
use crate::headers::check_headers;
use crate::profile::ColumnProfiler;
use crate::structure::{empty_lines, scan_structure};
use crate::{IngestError, LoadedCsv, ValidatedInput, ValidationOptions};

#[derive(Default)]
struct Findings {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    statistics: ValidationStatistics,
}

impl Findings {
    fn terminal(mut self, delimiter: Option<Delimiter>, issue: ValidationIssue) -> ValidatedInput {
        self.errors.push(issue);
        ValidatedInput {
            result: ValidationResult::new(
                delimiter,
                self.errors,
                self.warnings,
                self.statistics,
                Default::default(),
            ),
            loaded: None,
        }
    }
}

pub(crate) fn unreadable(message: String) -> ValidatedInput {
    Findings::default().terminal(None, ValidationIssue::new(IssueCode::Unreadable, message))
}

pub(crate) fn validate_text(
    text: &str,
    options: &ValidationOptions,
) -> Result<ValidatedInput, IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut findings = Findings::default();

    if text.trim().is_empty() {
        return Ok(findings.terminal(
            None,
            ValidationIssue::new(IssueCode::EmptyFile, "file is empty"),
        ));
    }

    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(text));
    debug!(%delimiter, overridden = options.delimiter.is_some(), "csv delimiter selected");

    findings.errors.extend(scan_structure(text, delimiter));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut records: Vec<(usize, Vec<String>)> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record
                    .position()
                    .and_then(|p| usize::try_from(p.line()).ok())
                    .unwrap_or(records.len() + 1);
                records.push((line, record.iter().map(ToString::to_string).collect()));
            }
            Err(err) => {
                let mut issue = ValidationIssue::new(
                    IssueCode::ParseFailure,
                    format!("csv parse failed: {err}"),
                );
                if let Some(line) = err
                    .position()
                    .and_then(|p| usize::try_from(p.line()).ok())
                {
                    issue = issue.at_line(line);
                }
                return Ok(findings.terminal(Some(delimiter), issue));
            }
        }
    }

    let mut records = records.into_iter();
    let Some((header_line, header_cells)) = records.next() else {
        return Ok(findings.terminal(
            Some(delimiter),
            ValidationIssue::new(IssueCode::EmptyFile, "file has no header row"),
        ));
    };
    let columns: Vec<String> = header_cells.iter().map(|h| h.trim().to_string()).collect();
    let headers_verbatim = header_cells.iter().zip(&columns).all(|(raw, name)| raw == name);
    findings.statistics.column_count = columns.len();

    let header_findings = check_headers(&columns, header_line)?;
    findings.errors.extend(header_findings.errors);
    findings.warnings.extend(header_findings.warnings);

    let classifier = ValueClassifier::new()?;
    let mut profiler = ColumnProfiler::new(&classifier, &columns, options.max_cell_length);
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut data_rows = 0_usize;
    let mut skipped_lines: Vec<usize> = empty_lines(text)
        .into_iter()
        .filter(|line| *line > header_line)
        .collect();

    for (line, cells) in records {
        if cells.iter().all(|c| c.trim().is_empty()) {
            skipped_lines.push(line);
            continue;
        }
        data_rows += 1;
        if cells.len() != columns.len() {
            findings.errors.push(
                ValidationIssue::new(
                    IssueCode::ColumnCountMismatch,
                    format!(
                        "expected {} fields as in the header, found {}",
                        columns.len(),
                        cells.len()
                    ),
                )
                .at_line(line),
            );
            continue;
        }
        profiler.observe_row(line, &cells);
        rows.push(cells);
    }
    findings.statistics.row_count = data_rows;
    skipped_lines.sort_unstable();
    let empty_rows = skipped_lines.len();
    findings.warnings.extend(skipped_lines.into_iter().map(|line| {
        ValidationIssue::new(IssueCode::EmptyRow, "row is completely empty; skipped").at_line(line)
    }));

    if data_rows == 0 {
        return Ok(findings.terminal(
            Some(delimiter),
            ValidationIssue::new(IssueCode::NoDataRows, "file has a header but no data rows"),
        ));
    }

    let duplicate_rows = {
        let mut seen: HashSet<&[String]> = HashSet::with_capacity(rows.len());
        rows.iter()
            .filter(|cells| !seen.insert(cells.as_slice()))
            .count()
    };
    findings.statistics.duplicate_row_count = duplicate_rows;
    if duplicate_rows > 0 {
        findings.warnings.push(ValidationIssue::new(
            IssueCode::DuplicateRows,
            format!("{duplicate_rows} rows repeat an earlier row exactly"),
        ));
    }

    let outcome = profiler.finish();
    findings.statistics.empty_field_count = outcome.empty_field_count;
    findings.statistics.data_type_inconsistency_count = outcome.inconsistent_columns;
    findings.errors.extend(outcome.errors);
    findings.warnings.extend(outcome.warnings);

    let mut result = ValidationResult::new(
        Some(delimiter),
        findings.errors,
        findings.warnings,
        findings.statistics,
        outcome.profile,
    );
    if options.fail_on_warn && !result.warnings().is_empty() {
        result = result.with_warnings_as_errors();
    }
    info!(
        %delimiter,
        rows = result.statistics().row_count,
        columns = result.statistics().column_count,
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        valid = result.is_valid(),
        "csv validation complete"
    );

    if !result.is_valid() {
        return Ok(ValidatedInput {
            result,
            loaded: None,
        });
    }

    let dataset = Dataset::from_records(columns, rows, delimiter).ok_or_else(|| {
        IngestError("validated rows do not match the header width".to_string())
    })?;
    // Uploaded text must carry the same header names the comparison used.
    let verbatim = delimiter == Delimiter::Comma
        && headers_verbatim
        && empty_rows == 0
        && !text.lines().any(|line| line.trim().is_empty());
    let raw_content = if verbatim {
        text.to_string()
    } else {
        encode_comma_separated(&dataset)?
    };
    Ok(ValidatedInput {
        result,
        loaded: Some(LoadedCsv {
            dataset,
            raw_content,
        }),
    })
}

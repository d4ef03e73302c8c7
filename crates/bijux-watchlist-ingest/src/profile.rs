// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, HashMap};

use bijux_watchlist_model::{ColumnType, IssueCode, ValidationIssue};

use crate::classify::ValueClassifier;

pub(crate) const CONSISTENCY_THRESHOLD_PERCENT: f64 = 90.0;
const INJECTION_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

/// Accumulates per-column type counts and per-cell findings in one pass.
pub(crate) struct ColumnProfiler<'a> {
    classifier: &'a ValueClassifier,
    max_cell_length: usize,
    columns: &'a [String],
    profile: BTreeMap<String, BTreeMap<ColumnType, usize>>,
    values: Vec<Vec<String>>,
    pub empty_field_count: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl<'a> ColumnProfiler<'a> {
    pub fn new(classifier: &'a ValueClassifier, columns: &'a [String], max_cell_length: usize) -> Self {
        Self {
            classifier,
            max_cell_length,
            columns,
            profile: BTreeMap::new(),
            values: vec![Vec::new(); columns.len()],
            empty_field_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn observe_row(&mut self, line: usize, cells: &[String]) {
        for (idx, (column, value)) in self.columns.iter().zip(cells).enumerate() {
            if value.trim().is_empty() {
                self.empty_field_count += 1;
                continue;
            }
            let detected = self.classifier.classify(value);
            *self
                .profile
                .entry(column.clone())
                .or_default()
                .entry(detected)
                .or_insert(0) += 1;

            let length = value.chars().count();
            if length > self.max_cell_length {
                self.errors.push(
                    ValidationIssue::new(
                        IssueCode::CellTooLong,
                        format!(
                            "value has {length} characters; the limit is {}",
                            self.max_cell_length
                        ),
                    )
                    .at_line(line)
                    .in_column(column.as_str()),
                );
            }
            if value.starts_with(INJECTION_PREFIXES) {
                self.warnings.push(
                    ValidationIssue::new(
                        IssueCode::CsvInjectionRisk,
                        "value starts with a formula character (= + - @)",
                    )
                    .at_line(line)
                    .in_column(column.as_str()),
                );
            }
            if detected.is_identifier() {
                self.values[idx].push(value.trim().to_ascii_lowercase());
            }
        }
    }

    /// Consumes the profiler, appending per-column consistency findings.
    pub fn finish(mut self) -> ProfileOutcome {
        let mut inconsistent_columns = 0;
        for (idx, column) in self.columns.iter().enumerate() {
            let Some(counts) = self.profile.get(column) else {
                continue;
            };
            let Some((majority, majority_count)) = majority_type(counts) else {
                continue;
            };
            let total: usize = counts.values().sum();
            if counts.len() > 1 {
                #[allow(clippy::cast_precision_loss)]
                let percent = majority_count as f64 * 100.0 / total as f64;
                if percent < CONSISTENCY_THRESHOLD_PERCENT {
                    inconsistent_columns += 1;
                    self.warnings.push(
                        ValidationIssue::new(
                            IssueCode::TypeInconsistency,
                            format!(
                                "majority type {majority} covers {percent:.1}% of {total} values across {} types",
                                counts.len()
                            ),
                        )
                        .in_column(column.as_str()),
                    );
                }
            }
            if majority.is_identifier() {
                let duplicates = count_duplicates(&self.values[idx]);
                if duplicates > 0 {
                    self.warnings.push(
                        ValidationIssue::new(
                            IssueCode::DuplicateIdentifierValues,
                            format!("{duplicates} duplicate {majority} values"),
                        )
                        .in_column(column.as_str()),
                    );
                }
            }
        }
        ProfileOutcome {
            profile: self.profile,
            empty_field_count: self.empty_field_count,
            inconsistent_columns,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

pub(crate) struct ProfileOutcome {
    pub profile: BTreeMap<String, BTreeMap<ColumnType, usize>>,
    pub empty_field_count: usize,
    pub inconsistent_columns: usize,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// Most frequent type; ties go to the type with higher precedence.
fn majority_type(counts: &BTreeMap<ColumnType, usize>) -> Option<(ColumnType, usize)> {
    let mut best: Option<(ColumnType, usize)> = None;
    for (kind, count) in counts {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((*kind, *count)),
        }
    }
    best
}

fn count_duplicates(values: &[String]) -> usize {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(values.len());
    let mut duplicates = 0;
    for value in values {
        let n = seen.entry(value.as_str()).or_insert(0);
        if *n > 0 {
            duplicates += 1;
        }
        *n += 1;
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_tie_prefers_earlier_type() {
        let counts = BTreeMap::from([(ColumnType::String, 2), (ColumnType::Integer, 2)]);
        assert_eq!(majority_type(&counts), Some((ColumnType::Integer, 2)));
    }

    #[test]
    fn duplicates_count_repeats_not_distinct_values() {
        let values: Vec<String> = ["a", "b", "a", "a"].iter().map(ToString::to_string).collect();
        assert_eq!(count_duplicates(&values), 2);
    }
}

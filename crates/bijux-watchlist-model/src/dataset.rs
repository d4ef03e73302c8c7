// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub const ALL: [Self; 3] = [Self::Comma, Self::Semicolon, Self::Tab];

    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
            Self::Tab => b'\t',
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        self.as_byte() as char
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comma => "comma",
            Self::Semicolon => "semicolon",
            Self::Tab => "tab",
        }
    }
}

impl Display for Delimiter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One data row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, String>);

impl Row {
    #[must_use]
    pub fn new(cells: BTreeMap<String, String>) -> Self {
        Self(cells)
    }

    #[must_use]
    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    /// Value of `column` when it is present and not blank.
    #[must_use]
    pub fn key_value(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn cells(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parsed CSV content: the header in file order plus every well-formed row.
///
/// Every row carries exactly the header's column set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
    delimiter: Delimiter,
}

impl Dataset {
    /// Builds a dataset from header and ordered row values.
    ///
    /// Returns `None` when a row's value count differs from the header's.
    #[must_use]
    pub fn from_records(
        columns: Vec<String>,
        records: Vec<Vec<String>>,
        delimiter: Delimiter,
    ) -> Option<Self> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            if record.len() != columns.len() {
                return None;
            }
            rows.push(Row::new(columns.iter().cloned().zip(record).collect()));
        }
        Some(Self {
            columns,
            rows,
            delimiter,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub const fn delimiter(&self) -> Delimiter {
        self.delimiter
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names sorted and deduplicated; the form schema comparison uses.
    #[must_use]
    pub fn sorted_columns(&self) -> Vec<String> {
        let mut cols = self.columns.clone();
        cols.sort();
        cols.dedup();
        cols
    }
}

// SPDX-License-Identifier: Apache-2.0

use bijux_watchlist_model::{Delimiter, IssueCode, ValidationIssue};

/// True when a raw line holds nothing but whitespace and delimiters.
pub(crate) fn is_blank_line(line: &str, delimiter: Delimiter) -> bool {
    line.chars()
        .all(|c| c.is_whitespace() || c == delimiter.as_char())
}

/// Line numbers of lines with no content at all. The parser drops these
/// without producing a record.
pub(crate) fn empty_lines(text: &str) -> Vec<usize> {
    text.lines()
        .enumerate()
        .filter(|(_, raw)| raw.trim_end_matches('\r').is_empty())
        .map(|(idx, _)| idx + 1)
        .collect()
}

/// Line-oriented scan run before parsing.
///
/// Empty fields and leading or trailing delimiters do not survive the remote
/// round trip, so each occurrence is an error. Blank lines are left to the
/// empty-row check. Quotes are not interpreted here.
pub(crate) fn scan_structure(text: &str, delimiter: Delimiter) -> Vec<ValidationIssue> {
    let d = delimiter.as_char();
    let doubled: String = [d, d].iter().collect();
    let mut issues = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        if is_blank_line(line, delimiter) {
            continue;
        }
        if line.contains(&doubled) {
            issues.push(
                ValidationIssue::new(
                    IssueCode::ConsecutiveDelimiters,
                    format!("consecutive {delimiter} delimiters (empty field)"),
                )
                .at_line(line_no),
            );
        }
        if line.starts_with(d) {
            issues.push(
                ValidationIssue::new(
                    IssueCode::LeadingDelimiter,
                    format!("line starts with a {delimiter} delimiter"),
                )
                .at_line(line_no),
            );
        }
        if line.ends_with(d) {
            issues.push(
                ValidationIssue::new(
                    IssueCode::TrailingDelimiter,
                    format!("line ends with a {delimiter} delimiter"),
                )
                .at_line(line_no),
            );
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_every_structural_problem_with_line_numbers() {
        let issues = scan_structure("id,email\n1,,x\n,2\n3,\n", Delimiter::Comma);
        let got: Vec<(IssueCode, Option<usize>)> =
            issues.iter().map(|i| (i.code, i.line)).collect();
        assert_eq!(
            got,
            vec![
                (IssueCode::ConsecutiveDelimiters, Some(2)),
                (IssueCode::LeadingDelimiter, Some(3)),
                (IssueCode::TrailingDelimiter, Some(4)),
            ]
        );
    }

    #[test]
    fn empty_lines_are_numbered_from_one() {
        assert_eq!(empty_lines("a,b\n\n1,2\r\n\r\n3,4\n"), vec![2, 4]);
        assert!(empty_lines("a,b\n1,2\n").is_empty());
    }

    #[test]
    fn blank_and_delimiter_only_lines_are_skipped() {
        assert!(scan_structure("a;b\n\n;;\n1;2\r\n", Delimiter::Semicolon).is_empty());
    }
}

// SPDX-License-Identifier: Apache-2.0

use bijux_watchlist_model::Delimiter;

/// Picks the delimiter occurring most often in the first line.
///
/// Ties resolve in `Delimiter::ALL` order, so comma wins any tie. Only the
/// first line is inspected: a single-column file or a quoted header holding a
/// delimiter can mis-detect, which is why callers may pass an override.
#[must_use]
pub fn detect_delimiter(text: &str) -> Delimiter {
    let first_line = text.lines().next().unwrap_or("");
    let mut best = Delimiter::Comma;
    let mut best_count = 0_usize;
    for candidate in Delimiter::ALL {
        let count = first_line
            .bytes()
            .filter(|b| *b == candidate.as_byte())
            .count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

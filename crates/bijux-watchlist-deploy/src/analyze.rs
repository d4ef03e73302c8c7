// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};

use bijux_watchlist_model::{ChangeSet, Row};

fn index_by_key<'a>(rows: &'a [Row], search_key: &str) -> (BTreeMap<&'a str, &'a Row>, usize) {
    let mut index = BTreeMap::new();
    let mut keyless = 0;
    for row in rows {
        match row.key_value(search_key) {
            Some(key) => {
                index.entry(key).or_insert(row);
            }
            None => keyless += 1,
        }
    }
    (index, keyless)
}

/// Rows of `rows` whose key is absent from `other`, first occurrence per key,
/// in input order.
fn missing_from(rows: &[Row], other: &BTreeMap<&str, &Row>, search_key: &str) -> Vec<Row> {
    let mut emitted = BTreeSet::new();
    rows.iter()
        .filter(|row| {
            row.key_value(search_key)
                .is_some_and(|key| !other.contains_key(key) && emitted.insert(key))
        })
        .cloned()
        .collect()
}

/// Item-level difference between deployed and new rows keyed by the
/// search-key value. Rows without a key value are counted, not compared.
#[must_use]
pub fn analyze_changes(previous: &[Row], current: &[Row], search_key: &str) -> ChangeSet {
    let (old, keyless_previous) = index_by_key(previous, search_key);
    let (new, keyless_current) = index_by_key(current, search_key);

    let added = missing_from(current, &old, search_key);
    let removed = missing_from(previous, &new, search_key);
    let unchanged_count = new.keys().filter(|k| old.contains_key(*k)).count();

    ChangeSet {
        added,
        removed,
        unchanged_count,
        keyless_previous,
        keyless_current,
    }
}

// SPDX-License-Identifier: Apache-2.0

use bijux_watchlist_model::{Dataset, SchemaComparison, WatchlistResource};

use crate::DeployError;

/// Picks the search-key column: the requested one when given, the first
/// dataset column otherwise.
pub fn resolve_search_key(columns: &[String], requested: Option<&str>) -> Result<String, DeployError> {
    match requested.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => {
            if columns.iter().any(|c| c == key) {
                Ok(key.to_string())
            } else {
                Err(DeployError::SearchKeyNotFound {
                    key: key.to_string(),
                    available: columns.join(", "),
                })
            }
        }
        None => columns.first().cloned().ok_or_else(|| DeployError::SearchKeyNotFound {
            key: String::new(),
            available: String::new(),
        }),
    }
}

/// Column sets are compared as sorted lists, so a pure reordering is not a
/// change.
#[must_use]
pub fn compare_schema(
    dataset: &Dataset,
    search_key: &str,
    existing: &WatchlistResource,
) -> SchemaComparison {
    let current = dataset.sorted_columns();
    let previous = existing.sorted_columns();
    let missing_from = |from: &[String], other: &[String]| -> Vec<String> {
        from.iter()
            .filter(|c| other.binary_search(*c).is_err())
            .cloned()
            .collect()
    };
    SchemaComparison {
        columns_changed: current != previous,
        search_key_changed: existing.search_key != search_key,
        added_columns: missing_from(&current, &previous),
        removed_columns: missing_from(&previous, &current),
        previous_search_key: existing.search_key.clone(),
        search_key: search_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bijux_watchlist_model::{Delimiter, RemoteIdentifiers, WatchlistAlias};

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn dataset(columns: &[&str]) -> Dataset {
        Dataset::from_records(cols(columns), Vec::new(), Delimiter::Comma).expect("dataset")
    }

    fn resource(columns: &[&str], key: &str) -> WatchlistResource {
        WatchlistResource {
            alias: WatchlistAlias::parse("vip").expect("alias"),
            display_name: "vip".to_string(),
            description: String::new(),
            search_key: key.to_string(),
            columns: cols(columns),
            items: Vec::new(),
            identifiers: RemoteIdentifiers::default(),
        }
    }

    #[test]
    fn default_key_is_first_column() {
        assert_eq!(resolve_search_key(&cols(&["id", "email"]), None).expect("key"), "id");
        assert_eq!(resolve_search_key(&cols(&["id", "email"]), Some("  ")).expect("key"), "id");
    }

    #[test]
    fn requested_key_must_exist() {
        let err = resolve_search_key(&cols(&["id", "email"]), Some("name")).expect_err("missing");
        assert!(err.to_string().contains("name"), "unexpected error: {err}");
        assert_eq!(
            resolve_search_key(&cols(&["id", "email"]), Some("email")).expect("key"),
            "email"
        );
    }

    #[test]
    fn reordered_columns_are_unchanged() {
        let cmp = compare_schema(&dataset(&["email", "id"]), "id", &resource(&["id", "email"], "id"));
        assert!(!cmp.columns_changed);
        assert!(!cmp.search_key_changed);
        assert!(cmp.added_columns.is_empty() && cmp.removed_columns.is_empty());
    }

    #[test]
    fn added_and_removed_columns_are_listed() {
        let cmp = compare_schema(
            &dataset(&["id", "name"]),
            "name",
            &resource(&["id", "email"], "id"),
        );
        assert!(cmp.columns_changed);
        assert!(cmp.search_key_changed);
        assert_eq!(cmp.added_columns, cols(&["name"]));
        assert_eq!(cmp.removed_columns, cols(&["email"]));
        assert_eq!(cmp.previous_search_key, "id");
    }
}

// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::Row;

pub const ALIAS_MAX_LEN: usize = 64;
pub const SOURCE_TYPE_LOCAL_FILE: &str = "Local file";
pub const CONTENT_TYPE_CSV: &str = "text/csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError(pub String);

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ModelError {}

/// Unique, immutable name of a watchlist. It survives recreation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WatchlistAlias(String);

impl WatchlistAlias {
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ModelError("watchlist alias must not be empty".to_string()));
        }
        if s.len() > ALIAS_MAX_LEN {
            return Err(ModelError(format!(
                "watchlist alias exceeds max length {ALIAS_MAX_LEN}"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ModelError(format!(
                "watchlist alias `{s}` may only contain ASCII letters, digits, '_' and '-'"
            )));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for WatchlistAlias {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Address of a watchlist: the scope (for example a subscription and
/// resource group path), the container workspace and the alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchlistTarget {
    pub scope_id: String,
    pub container_id: String,
    pub alias: WatchlistAlias,
}

impl WatchlistTarget {
    pub fn new(scope_id: &str, container_id: &str, alias: &str) -> Result<Self, ModelError> {
        let scope_id = scope_id.trim().trim_matches('/');
        if scope_id.is_empty() {
            return Err(ModelError("scope id must not be empty".to_string()));
        }
        let container_id = container_id.trim();
        if container_id.is_empty() || container_id.contains('/') {
            return Err(ModelError(
                "container id must be a single non-empty path segment".to_string(),
            ));
        }
        Ok(Self {
            scope_id: scope_id.to_string(),
            container_id: container_id.to_string(),
            alias: WatchlistAlias::parse(alias)?,
        })
    }
}

impl Display for WatchlistTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.scope_id, self.container_id, self.alias)
    }
}

/// A watchlist as currently stored remotely, with all of its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistResource {
    pub alias: WatchlistAlias,
    pub display_name: String,
    pub description: String,
    pub search_key: String,
    pub columns: Vec<String>,
    pub items: Vec<Row>,
    #[serde(default)]
    pub identifiers: RemoteIdentifiers,
}

impl WatchlistResource {
    /// Column names in first-seen order across all items.
    #[must_use]
    pub fn columns_from_items(items: &[Row]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for item in items {
            for col in item.columns() {
                if !out.iter().any(|c| c == col) {
                    out.push(col.to_string());
                }
            }
        }
        out
    }

    #[must_use]
    pub fn sorted_columns(&self) -> Vec<String> {
        let mut cols = self.columns.clone();
        cols.sort();
        cols.dedup();
        cols
    }
}

/// Identifiers the remote store assigns to a watchlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteIdentifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watchlist_id: Option<String>,
}

/// Body of a watchlist PUT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistPayload {
    pub display_name: String,
    pub description: String,
    pub provider: String,
    pub source: String,
    pub source_type: String,
    pub raw_content: String,
    pub items_search_key: String,
    pub content_type: String,
    pub number_of_lines_to_skip: u32,
}

impl WatchlistPayload {
    #[must_use]
    pub fn from_csv(
        display_name: &str,
        description: &str,
        provider: &str,
        source: &str,
        raw_content: String,
        items_search_key: &str,
    ) -> Self {
        Self {
            display_name: display_name.to_string(),
            description: description.to_string(),
            provider: provider.to_string(),
            source: source.to_string(),
            source_type: SOURCE_TYPE_LOCAL_FILE.to_string(),
            raw_content,
            items_search_key: items_search_key.to_string(),
            content_type: CONTENT_TYPE_CSV.to_string(),
            number_of_lines_to_skip: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_rejects_path_characters() {
        assert!(WatchlistAlias::parse("high_value-assets").is_ok());
        assert!(WatchlistAlias::parse("a/b").is_err());
        assert!(WatchlistAlias::parse("   ").is_err());
        assert!(WatchlistAlias::parse(&"x".repeat(ALIAS_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn target_normalizes_scope_slashes() {
        let target = WatchlistTarget::new("/subscriptions/s1/resourceGroups/rg/", "ws", "vip")
            .expect("target");
        assert_eq!(target.scope_id, "subscriptions/s1/resourceGroups/rg");
        assert_eq!(target.to_string(), "subscriptions/s1/resourceGroups/rg/ws/vip");
    }

    #[test]
    fn payload_serializes_with_camel_case_fields() {
        let payload = WatchlistPayload::from_csv("vip", "desc", "soc", "vip.csv", "id\n1\n".to_string(), "id");
        let value = serde_json::to_value(&payload).expect("json");
        assert_eq!(value["itemsSearchKey"], "id");
        assert_eq!(value["sourceType"], SOURCE_TYPE_LOCAL_FILE);
        assert_eq!(value["contentType"], CONTENT_TYPE_CSV);
        assert_eq!(value["numberOfLinesToSkip"], 0);
        assert_eq!(value["rawContent"], "id\n1\n");
    }

    #[test]
    fn columns_from_items_keeps_first_seen_order() {
        let items = vec![
            Row::from_pairs([("id", "1"), ("email", "a@x.com")]),
            Row::from_pairs([("id", "2"), ("name", "b")]),
        ];
        assert_eq!(
            WatchlistResource::columns_from_items(&items),
            vec!["email".to_string(), "id".to_string(), "name".to_string()]
        );
    }
}

// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::{RemoteIdentifiers, Row, WatchlistAlias};

/// Column-set and search-key differences between the new dataset and the
/// deployed watchlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaComparison {
    pub columns_changed: bool,
    pub search_key_changed: bool,
    pub added_columns: Vec<String>,
    pub removed_columns: Vec<String>,
    pub previous_search_key: String,
    pub search_key: String,
}

/// Item-level difference keyed by the search-key value.
///
/// Rows without a key value are not tracked and only counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeSet {
    pub added: Vec<Row>,
    pub removed: Vec<Row>,
    pub unchanged_count: usize,
    pub keyless_previous: usize,
    pub keyless_current: usize,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecreateReason {
    SearchKeyChanged,
    SchemaChanged,
    ItemsRemoved,
}

impl RecreateReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SearchKeyChanged => "search_key_changed",
            Self::SchemaChanged => "schema_changed",
            Self::ItemsRemoved => "items_removed",
        }
    }
}

impl Display for RecreateReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a run converges the remote watchlist onto the new dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "strategy", content = "reason", rename_all = "snake_case")]
pub enum DeploymentDecision {
    Create,
    Update,
    Recreate(RecreateReason),
}

impl DeploymentDecision {
    #[must_use]
    pub const fn strategy(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Recreate(_) => "recreate",
        }
    }

    #[must_use]
    pub const fn reason(self) -> Option<RecreateReason> {
        match self {
            Self::Recreate(reason) => Some(reason),
            Self::Create | Self::Update => None,
        }
    }

    #[must_use]
    pub const fn requires_delete(self) -> bool {
        matches!(self, Self::Recreate(_))
    }
}

impl Display for DeploymentDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Recreate(reason) => write!(f, "recreate ({reason})"),
            other => write!(f, "{}", other.strategy()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStage {
    Validate,
    Inspect,
    Compare,
    Analyze,
    Decide,
    Delete,
    Settle,
    Upsert,
    Report,
}

impl DeployStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Inspect => "inspect",
            Self::Compare => "compare",
            Self::Analyze => "analyze",
            Self::Decide => "decide",
            Self::Delete => "delete",
            Self::Settle => "settle",
            Self::Upsert => "upsert",
            Self::Report => "report",
        }
    }
}

impl Display for DeployStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeployEvent {
    pub stage: DeployStage,
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentReport {
    pub schema_version: String,
    pub alias: WatchlistAlias,
    pub decision: DeploymentDecision,
    pub applied: bool,
    /// Set when the watchlist was deleted for recreation and the recreate
    /// did not complete.
    #[serde(default)]
    pub partial_state: bool,
    pub search_key: String,
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaComparison>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_count: Option<usize>,
    pub added_sample: Vec<String>,
    pub removed_sample: Vec<String>,
    pub content_sha256: String,
    pub remote: RemoteIdentifiers,
    pub warnings: usize,
    pub events: Vec<DeployEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_serializes_as_tagged_strategy() {
        let value = serde_json::to_value(DeploymentDecision::Recreate(RecreateReason::ItemsRemoved))
            .expect("json");
        assert_eq!(value["strategy"], "recreate");
        assert_eq!(value["reason"], "items_removed");
        let value = serde_json::to_value(DeploymentDecision::Update).expect("json");
        assert_eq!(value["strategy"], "update");
    }

    #[test]
    fn only_recreate_deletes() {
        assert!(!DeploymentDecision::Create.requires_delete());
        assert!(!DeploymentDecision::Update.requires_delete());
        assert!(DeploymentDecision::Recreate(RecreateReason::SchemaChanged).requires_delete());
        assert_eq!(
            DeploymentDecision::Recreate(RecreateReason::SchemaChanged).to_string(),
            "recreate (schema_changed)"
        );
    }
}

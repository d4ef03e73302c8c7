// SPDX-License-Identifier: Apache-2.0

use bijux_watchlist_model::{DeploymentDecision, RecreateReason};

/// Update semantics on the remote side only merge items, so any transition
/// that must drop an item, a column or the key index goes through recreation.
/// Rules are checked in order and the first match wins.
#[must_use]
pub const fn select_strategy(
    is_first_deployment: bool,
    search_key_changed: bool,
    columns_changed: bool,
    removed_item_count: usize,
) -> DeploymentDecision {
    if is_first_deployment {
        DeploymentDecision::Create
    } else if search_key_changed {
        DeploymentDecision::Recreate(RecreateReason::SearchKeyChanged)
    } else if columns_changed {
        DeploymentDecision::Recreate(RecreateReason::SchemaChanged)
    } else if removed_item_count > 0 {
        DeploymentDecision::Recreate(RecreateReason::ItemsRemoved)
    } else {
        DeploymentDecision::Update
    }
}

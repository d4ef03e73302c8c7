// SPDX-License-Identifier: Apache-2.0

use bijux_watchlist_model::WatchlistTarget;

pub const CONTAINER_PROVIDER: &str = "providers/Microsoft.OperationalInsights/workspaces";
pub const WATCHLIST_PROVIDER: &str = "providers/Microsoft.SecurityInsights/watchlists";

/// Collection path of all watchlists in the target's container.
#[must_use]
pub fn watchlists_path(target: &WatchlistTarget) -> String {
    format!(
        "{}/{CONTAINER_PROVIDER}/{}/{WATCHLIST_PROVIDER}",
        target.scope_id, target.container_id
    )
}

#[must_use]
pub fn watchlist_path(target: &WatchlistTarget) -> String {
    format!("{}/{}", watchlists_path(target), target.alias)
}

#[must_use]
pub fn watchlist_items_path(target: &WatchlistTarget) -> String {
    format!("{}/watchlistItems", watchlist_path(target))
}

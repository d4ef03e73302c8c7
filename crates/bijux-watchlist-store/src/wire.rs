// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use bijux_watchlist_model::{RemoteIdentifiers, Row, WatchlistPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct WatchlistDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub etag: Option<String>,
    #[serde(default)]
    pub properties: WatchlistProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WatchlistProperties {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub items_search_key: Option<String>,
    pub watchlist_id: Option<String>,
}

impl WatchlistDocument {
    pub fn identifiers(&self) -> RemoteIdentifiers {
        RemoteIdentifiers {
            id: self.id.clone(),
            etag: self.etag.clone(),
            watchlist_id: self.properties.watchlist_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemPage {
    #[serde(default)]
    pub value: Vec<ItemDocument>,
    #[serde(default, rename = "nextLink")]
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemDocument {
    #[serde(default)]
    pub properties: ItemProperties,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ItemProperties {
    #[serde(default, rename = "itemsKeyValue")]
    pub items_key_value: BTreeMap<String, Value>,
}

impl ItemDocument {
    /// Non-string cell values are rendered as their JSON text; nulls become
    /// empty cells.
    pub fn into_row(self) -> Row {
        Row::new(
            self.properties
                .items_key_value
                .into_iter()
                .map(|(column, value)| {
                    let cell = match value {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (column, cell)
                })
                .collect(),
        )
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PutBody<'a> {
    pub properties: &'a WatchlistPayload,
}

// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bijux_watchlist_model::{
    RemoteIdentifiers, Row, WatchlistPayload, WatchlistResource, WatchlistTarget,
};
use reqwest::blocking::{Client, RequestBuilder};
use tracing::{debug, warn};

use crate::envelope::remote_error_message;
use crate::instrumentation::{NoopInstrumentation, StoreInstrumentation};
use crate::paths::{watchlist_items_path, watchlist_path, watchlists_path};
use crate::wire::{ItemDocument, ItemPage, PutBody, WatchlistDocument};
use crate::{StoreError, StoreErrorCode, WatchlistStore};

const MAX_ITEM_PAGES: usize = 10_000;

/// Watchlist client over the remote management REST API.
#[derive(Clone)]
pub struct HttpWatchlistStore {
    base_url: String,
    api_version: String,
    bearer_token: Option<String>,
    client: Client,
    instrumentation: Arc<dyn StoreInstrumentation>,
}

impl HttpWatchlistStore {
    pub fn new(base_url: &str, api_version: &str, timeout: Duration) -> Result<Self, StoreError> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| StoreError::new(StoreErrorCode::Validation, format!("invalid base url: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StoreError::new(
                StoreErrorCode::Validation,
                format!("unsupported base url scheme `{}`", parsed.scheme()),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            bearer_token: None,
            client,
            instrumentation: Arc::new(NoopInstrumentation),
        })
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_instrumentation(mut self, instrumentation: Arc<dyn StoreInstrumentation>) -> Self {
        self.instrumentation = instrumentation;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}?api-version={}", self.base_url, self.api_version)
    }

    /// Sends one request and returns the body of a successful response.
    fn send(&self, operation: &str, request: RequestBuilder, sent: usize) -> Result<String, StoreError> {
        let request = match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let started = Instant::now();
        let response = request.send().map_err(|e| {
            let err = StoreError::new(StoreErrorCode::Network, e.to_string());
            self.instrumentation.observe_error(operation, err.code);
            err
        })?;
        let status = response.status();
        let body = response.text().map_err(|e| {
            let err = StoreError::new(StoreErrorCode::Network, e.to_string());
            self.instrumentation.observe_error(operation, err.code);
            err
        })?;
        self.instrumentation
            .observe_request(operation, sent, body.len(), started.elapsed());
        debug!(operation, status = status.as_u16(), bytes = body.len(), "watchlist request complete");
        if status.is_success() {
            return Ok(body);
        }
        let code = StoreErrorCode::from_status(status.as_u16());
        self.instrumentation.observe_error(operation, code);
        Err(StoreError::new(code, remote_error_message(&body)).with_status(status.as_u16()))
    }

    fn fetch_items(&self, target: &WatchlistTarget) -> Result<Vec<Row>, StoreError> {
        let mut items = Vec::new();
        let mut visited = BTreeSet::new();
        let mut next = Some(self.url(&watchlist_items_path(target)));
        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) || visited.len() > MAX_ITEM_PAGES {
                warn!(%url, "watchlist item paging stopped at a repeated or excessive link");
                return Err(StoreError::new(
                    StoreErrorCode::Decode,
                    "watchlist item paging did not terminate",
                ));
            }
            let body = self.send("list_items", self.client.get(&url), 0)?;
            let page: ItemPage = serde_json::from_str(&body)
                .map_err(|e| StoreError::new(StoreErrorCode::Decode, format!("item page: {e}")))?;
            items.extend(page.value.into_iter().map(ItemDocument::into_row));
            next = page.next_link.filter(|link| !link.trim().is_empty());
        }
        Ok(items)
    }
}

impl WatchlistStore for HttpWatchlistStore {
    fn check_container(&self, target: &WatchlistTarget) -> Result<(), StoreError> {
        match self.send("check_container", self.client.get(self.url(&watchlists_path(target))), 0) {
            Ok(_) => Ok(()),
            Err(err) if err.code == StoreErrorCode::NotFound => Err(StoreError {
                message: format!(
                    "container `{}` not found or not enabled for watchlists: {}",
                    target.container_id, err.message
                ),
                ..err
            }),
            Err(err) => Err(err),
        }
    }

    fn fetch(&self, target: &WatchlistTarget) -> Result<Option<WatchlistResource>, StoreError> {
        let body = match self.send("fetch", self.client.get(self.url(&watchlist_path(target))), 0) {
            Ok(body) => body,
            Err(err) if err.code == StoreErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let document: WatchlistDocument = serde_json::from_str(&body)
            .map_err(|e| StoreError::new(StoreErrorCode::Decode, format!("watchlist: {e}")))?;
        let items = self.fetch_items(target)?;
        let identifiers = document.identifiers();
        let properties = document.properties;
        Ok(Some(WatchlistResource {
            alias: target.alias.clone(),
            display_name: properties
                .display_name
                .unwrap_or_else(|| target.alias.to_string()),
            description: properties.description.unwrap_or_default(),
            search_key: properties.items_search_key.unwrap_or_default(),
            columns: WatchlistResource::columns_from_items(&items),
            items,
            identifiers,
        }))
    }

    fn delete(&self, target: &WatchlistTarget) -> Result<(), StoreError> {
        match self.send("delete", self.client.delete(self.url(&watchlist_path(target))), 0) {
            Ok(_) => Ok(()),
            Err(err) if err.code == StoreErrorCode::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn upsert(
        &self,
        target: &WatchlistTarget,
        payload: &WatchlistPayload,
    ) -> Result<RemoteIdentifiers, StoreError> {
        let body = serde_json::to_vec(&PutBody { properties: payload })
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        let sent = body.len();
        let request = self
            .client
            .put(self.url(&watchlist_path(target)))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body);
        let response = self.send("upsert", request, sent)?;
        if response.trim().is_empty() {
            return Ok(RemoteIdentifiers::default());
        }
        let document: WatchlistDocument = serde_json::from_str(&response)
            .map_err(|e| StoreError::new(StoreErrorCode::Decode, format!("upsert response: {e}")))?;
        Ok(document.identifiers())
    }
}

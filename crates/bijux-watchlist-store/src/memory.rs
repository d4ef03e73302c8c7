// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use bijux_watchlist_model::{
    RemoteIdentifiers, Row, WatchlistPayload, WatchlistResource, WatchlistTarget,
};
use csv::ReaderBuilder;

use crate::{StoreError, StoreErrorCode, WatchlistStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreOperation {
    CheckContainer,
    Fetch,
    Delete,
    Upsert,
}

#[derive(Default)]
struct MemoryState {
    watchlists: BTreeMap<String, WatchlistResource>,
    missing_containers: BTreeSet<String>,
    failures: BTreeMap<StoreOperation, StoreError>,
    calls: Vec<StoreOperation>,
    revision: u64,
}

/// Process-local store with the remote merge semantics: an upsert of an
/// existing watchlist adds or replaces items by search key and keeps the rest.
#[derive(Default)]
pub struct InMemoryWatchlistStore {
    state: Mutex<MemoryState>,
}

fn key_of(target: &WatchlistTarget) -> String {
    target.to_string()
}

impl InMemoryWatchlistStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "memory store lock poisoned"))
    }

    /// Marks a container as absent so `check_container` reports not found.
    pub fn remove_container(&self, container_id: &str) -> Result<(), StoreError> {
        self.lock()?.missing_containers.insert(container_id.to_string());
        Ok(())
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: StoreOperation, error: StoreError) -> Result<(), StoreError> {
        self.lock()?.failures.insert(operation, error);
        Ok(())
    }

    pub fn calls(&self) -> Result<Vec<StoreOperation>, StoreError> {
        Ok(self.lock()?.calls.clone())
    }

    pub fn resource(&self, target: &WatchlistTarget) -> Result<Option<WatchlistResource>, StoreError> {
        Ok(self.lock()?.watchlists.get(&key_of(target)).cloned())
    }

    fn begin(&self, operation: StoreOperation) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        let mut state = self.lock()?;
        state.calls.push(operation);
        if let Some(err) = state.failures.remove(&operation) {
            return Err(err);
        }
        Ok(state)
    }
}

fn parse_items(raw_content: &str) -> Result<Vec<Row>, StoreError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b',')
        .from_reader(raw_content.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| StoreError::new(StoreErrorCode::Validation, e.to_string()))?;
        rows.push(Row::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.to_string())),
        ));
    }
    Ok(rows)
}

impl WatchlistStore for InMemoryWatchlistStore {
    fn check_container(&self, target: &WatchlistTarget) -> Result<(), StoreError> {
        let state = self.begin(StoreOperation::CheckContainer)?;
        if state.missing_containers.contains(&target.container_id) {
            return Err(StoreError::new(
                StoreErrorCode::NotFound,
                format!("container `{}` not found", target.container_id),
            )
            .with_status(404));
        }
        Ok(())
    }

    fn fetch(&self, target: &WatchlistTarget) -> Result<Option<WatchlistResource>, StoreError> {
        let state = self.begin(StoreOperation::Fetch)?;
        Ok(state.watchlists.get(&key_of(target)).cloned())
    }

    fn delete(&self, target: &WatchlistTarget) -> Result<(), StoreError> {
        let mut state = self.begin(StoreOperation::Delete)?;
        state.watchlists.remove(&key_of(target));
        Ok(())
    }

    fn upsert(
        &self,
        target: &WatchlistTarget,
        payload: &WatchlistPayload,
    ) -> Result<RemoteIdentifiers, StoreError> {
        let mut state = self.begin(StoreOperation::Upsert)?;
        let incoming = parse_items(&payload.raw_content)?;
        state.revision += 1;
        let revision = state.revision;
        let key = key_of(target);
        let search_key = payload.items_search_key.as_str();

        let mut items = match state.watchlists.remove(&key) {
            Some(existing) => existing.items,
            None => Vec::new(),
        };
        for row in incoming {
            let position = row
                .key_value(search_key)
                .and_then(|k| items.iter().position(|i| i.key_value(search_key) == Some(k)));
            match position {
                Some(idx) => items[idx] = row,
                None => items.push(row),
            }
        }

        let identifiers = RemoteIdentifiers {
            id: Some(format!("/{key}")),
            etag: Some(format!("\"{revision}\"")),
            watchlist_id: Some(format!("{revision:016x}")),
        };
        state.watchlists.insert(
            key,
            WatchlistResource {
                alias: target.alias.clone(),
                display_name: payload.display_name.clone(),
                description: payload.description.clone(),
                search_key: payload.items_search_key.clone(),
                columns: WatchlistResource::columns_from_items(&items),
                items,
                identifiers: identifiers.clone(),
            },
        );
        Ok(identifiers)
    }
}

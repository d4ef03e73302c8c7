// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use bijux_watchlist_model::{DeployEvent, DeployStage};
use tracing::info;

/// Ordered record of one run's stage events. Each event is also emitted as a
/// tracing event.
#[derive(Debug, Default, Clone)]
pub struct DeployLog {
    events: Vec<DeployEvent>,
}

impl DeployLog {
    pub fn emit(&mut self, stage: DeployStage, name: impl Into<String>, fields: BTreeMap<String, String>) {
        let name = name.into();
        info!(stage = stage.as_str(), event = %name, fields = ?fields, "watchlist deploy");
        self.events.push(DeployEvent {
            stage,
            name,
            fields,
        });
    }

    #[must_use]
    pub fn events(&self) -> &[DeployEvent] {
        &self.events
    }
}

pub(crate) fn fields<const N: usize>(pairs: [(&str, String); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

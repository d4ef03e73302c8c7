// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use bijux_watchlist_core::canonical::stable_json_pretty;
use bijux_watchlist_model::{DeploymentReport, Row};
use tracing::warn;

pub const REPORT_SCHEMA_VERSION: &str = "1";

/// Sorted, de-duplicated key values of `rows`, at most `limit` of them.
#[must_use]
pub fn sample_keys(rows: &[Row], search_key: &str, limit: usize) -> Vec<String> {
    let mut keys: Vec<String> = rows
        .iter()
        .filter_map(|r| r.key_value(search_key))
        .map(ToString::to_string)
        .collect();
    keys.sort();
    keys.dedup();
    keys.truncate(limit);
    keys
}

/// Writes the report as canonical JSON. Failures are logged and reported as
/// `false`; they never fail the deployment.
pub fn write_report(report: &DeploymentReport, path: &Path) -> bool {
    let rendered = match stable_json_pretty(report) {
        Ok(rendered) => rendered,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "report serialization failed");
            return false;
        }
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = fs::create_dir_all(parent) {
            warn!(path = %path.display(), error = %err, "report directory creation failed");
            return false;
        }
    }
    match fs::write(path, format!("{rendered}\n")) {
        Ok(()) => true,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "report write failed");
            false
        }
    }
}

/// Human-readable summary, one fact per line.
#[must_use]
pub fn render_text(report: &DeploymentReport) -> String {
    let mut out = String::new();
    let verb = if report.applied { "applied" } else { "planned" };
    let _ = writeln!(out, "watchlist {}: {} ({verb})", report.alias, report.decision);
    let _ = writeln!(out, "search key: {}", report.search_key);
    let _ = writeln!(out, "items: {}", report.item_count);
    if let Some(schema) = &report.schema {
        if !schema.added_columns.is_empty() {
            let _ = writeln!(out, "added columns: {}", schema.added_columns.join(", "));
        }
        if !schema.removed_columns.is_empty() {
            let _ = writeln!(out, "removed columns: {}", schema.removed_columns.join(", "));
        }
        if schema.search_key_changed {
            let _ = writeln!(
                out,
                "search key changed: {} -> {}",
                schema.previous_search_key, schema.search_key
            );
        }
    }
    if let (Some(added), Some(removed)) = (report.added_count, report.removed_count) {
        let _ = writeln!(out, "added: {added} removed: {removed}");
    }
    if !report.added_sample.is_empty() {
        let _ = writeln!(out, "added sample: {}", report.added_sample.join(", "));
    }
    if !report.removed_sample.is_empty() {
        let _ = writeln!(out, "removed sample: {}", report.removed_sample.join(", "));
    }
    if let Some(id) = &report.remote.watchlist_id {
        let _ = writeln!(out, "watchlist id: {id}");
    }
    if report.partial_state {
        let _ = writeln!(out, "watchlist deleted and not recreated: manual recreation required");
    }
    if report.warnings > 0 {
        let _ = writeln!(out, "validation warnings: {}", report.warnings);
    }
    out
}

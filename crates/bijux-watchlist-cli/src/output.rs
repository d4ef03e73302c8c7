// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;

use bijux_watchlist_model::ValidationResult;
use serde_json::Value;

use crate::OutputMode;

pub(crate) fn emit_ok(output_mode: OutputMode, payload: &Value) -> Result<(), String> {
    if output_mode.json {
        println!(
            "{}",
            serde_json::to_string(payload).map_err(|e| e.to_string())?
        );
    } else {
        println!(
            "{}",
            serde_json::to_string_pretty(payload).map_err(|e| e.to_string())?
        );
    }
    Ok(())
}

pub(crate) fn render_validation(path: &str, result: &ValidationResult) -> String {
    let mut out = String::new();
    let stats = result.statistics();
    let verdict = if result.is_valid() { "valid" } else { "invalid" };
    let delimiter = result
        .delimiter()
        .map_or_else(|| "unknown".to_string(), |d| d.as_str().to_string());
    let _ = writeln!(out, "{path}: {verdict}");
    let _ = writeln!(
        out,
        "delimiter: {delimiter}, rows: {}, columns: {}, empty fields: {}, duplicate rows: {}",
        stats.row_count, stats.column_count, stats.empty_field_count, stats.duplicate_row_count
    );
    for issue in result.errors() {
        let _ = writeln!(out, "error[{}] {issue}", issue.code.as_str());
    }
    for issue in result.warnings() {
        let _ = writeln!(out, "warning[{}] {issue}", issue.code.as_str());
    }
    out
}

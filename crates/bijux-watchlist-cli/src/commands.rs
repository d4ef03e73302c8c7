// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bijux_watchlist_core::{
    resolve_bijux_config_path, ConfigPathScope, ExitCode, MachineError, WatchlistConfig,
};
use bijux_watchlist_deploy::{deploy, plan, render_text, write_report, DeployError, DeployRequest};
use bijux_watchlist_ingest::{validate_csv_file, ValidationOptions};
use bijux_watchlist_model::{DeploymentReport, WatchlistTarget};
use bijux_watchlist_store::{HttpWatchlistStore, StoreMetricsCollector};
use serde_json::json;
use tracing::{info, warn};

use crate::output::{emit_ok, render_validation};
use crate::{CliError, DeployArgs, InputArgs, OutputMode};

fn validation_options(input: &InputArgs, config: &WatchlistConfig) -> ValidationOptions {
    ValidationOptions {
        delimiter: input.delimiter.map(Into::into),
        max_cell_length: input.max_cell_length.unwrap_or(config.max_cell_length),
        fail_on_warn: input.fail_on_warn,
    }
}

fn serialize<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, CliError> {
    serde_json::to_value(value).map_err(|e| CliError::internal(e.to_string()))
}

pub(crate) fn run_validate(
    file: &Path,
    input: &InputArgs,
    config: &WatchlistConfig,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let validated = validate_csv_file(file, &validation_options(input, config))
        .map_err(|e| CliError::internal(e.to_string()))?;
    let result = validated.result;
    if output_mode.json {
        emit_ok(output_mode, &serialize(&result)?).map_err(CliError::internal)?;
    } else {
        print!("{}", render_validation(&file.display().to_string(), &result));
    }
    if result.is_valid() {
        Ok(())
    } else {
        Err(CliError {
            exit_code: ExitCode::Validation,
            machine: MachineError::new("validation_failed", "csv validation failed")
                .with_detail("errors", &result.errors().len().to_string())
                .with_detail("path", &file.display().to_string()),
        })
    }
}

fn build_request(args: &DeployArgs, config: &WatchlistConfig) -> Result<DeployRequest, CliError> {
    let target = WatchlistTarget::new(&args.scope, &args.container, &args.alias)
        .map_err(|e| CliError::usage("usage_error", &e.to_string()))?;
    let provider = args.provider.clone().unwrap_or_else(|| config.provider.clone());
    let mut request = DeployRequest::new(args.file.clone(), target, provider);
    request.description = args.description.clone();
    request.display_name = args.display_name.clone();
    request.search_key = args.search_key.clone();
    request.source_name = args.source_name.clone().or_else(|| config.source_name.clone());
    request.validation = validation_options(&args.input, config);
    request.settle_delay =
        Duration::from_millis(args.settle_delay_ms.unwrap_or(config.settle_delay_ms));
    request.report_sample_size = config.report_sample_size;
    Ok(request)
}

fn build_store(
    args: &DeployArgs,
    config: &WatchlistConfig,
    metrics: Arc<StoreMetricsCollector>,
) -> Result<HttpWatchlistStore, CliError> {
    let base_url = args
        .base_url
        .as_deref()
        .or(config.base_url.as_deref())
        .ok_or_else(|| {
            CliError::usage(
                "usage_error",
                "remote base url is not configured; pass --base-url, set BIJUX_WATCHLIST_BASE_URL or base_url in the config file",
            )
        })?;
    let store = HttpWatchlistStore::new(
        base_url,
        &config.api_version,
        Duration::from_millis(config.request_timeout_ms),
    )
    .map_err(|e| CliError::usage("usage_error", &e.to_string()))?
    .with_instrumentation(metrics);
    Ok(match &config.bearer_token {
        Some(token) => store.with_bearer_token(token.clone()),
        None => store,
    })
}

fn deploy_error(err: &DeployError) -> CliError {
    let mut machine = MachineError::new(err.code(), &err.to_string());
    match err {
        DeployError::Validation { result, .. } => {
            for issue in result.errors() {
                warn!(code = issue.code.as_str(), "{issue}");
            }
            machine = machine.with_detail("errors", &result.errors().len().to_string());
            if let Some(first) = result.errors().first() {
                machine = machine.with_detail("first_error", &first.to_string());
            }
        }
        DeployError::TargetNotFound { source, .. } | DeployError::Remote { source, .. } => {
            if let Some(status) = source.status {
                machine = machine.with_detail("status", &status.to_string());
            }
            machine = machine.with_detail("remote_code", source.code.as_str());
        }
        DeployError::PartialRecreate { alias, .. } => {
            machine = machine
                .with_detail("alias", alias)
                .with_detail("action", "manual recreation required");
        }
        DeployError::SearchKeyNotFound { .. } | DeployError::Internal(_) => {}
    }
    CliError {
        exit_code: err.exit_code(),
        machine,
    }
}

fn emit_report(
    report: &DeploymentReport,
    path: Option<&Path>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    if let Some(path) = path {
        if write_report(report, path) {
            info!(path = %path.display(), "deployment report written");
        }
    }
    if output_mode.json {
        emit_ok(output_mode, &serialize(report)?).map_err(CliError::internal)
    } else {
        print!("{}", render_text(report));
        Ok(())
    }
}

pub(crate) fn run_plan(
    args: &DeployArgs,
    config: &WatchlistConfig,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let request = build_request(args, config)?;
    let store = build_store(args, config, Arc::new(StoreMetricsCollector::default()))?;
    let planned = plan(&store, &request).map_err(|e| deploy_error(&e))?;
    emit_report(&planned.report(false, None), args.report.as_deref(), output_mode)
}

pub(crate) fn run_deploy(
    args: &DeployArgs,
    config: &WatchlistConfig,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let request = build_request(args, config)?;
    let metrics = Arc::new(StoreMetricsCollector::default());
    let store = build_store(args, config, Arc::clone(&metrics))?;
    let outcome = deploy(&store, &request);
    let snapshot = metrics.snapshot();
    info!(
        requests = snapshot.request_count,
        bytes_sent = snapshot.bytes_sent,
        bytes_received = snapshot.bytes_received,
        latency_ms = u64::try_from(snapshot.latency_ms_total).unwrap_or(u64::MAX),
        failures = ?snapshot.failures_by_class,
        "remote request summary"
    );
    match outcome {
        Ok(report) => emit_report(&report, args.report.as_deref(), output_mode),
        Err(err) => {
            if let (DeployError::PartialRecreate { report, .. }, Some(path)) =
                (&err, args.report.as_deref())
            {
                write_report(report, path);
            }
            Err(deploy_error(&err))
        }
    }
}

pub(crate) fn run_config(
    config: &WatchlistConfig,
    explicit: Option<&Path>,
    output_mode: OutputMode,
) -> Result<(), CliError> {
    let payload = json!({
        "config": serialize(config)?,
        "explicit_config": explicit,
        "workspace_config": resolve_bijux_config_path(ConfigPathScope::Workspace),
        "user_config": resolve_bijux_config_path(ConfigPathScope::User),
        "bearer_token_set": config.bearer_token.is_some(),
    });
    emit_ok(output_mode, &payload).map_err(CliError::internal)
}

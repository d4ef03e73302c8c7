// SPDX-License-Identifier: Apache-2.0

use std::thread;

use bijux_watchlist_ingest::{validate_csv_file, LoadedCsv};
use bijux_watchlist_model::{
    ChangeSet, DeployStage, DeploymentDecision, DeploymentReport, RemoteIdentifiers,
    SchemaComparison, ValidationResult, WatchlistPayload, WatchlistTarget,
};
use bijux_watchlist_store::{StoreError, StoreErrorCode, WatchlistStore};
use tracing::{info, info_span, warn};

use crate::analyze::analyze_changes;
use crate::compare::{compare_schema, resolve_search_key};
use crate::log::{fields, DeployLog};
use crate::report::{sample_keys, REPORT_SCHEMA_VERSION};
use crate::strategy::select_strategy;
use crate::{DeployError, DeployRequest};

/// Outcome of the read-only half of a run: what would be applied and why.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    pub target: WatchlistTarget,
    pub validation: ValidationResult,
    pub search_key: String,
    /// Identifiers of the deployed watchlist, when one exists.
    pub existing: Option<RemoteIdentifiers>,
    pub schema: Option<SchemaComparison>,
    /// Absent on first deployment and when the column set changed.
    pub changes: Option<ChangeSet>,
    pub decision: DeploymentDecision,
    pub payload: WatchlistPayload,
    pub item_count: usize,
    pub content_sha256: String,
    pub log: DeployLog,
    sample_size: usize,
}

impl DeploymentPlan {
    /// Report for this plan. `remote` carries the identifiers returned by the
    /// upsert when the plan was applied.
    #[must_use]
    pub fn report(&self, applied: bool, remote: Option<RemoteIdentifiers>) -> DeploymentReport {
        let (added_count, removed_count, added_sample, removed_sample) = match &self.changes {
            Some(changes) => (
                Some(changes.added.len()),
                Some(changes.removed.len()),
                sample_keys(&changes.added, &self.search_key, self.sample_size),
                sample_keys(&changes.removed, &self.search_key, self.sample_size),
            ),
            None => (None, None, Vec::new(), Vec::new()),
        };
        DeploymentReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            alias: self.target.alias.clone(),
            decision: self.decision,
            applied,
            partial_state: false,
            search_key: self.search_key.clone(),
            item_count: self.item_count,
            schema: self.schema.clone(),
            added_count,
            removed_count,
            added_sample,
            removed_sample,
            content_sha256: self.content_sha256.clone(),
            remote: remote.or_else(|| self.existing.clone()).unwrap_or_default(),
            warnings: self.validation.warnings().len(),
            events: self.log.events().to_vec(),
        }
    }
}

fn validation_summary(result: &ValidationResult) -> String {
    match result.errors().first() {
        Some(first) => format!("{} error(s), first: {first}", result.errors().len()),
        None => "input rejected".to_string(),
    }
}

fn load_input(
    request: &DeployRequest,
    log: &mut DeployLog,
) -> Result<(ValidationResult, LoadedCsv), DeployError> {
    let input = validate_csv_file(&request.csv_path, &request.validation)
        .map_err(|e| DeployError::Internal(e.to_string()))?;
    let stats = input.result.statistics();
    log.emit(
        DeployStage::Validate,
        "csv_validated",
        fields([
            ("path", request.csv_path.display().to_string()),
            ("valid", input.result.is_valid().to_string()),
            ("rows", stats.row_count.to_string()),
            ("columns", stats.column_count.to_string()),
            ("errors", input.result.errors().len().to_string()),
            ("warnings", input.result.warnings().len().to_string()),
        ]),
    );
    for issue in input.result.warnings() {
        warn!(code = issue.code.as_str(), "{issue}");
    }
    match input.loaded {
        Some(loaded) if input.result.is_valid() => Ok((input.result, loaded)),
        _ => Err(DeployError::Validation {
            summary: validation_summary(&input.result),
            result: Box::new(input.result),
        }),
    }
}

fn remote(stage: DeployStage) -> impl FnOnce(StoreError) -> DeployError {
    move |source| DeployError::Remote { stage, source }
}

/// Validates the input and reads remote state, then decides the strategy.
/// Nothing is written to the remote store.
pub fn plan<S: WatchlistStore + ?Sized>(
    store: &S,
    request: &DeployRequest,
) -> Result<DeploymentPlan, DeployError> {
    let target = &request.target;
    let _span = info_span!("watchlist_plan", alias = %target.alias).entered();
    let mut log = DeployLog::default();

    let (validation, loaded) = load_input(request, &mut log)?;
    let dataset = &loaded.dataset;
    let search_key = resolve_search_key(dataset.columns(), request.search_key.as_deref())?;

    match store.check_container(target) {
        Ok(()) => {}
        Err(source) if source.code == StoreErrorCode::NotFound => {
            return Err(DeployError::TargetNotFound {
                target: format!("{}/{}", target.scope_id, target.container_id),
                source,
            });
        }
        Err(source) => return Err(remote(DeployStage::Inspect)(source)),
    }
    let existing = store.fetch(target).map_err(remote(DeployStage::Inspect))?;
    log.emit(
        DeployStage::Inspect,
        "remote_read",
        fields([
            ("target", target.to_string()),
            ("exists", existing.is_some().to_string()),
            (
                "items",
                existing.as_ref().map_or(0, |r| r.items.len()).to_string(),
            ),
        ]),
    );

    let mut schema = None;
    let mut changes = None;
    if let Some(resource) = &existing {
        let comparison = compare_schema(dataset, &search_key, resource);
        log.emit(
            DeployStage::Compare,
            "schema_compared",
            fields([
                ("columns_changed", comparison.columns_changed.to_string()),
                ("search_key_changed", comparison.search_key_changed.to_string()),
                ("added_columns", comparison.added_columns.join(",")),
                ("removed_columns", comparison.removed_columns.join(",")),
            ]),
        );
        if comparison.columns_changed {
            log.emit(
                DeployStage::Analyze,
                "item_diff_skipped",
                fields([("reason", "column set changed".to_string())]),
            );
        } else {
            let diff = analyze_changes(&resource.items, dataset.rows(), &search_key);
            log.emit(
                DeployStage::Analyze,
                "items_compared",
                fields([
                    ("added", diff.added.len().to_string()),
                    ("removed", diff.removed.len().to_string()),
                    ("unchanged", diff.unchanged_count.to_string()),
                    ("keyless_previous", diff.keyless_previous.to_string()),
                    ("keyless_current", diff.keyless_current.to_string()),
                ]),
            );
            changes = Some(diff);
        }
        schema = Some(comparison);
    }

    let decision = select_strategy(
        existing.is_none(),
        schema.as_ref().is_some_and(|s| s.search_key_changed),
        schema.as_ref().is_some_and(|s| s.columns_changed),
        changes.as_ref().map_or(0, |c| c.removed.len()),
    );
    log.emit(
        DeployStage::Decide,
        "strategy_selected",
        fields([
            ("strategy", decision.strategy().to_string()),
            (
                "reason",
                decision.reason().map(|r| r.as_str().to_string()).unwrap_or_default(),
            ),
        ]),
    );

    let alias = target.alias.to_string();
    let source = request.source_name.clone().unwrap_or_else(|| {
        request
            .csv_path
            .file_name()
            .map_or_else(|| alias.clone(), |n| n.to_string_lossy().into_owned())
    });
    let content_sha256 = loaded.content_sha256();
    let item_count = dataset.len();
    let payload = WatchlistPayload::from_csv(
        request.display_name.as_deref().unwrap_or(&alias),
        &request.description,
        &request.provider,
        &source,
        loaded.raw_content,
        &search_key,
    );

    Ok(DeploymentPlan {
        target: target.clone(),
        validation,
        search_key,
        existing: existing.map(|r| r.identifiers),
        schema,
        changes,
        decision,
        payload,
        item_count,
        content_sha256,
        log,
        sample_size: request.report_sample_size,
    })
}

/// Plans and applies one reconciliation. A recreate deletes the watchlist,
/// waits for the removal to settle and writes it again; a failure after the
/// delete is reported as a partial recreate.
pub fn deploy<S: WatchlistStore + ?Sized>(
    store: &S,
    request: &DeployRequest,
) -> Result<DeploymentReport, DeployError> {
    let mut plan = plan(store, request)?;
    let target = &request.target;
    let _span = info_span!("watchlist_deploy", alias = %target.alias).entered();

    if plan.decision.requires_delete() {
        store.delete(target).map_err(remote(DeployStage::Delete))?;
        plan.log.emit(
            DeployStage::Delete,
            "watchlist_deleted",
            fields([("target", target.to_string())]),
        );
        if !request.settle_delay.is_zero() {
            info!(
                delay_ms = u64::try_from(request.settle_delay.as_millis()).unwrap_or(u64::MAX),
                "waiting for remote deletion to settle"
            );
            thread::sleep(request.settle_delay);
        }
        plan.log.emit(
            DeployStage::Settle,
            "deletion_settled",
            fields([(
                "delay_ms",
                request.settle_delay.as_millis().to_string(),
            )]),
        );
    }

    let identifiers = match store.upsert(target, &plan.payload) {
        Ok(identifiers) => identifiers,
        Err(source) if plan.decision.requires_delete() => {
            warn!(alias = %target.alias, error = %source, "recreate failed after delete");
            plan.log.emit(
                DeployStage::Upsert,
                "recreate_failed",
                fields([("error", source.to_string())]),
            );
            let mut report = plan.report(false, None);
            report.partial_state = true;
            report.remote = RemoteIdentifiers::default();
            return Err(DeployError::PartialRecreate {
                alias: target.alias.to_string(),
                source,
                report: Box::new(report),
            });
        }
        Err(source) => return Err(remote(DeployStage::Upsert)(source)),
    };
    plan.log.emit(
        DeployStage::Upsert,
        "watchlist_written",
        fields([
            ("strategy", plan.decision.strategy().to_string()),
            ("items", plan.item_count.to_string()),
            (
                "watchlist_id",
                identifiers.watchlist_id.clone().unwrap_or_default(),
            ),
        ]),
    );
    plan.log.emit(
        DeployStage::Report,
        "deployment_complete",
        fields([("decision", plan.decision.to_string())]),
    );
    Ok(plan.report(true, Some(identifiers)))
}

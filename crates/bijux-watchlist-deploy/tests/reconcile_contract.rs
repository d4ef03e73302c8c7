// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bijux_watchlist_core::ExitCode;
use bijux_watchlist_deploy::{deploy, plan, write_report, DeployError, DeployRequest};
use bijux_watchlist_model::{DeploymentDecision, IssueCode, RecreateReason, WatchlistTarget};
use bijux_watchlist_store::{
    InMemoryWatchlistStore, StoreError, StoreErrorCode, StoreOperation,
};
use tempfile::{tempdir, TempDir};

fn target() -> WatchlistTarget {
    WatchlistTarget::new("subscriptions/s1/resourceGroups/rg", "ws1", "vip").expect("target")
}

fn write_csv(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).expect("write csv");
    path
}

fn request(path: PathBuf) -> DeployRequest {
    let mut request = DeployRequest::new(path, target(), "bijux-watchlist");
    request.description = "VIP users".to_string();
    request.settle_delay = Duration::ZERO;
    request
}

struct Scenario {
    dir: TempDir,
    store: InMemoryWatchlistStore,
}

impl Scenario {
    fn new() -> Self {
        Self {
            dir: tempdir().expect("tmp"),
            store: InMemoryWatchlistStore::new(),
        }
    }

    fn deploy(&self, text: &str) -> Result<bijux_watchlist_model::DeploymentReport, DeployError> {
        let path = write_csv(self.dir.path(), "vip.csv", text);
        deploy(&self.store, &request(path))
    }
}

const BASE: &str = "id,email\n1,a@x.com\n2,b@x.com\n";

#[test]
fn example_lifecycle_create_update_and_recreate() {
    let s = Scenario::new();

    let created = s.deploy(BASE).expect("create");
    assert_eq!(created.decision, DeploymentDecision::Create);
    assert_eq!(created.item_count, 2);
    assert!(created.applied);
    assert_eq!(created.search_key, "id");
    assert!(created.added_count.is_none());

    let updated = s
        .deploy("id,email\n1,a@x.com\n2,b@x.com\n3,c@x.com\n")
        .expect("update");
    assert_eq!(updated.decision, DeploymentDecision::Update);
    assert_eq!(updated.added_count, Some(1));
    assert_eq!(updated.removed_count, Some(0));
    assert_eq!(updated.added_sample, vec!["3".to_string()]);

    let removed = s
        .deploy("id,email\n1,a@x.com\n3,c@x.com\n")
        .expect("recreate on removal");
    assert_eq!(
        removed.decision,
        DeploymentDecision::Recreate(RecreateReason::ItemsRemoved)
    );
    assert_eq!(removed.removed_sample, vec!["2".to_string()]);
    let stored = s.store.resource(&target()).expect("lock").expect("present");
    assert_eq!(stored.items.len(), 2, "recreate converges to the exact rows");

    let widened = s
        .deploy("id,email,name\n1,a@x.com,A\n3,c@x.com,C\n")
        .expect("recreate on schema change");
    assert_eq!(
        widened.decision,
        DeploymentDecision::Recreate(RecreateReason::SchemaChanged)
    );
    assert!(widened.added_count.is_none(), "no item diff across schemas");
    let schema = widened.schema.expect("schema comparison");
    assert_eq!(schema.added_columns, vec!["name".to_string()]);
}

#[test]
fn redeploying_unchanged_csv_is_an_empty_update() {
    let s = Scenario::new();
    s.deploy(BASE).expect("create");
    let again = s.deploy(BASE).expect("second run");
    assert_eq!(again.decision, DeploymentDecision::Update);
    assert_eq!(again.added_count, Some(0));
    assert_eq!(again.removed_count, Some(0));
}

#[test]
fn changing_only_the_search_key_recreates() {
    let s = Scenario::new();
    s.deploy(BASE).expect("create");
    let path = write_csv(s.dir.path(), "vip.csv", BASE);
    let mut req = request(path);
    req.search_key = Some("email".to_string());
    let report = deploy(&s.store, &req).expect("recreate");
    assert_eq!(
        report.decision,
        DeploymentDecision::Recreate(RecreateReason::SearchKeyChanged)
    );
}

#[test]
fn reordered_columns_are_an_update() {
    let s = Scenario::new();
    s.deploy(BASE).expect("create");
    let path = write_csv(s.dir.path(), "vip.csv", "email,id\na@x.com,1\nb@x.com,2\n");
    let mut req = request(path);
    req.search_key = Some("id".to_string());
    let report = deploy(&s.store, &req).expect("update");
    assert_eq!(report.decision, DeploymentDecision::Update);
}

#[test]
fn recreate_deletes_before_writing() {
    let s = Scenario::new();
    s.deploy(BASE).expect("create");
    s.deploy("id,email\n1,a@x.com\n").expect("recreate");
    let calls = s.store.calls().expect("calls");
    let tail: Vec<_> = calls.iter().rev().take(2).rev().copied().collect();
    assert_eq!(tail, vec![StoreOperation::Delete, StoreOperation::Upsert]);
}

#[test]
fn invalid_csv_makes_no_remote_calls() {
    let s = Scenario::new();
    let err = s.deploy("id,email\n1,a@x.com\n2\n").expect_err("invalid");
    match &err {
        DeployError::Validation { result, .. } => {
            assert!(result.has_error(IssueCode::ColumnCountMismatch));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), ExitCode::Validation);
    assert!(s.store.calls().expect("calls").is_empty());
}

#[test]
fn unknown_search_key_is_an_input_error() {
    let s = Scenario::new();
    let path = write_csv(s.dir.path(), "vip.csv", BASE);
    let mut req = request(path);
    req.search_key = Some("name".to_string());
    let err = deploy(&s.store, &req).expect_err("missing key");
    assert!(matches!(err, DeployError::SearchKeyNotFound { .. }), "unexpected error: {err}");
    assert_eq!(err.exit_code(), ExitCode::Validation);
    assert!(s.store.calls().expect("calls").is_empty());
}

#[test]
fn missing_container_is_a_target_error() {
    let s = Scenario::new();
    s.store.remove_container("ws1").expect("lock");
    let err = s.deploy(BASE).expect_err("missing container");
    assert_eq!(err.exit_code(), ExitCode::TargetNotFound);
    assert!(err.to_string().contains("ws1"), "unexpected error: {err}");
}

#[test]
fn failed_recreate_after_delete_is_partial() {
    let s = Scenario::new();
    s.deploy(BASE).expect("create");
    s.store
        .fail_next(
            StoreOperation::Upsert,
            StoreError::new(StoreErrorCode::Network, "connection reset"),
        )
        .expect("inject");
    let err = s.deploy("id,email\n1,a@x.com\n").expect_err("partial");
    assert_eq!(err.exit_code(), ExitCode::PartialRecreate);
    assert!(err.to_string().contains("manual recreation required"), "{err}");
    match err {
        DeployError::PartialRecreate { report, .. } => {
            assert!(report.partial_state);
            assert!(!report.applied);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(s.store.resource(&target()).expect("lock").is_none());

    let recovered = s.deploy("id,email\n1,a@x.com\n").expect("rerun recreates");
    assert_eq!(recovered.decision, DeploymentDecision::Create);
}

#[test]
fn failed_update_is_a_remote_error() {
    let s = Scenario::new();
    s.deploy(BASE).expect("create");
    s.store
        .fail_next(
            StoreOperation::Upsert,
            StoreError::new(StoreErrorCode::Unauthorized, "token expired").with_status(401),
        )
        .expect("inject");
    let err = s.deploy(BASE).expect_err("remote failure");
    assert_eq!(err.exit_code(), ExitCode::RemoteFailure);
    assert!(err.to_string().contains("token expired"), "unexpected error: {err}");
}

#[test]
fn plan_does_not_write() {
    let s = Scenario::new();
    let path = write_csv(s.dir.path(), "vip.csv", BASE);
    let planned = plan(&s.store, &request(path)).expect("plan");
    assert_eq!(planned.decision, DeploymentDecision::Create);
    assert_eq!(planned.payload.items_search_key, "id");
    assert_eq!(planned.payload.source, "vip.csv");
    assert_eq!(
        s.store.calls().expect("calls"),
        vec![StoreOperation::CheckContainer, StoreOperation::Fetch]
    );
    let report = planned.report(false, None);
    assert!(!report.applied);
    assert!(report.events.iter().any(|e| e.name == "strategy_selected"));
}

#[test]
fn semicolon_input_is_uploaded_comma_separated() {
    let s = Scenario::new();
    let path = write_csv(s.dir.path(), "vip.csv", "id;email\n1;a@x.com\n");
    let planned = plan(&s.store, &request(path)).expect("plan");
    assert_eq!(planned.payload.raw_content, "id,email\n1,a@x.com\n");
}

#[test]
fn report_is_written_as_json_and_bad_paths_are_tolerated() {
    let s = Scenario::new();
    let report = s.deploy(BASE).expect("create");
    let out = s.dir.path().join("reports/run.json");
    assert!(write_report(&report, &out));
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read")).expect("json");
    assert_eq!(value["decision"]["strategy"], "create");
    assert_eq!(value["alias"], "vip");

    let blocked = s.dir.path().join("vip.csv").join("nested.json");
    assert!(!write_report(&report, &blocked));
}

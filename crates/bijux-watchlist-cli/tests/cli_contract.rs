// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::{tempdir, TempDir};
use tiny_http::{Header, Method, Response, Server, StatusCode};

const SCOPE: &str = "subscriptions/s1/resourceGroups/rg";
const CONTAINER_PATH: &str = "/subscriptions/s1/resourceGroups/rg/providers/Microsoft.OperationalInsights/workspaces/ws1/providers/Microsoft.SecurityInsights/watchlists";

type Handler = Box<dyn Fn(&Method, &str) -> (u16, String) + Send>;
/// Method, path and body of every request the mock server received.
type RequestLog = Arc<Mutex<Vec<(Method, String, String)>>>;

fn spawn_server(handler: Handler) -> (String, RequestLog, thread::JoinHandle<()>) {
    let server = Server::http("127.0.0.1:0").expect("http server");
    let base = format!("http://{}", server.server_addr());
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_clone = Arc::clone(&log);
    let handle = thread::spawn(move || loop {
        let mut req = match server.recv_timeout(Duration::from_secs(3)) {
            Ok(Some(req)) => req,
            Ok(None) | Err(_) => break,
        };
        let mut body = String::new();
        let _ = req.as_reader().read_to_string(&mut body);
        let path = req.url().split('?').next().unwrap_or_default().to_string();
        let (status, payload) = handler(req.method(), &path);
        log_clone
            .lock()
            .expect("log")
            .push((req.method().clone(), path, body));
        let _ = req.respond(
            Response::from_string(payload)
                .with_status_code(StatusCode(status))
                .with_header(
                    Header::from_bytes("Content-Type", "application/json").expect("header"),
                ),
        );
    });
    (base, log, handle)
}

fn not_found() -> (u16, String) {
    (
        404,
        r#"{"error":{"code":"NotFound","message":"resource not found"}}"#.to_string(),
    )
}

/// A command isolated from the caller's config files and environment.
fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bijux-watchlist"));
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("xdg"))
        .env_remove("BIJUX_WATCHLIST_BASE_URL")
        .env_remove("BIJUX_WATCHLIST_TOKEN")
        .env_remove("BIJUX_WATCHLIST_SETTLE_DELAY_MS")
        .env_remove("BIJUX_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

fn write_csv(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).expect("write csv");
    path.display().to_string()
}

fn deploy_args<'a>(csv: &'a str, base: &'a str) -> Vec<&'a str> {
    vec![
        "--json",
        "deploy",
        "--file",
        csv,
        "--scope",
        SCOPE,
        "--container",
        "ws1",
        "--alias",
        "vip",
        "--base-url",
        base,
        "--settle-delay-ms",
        "0",
    ]
}

fn parse_commands_from_help(text: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut in_commands = false;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed == "Commands:" {
            in_commands = true;
            continue;
        }
        if in_commands {
            if trimmed.is_empty() {
                break;
            }
            let name = trimmed.split_whitespace().next().unwrap_or("");
            if !name.is_empty() && name != "help" {
                commands.push(name.to_string());
            }
        }
    }
    commands.sort();
    commands
}

#[test]
fn help_command_surface_is_stable() {
    let home = tempdir().expect("tmp");
    let output = cli(&home).arg("--help").output().expect("run help");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8 help");
    let expected = include_str!("snapshots/help.commands.txt")
        .lines()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert_eq!(parse_commands_from_help(&text), expected);
    assert!(text.contains("BIJUX_WATCHLIST_BASE_URL"));
}

#[test]
fn unknown_flag_returns_usage_exit_code_with_machine_error() {
    let home = tempdir().expect("tmp");
    let output = cli(&home)
        .args(["--json", "--unknown-flag"])
        .output()
        .expect("run bad cli");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let payload: Value = serde_json::from_str(stderr.trim()).expect("json error");
    assert_eq!(payload["code"], "usage_error");
}

#[test]
fn validate_clean_file_exits_zero_with_json_result() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "ok.csv", "ip,label\n10.0.0.1,gw\n10.0.0.2,dns\n");
    let output = cli(&home)
        .args(["--json", "validate", &csv])
        .output()
        .expect("run validate");
    assert_eq!(output.status.code(), Some(0));
    let payload: Value = serde_json::from_slice(&output.stdout).expect("json result");
    assert_eq!(payload["is_valid"], true);
    assert_eq!(payload["delimiter"], "comma");
    assert_eq!(payload["statistics"]["row_count"], 2);
}

#[test]
fn validate_ragged_file_exits_with_validation_code() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "bad.csv", "ip,label\n10.0.0.1,gw\n10.0.0.2\n");
    let output = cli(&home)
        .args(["validate", &csv])
        .output()
        .expect("run validate");
    assert_eq!(output.status.code(), Some(3));
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(stdout.contains("invalid"), "unexpected output: {stdout}");
    assert!(stdout.contains("line 3"), "unexpected output: {stdout}");
}

#[test]
fn fail_on_warn_turns_warnings_into_validation_failure() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "dup.csv", "ip,label\n10.0.0.1,gw\n10.0.0.1,gw\n");
    let relaxed = cli(&home)
        .args(["validate", &csv])
        .output()
        .expect("run validate");
    assert_eq!(relaxed.status.code(), Some(0));
    let strict = cli(&home)
        .args(["validate", "--fail-on-warn", &csv])
        .output()
        .expect("run validate");
    assert_eq!(strict.status.code(), Some(3));
}

#[test]
fn deploy_without_base_url_is_a_usage_error() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "ok.csv", "ip,label\n10.0.0.1,gw\n");
    let output = cli(&home)
        .args([
            "--json",
            "deploy",
            "--file",
            &csv,
            "--scope",
            SCOPE,
            "--container",
            "ws1",
            "--alias",
            "vip",
        ])
        .output()
        .expect("run deploy");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("base url"), "unexpected error: {stderr}");
}

#[test]
fn deploy_creates_missing_watchlist_and_writes_report() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "ok.csv", "ip,label\n10.0.0.1,gw\n10.0.0.2,dns\n");
    let report_path = home.path().join("out").join("report.json");
    let (base, log, handle) = spawn_server(Box::new(|method, path| {
        match (method, path) {
            (Method::Get, p) if p == CONTAINER_PATH => (200, r#"{"value":[]}"#.to_string()),
            (Method::Put, _) => (
                200,
                r#"{"id":"/watchlists/vip","etag":"\"e1\"","properties":{"watchlistId":"w-1"}}"#
                    .to_string(),
            ),
            _ => not_found(),
        }
    }));
    let report_arg = report_path.display().to_string();
    let mut args = deploy_args(&csv, &base);
    args.extend(["--report", report_arg.as_str()]);
    let output = cli(&home).args(&args).output().expect("run deploy");
    handle.join().expect("server thread");
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let payload: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(payload["decision"]["strategy"], "create");
    assert_eq!(payload["applied"], true);
    assert_eq!(payload["item_count"], 2);

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&report_path).expect("report file"))
            .expect("report json");
    assert_eq!(written["decision"], payload["decision"]);

    let calls = log.lock().expect("log");
    let methods = calls.iter().map(|(m, _, _)| m.clone()).collect::<Vec<_>>();
    assert_eq!(methods, vec![Method::Get, Method::Get, Method::Put]);
    let put: Value = serde_json::from_str(&calls[2].2).expect("put body");
    assert_eq!(put["properties"]["itemsSearchKey"], "ip");
    assert_eq!(put["properties"]["displayName"], "vip");
}

#[test]
fn plan_reads_remote_state_without_writing() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "ok.csv", "ip,label\n10.0.0.1,gw\n");
    let (base, log, handle) = spawn_server(Box::new(|method, path| match (method, path) {
        (Method::Get, p) if p == CONTAINER_PATH => (200, r#"{"value":[]}"#.to_string()),
        _ => not_found(),
    }));
    let mut args = deploy_args(&csv, &base);
    args[1] = "plan";
    let output = cli(&home).args(&args).output().expect("run plan");
    handle.join().expect("server thread");
    assert_eq!(output.status.code(), Some(0));
    let payload: Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(payload["applied"], false);
    assert!(log
        .lock()
        .expect("log")
        .iter()
        .all(|(method, _, _)| *method == Method::Get));
}

#[test]
fn deploy_into_missing_container_exits_target_not_found() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "ok.csv", "ip,label\n10.0.0.1,gw\n");
    let (base, _log, handle) = spawn_server(Box::new(|_, _| not_found()));
    let output = cli(&home)
        .args(deploy_args(&csv, &base))
        .output()
        .expect("run deploy");
    handle.join().expect("server thread");
    assert_eq!(output.status.code(), Some(5));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let payload: Value = serde_json::from_str(stderr.trim().lines().last().unwrap_or_default())
        .expect("json error");
    assert_eq!(payload["code"], "target_not_found");
}

#[test]
fn failed_write_exits_remote_failure() {
    let home = tempdir().expect("tmp");
    let csv = write_csv(home.path(), "ok.csv", "ip,label\n10.0.0.1,gw\n");
    let (base, _log, handle) = spawn_server(Box::new(|method, path| match (method, path) {
        (Method::Get, p) if p == CONTAINER_PATH => (200, r#"{"value":[]}"#.to_string()),
        (Method::Put, _) => (
            500,
            r#"{"error":{"code":"InternalServerError","message":"try later"}}"#.to_string(),
        ),
        _ => not_found(),
    }));
    let output = cli(&home)
        .args(deploy_args(&csv, &base))
        .output()
        .expect("run deploy");
    handle.join().expect("server thread");
    assert_eq!(output.status.code(), Some(6));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("remote_failure"), "unexpected error: {stderr}");
    assert!(stderr.contains("try later"), "unexpected error: {stderr}");
}

#[test]
fn config_reports_file_values_and_hides_token() {
    let home = tempdir().expect("tmp");
    let config_path = home.path().join("watchlist.toml");
    fs::write(
        &config_path,
        "base_url = \"https://management.example\"\nsettle_delay_ms = 250\n",
    )
    .expect("write config");
    let output = cli(&home)
        .env("BIJUX_WATCHLIST_TOKEN", "s3cret")
        .args(["--json", "--config"])
        .arg(&config_path)
        .arg("config")
        .output()
        .expect("run config");
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    assert!(!stdout.contains("s3cret"));
    let payload: Value = serde_json::from_str(&stdout).expect("json config");
    assert_eq!(payload["config"]["base_url"], "https://management.example");
    assert_eq!(payload["config"]["settle_delay_ms"], 250);
    assert_eq!(payload["bearer_token_set"], true);
}

#[test]
fn unreadable_config_is_a_usage_error() {
    let home = tempdir().expect("tmp");
    let output = cli(&home)
        .args(["--json", "--config", "missing.toml", "config"])
        .output()
        .expect("run config");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("config_error"), "unexpected error: {stderr}");
}

//! Integration tests for the `harvia` CLI binary.
//!
//! Argument parsing, help output, completions, config handling, and a few
//! end-to-end runs against a mocked MyHarvia backend.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `harvia` binary with env isolation.
///
/// Clears all `HARVIA_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn harvia_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("harvia");
    cmd.env("HOME", "/tmp/harvia-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/harvia-cli-test-nonexistent")
        .env("HARVIA_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("HARVIA_PROFILE")
        .env_remove("HARVIA_DEVICE")
        .env_remove("HARVIA_OUTPUT")
        .env_remove("HARVIA_TIMEOUT")
        .env_remove("HARVIA_USERNAME")
        .env_remove("HARVIA_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn missing_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = missing_config();
    let output = harvia_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, config) = missing_config();
    harvia_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("Harvia")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("humidity")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = missing_config();
    harvia_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("harvia"));
}

#[test]
fn test_completions_zsh() {
    let (_dir, config) = missing_config();
    harvia_cmd(&config)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_dir, config) = missing_config();
    let output = harvia_cmd(&config).arg("sweat").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("sweat"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_switch_requires_on_or_off() {
    let (_dir, config) = missing_config();
    harvia_cmd(&config)
        .args(["lights", "dim"])
        .assert()
        .code(2);
}

#[test]
fn test_status_without_credentials() {
    let (_dir, config) = missing_config();
    harvia_cmd(&config)
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials configured"));
}

#[test]
fn test_unknown_profile() {
    let (_dir, config) = missing_config();
    harvia_cmd(&config)
        .args(["-p", "cabin", "status"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Profile 'cabin' not found"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_redacts_password() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "default_profile = \"home\"\n\n[profiles.home]\nusername = \"sauna@example.com\"\npassword = \"hunter2\"\n",
    )
    .unwrap();

    harvia_cmd(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("sauna@example.com")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_set_and_use() {
    let (_dir, config) = missing_config();

    harvia_cmd(&config)
        .args(["-p", "cabin", "config", "set", "device", "sauna-9"])
        .assert()
        .success();
    harvia_cmd(&config)
        .args(["config", "use", "cabin"])
        .assert()
        .success();
    harvia_cmd(&config)
        .args(["config", "set", "listing_policy", "sideways"])
        .assert()
        .code(2);

    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("default_profile = \"cabin\""), "{written}");
    assert!(written.contains("device = \"sauna-9\""), "{written}");
}

// ── Against a mocked backend ────────────────────────────────────────

async fn backend() -> MockServer {
    let server = MockServer::start().await;
    let uri = server.uri();
    for service in ["users", "device", "events", "data"] {
        let mut body = json!({ "endpoint": format!("{uri}/graphql/{service}") });
        if service == "users" {
            body["userPoolId"] = json!("eu-west-1_Pool");
            body["clientId"] = json!("client");
        }
        Mock::given(method("GET"))
            .and(path(format!("/{service}/endpoint")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(path("/cognito"))
        .and(header(
            "x-amz-target",
            "AWSCognitoIdentityProviderService.InitiateAuth",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ChallengeName": "PASSWORD_VERIFIER",
            "ChallengeParameters": {
                "USER_ID_FOR_SRP": "user-1",
                "SALT": "9a1b2c3d4e5f",
                "SRP_B": "1f2e3d4c5b6a79880123456789abcdef",
                "SECRET_BLOCK": "c2VjcmV0LWJsb2Nr",
                "USERNAME": "user-1"
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cognito"))
        .and(header(
            "x-amz-target",
            "AWSCognitoIdentityProviderService.RespondToAuthChallenge",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "AuthenticationResult": {
                "AccessToken": "access",
                "IdToken": "id-token",
                "RefreshToken": "refresh",
                "ExpiresIn": 3600,
                "TokenType": "Bearer"
            }
        })))
        .mount(&server)
        .await;

    server
}

/// Device tree and reported state for `sauna-1`, without telemetry.
async fn mount_device(server: &MockServer) {
    let tree = json!([{ "i": { "name": "root" }, "c": [{ "i": { "name": "sauna-1" }, "c": [] }] }]);
    Mock::given(method("POST"))
        .and(path("/graphql/device"))
        .and(header("authorization", "id-token"))
        .and(body_partial_json(json!({ "query": "query Query {\n  getDeviceTree\n}\n" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "getDeviceTree": tree.to_string() }
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql/device"))
        .and(body_partial_json(json!({ "variables": { "deviceId": "sauna-1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "getDeviceState": {
                "desired": "{}",
                "reported": json!({ "displayName": "Cabin", "active": 1, "targetTemp": 80, "statusCodes": "1903" }).to_string(),
                "timestamp": 1,
                "__typename": "DeviceState"
            } }
        })))
        .mount(server)
        .await;
}

async fn mount_sauna(server: &MockServer) {
    mount_device(server).await;
    Mock::given(method("POST"))
        .and(path("/graphql/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "getLatestData": {
                "deviceId": "sauna-1",
                "timestamp": 2,
                "sessionId": "s",
                "type": "t",
                "data": json!({ "temperature": 75, "humidity": 20 }).to_string(),
                "__typename": "LatestData"
            } }
        })))
        .mount(server)
        .await;
}

fn write_profile(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let config = dir.join("config.toml");
    std::fs::write(
        &config,
        format!(
            "[profiles.default]\nusername = \"sauna@example.com\"\npassword = \"pw\"\n\
             discovery_url = \"{uri}\"\ncognito_endpoint = \"{uri}/cognito\"\n",
            uri = server.uri()
        ),
    )
    .unwrap();
    config
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_as_json() {
    let server = backend().await;
    mount_sauna(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_profile(dir.path(), &server);

    let output = harvia_cmd(&config)
        .env("HARVIA_PASSWORD", "pw")
        .args(["-o", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["device_id"], "sauna-1");
    assert_eq!(status["name"], "Cabin");
    assert_eq!(status["power"], "on");
    assert_eq!(status["target_temperature_f"], 176.0);
    assert_eq!(status["target_temperature_c"], json!(80));
    assert_eq!(status["current_temperature_c"], json!(75));
    assert_eq!(status["humidity_pct"], json!(20));
    assert_eq!(status["door"], "open");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_out_of_range_temperature_reports_error_object() {
    let server = backend().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_profile(dir.path(), &server);

    let output = harvia_cmd(&config)
        .env("HARVIA_PASSWORD", "pw")
        .args(["-o", "json", "temp", "300"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "{}", combined_output(&output));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("between 104"), "got: {error}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_plain_lists_ids() {
    let server = backend().await;
    mount_sauna(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_profile(dir.path(), &server);

    harvia_cmd(&config)
        .env("HARVIA_PASSWORD", "pw")
        .args(["-o", "plain", "devices"])
        .assert()
        .success()
        .stdout("sauna-1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_failure_reports_error_object() {
    let server = backend().await;
    mount_device(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql/data"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_profile(dir.path(), &server);

    let output = harvia_cmd(&config)
        .env("HARVIA_PASSWORD", "pw")
        .args(["-o", "json", "devices"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1), "{}", combined_output(&output));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to list devices: "), "got: {error}");
}

// ── MCP tool server ─────────────────────────────────────────────────

/// The JSON payload carried in a `tools/call` result's text content.
fn tool_payload(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_mcp_without_credentials() {
    let (_dir, config) = missing_config();
    harvia_cmd(&config)
        .arg("mcp")
        .write_stdin("")
        .assert()
        .code(3)
        .stdout("");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mcp_serves_sauna_tools() {
    let server = backend().await;
    mount_sauna(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql/device"))
        .and(body_partial_json(json!({ "operationName": "Mutation" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "requestStateChange": 1 }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_profile(dir.path(), &server);

    let requests = [
        json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize",
                "params": { "protocolVersion": "2025-03-26", "capabilities": {},
                            "clientInfo": { "name": "test", "version": "0" } } }),
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/call",
                "params": { "name": "get_sauna_status", "arguments": {} } }),
        json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call",
                "params": { "name": "list_devices" } }),
        json!({ "jsonrpc": "2.0", "id": 4, "method": "tools/call",
                "params": { "name": "toggle_lights", "arguments": { "on": true } } }),
    ];
    let stdin: String = requests.iter().map(|r| format!("{r}\n")).collect();

    let output = harvia_cmd(&config)
        .env("HARVIA_PASSWORD", "pw")
        .arg("mcp")
        .write_stdin(stdin)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let responses: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 4, "{responses:?}");
    assert_eq!(responses[0]["result"]["protocolVersion"], "2025-03-26");

    let status = tool_payload(&responses[1]);
    assert_eq!(responses[1]["result"]["isError"], false);
    assert_eq!(status["device_id"], "sauna-1");
    assert_eq!(status["target_temperature_c"], json!(80));
    assert_eq!(status["current_temperature_c"], json!(75));

    let devices = tool_payload(&responses[2]);
    assert_eq!(devices[0]["device_id"], "sauna-1");

    let ack = tool_payload(&responses[3]);
    assert_eq!(ack, json!({ "status": "ok", "device_id": "sauna-1", "lights": "on" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_mcp_list_failure_is_an_error_list() {
    let server = backend().await;
    mount_device(&server).await;
    Mock::given(method("POST"))
        .and(path("/graphql/data"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_profile(dir.path(), &server);

    let request = json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/call",
                          "params": { "name": "list_devices", "arguments": {} } });
    let output = harvia_cmd(&config)
        .env("HARVIA_PASSWORD", "pw")
        .arg("mcp")
        .write_stdin(format!("{request}\n"))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let response: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(response["result"]["isError"], true);
    let payload = tool_payload(&response);
    let error = payload[0]["error"].as_str().unwrap();
    assert!(error.starts_with("Failed to list devices: "), "got: {error}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_sign_in_exits_with_auth_code() {
    let server = MockServer::start().await;
    let uri = server.uri();
    for service in ["users", "device", "events", "data"] {
        let mut body = json!({ "endpoint": format!("{uri}/graphql/{service}") });
        if service == "users" {
            body["userPoolId"] = json!("eu-west-1_Pool");
            body["clientId"] = json!("client");
        }
        Mock::given(method("GET"))
            .and(path(format!("/{service}/endpoint")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/cognito"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "__type": "NotAuthorizedException",
            "message": "Incorrect username or password."
        })))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_profile(dir.path(), &server);

    harvia_cmd(&config)
        .env("HARVIA_PASSWORD", "wrong")
        .arg("status")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Authentication failed"));
}

use assert_cmd::Command;
use httpmock::prelude::*;
use serde_json::json;

fn rackctl(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("rackctl").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env_remove("RACK_CONFIG")
        .env_remove("RACK_HOST")
        .env_remove("RACK_PASSWORD")
        .env_remove("RACK_NAME");
    cmd
}

#[test]
fn version_flag_prints_build_info() {
    let home = tempfile::tempdir().unwrap();
    let output = rackctl(home.path()).arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("rackctl "));
}

#[test]
fn malformed_assignment_fails_before_any_request() {
    let home = tempfile::tempdir().unwrap();
    let output = rackctl(home.path())
        .args(["params", "set", "InstanceCount"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid argument: InstanceCount"));
}

#[test]
fn missing_host_is_reported() {
    let home = tempfile::tempdir().unwrap();
    let output = rackctl(home.path()).arg("info").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no rack host configured"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    let output = rackctl(home.path())
        .args(["--config", "absent.toml", "info"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn ps_lists_all_processes_from_the_rack() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/system/processes").header("all", "true");
        then.status(200).json_body(json!([
            {"id": "a1b2c3", "app": "rack", "name": "web", "release": "RABCDEF", "command": "api"}
        ]));
    });

    let output = rackctl(home.path())
        .args(["--host", &server.base_url(), "ps", "--all"])
        .output()
        .unwrap();
    mock.assert();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("ID"));
    assert!(stdout.contains("a1b2c3"));
}

#[test]
fn logs_without_follow_print_the_backlog() {
    let home = tempfile::tempdir().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/system/logs")
            .header("follow", "false")
            .header("since", "300");
        then.status(200).body("web: started\nweb: listening\n");
    });

    let output = rackctl(home.path())
        .args(["--host", &server.base_url(), "logs", "--no-follow", "--since", "5m"])
        .output()
        .unwrap();
    mock.assert();
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "web: started\nweb: listening\n"
    );
}

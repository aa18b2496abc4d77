use std::time::Duration;

use httpmock::prelude::*;
use rack_common::RackCredentials;
use rack_core::{
    HttpRackClient, LogOptions, ParameterConvergence, ParameterSet, RackApi, RackError,
    RolloutSupervisor, ScaleRequest, SupervisorSettings, SystemStatus,
};
use serde_json::json;
use std::sync::Arc;

// base64("rack:secret")
const AUTH: &str = "Basic cmFjazpzZWNyZXQ=";

fn client(server: &MockServer) -> HttpRackClient {
    let credentials = RackCredentials::new(server.base_url())
        .with_password("secret")
        .with_rack("production");
    HttpRackClient::new(&credentials, Duration::from_secs(5), "0.1.0").unwrap()
}

#[tokio::test]
async fn get_system_sends_credentials_and_parses_state() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/system")
                .header("authorization", AUTH)
                .header("rack", "production")
                .header("version", "0.1.0");
            then.status(200).json_body(json!({
                "name": "production",
                "status": "running",
                "version": "20200201000000",
                "count": 3,
                "type": "t3.small"
            }));
        })
        .await;

    let state = client(&server).get_system().await.unwrap();
    mock.assert_async().await;
    assert_eq!(state.status, SystemStatus::Running);
    assert_eq!(state.count, Some(3));
}

#[tokio::test]
async fn update_rejection_carries_remote_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/system")
                .body("version=20200201000000");
            then.status(403)
                .header("content-type", "application/json")
                .body(r#"{"error":"rack is already running 20200201000000"}"#);
        })
        .await;

    let api: Arc<dyn RackApi> = Arc::new(client(&server));
    let supervisor = RolloutSupervisor::new(api, SupervisorSettings::default());
    let err = supervisor.trigger("20200201000000").await.unwrap_err();
    match err {
        RackError::TriggerRejected { message, .. } => {
            assert_eq!(message, "rack is already running 20200201000000")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn noop_parameter_update_is_recognised_over_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/apps/production/parameters")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("InstanceCount=3");
            then.status(403)
                .json_body(json!({"error": "No updates are to be performed."}));
        })
        .await;

    let convergence = ParameterConvergence::new(Arc::new(client(&server)));
    let params = ParameterSet::parse_assignments(["InstanceCount=3"]).unwrap();
    let err = convergence.apply("production", &params).await.unwrap_err();
    mock.assert_async().await;
    assert!(err.is_noop());
}

#[tokio::test]
async fn scale_sends_count_and_type() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT).path("/system").body("count=4&type=c5.large");
            then.status(200).json_body(json!({
                "name": "production",
                "status": "updating",
                "version": "20200201000000",
                "count": 4,
                "type": "c5.large"
            }));
        })
        .await;

    let request = ScaleRequest::new(Some(4), Some("c5.large".into()));
    let state = rack_core::scale(&client(&server), &request).await.unwrap();
    mock.assert_async().await;
    assert_eq!(state.status, SystemStatus::Updating);
    assert_eq!(state.instance_type.as_deref(), Some("c5.large"));
}

#[tokio::test]
async fn plain_text_errors_are_kept() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/system/releases");
            then.status(502).body("bad gateway\n");
        })
        .await;

    let err = client(&server).list_releases().await.unwrap_err();
    assert!(matches!(
        err,
        RackError::Api { status: 502, ref message } if message == "bad gateway"
    ));
}

#[tokio::test]
async fn process_listing_asks_for_all_when_requested() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/system/processes").header("all", "true");
            then.status(200).json_body(json!([
                {
                    "id": "a1b2c3",
                    "app": "rack",
                    "name": "web",
                    "release": "RABCDEF",
                    "command": "api",
                    "started": "2020-02-01T10:00:00Z",
                    "cpu": 0.5
                },
                {"id": "d4e5f6", "app": "billing", "name": "worker"}
            ]));
        })
        .await;

    let processes = client(&server).list_processes(true).await.unwrap();
    mock.assert_async().await;
    assert_eq!(processes.len(), 2);
    assert_eq!(processes[0].name, "web");
    assert!(processes[0].started.is_some());
    assert_eq!(processes[1].app, "billing");
    assert!(processes[1].started.is_none());
}

#[tokio::test]
async fn log_stream_is_copied_to_the_sink() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/system/logs")
                .header("authorization", AUTH)
                .header("follow", "false")
                .header("since", "600")
                .header("filter", "error");
            then.status(200)
                .body("2020-02-01T10:00:00Z web error one\n2020-02-01T10:00:01Z web error two\n");
        })
        .await;

    let options = LogOptions {
        filter: Some("error".into()),
        follow: false,
        since: Duration::from_secs(600),
    };
    let mut sink = Vec::new();
    let written = client(&server)
        .stream_logs(&options, &mut sink)
        .await
        .unwrap();
    mock.assert_async().await;
    let text = String::from_utf8(sink).unwrap();
    assert_eq!(written as usize, text.len());
    assert_eq!(text.lines().count(), 2);
    assert!(text.ends_with("error two\n"));
}

#[tokio::test]
async fn log_stream_errors_surface_before_output() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/system/logs");
            then.status(401).json_body(json!({"error": "invalid password"}));
        })
        .await;

    let mut sink = Vec::new();
    let err = client(&server)
        .stream_logs(&LogOptions::default(), &mut sink)
        .await
        .unwrap_err();
    assert!(matches!(err, RackError::Api { status: 401, .. }));
    assert!(sink.is_empty());
}

//! ---
//! rack_section: "15-testing-qa-runbook"
//! rack_subsection: "integration-tests"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "End-to-end checks across catalog, accessor, and supervisor."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use rack_common::RackCredentials;
use rack_core::{
    HttpRackClient, RackApi, RolloutOutcome, RolloutSupervisor, SupervisorSettings,
};
use rack_versioning::{HttpVersionRegistry, VersionCatalog};
use serde_json::json;

fn feed() -> serde_json::Value {
    json!({
        "releases": [
            {"id": "20200101000000", "created_at": "2020-01-01T00:00:00Z"},
            {"id": "20200201000000", "created_at": "2020-02-01T00:00:00Z", "required": true},
            {"id": "20200301000000", "created_at": "2020-03-01T00:00:00Z"}
        ]
    })
}

fn system(status: &str, version: &str) -> serde_json::Value {
    json!({"name": "production", "status": status, "version": version})
}

fn fast_settings() -> SupervisorSettings {
    SupervisorSettings {
        poll_interval: Duration::from_millis(10),
        grace: Duration::from_millis(10),
        deadline: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn gated_update_stops_at_required_release_and_converges() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/versions.json");
            then.status(200).json_body(feed());
        })
        .await;
    let mut before = server
        .mock_async(|when, then| {
            when.method(GET).path("/system");
            then.status(200)
                .json_body(system("running", "20200101000000"));
        })
        .await;
    let trigger = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/system")
                .body("version=20200201000000");
            then.status(200)
                .json_body(system("updating", "20200201000000"));
        })
        .await;

    let registry = HttpVersionRegistry::new(format!("{}/versions.json", server.base_url())).unwrap();
    let catalog = VersionCatalog::fetch(&registry).await.unwrap();
    let credentials = RackCredentials::new(server.base_url()).with_password("secret");
    let api = Arc::new(HttpRackClient::new(&credentials, Duration::from_secs(5), "0.1.0").unwrap());

    let current = api.get_system().await.unwrap();
    let plan = catalog.plan_update(&current.version, None).unwrap();
    assert!(plan.gated);
    assert_eq!(plan.target.id, "20200201000000");
    assert_eq!(plan.requested.id, "20200301000000");

    let supervisor = RolloutSupervisor::new(api.clone(), fast_settings());
    supervisor.trigger(&plan.target.id).await.unwrap();
    trigger.assert_async().await;

    before.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/system");
            then.status(200)
                .json_body(system("running", "20200201000000"));
        })
        .await;

    let outcome = supervisor.wait(Some(&plan.target.id)).await.unwrap();
    assert_eq!(
        outcome,
        RolloutOutcome::Converged {
            version: "20200201000000".into()
        }
    );
}

#[tokio::test]
async fn unreachable_rack_aborts_supervision() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/system");
            then.status(500).json_body(json!({"error": "rack api unavailable"}));
        })
        .await;

    let credentials = RackCredentials::new(server.base_url());
    let api = Arc::new(HttpRackClient::new(&credentials, Duration::from_secs(5), "0.1.0").unwrap());
    let err = RolloutSupervisor::new(api, fast_settings())
        .supervise(Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("status poll failed"));
    assert!(err.to_string().contains("rack api unavailable"));
}

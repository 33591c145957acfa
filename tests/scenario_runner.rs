//! End-to-end runs of the verification scenario against a registry on an
//! ephemeral port.

mod common;

use app_registry::client::{
    Credentials, Fixtures, RegistryClient, ScenarioRunner, Step, StepOutcome,
};
use common::*;

#[tokio::test]
async fn test_scenario_passes_for_root_tenant() {
    let server = TestServer::start().await;
    let client = RegistryClient::new(&server.base_url).unwrap();

    let report = ScenarioRunner::new(&client, Credentials::new(ROOT_TENANT, ROOT_TOKEN))
        .run()
        .await;

    assert!(report.passed(), "{}", report);
    assert_eq!(report.steps.len(), Step::ALL.len());
}

#[tokio::test]
async fn test_scenario_passes_for_tenant() {
    let server = TestServer::start().await;
    let client = RegistryClient::new(&server.base_url).unwrap();

    let report = ScenarioRunner::new(&client, Credentials::new(TENANT, TENANT_TOKEN))
        .run()
        .await;

    assert!(report.passed(), "{}", report);
}

#[tokio::test]
async fn test_scenario_can_run_twice_against_one_server() {
    let server = TestServer::start().await;
    let client = RegistryClient::new(&server.base_url).unwrap();
    let credentials = Credentials::new(TENANT, TENANT_TOKEN);

    let first = ScenarioRunner::new(&client, credentials.clone()).run().await;
    assert!(first.passed(), "{}", first);

    // The imported application is kept, so a second import collides
    let second = ScenarioRunner::new(&client, credentials).run().await;
    assert!(matches!(
        second.outcome(Step::Import),
        Some(StepOutcome::Failed(_))
    ));
    assert_eq!(
        second.outcome(Step::Export),
        Some(&StepOutcome::Skipped {
            prerequisite: Step::Import
        })
    );
    assert_eq!(second.outcome(Step::GetDeleted), Some(&StepOutcome::Passed));
}

#[tokio::test]
async fn test_rejected_credential_skips_dependent_steps() {
    let server = TestServer::start().await;
    let client = RegistryClient::new(&server.base_url).unwrap();

    let report = ScenarioRunner::new(&client, Credentials::new(ROOT_TENANT, "wrong-token"))
        .run()
        .await;

    assert!(!report.passed());
    assert_eq!(report.failures().count(), 3);
    for step in [Step::ListDefaults, Step::Import, Step::Create] {
        assert!(
            matches!(
                report.outcome(step),
                Some(StepOutcome::Failed(reason)) if reason.contains("401")
            ),
            "{}",
            report
        );
    }
    for step in [Step::Export, Step::Get, Step::Delete, Step::GetDeleted] {
        assert!(matches!(
            report.outcome(step),
            Some(StepOutcome::Skipped { .. })
        ));
    }
}

#[tokio::test]
async fn test_wrong_fixture_names_fail_the_checks() {
    let server = TestServer::start().await;
    let client = RegistryClient::new(&server.base_url).unwrap();
    let fixtures = Fixtures {
        imported_name: "SomethingElse",
        created_name: "Another Name",
        ..Fixtures::for_tenant(ROOT_TENANT)
    };

    let report = ScenarioRunner::new(&client, Credentials::new(ROOT_TENANT, ROOT_TOKEN))
        .with_fixtures(fixtures)
        .run()
        .await;

    assert!(matches!(
        report.outcome(Step::Export),
        Some(StepOutcome::Failed(reason)) if reason.contains("SomethingElse")
    ));
    assert!(matches!(
        report.outcome(Step::Get),
        Some(StepOutcome::Failed(_))
    ));
    assert_eq!(
        report.outcome(Step::Delete),
        Some(&StepOutcome::Skipped {
            prerequisite: Step::Get
        })
    );
}

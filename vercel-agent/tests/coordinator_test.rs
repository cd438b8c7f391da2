//! Coordinator cycle tests: snapshot assembly, per-item degradation and
//! the two-tier failure semantics.

use std::sync::Arc;

use reqwest::Client;
use vercel_agent::api::{ApiError, VercelClient};
use vercel_agent::audit::audit_project;
use vercel_agent::coordinator::{DeploymentCoordinator, ProjectCoordinator};
use vercel_agent::health::HealthTracker;
use vercel_devkit::{fixtures, MockVercelApi};

async fn client_for(stub: &MockVercelApi) -> VercelClient {
    let base = stub.spawn().await;
    VercelClient::new(Client::new(), "tok_test", None).with_base_url(base)
}

fn project_coordinator(client: VercelClient) -> Arc<ProjectCoordinator> {
    Arc::new(ProjectCoordinator::new(client, HealthTracker::new(), 900))
}

fn deployment_coordinator(
    client: VercelClient,
    projects: Arc<ProjectCoordinator>,
) -> DeploymentCoordinator {
    DeploymentCoordinator::new(client, projects, HealthTracker::new(), 60)
}

#[tokio::test]
async fn test_refresh_builds_full_snapshot() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![
        fixtures::project("prj_1", "web"),
        fixtures::project("prj_2", "docs"),
    ]);
    stub.set_domains(vec![fixtures::domain("example.com", true)]);
    stub.set_domain_config("example.com", fixtures::domain_config(Some("CNAME"), false));
    stub.set_env_vars("prj_1", fixtures::env_vars(&["encrypted", "secret"]));

    let client = client_for(&stub).await;
    let coordinator = project_coordinator(client);
    let snapshot = coordinator.refresh().await.unwrap();

    assert_eq!(snapshot.projects.len(), 2);
    assert_eq!(snapshot.projects["prj_2"].name, "docs");

    let domain = &snapshot.domains["example.com"];
    assert!(domain.verified);
    assert_eq!(domain.configured_by.as_deref(), Some("CNAME"));
    assert_eq!(domain.misconfigured, Some(false));

    // Every indexed project gets an env var entry, fetched or not
    assert_eq!(snapshot.env_vars["prj_1"].len(), 2);
    assert_eq!(snapshot.env_vars["prj_2"].len(), 0);

    // The published snapshot is the returned one
    assert!(coordinator.snapshot().is_some());
}

#[tokio::test]
async fn test_domain_config_failure_degrades_single_domain() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project("prj_1", "web")]);
    stub.set_domains(vec![
        fixtures::domain("ok.example.com", true),
        fixtures::domain("bad.example.com", true),
        fixtures::domain("fine.example.com", false),
    ]);
    stub.fail("/v6/domains/bad.example.com/config", 500);

    let client = client_for(&stub).await;
    let snapshot = project_coordinator(client).refresh().await.unwrap();

    assert_eq!(snapshot.domains.len(), 3);

    let degraded = &snapshot.domains["bad.example.com"];
    assert_eq!(degraded.misconfigured, None);
    assert_eq!(degraded.configured_by, None);
    assert!(degraded.verified);

    let healthy = &snapshot.domains["ok.example.com"];
    assert_eq!(healthy.configured_by.as_deref(), Some("CNAME"));
}

#[tokio::test]
async fn test_env_var_failure_degrades_to_empty_list() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![
        fixtures::project("prj_1", "web"),
        fixtures::project("prj_2", "docs"),
    ]);
    stub.set_env_vars("prj_2", fixtures::env_vars(&["encrypted"]));
    stub.fail("/v9/projects/prj_1/env", 429);

    let client = client_for(&stub).await;
    let snapshot = project_coordinator(client).refresh().await.unwrap();

    assert_eq!(snapshot.env_vars["prj_1"].len(), 0);
    assert_eq!(snapshot.env_vars["prj_2"].len(), 1);
}

#[tokio::test]
async fn test_auth_failure_fails_cycle_without_snapshot() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project("prj_1", "web")]);
    stub.fail("/v10/projects", 401);

    let client = client_for(&stub).await;
    let coordinator = project_coordinator(client);
    let err = coordinator.refresh().await.unwrap_err();

    assert!(matches!(err, ApiError::Authentication(_)));
    assert!(coordinator.snapshot().is_none());
}

#[tokio::test]
async fn test_transient_top_level_failure_fails_cycle() {
    let stub = MockVercelApi::new();
    stub.fail("/v5/domains", 503);

    let client = client_for(&stub).await;
    let err = project_coordinator(client).refresh().await.unwrap_err();
    assert!(matches!(err, ApiError::Connection(_)));
}

#[tokio::test]
async fn test_auth_failure_in_item_fetch_fails_cycle() {
    // Authentication is never degraded at the item level: an invalid
    // credential invalidates every sub-fetch.
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project("prj_1", "web")]);
    stub.fail("/v9/projects/prj_1/env", 401);

    let client = client_for(&stub).await;
    let err = project_coordinator(client).refresh().await.unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
}

#[tokio::test]
async fn test_deployments_empty_before_first_project_refresh() {
    let stub = MockVercelApi::new();
    let client = client_for(&stub).await;

    let projects = project_coordinator(client.clone());
    let deployments = deployment_coordinator(client, projects);

    let snapshot = deployments.refresh().await.unwrap();
    assert!(snapshot.deployments.is_empty());
    assert_eq!(snapshot.generation, 1);
}

#[tokio::test]
async fn test_deployments_capped_at_five_per_project() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project("prj_1", "web")]);
    stub.set_deployments(
        "prj_1",
        fixtures::deployments(&["READY", "READY", "READY", "ERROR", "READY", "READY", "READY"]),
    );

    let client = client_for(&stub).await;
    let projects = project_coordinator(client.clone());
    projects.refresh().await.unwrap();

    let snapshot = deployment_coordinator(client, projects).refresh().await.unwrap();
    assert_eq!(snapshot.deployments["prj_1"].len(), 5);
}

#[tokio::test]
async fn test_deployment_failure_degrades_single_project() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![
        fixtures::project("prj_1", "web"),
        fixtures::project("prj_2", "docs"),
    ]);
    stub.set_deployments("prj_1", fixtures::deployments(&["READY"]));
    stub.set_deployments("prj_2", fixtures::deployments(&["READY"]));
    stub.fail_when("/v6/deployments", "projectId=prj_2", 500);

    let client = client_for(&stub).await;
    let projects = project_coordinator(client.clone());
    projects.refresh().await.unwrap();

    let snapshot = deployment_coordinator(client, projects).refresh().await.unwrap();
    assert_eq!(snapshot.deployments["prj_1"].len(), 1);
    assert_eq!(snapshot.deployments["prj_2"].len(), 0);
}

#[tokio::test]
async fn test_deployment_auth_failure_fails_cycle() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project("prj_1", "web")]);
    stub.fail_when("/v6/deployments", "projectId=prj_1", 403);

    let client = client_for(&stub).await;
    let projects = project_coordinator(client.clone());
    projects.refresh().await.unwrap();

    let err = deployment_coordinator(client, projects)
        .refresh()
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authentication(_)));
}

#[tokio::test]
async fn test_generation_bumps_per_cycle() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project("prj_1", "web")]);

    let client = client_for(&stub).await;
    let projects = project_coordinator(client.clone());
    projects.refresh().await.unwrap();

    let deployments = deployment_coordinator(client, projects);
    assert_eq!(deployments.refresh().await.unwrap().generation, 1);
    assert_eq!(deployments.refresh().await.unwrap().generation, 2);
    assert_eq!(deployments.snapshot().generation, 2);
}

#[tokio::test]
async fn test_end_to_end_clean_project_scores_100() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project("prj_1", "web")]);
    stub.set_deployments("prj_1", fixtures::deployments(&["READY", "READY", "READY"]));
    stub.set_env_vars("prj_1", fixtures::env_vars(&["encrypted", "encrypted"]));

    let client = client_for(&stub).await;
    let projects = project_coordinator(client.clone());
    let project_snapshot = projects.refresh().await.unwrap();
    let deployment_snapshot = deployment_coordinator(client, projects.clone())
        .refresh()
        .await
        .unwrap();

    let project = &project_snapshot.projects["prj_1"];
    let deployments = &deployment_snapshot.deployments["prj_1"];
    let env_vars = &project_snapshot.env_vars["prj_1"];

    let result = audit_project(project, deployments, env_vars);
    assert_eq!(result.score, 100);
    assert!(result.issues.is_empty());
}

#[tokio::test]
async fn test_end_to_end_bare_project_scores_zero() {
    let stub = MockVercelApi::new();
    stub.set_projects(vec![fixtures::project_with("prj_1", "web", None, "16.x")]);

    let client = client_for(&stub).await;
    let projects = project_coordinator(client.clone());
    let project_snapshot = projects.refresh().await.unwrap();
    let deployment_snapshot = deployment_coordinator(client, projects.clone())
        .refresh()
        .await
        .unwrap();

    let project = &project_snapshot.projects["prj_1"];
    let deployments = &deployment_snapshot.deployments["prj_1"];
    let env_vars = &project_snapshot.env_vars["prj_1"];

    // Zero deployments: exactly 4 checks run, node + framework +
    // no-deployments issues present (plaintext check passes).
    let result = audit_project(project, deployments, env_vars);
    assert_eq!(result.issues.len(), 3);
    assert_eq!(result.score, 25);
    assert!(result.issues.iter().any(|i| i.contains("framework")));
    assert!(result.issues.iter().any(|i| i.contains("Deploy your project")));
}

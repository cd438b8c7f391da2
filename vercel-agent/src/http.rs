/**
 * API REST VERCEL-AGENT - Serveur HTTP de consultation
 *
 * RÔLE :
 * Expose l'état courant du daemon (snapshots, audit, santé, diagnostics)
 * en lecture seule pour dashboard, CLI et scripts.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, routes /health, /system/health, /projects, /domains
 * - Sérialisation JSON automatique des réponses
 * - Snapshots partagés avec les coordinators (lecture sans blocage)
 */

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::audit::AuditCache;
use crate::config::AgentConfig;
use crate::coordinator::{DeploymentCoordinator, ProjectCoordinator};
use crate::diagnostics::diagnostics_payload;
use crate::health::{AgentHealth, HealthTracker};
use crate::models::{Deployment, EnvVar};
use crate::sensors;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AgentConfig>,
    pub projects: Arc<ProjectCoordinator>,
    pub deployments: Arc<DeploymentCoordinator>,
    pub health_tracker: HealthTracker,
    pub audit_cache: Arc<AuditCache>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/projects", get(get_projects))
        .route("/projects/{id}", get(get_project))
        .route("/projects/{id}/audit", get(get_project_audit))
        .route("/domains", get(get_domains))
        .route("/diagnostics", get(get_diagnostics))
        .with_state(app_state)
}

const NO_DEPLOYMENTS: &[Deployment] = &[];
const NO_ENV_VARS: &[EnvVar] = &[];

// GET /system/health (état du daemon)
async fn get_system_health(State(app): State<AppState>) -> Json<AgentHealth> {
    let snapshot = app.projects.snapshot();
    Json(app.health_tracker.get_health(snapshot.as_deref()))
}

// GET /projects (liste + totaux compte)
async fn get_projects(State(app): State<AppState>) -> Json<Value> {
    let Some(snapshot) = app.projects.snapshot() else {
        return Json(json!({ "projects": [], "totals": Value::Null }));
    };
    let deployment_snapshot = app.deployments.snapshot();

    let mut list: Vec<Value> = snapshot
        .projects
        .values()
        .map(|project| {
            let deployments = deployment_snapshot
                .deployments
                .get(&project.id)
                .map(Vec::as_slice)
                .unwrap_or(NO_DEPLOYMENTS);
            let env_vars = snapshot
                .env_vars
                .get(&project.id)
                .map(Vec::as_slice)
                .unwrap_or(NO_ENV_VARS);
            json!({
                "id": project.id,
                "name": project.name,
                "metrics": sensors::project_metrics_json(project, deployments, env_vars),
            })
        })
        .collect();
    list.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

    Json(json!({
        "projects": list,
        "totals": sensors::account_metrics_json(&snapshot),
    }))
}

// GET /projects/:id (détail)
async fn get_project(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let snapshot = app.projects.snapshot().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let project = snapshot.projects.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    let deployment_snapshot = app.deployments.snapshot();
    let deployments = deployment_snapshot
        .deployments
        .get(&id)
        .map(Vec::as_slice)
        .unwrap_or(NO_DEPLOYMENTS);
    let env_vars = snapshot
        .env_vars
        .get(&id)
        .map(Vec::as_slice)
        .unwrap_or(NO_ENV_VARS);

    Ok(Json(json!({
        "id": project.id,
        "name": project.name,
        "framework": project.framework,
        "node_version": project.node_version,
        "updated_at": project.updated_at,
        "metrics": sensors::project_metrics_json(project, deployments, env_vars),
        "deployments": deployments,
        "env_vars": env_vars,
    })))
}

// GET /projects/:id/audit (score mémoïsé par génération)
async fn get_project_audit(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let snapshot = app.projects.snapshot().ok_or(StatusCode::SERVICE_UNAVAILABLE)?;
    let project = snapshot.projects.get(&id).ok_or(StatusCode::NOT_FOUND)?;

    let deployment_snapshot = app.deployments.snapshot();
    let deployments = deployment_snapshot
        .deployments
        .get(&id)
        .map(Vec::as_slice)
        .unwrap_or(NO_DEPLOYMENTS);
    let env_vars = snapshot
        .env_vars
        .get(&id)
        .map(Vec::as_slice)
        .unwrap_or(NO_ENV_VARS);

    let result = app.audit_cache.get_or_compute(
        deployment_snapshot.generation,
        project,
        deployments,
        env_vars,
    );

    Ok(Json(json!({
        "project_id": id,
        "score": result.score,
        "issues": result.issues,
    })))
}

// GET /domains (liste avec flags de santé)
async fn get_domains(State(app): State<AppState>) -> Json<Value> {
    let Some(snapshot) = app.projects.snapshot() else {
        return Json(json!({ "domains": [] }));
    };

    let mut list: Vec<Value> = snapshot
        .domains
        .values()
        .map(|domain| {
            json!({
                "name": domain.name,
                "verified": domain.verified,
                "configured_by": domain.configured_by,
                "misconfigured": domain.misconfigured,
                "flags": sensors::domain_flags_json(domain),
            })
        })
        .collect();
    list.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));

    Json(json!({ "domains": list }))
}

// GET /diagnostics (config + snapshots, secrets caviardés)
async fn get_diagnostics(State(app): State<AppState>) -> Json<Value> {
    let snapshot = app.projects.snapshot();
    let deployment_snapshot = app.deployments.snapshot();
    Json(diagnostics_payload(
        &app.config,
        snapshot.as_deref(),
        &deployment_snapshot,
    ))
}

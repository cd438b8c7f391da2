//! Vercel Agent - deployment monitoring daemon
//!
//! Bootstrap: load config (or run the setup wizard), verify the stored
//! credential, prime both snapshots, start the two polling loops and
//! serve the read-only status API.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use vercel_agent::api::VercelClient;
use vercel_agent::audit::AuditCache;
use vercel_agent::config::AgentConfig;
use vercel_agent::coordinator::{DeploymentCoordinator, ProjectCoordinator};
use vercel_agent::health::HealthTracker;
use vercel_agent::http::{build_router, AppState};
use vercel_agent::wizard::SetupWizard;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Ok if .env does not exist
    tracing_subscriber::fmt().init();

    let force_setup = std::env::args().any(|arg| arg == "setup");

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    if force_setup || AgentConfig::is_first_time_setup() {
        SetupWizard::run(http.clone()).await?;
        if force_setup {
            // Explicit `setup` runs reconfigure and exit
            return Ok(());
        }
    }

    let config = Arc::new(
        AgentConfig::load()
            .await
            .context("Failed to load configuration")?,
    );
    let token = config.resolve_token().context(
        "No API token found. Run `vercel-agent setup` or set VERCEL_TOKEN.",
    )?;

    let client = VercelClient::new(http, token, config.api.team_id.clone());

    // Startup credential check, fails fast on a revoked token
    match client.get_user().await {
        Ok(user) => info!("authenticated as {}", user.username),
        Err(err) if !err.is_transient() => {
            error!("stored credential rejected: {err}. Run `vercel-agent setup` to re-authenticate.");
            std::process::exit(1);
        }
        Err(err) => warn!("could not verify credential at startup: {err}"),
    }

    let health_tracker = HealthTracker::new();
    let projects = Arc::new(ProjectCoordinator::new(
        client.clone(),
        health_tracker.clone(),
        config.api.project_scan_interval_secs,
    ));
    let deployments = Arc::new(DeploymentCoordinator::new(
        client,
        projects.clone(),
        health_tracker.clone(),
        config.api.deployment_scan_interval_secs,
    ));

    // Prime both snapshots before serving; failures here retry on the
    // regular tick
    if let Err(err) = projects.refresh().await {
        warn!("initial project refresh failed: {err}");
    }
    if let Err(err) = deployments.refresh().await {
        warn!("initial deployment refresh failed: {err}");
    }

    projects.clone().spawn_polling();
    deployments.clone().spawn_polling();

    let app = build_router(AppState {
        config: config.clone(),
        projects,
        deployments,
        health_tracker,
        audit_cache: Arc::new(AuditCache::new()),
    });

    let listener = TcpListener::bind(&config.http.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.http.bind_address))?;
    info!("status API listening on http://{}", config.http.bind_address);
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

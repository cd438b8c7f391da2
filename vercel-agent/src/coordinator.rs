//! Refresh coordinators for the monitored Vercel account
//!
//! Two independent cycles at different cadences:
//! - ProjectCoordinator (slow): projects, domains + config health, env
//!   var metadata, assembled into one ProjectSnapshot per tick.
//! - DeploymentCoordinator (fast): recent deployments per project,
//!   keyed off whatever project snapshot is current at tick time.
//!
//! Sub-fetches inside one cycle fan out concurrently; a transient
//! failure degrades its own record only. Authentication errors always
//! fail the whole cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, VercelClient};
use crate::health::HealthTracker;
use crate::models::{DeploymentsMap, DomainsMap, EnvVarsMap, ProjectsMap};
use crate::state::{new_state, Shared};

/// Default interval for the project/domain/env cycle.
pub const DEFAULT_PROJECT_SCAN_INTERVAL_SECS: u64 = 900;
/// Default interval for the deployment cycle.
pub const DEFAULT_DEPLOYMENT_SCAN_INTERVAL_SECS: u64 = 60;
/// Recent deployments kept per project.
pub const DEPLOYMENTS_PER_PROJECT: usize = 5;

/// Output of one project cycle. Replaced wholesale on every successful
/// tick; consumers hold the Arc and never see a partial snapshot.
#[derive(Debug, Default, Serialize)]
pub struct ProjectSnapshot {
    pub projects: ProjectsMap,
    pub domains: DomainsMap,
    pub env_vars: EnvVarsMap,
}

/// Latest complete deployment mapping plus its generation counter. The
/// generation moves on every successful cycle; audit results are
/// memoized against it.
#[derive(Debug, Clone, Default)]
pub struct DeploymentSnapshot {
    pub generation: u64,
    pub deployments: Arc<DeploymentsMap>,
}

pub struct ProjectCoordinator {
    client: VercelClient,
    snapshot: Shared<Option<Arc<ProjectSnapshot>>>,
    health: HealthTracker,
    interval_secs: u64,
}

impl ProjectCoordinator {
    pub fn new(client: VercelClient, health: HealthTracker, interval_secs: u64) -> Self {
        Self {
            client,
            snapshot: new_state(None),
            health,
            interval_secs,
        }
    }

    /// Latest complete snapshot, if any cycle has succeeded yet.
    pub fn snapshot(&self) -> Option<Arc<ProjectSnapshot>> {
        self.snapshot.lock().clone()
    }

    /// Run one full refresh cycle and publish the snapshot.
    pub async fn refresh(&self) -> Result<Arc<ProjectSnapshot>, ApiError> {
        match self.run_cycle().await {
            Ok(snapshot) => {
                self.health.record_project_success();
                Ok(snapshot)
            }
            Err(err) => {
                self.health.record_project_failure(&err);
                Err(err)
            }
        }
    }

    async fn run_cycle(&self) -> Result<Arc<ProjectSnapshot>, ApiError> {
        let (raw_projects, raw_domains) =
            tokio::try_join!(self.client.get_projects(), self.client.get_domains())?;

        let mut projects: ProjectsMap = HashMap::new();
        for project in raw_projects {
            projects.insert(project.id.clone(), project);
        }

        // Config health per domain, one concurrent fetch each. A failed
        // fetch degrades that domain only.
        let config_fetches = raw_domains.into_iter().map(|domain| {
            let client = self.client.clone();
            async move {
                let name = domain.name.clone();
                match client.get_domain_config(&name).await {
                    Ok(config) => Ok((name, domain.with_config(config))),
                    Err(err) if err.is_transient() => {
                        warn!("domain config fetch failed for {name}: {err}");
                        Ok((name, domain.degraded()))
                    }
                    Err(err) => Err(err),
                }
            }
        });
        let mut domains: DomainsMap = HashMap::new();
        for result in join_all(config_fetches).await {
            let (name, domain) = result?;
            domains.insert(name, domain);
        }

        // Env var metadata per project, same degradation contract.
        let env_fetches = projects.keys().cloned().map(|project_id| {
            let client = self.client.clone();
            async move {
                match client.get_project_env_vars(&project_id).await {
                    Ok(envs) => Ok((project_id, envs)),
                    Err(err) if err.is_transient() => {
                        warn!("env var fetch failed for {project_id}: {err}");
                        Ok((project_id, Vec::new()))
                    }
                    Err(err) => Err(err),
                }
            }
        });
        let mut env_vars: EnvVarsMap = HashMap::new();
        for result in join_all(env_fetches).await {
            let (project_id, envs) = result?;
            env_vars.insert(project_id, envs);
        }

        let snapshot = Arc::new(ProjectSnapshot {
            projects,
            domains,
            env_vars,
        });
        *self.snapshot.lock() = Some(snapshot.clone());
        info!(
            projects = snapshot.projects.len(),
            domains = snapshot.domains.len(),
            "project snapshot refreshed"
        );
        Ok(snapshot)
    }

    /// Start the periodic refresh loop. A slow cycle simply delays the
    /// next tick; failed cycles retry at the next one.
    pub fn spawn_polling(self: Arc<Self>) {
        info!("starting project polling (interval: {}s)", self.interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(self.interval_secs));
            // The first tick completes immediately; startup already did
            // the first refresh.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = self.refresh().await {
                    error!("project refresh failed: {err}");
                }
            }
        });
    }
}

pub struct DeploymentCoordinator {
    client: VercelClient,
    projects: Arc<ProjectCoordinator>,
    snapshot: Shared<DeploymentSnapshot>,
    health: HealthTracker,
    interval_secs: u64,
}

impl DeploymentCoordinator {
    pub fn new(
        client: VercelClient,
        projects: Arc<ProjectCoordinator>,
        health: HealthTracker,
        interval_secs: u64,
    ) -> Self {
        Self {
            client,
            projects,
            snapshot: new_state(DeploymentSnapshot::default()),
            health,
            interval_secs,
        }
    }

    /// Latest complete deployment snapshot (empty before the first
    /// successful cycle, generation 0).
    pub fn snapshot(&self) -> DeploymentSnapshot {
        self.snapshot.lock().clone()
    }

    /// Run one refresh cycle and publish the mapping.
    pub async fn refresh(&self) -> Result<DeploymentSnapshot, ApiError> {
        match self.run_cycle().await {
            Ok(snapshot) => {
                self.health.record_deployment_success();
                Ok(snapshot)
            }
            Err(err) => {
                self.health.record_deployment_failure(&err);
                Err(err)
            }
        }
    }

    async fn run_cycle(&self) -> Result<DeploymentSnapshot, ApiError> {
        // Whatever project snapshot is current right now; never waits
        // for a fresher one.
        let Some(project_snapshot) = self.projects.snapshot() else {
            debug!("no project snapshot yet, publishing empty deployment mapping");
            return Ok(self.publish(HashMap::new()));
        };

        let fetches = project_snapshot.projects.keys().cloned().map(|project_id| {
            let client = self.client.clone();
            async move {
                match client
                    .get_deployments(&project_id, DEPLOYMENTS_PER_PROJECT)
                    .await
                {
                    Ok(deployments) => Ok((project_id, deployments)),
                    Err(err) if err.is_transient() => {
                        warn!("deployment fetch failed for {project_id}: {err}");
                        Ok((project_id, Vec::new()))
                    }
                    Err(err) => Err(err),
                }
            }
        });

        let mut deployments: DeploymentsMap = HashMap::new();
        for result in join_all(fetches).await {
            let (project_id, list) = result?;
            deployments.insert(project_id, list);
        }

        debug!(projects = deployments.len(), "deployment snapshot refreshed");
        Ok(self.publish(deployments))
    }

    fn publish(&self, deployments: DeploymentsMap) -> DeploymentSnapshot {
        let mut cell = self.snapshot.lock();
        cell.generation += 1;
        cell.deployments = Arc::new(deployments);
        cell.clone()
    }

    /// Start the periodic refresh loop.
    pub fn spawn_polling(self: Arc<Self>) {
        info!(
            "starting deployment polling (interval: {}s)",
            self.interval_secs
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(self.interval_secs));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = self.refresh().await {
                    error!("deployment refresh failed: {err}");
                }
            }
        });
    }
}

//! Wire data model for the Vercel REST API
//!
//! Field names follow the API's camelCase payloads (serde renames).
//! Env vars are metadata only - values are never fetched.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub framework: Option<String>,      // None or "other" = no framework detected
    #[serde(rename = "nodeVersion", default)]
    pub node_version: Option<String>,   // ex: "20.x"
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<i64>,        // epoch ms
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(rename = "configuredBy", default)]
    pub configured_by: Option<String>,  // ex: "CNAME", "A"
    #[serde(default)]
    pub misconfigured: Option<bool>,    // None = health check failed, unknown
}

/// Per-domain config-health payload, merged over the listed domain record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(rename = "configuredBy", default)]
    pub configured_by: Option<String>,
    #[serde(default)]
    pub misconfigured: Option<bool>,
}

impl Domain {
    /// Overlay config-health fields on the base domain record.
    pub fn with_config(mut self, config: DomainConfig) -> Self {
        self.configured_by = config.configured_by;
        self.misconfigured = config.misconfigured;
        self
    }

    /// Placeholder record when the config-health call failed.
    pub fn degraded(self) -> Self {
        self.with_config(DomainConfig::default())
    }
}

/// Deployment states as returned by the API (uppercase on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeploymentState {
    Ready,
    Error,
    Building,
    Queued,
    Canceled,
    Initializing,
    #[serde(other)]
    Unknown,
}

impl DeploymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentState::Ready => "READY",
            DeploymentState::Error => "ERROR",
            DeploymentState::Building => "BUILDING",
            DeploymentState::Queued => "QUEUED",
            DeploymentState::Canceled => "CANCELED",
            DeploymentState::Initializing => "INITIALIZING",
            DeploymentState::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub uid: String,
    pub state: DeploymentState,
    #[serde(rename = "projectId", default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub created: i64,                   // epoch ms
    #[serde(default)]
    pub ready: Option<i64>,             // epoch ms, absent while building
    #[serde(default)]
    pub source: Option<String>,         // git, cli, redeploy, import, ...
    #[serde(rename = "isRollbackCandidate", default)]
    pub is_rollback_candidate: Option<bool>,
    #[serde(rename = "inspectorUrl", default)]
    pub inspector_url: Option<String>,
    #[serde(default)]
    pub meta: Option<DeploymentMeta>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentMeta {
    #[serde(rename = "githubCommitMessage", default)]
    pub github_commit_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,                   // plain, encrypted, secret, sensitive
    #[serde(default)]
    pub target: Vec<String>,            // production, preview, development
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

pub type ProjectsMap = HashMap<String, Project>;
pub type DomainsMap = HashMap<String, Domain>;
pub type EnvVarsMap = HashMap<String, Vec<EnvVar>>;
pub type DeploymentsMap = HashMap<String, Vec<Deployment>>;

// Response envelopes. The two listing calls use different cursor echo
// parameters (projects: `from`, domains: `until`) but share this shape.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub next: Option<serde_json::Value>,    // number or string on the wire
}

impl Pagination {
    /// Cursor to echo back as a query parameter, if another page exists.
    pub fn next_cursor(&self) -> Option<String> {
        match &self.next {
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProjectsPage {
    pub projects: Vec<Project>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct DomainsPage {
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Deserialize)]
pub struct DeploymentsPage {
    pub deployments: Vec<Deployment>,
}

#[derive(Debug, Deserialize)]
pub struct EnvVarsPage {
    pub envs: Vec<EnvVar>,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct TeamsPage {
    pub teams: Vec<Team>,
}

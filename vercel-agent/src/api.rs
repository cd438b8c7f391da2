//! Async client for the Vercel REST API
//!
//! Handles:
//! - Bearer token auth and optional team scoping
//! - Cursor-based pagination (projects and domains echo different params)
//! - Error classification (authentication / rate limit / connection)

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{
    Deployment, DeploymentsPage, Domain, DomainConfig, DomainsPage, EnvVar, EnvVarsPage, Project,
    ProjectsPage, Team, TeamsPage, User, UserEnvelope,
};

pub const VERCEL_API_BASE: &str = "https://api.vercel.com";

/// Page size for the paginated listing calls.
const PAGE_LIMIT: &str = "100";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("rate limited (retry-after: {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },
    #[error("connection error: {0}")]
    Connection(String),
}

impl ApiError {
    /// Transient failures degrade per-item fetches inside a cycle.
    /// Authentication failures never do - an invalid credential
    /// invalidates every sub-fetch, so the cycle fails fast.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ApiError::Authentication(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Connection(err.to_string())
    }
}

/// Typed client over the Vercel REST API. Cheap to clone, shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct VercelClient {
    http: Client,
    base_url: String,
    token: String,
    team_id: Option<String>,
}

impl VercelClient {
    pub fn new(http: Client, token: impl Into<String>, team_id: Option<String>) -> Self {
        Self {
            http,
            base_url: VERCEL_API_BASE.to_string(),
            token: token.into(),
            team_id,
        }
    }

    /// Point the client at a different host (devkit stub in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Team scoping wins over per-call parameters: a caller-provided
    /// `teamId` is dropped, everything else passes through.
    fn merged_params(&self, params: &[(String, String)]) -> Vec<(String, String)> {
        let mut merged: Vec<(String, String)> = params
            .iter()
            .filter(|(key, _)| key != "teamId")
            .cloned()
            .collect();
        if let Some(team_id) = &self.team_id {
            merged.push(("teamId".to_string(), team_id.clone()));
        }
        merged
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {path}");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&self.merged_params(params))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication(format!("HTTP {status} on {path}")));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok());
            return Err(ApiError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Connection(format!(
                "HTTP {status} on {path}: {body}"
            )));
        }

        resp.json::<T>()
            .await
            .map_err(|err| ApiError::Connection(format!("invalid response from {path}: {err}")))
    }

    /// Authenticated account identity. Used only for credential
    /// validation (setup and re-authentication).
    pub async fn get_user(&self) -> Result<User, ApiError> {
        let envelope: UserEnvelope = self.get_json("/v2/user", &[]).await?;
        Ok(envelope.user)
    }

    /// Teams accessible to the authenticated user.
    pub async fn get_teams(&self) -> Result<Vec<Team>, ApiError> {
        let page: TeamsPage = self.get_json("/v2/teams", &[]).await?;
        Ok(page.teams)
    }

    /// Full project list. Follows `pagination.next` cursors, echoed back
    /// as the `from` parameter, until the API stops returning one.
    pub async fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut params = vec![("limit".to_string(), PAGE_LIMIT.to_string())];
            if let Some(from) = &cursor {
                params.push(("from".to_string(), from.clone()));
            }
            let page: ProjectsPage = self.get_json("/v10/projects", &params).await?;
            all.extend(page.projects);
            cursor = page.pagination.as_ref().and_then(|p| p.next_cursor());
            if cursor.is_none() {
                break;
            }
        }
        Ok(all)
    }

    /// Single project lookup.
    pub async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        self.get_json(&format!("/v9/projects/{project_id}"), &[]).await
    }

    /// Most recent deployments for a project, server-ordered newest
    /// first. No local sorting.
    pub async fn get_deployments(
        &self,
        project_id: &str,
        limit: usize,
    ) -> Result<Vec<Deployment>, ApiError> {
        let params = vec![
            ("projectId".to_string(), project_id.to_string()),
            ("limit".to_string(), limit.to_string()),
        ];
        let page: DeploymentsPage = self.get_json("/v6/deployments", &params).await?;
        Ok(page.deployments)
    }

    /// Full domain list. Same cursor contract as projects, but echoed
    /// back as `until` instead of `from`.
    pub async fn get_domains(&self) -> Result<Vec<Domain>, ApiError> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut params = vec![("limit".to_string(), PAGE_LIMIT.to_string())];
            if let Some(until) = &cursor {
                params.push(("until".to_string(), until.clone()));
            }
            let page: DomainsPage = self.get_json("/v5/domains", &params).await?;
            all.extend(page.domains);
            cursor = page.pagination.as_ref().and_then(|p| p.next_cursor());
            if cursor.is_none() {
                break;
            }
        }
        Ok(all)
    }

    /// Per-domain config/health object.
    pub async fn get_domain_config(&self, domain: &str) -> Result<DomainConfig, ApiError> {
        self.get_json(&format!("/v6/domains/{domain}/config"), &[]).await
    }

    /// Env var metadata for a project. Keys and storage types only,
    /// never values.
    pub async fn get_project_env_vars(&self, project_id: &str) -> Result<Vec<EnvVar>, ApiError> {
        let page: EnvVarsPage = self
            .get_json(&format!("/v9/projects/{project_id}/env"), &[])
            .await?;
        Ok(page.envs)
    }
}

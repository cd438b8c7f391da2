/*!
Stub HTTP de l'API Vercel pour tests d'intégration

Sert des fixtures JSON sur un port éphémère, avec:
- Pagination par curseur (projets: `from`, domaines: `until`)
- Injection d'erreurs par route (status + Retry-After, filtre query)
- Compteurs de requêtes et dernière query vue par chemin
- Vérification optionnelle du bearer token
*/

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Failure {
    status: u16,
    retry_after: Option<u64>,
    query_contains: Option<String>,
}

#[derive(Default)]
struct StubState {
    user: Value,
    teams: Vec<Value>,
    projects: Vec<Value>,
    domains: Vec<Value>,
    domain_configs: HashMap<String, Value>,
    deployments: HashMap<String, Vec<Value>>,
    env_vars: HashMap<String, Vec<Value>>,
    /// Items per listing page; forces pagination regardless of the
    /// client's `limit` parameter.
    page_size: usize,
    expected_token: Option<String>,
    failures: Vec<(String, Failure)>,
    hits: HashMap<String, usize>,
    last_queries: HashMap<String, HashMap<String, String>>,
}

type StubHandle = Arc<Mutex<StubState>>;

/// Stub de l'API Vercel. Clonable, tout l'état est partagé.
#[derive(Clone)]
pub struct MockVercelApi {
    state: StubHandle,
}

impl Default for MockVercelApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVercelApi {
    pub fn new() -> Self {
        let state = StubState {
            user: crate::fixtures::user("user_abc123", "testuser"),
            page_size: 100,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Démarre le serveur sur un port éphémère, retourne l'URL de base.
    pub async fn spawn(&self) -> String {
        let app = router(self.state.clone());
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    // --- Configuration des fixtures ---

    pub fn set_user(&self, user: Value) {
        self.state.lock().user = user;
    }

    pub fn set_teams(&self, teams: Vec<Value>) {
        self.state.lock().teams = teams;
    }

    pub fn set_projects(&self, projects: Vec<Value>) {
        self.state.lock().projects = projects;
    }

    pub fn set_domains(&self, domains: Vec<Value>) {
        self.state.lock().domains = domains;
    }

    pub fn set_domain_config(&self, name: &str, config: Value) {
        self.state.lock().domain_configs.insert(name.to_string(), config);
    }

    pub fn set_deployments(&self, project_id: &str, deployments: Vec<Value>) {
        self.state
            .lock()
            .deployments
            .insert(project_id.to_string(), deployments);
    }

    pub fn set_env_vars(&self, project_id: &str, envs: Vec<Value>) {
        self.state.lock().env_vars.insert(project_id.to_string(), envs);
    }

    /// Taille des pages des listings (force la pagination).
    pub fn set_page_size(&self, page_size: usize) {
        self.state.lock().page_size = page_size.max(1);
    }

    /// Exige `Authorization: Bearer <token>` sur toutes les routes.
    pub fn require_token(&self, token: &str) {
        self.state.lock().expected_token = Some(token.to_string());
    }

    // --- Injection d'erreurs ---

    pub fn fail(&self, path: &str, status: u16) {
        self.state.lock().failures.push((
            path.to_string(),
            Failure {
                status,
                retry_after: None,
                query_contains: None,
            },
        ));
    }

    pub fn fail_with_retry_after(&self, path: &str, status: u16, retry_after: u64) {
        self.state.lock().failures.push((
            path.to_string(),
            Failure {
                status,
                retry_after: Some(retry_after),
                query_contains: None,
            },
        ));
    }

    /// Échec limité aux requêtes dont la query contient `needle`
    /// (ex: "projectId=prj_1").
    pub fn fail_when(&self, path: &str, needle: &str, status: u16) {
        self.state.lock().failures.push((
            path.to_string(),
            Failure {
                status,
                retry_after: None,
                query_contains: Some(needle.to_string()),
            },
        ));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    // --- Observation du trafic ---

    pub fn hits(&self, path: &str) -> usize {
        self.state.lock().hits.get(path).copied().unwrap_or(0)
    }

    pub fn last_query(&self, path: &str) -> Option<HashMap<String, String>> {
        self.state.lock().last_queries.get(path).cloned()
    }
}

fn router(state: StubHandle) -> Router {
    Router::new()
        .route("/v2/user", get(get_user))
        .route("/v2/teams", get(get_teams))
        .route("/v10/projects", get(get_projects))
        .route("/v9/projects/{id}", get(get_project))
        .route("/v9/projects/{id}/env", get(get_env_vars))
        .route("/v6/deployments", get(get_deployments))
        .route("/v5/domains", get(get_domains))
        .route("/v6/domains/{name}/config", get(get_domain_config))
        .with_state(state)
}

/// Comptage + auth + injection d'erreurs, commun à toutes les routes.
fn intercept(
    state: &StubHandle,
    path: &str,
    headers: &HeaderMap,
    query: &HashMap<String, String>,
) -> Option<Response> {
    let mut stub = state.lock();
    *stub.hits.entry(path.to_string()).or_insert(0) += 1;
    stub.last_queries.insert(path.to_string(), query.clone());

    if let Some(expected) = &stub.expected_token {
        let authorized = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .map(|value| value == format!("Bearer {expected}"))
            .unwrap_or(false);
        if !authorized {
            return Some(
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"error": {"code": "forbidden", "message": "Not authorized"}})),
                )
                    .into_response(),
            );
        }
    }

    let query_line = query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    for (match_path, failure) in &stub.failures {
        let path_matches = match_path == path;
        let query_matches = failure
            .query_contains
            .as_ref()
            .map_or(true, |needle| query_line.contains(needle));
        if path_matches && query_matches {
            let status = StatusCode::from_u16(failure.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut response = (
                status,
                Json(json!({"error": {"code": "injected", "message": "injected failure"}})),
            )
                .into_response();
            if let Some(secs) = failure.retry_after {
                if let Ok(header_value) = secs.to_string().parse() {
                    response.headers_mut().insert("retry-after", header_value);
                }
            }
            return Some(response);
        }
    }

    None
}

fn paginate(items: &[Value], page_size: usize, cursor: Option<usize>) -> (Vec<Value>, Value) {
    let start = cursor.unwrap_or(0).min(items.len());
    let end = (start + page_size).min(items.len());
    let next = if end < items.len() {
        json!(end)
    } else {
        Value::Null
    };
    (items[start..end].to_vec(), next)
}

async fn get_user(
    State(state): State<StubHandle>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = intercept(&state, "/v2/user", &headers, &query) {
        return response;
    }
    let stub = state.lock();
    Json(json!({"user": stub.user})).into_response()
}

async fn get_teams(
    State(state): State<StubHandle>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = intercept(&state, "/v2/teams", &headers, &query) {
        return response;
    }
    let stub = state.lock();
    Json(json!({
        "teams": stub.teams,
        "pagination": {"count": stub.teams.len(), "next": null, "prev": null},
    }))
    .into_response()
}

async fn get_projects(
    State(state): State<StubHandle>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = intercept(&state, "/v10/projects", &headers, &query) {
        return response;
    }
    let stub = state.lock();
    let cursor = query.get("from").and_then(|value| value.parse().ok());
    let (page, next) = paginate(&stub.projects, stub.page_size, cursor);
    Json(json!({
        "projects": page,
        "pagination": {"count": stub.projects.len(), "next": next},
    }))
    .into_response()
}

async fn get_project(
    State(state): State<StubHandle>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = format!("/v9/projects/{id}");
    if let Some(response) = intercept(&state, &path, &headers, &query) {
        return response;
    }
    let stub = state.lock();
    match stub.projects.iter().find(|p| p["id"] == json!(id)) {
        Some(project) => Json(project.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"code": "not_found", "message": "Project not found"}})),
        )
            .into_response(),
    }
}

async fn get_env_vars(
    State(state): State<StubHandle>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = format!("/v9/projects/{id}/env");
    if let Some(response) = intercept(&state, &path, &headers, &query) {
        return response;
    }
    let stub = state.lock();
    let envs = stub.env_vars.get(&id).cloned().unwrap_or_default();
    Json(json!({"envs": envs})).into_response()
}

async fn get_deployments(
    State(state): State<StubHandle>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = intercept(&state, "/v6/deployments", &headers, &query) {
        return response;
    }
    let stub = state.lock();
    let project_id = query.get("projectId").cloned().unwrap_or_default();
    let limit: usize = query
        .get("limit")
        .and_then(|value| value.parse().ok())
        .unwrap_or(usize::MAX);
    let mut deployments = stub.deployments.get(&project_id).cloned().unwrap_or_default();
    deployments.truncate(limit);
    Json(json!({"deployments": deployments})).into_response()
}

async fn get_domains(
    State(state): State<StubHandle>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = intercept(&state, "/v5/domains", &headers, &query) {
        return response;
    }
    let stub = state.lock();
    let cursor = query.get("until").and_then(|value| value.parse().ok());
    let (page, next) = paginate(&stub.domains, stub.page_size, cursor);
    Json(json!({
        "domains": page,
        "pagination": {"count": stub.domains.len(), "next": next},
    }))
    .into_response()
}

async fn get_domain_config(
    State(state): State<StubHandle>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let path = format!("/v6/domains/{name}/config");
    if let Some(response) = intercept(&state, &path, &headers, &query) {
        return response;
    }
    let stub = state.lock();
    let config = stub
        .domain_configs
        .get(&name)
        .cloned()
        .unwrap_or_else(|| json!({"configuredBy": "CNAME", "misconfigured": false}));
    Json(config).into_response()
}

//! Metric descriptors mapping snapshots to displayable values
//!
//! Per-metric extraction lives in static tables of descriptors (key +
//! value closure + attribute closure) rather than one handler type per
//! metric. The HTTP layer walks the tables to render JSON.

use serde_json::{json, Value};

use crate::audit::audit_project;
use crate::coordinator::ProjectSnapshot;
use crate::models::{Deployment, Domain, EnvVar, Project};

pub struct ProjectMetric {
    pub key: &'static str,
    pub value_fn: fn(&Project, &[Deployment], &[EnvVar]) -> Value,
    pub attr_fn: fn(&Project, &[Deployment], &[EnvVar]) -> Option<Value>,
}

pub struct AccountMetric {
    pub key: &'static str,
    pub value_fn: fn(&ProjectSnapshot) -> Value,
}

pub struct DomainFlag {
    pub key: &'static str,
    pub value_fn: fn(&Domain) -> Option<bool>,
}

fn no_attrs(_: &Project, _: &[Deployment], _: &[EnvVar]) -> Option<Value> {
    None
}

/// API order is newest first, so the head of the list is the latest.
fn latest_deployment(deployments: &[Deployment]) -> Option<&Deployment> {
    deployments.first()
}

fn build_duration_seconds(deployment: Option<&Deployment>) -> Option<i64> {
    let deployment = deployment?;
    let ready = deployment.ready?;
    Some(((ready - deployment.created) as f64 / 1000.0).round() as i64)
}

const KNOWN_SOURCES: [&str; 4] = ["git", "cli", "redeploy", "import"];

pub const PROJECT_METRICS: &[ProjectMetric] = &[
    ProjectMetric {
        key: "deployment_status",
        value_fn: |_, deployments, _| match latest_deployment(deployments) {
            Some(dep) => json!(dep.state.as_str().to_ascii_lowercase()),
            None => Value::Null,
        },
        attr_fn: |_, deployments, _| {
            latest_deployment(deployments).map(|dep| {
                json!({
                    "deployment_id": dep.uid,
                    "commit_message": dep
                        .meta
                        .as_ref()
                        .and_then(|m| m.github_commit_message.clone())
                        .unwrap_or_default(),
                    "inspector_url": dep.inspector_url.clone().unwrap_or_default(),
                })
            })
        },
    },
    ProjectMetric {
        key: "deployment_url",
        value_fn: |_, deployments, _| match latest_deployment(deployments).and_then(|d| d.url.clone()) {
            Some(url) => json!(url),
            None => Value::Null,
        },
        attr_fn: no_attrs,
    },
    ProjectMetric {
        key: "build_duration",
        value_fn: |_, deployments, _| match build_duration_seconds(latest_deployment(deployments)) {
            Some(seconds) => json!(seconds),
            None => Value::Null,
        },
        attr_fn: no_attrs,
    },
    ProjectMetric {
        key: "deployment_source",
        value_fn: |_, deployments, _| {
            let source = latest_deployment(deployments)
                .and_then(|d| d.source.as_deref())
                .map(str::to_ascii_lowercase);
            match source {
                Some(s) if KNOWN_SOURCES.contains(&s.as_str()) => json!(s),
                _ => Value::Null,
            }
        },
        attr_fn: no_attrs,
    },
    ProjectMetric {
        key: "active_deployments",
        value_fn: |_, deployments, _| json!(deployments.len()),
        attr_fn: no_attrs,
    },
    ProjectMetric {
        key: "failed_deployments",
        value_fn: |_, deployments, _| {
            json!(deployments
                .iter()
                .filter(|d| d.state == crate::models::DeploymentState::Error)
                .count())
        },
        attr_fn: no_attrs,
    },
    ProjectMetric {
        key: "framework",
        value_fn: |project, _, _| match &project.framework {
            Some(framework) => json!(framework),
            None => Value::Null,
        },
        attr_fn: no_attrs,
    },
    ProjectMetric {
        key: "node_version",
        value_fn: |project, _, _| match &project.node_version {
            Some(version) => json!(version),
            None => Value::Null,
        },
        attr_fn: no_attrs,
    },
    ProjectMetric {
        key: "best_practices_score",
        value_fn: |project, deployments, env_vars| {
            json!(audit_project(project, deployments, env_vars).score)
        },
        attr_fn: |project, deployments, env_vars| {
            Some(json!({"issues": audit_project(project, deployments, env_vars).issues}))
        },
    },
    ProjectMetric {
        key: "best_practices_issues",
        value_fn: |project, deployments, env_vars| {
            json!(audit_project(project, deployments, env_vars).issues.len())
        },
        attr_fn: |project, deployments, env_vars| {
            Some(json!({"details": audit_project(project, deployments, env_vars).issues}))
        },
    },
];

pub const ACCOUNT_METRICS: &[AccountMetric] = &[
    AccountMetric {
        key: "total_projects",
        value_fn: |snapshot| json!(snapshot.projects.len()),
    },
    AccountMetric {
        key: "total_domains",
        value_fn: |snapshot| json!(snapshot.domains.len()),
    },
];

pub const DOMAIN_FLAGS: &[DomainFlag] = &[
    DomainFlag {
        key: "domain_healthy",
        value_fn: |domain| Some(domain.verified && domain.configured_by.is_some()),
    },
    DomainFlag {
        key: "ssl_valid",
        value_fn: |domain| Some(domain.configured_by.is_some()),
    },
    DomainFlag {
        // None = health check failed, state unknown
        key: "domain_misconfigured",
        value_fn: |domain| domain.misconfigured,
    },
];

pub fn project_metrics_json(
    project: &Project,
    deployments: &[Deployment],
    env_vars: &[EnvVar],
) -> Value {
    let mut metrics = serde_json::Map::new();
    for metric in PROJECT_METRICS {
        let mut entry = serde_json::Map::new();
        entry.insert("value".to_string(), (metric.value_fn)(project, deployments, env_vars));
        if let Some(attrs) = (metric.attr_fn)(project, deployments, env_vars) {
            entry.insert("attributes".to_string(), attrs);
        }
        metrics.insert(metric.key.to_string(), Value::Object(entry));
    }
    Value::Object(metrics)
}

pub fn account_metrics_json(snapshot: &ProjectSnapshot) -> Value {
    let mut metrics = serde_json::Map::new();
    for metric in ACCOUNT_METRICS {
        metrics.insert(metric.key.to_string(), (metric.value_fn)(snapshot));
    }
    Value::Object(metrics)
}

pub fn domain_flags_json(domain: &Domain) -> Value {
    let mut flags = serde_json::Map::new();
    for flag in DOMAIN_FLAGS {
        let value = match (flag.value_fn)(domain) {
            Some(b) => json!(b),
            None => Value::Null,
        };
        flags.insert(flag.key.to_string(), value);
    }
    Value::Object(flags)
}

//! Best practices audit for monitored projects
//!
//! Pure scoring over one project, its recent deployments, and its env
//! var metadata. All checks weigh equally; score = round(100 * passed /
//! total). The check count is not constant: the rollback check only runs
//! when the project has at least one recent deployment, so the
//! denominator reflects exactly the checks that ran.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{Deployment, DeploymentState, EnvVar, Project};
use crate::state::{new_state, Shared};

/// Node versions considered current (20+).
pub const CURRENT_NODE_VERSIONS: [&str; 3] = ["20.x", "22.x", "24.x"];

/// Max acceptable error rate in recent deployments.
pub const MAX_ERROR_RATE: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestPracticesResult {
    pub score: u8,
    pub issues: Vec<String>,
}

pub fn audit_project(
    project: &Project,
    deployments: &[Deployment],
    env_vars: &[EnvVar],
) -> BestPracticesResult {
    let mut checks: Vec<(bool, String)> = Vec::new();

    // Framework detected
    let framework_ok = matches!(project.framework.as_deref(), Some(f) if f != "other");
    checks.push((
        framework_ok,
        "No framework detected. Configure a framework for optimized builds.".to_string(),
    ));

    // Modern Node version
    let node_version = project.node_version.as_deref().unwrap_or("");
    checks.push((
        CURRENT_NODE_VERSIONS.contains(&node_version),
        format!("Node version {node_version:?} is outdated. Upgrade to Node 20+ for LTS support."),
    ));

    // Env var hygiene: no plaintext secrets
    let plaintext_count = env_vars.iter().filter(|e| e.kind == "plain").count();
    checks.push((
        plaintext_count == 0,
        format!(
            "{plaintext_count} environment variable(s) stored as plaintext. Use encrypted or secret type."
        ),
    ));

    // Deployment health. A project with nothing deployed fails here and
    // skips the rollback check entirely.
    if deployments.is_empty() {
        checks.push((
            false,
            "No deployments found. Deploy your project to get started.".to_string(),
        ));
    } else {
        let error_count = deployments
            .iter()
            .filter(|d| d.state == DeploymentState::Error)
            .count();
        let error_rate = error_count as f64 / deployments.len() as f64;
        checks.push((
            error_rate <= MAX_ERROR_RATE,
            format!(
                "High deployment failure rate: {error_count}/{} recent deployments failed.",
                deployments.len()
            ),
        ));

        // Rollback candidate available
        let has_rollback = deployments
            .iter()
            .any(|d| d.is_rollback_candidate.unwrap_or(false));
        checks.push((
            has_rollback,
            "No rollback candidate available. Ensure successful production deployments exist."
                .to_string(),
        ));
    }

    let total = checks.len();
    let passed = checks.iter().filter(|(ok, _)| *ok).count();
    let score = ((passed as f64 / total as f64) * 100.0).round() as u8;
    let issues = checks
        .into_iter()
        .filter(|(ok, _)| !ok)
        .map(|(_, msg)| msg)
        .collect();

    BestPracticesResult { score, issues }
}

/// Memoized audit results, keyed by project id and invalidated whenever
/// the deployment snapshot generation moves.
pub struct AuditCache {
    entries: Shared<HashMap<String, (u64, BestPracticesResult)>>,
}

impl AuditCache {
    pub fn new() -> Self {
        Self {
            entries: new_state(HashMap::new()),
        }
    }

    pub fn get_or_compute(
        &self,
        generation: u64,
        project: &Project,
        deployments: &[Deployment],
        env_vars: &[EnvVar],
    ) -> BestPracticesResult {
        {
            let entries = self.entries.lock();
            if let Some((cached_generation, result)) = entries.get(&project.id) {
                if *cached_generation == generation {
                    return result.clone();
                }
            }
        }

        let result = audit_project(project, deployments, env_vars);
        self.entries
            .lock()
            .insert(project.id.clone(), (generation, result.clone()));
        result
    }
}

impl Default for AuditCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_project(framework: Option<&str>, node_version: Option<&str>) -> Project {
        Project {
            id: "prj_123".to_string(),
            name: "my-app".to_string(),
            framework: framework.map(String::from),
            node_version: node_version.map(String::from),
            updated_at: Some(1700000000000),
        }
    }

    fn make_deployments(states: &[&str]) -> Vec<Deployment> {
        states
            .iter()
            .enumerate()
            .map(|(i, state)| Deployment {
                uid: format!("dpl_{i}"),
                state: serde_json::from_value(serde_json::json!(state)).unwrap(),
                project_id: Some("prj_123".to_string()),
                url: Some(format!("my-app-{i}.vercel.app")),
                created: 1700000000000 + i as i64 * 60000,
                ready: (*state == "READY").then(|| 1700000060000 + i as i64 * 60000),
                source: Some("git".to_string()),
                is_rollback_candidate: Some(*state == "READY"),
                inspector_url: None,
                meta: None,
            })
            .collect()
    }

    fn make_env_vars(kinds: &[&str]) -> Vec<EnvVar> {
        kinds
            .iter()
            .enumerate()
            .map(|(i, kind)| EnvVar {
                key: format!("VAR_{i}"),
                kind: kind.to_string(),
                target: vec!["production".to_string()],
            })
            .collect()
    }

    #[test]
    fn test_perfect_project() {
        let project = make_project(Some("nextjs"), Some("20.x"));
        let deployments = make_deployments(&["READY", "READY", "READY"]);
        let env_vars = make_env_vars(&["encrypted", "encrypted"]);

        let result = audit_project(&project, &deployments, &env_vars);
        assert_eq!(result.score, 100);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_no_deployments_runs_four_checks() {
        // Everything else passes: 3/4 checks, rollback check skipped.
        let project = make_project(Some("nextjs"), Some("20.x"));
        let result = audit_project(&project, &[], &[]);

        assert_eq!(result.score, 75);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("Deploy your project to get started"));
    }

    #[test]
    fn test_everything_fails_with_zero_deployments() {
        let project = make_project(None, None);
        let result = audit_project(&project, &[], &make_env_vars(&["plain"]));

        // 0/4 checks pass: framework, node, plaintext, no-deployments.
        assert_eq!(result.score, 0);
        assert_eq!(result.issues.len(), 4);
        assert!(result.issues.iter().any(|i| i.contains("framework")));
        assert!(result.issues.iter().any(|i| i.contains("Deploy your project")));
    }

    #[test]
    fn test_no_framework_counts_other_as_missing() {
        let project = make_project(Some("other"), Some("20.x"));
        let result = audit_project(&project, &[], &[]);
        assert!(result.issues.iter().any(|i| i.contains("No framework detected")));
    }

    #[test]
    fn test_old_node_version() {
        let project = make_project(Some("nextjs"), Some("16.x"));
        let result = audit_project(&project, &[], &[]);
        assert!(result.issues.iter().any(|i| i.contains("outdated")));
    }

    #[test]
    fn test_plaintext_count_in_message() {
        let project = make_project(Some("nextjs"), Some("20.x"));
        let env_vars = make_env_vars(&["plain", "encrypted", "plain"]);
        let result = audit_project(&project, &[], &env_vars);
        assert!(result
            .issues
            .iter()
            .any(|i| i.starts_with("2 environment variable(s)")));
    }

    #[test]
    fn test_high_error_rate() {
        let project = make_project(Some("nextjs"), Some("20.x"));
        // 3/5 errors = 0.6 > 0.3 threshold
        let deployments = make_deployments(&["ERROR", "ERROR", "READY", "ERROR", "READY"]);
        let result = audit_project(&project, &deployments, &[]);
        assert!(result
            .issues
            .iter()
            .any(|i| i.contains("3/5 recent deployments failed")));
    }

    #[test]
    fn test_error_rate_at_threshold_passes() {
        let project = make_project(Some("nextjs"), Some("20.x"));
        // 1 error in 5 = 0.2 <= 0.3, and READY deployments carry rollback candidates
        let deployments = make_deployments(&["ERROR", "READY", "READY", "READY", "READY"]);
        let result = audit_project(&project, &deployments, &[]);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_rollback_issue_present_without_candidate() {
        let project = make_project(Some("nextjs"), Some("20.x"));
        let mut deployments = make_deployments(&["READY"]);
        deployments[0].is_rollback_candidate = Some(false);
        let result = audit_project(&project, &deployments, &[]);
        assert!(result.issues.iter().any(|i| i.contains("rollback")));
    }

    #[test]
    fn test_rollback_issue_absent_with_candidate() {
        let project = make_project(Some("nextjs"), Some("20.x"));
        let deployments = make_deployments(&["READY", "ERROR"]);
        let result = audit_project(&project, &deployments, &[]);
        assert!(!result.issues.iter().any(|i| i.contains("rollback")));
    }

    #[test]
    fn test_score_issue_count_identity() {
        // score == round(100 * passed / total) and issues == total - passed,
        // across a spread of inputs.
        let cases = [
            (make_project(Some("nextjs"), Some("20.x")), make_deployments(&["READY"]), make_env_vars(&[])),
            (make_project(None, None), make_deployments(&["ERROR", "ERROR"]), make_env_vars(&["plain"])),
            (make_project(Some("vite"), Some("22.x")), vec![], make_env_vars(&["secret"])),
        ];

        for (project, deployments, env_vars) in &cases {
            let result = audit_project(project, deployments, env_vars);
            let total = if deployments.is_empty() { 4 } else { 5 };
            let passed = total - result.issues.len();
            let expected = ((passed as f64 / total as f64) * 100.0).round() as u8;
            assert_eq!(result.score, expected);
            assert!(result.score <= 100);
        }
    }

    #[test]
    fn test_cache_hits_within_generation() {
        let cache = AuditCache::new();
        let project = make_project(Some("nextjs"), Some("20.x"));
        let deployments = make_deployments(&["READY"]);

        let first = cache.get_or_compute(1, &project, &deployments, &[]);
        // Same generation: served from cache even if inputs changed.
        let cached = cache.get_or_compute(1, &project, &[], &[]);
        assert_eq!(first, cached);

        // Generation bump invalidates.
        let recomputed = cache.get_or_compute(2, &project, &[], &[]);
        assert_ne!(first, recomputed);
    }
}

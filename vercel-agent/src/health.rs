//! Daemon health tracking
//!
//! Uptime, refresh outcomes per coordinator and the auth-expired flag
//! used to signal that the stored credential needs replacing. Exposed
//! on GET /system/health.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::api::ApiError;
use crate::coordinator::ProjectSnapshot;

#[derive(Debug, Serialize)]
pub struct AgentHealth {
    pub uptime_seconds: u64,
    pub projects_tracked: u32,
    pub domains_tracked: u32,
    pub last_project_refresh: Option<DateTime<Utc>>,
    pub last_deployment_refresh: Option<DateTime<Utc>>,
    pub project_refresh_failures: u32,
    pub deployment_refresh_failures: u32,
    pub auth_expired: bool,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    last_project_refresh: Arc<Mutex<Option<DateTime<Utc>>>>,
    last_deployment_refresh: Arc<Mutex<Option<DateTime<Utc>>>>,
    project_failures: Arc<AtomicU32>,
    deployment_failures: Arc<AtomicU32>,
    auth_expired: Arc<AtomicBool>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            last_project_refresh: Arc::new(Mutex::new(None)),
            last_deployment_refresh: Arc::new(Mutex::new(None)),
            project_failures: Arc::new(AtomicU32::new(0)),
            deployment_failures: Arc::new(AtomicU32::new(0)),
            auth_expired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn record_project_success(&self) {
        *self.last_project_refresh.lock() = Some(Utc::now());
        self.project_failures.store(0, Ordering::Relaxed);
        self.auth_expired.store(false, Ordering::Relaxed);
    }

    pub fn record_project_failure(&self, err: &ApiError) {
        self.project_failures.fetch_add(1, Ordering::Relaxed);
        if !err.is_transient() {
            self.auth_expired.store(true, Ordering::Relaxed);
        }
    }

    pub fn record_deployment_success(&self) {
        *self.last_deployment_refresh.lock() = Some(Utc::now());
        self.deployment_failures.store(0, Ordering::Relaxed);
    }

    pub fn record_deployment_failure(&self, err: &ApiError) {
        self.deployment_failures.fetch_add(1, Ordering::Relaxed);
        if !err.is_transient() {
            self.auth_expired.store(true, Ordering::Relaxed);
        }
    }

    pub fn auth_expired(&self) -> bool {
        self.auth_expired.load(Ordering::Relaxed)
    }

    pub fn get_health(&self, snapshot: Option<&ProjectSnapshot>) -> AgentHealth {
        AgentHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            projects_tracked: snapshot.map(|s| s.projects.len() as u32).unwrap_or(0),
            domains_tracked: snapshot.map(|s| s.domains.len() as u32).unwrap_or(0),
            last_project_refresh: *self.last_project_refresh.lock(),
            last_deployment_refresh: *self.last_deployment_refresh.lock(),
            project_refresh_failures: self.project_failures.load(Ordering::Relaxed),
            deployment_refresh_failures: self.deployment_failures.load(Ordering::Relaxed),
            auth_expired: self.auth_expired.load(Ordering::Relaxed),
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_reset_on_success() {
        let tracker = HealthTracker::new();
        tracker.record_project_failure(&ApiError::Connection("timeout".into()));
        tracker.record_project_failure(&ApiError::Connection("timeout".into()));
        assert_eq!(tracker.get_health(None).project_refresh_failures, 2);

        tracker.record_project_success();
        let health = tracker.get_health(None);
        assert_eq!(health.project_refresh_failures, 0);
        assert!(health.last_project_refresh.is_some());
    }

    #[test]
    fn test_auth_failure_sets_expired_flag() {
        let tracker = HealthTracker::new();
        tracker.record_project_failure(&ApiError::Connection("timeout".into()));
        assert!(!tracker.auth_expired());

        tracker.record_deployment_failure(&ApiError::Authentication("401".into()));
        assert!(tracker.auth_expired());

        // A successful project cycle means the credential works again.
        tracker.record_project_success();
        assert!(!tracker.auth_expired());
    }
}

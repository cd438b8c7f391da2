//! Diagnostics export with secret redaction
//!
//! The /diagnostics payload is the redacted config plus both current
//! snapshots. Redaction is by key name, applied recursively, so nested
//! payloads can never leak a credential.

use serde_json::{json, Value};

use crate::config::AgentConfig;
use crate::coordinator::{DeploymentSnapshot, ProjectSnapshot};

/// Keys whose values are never exported.
pub const TO_REDACT: &[&str] = &["api_token", "token", "api_key", "email"];

const REDACTED: &str = "**REDACTED**";

pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    if TO_REDACT.contains(&key.as_str()) {
                        (key.clone(), Value::String(REDACTED.to_string()))
                    } else {
                        (key.clone(), redact(inner))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

pub fn diagnostics_payload(
    config: &AgentConfig,
    project_snapshot: Option<&ProjectSnapshot>,
    deployment_snapshot: &DeploymentSnapshot,
) -> Value {
    let config_json = serde_json::to_value(config).unwrap_or(Value::Null);
    let project_json = match project_snapshot {
        Some(snapshot) => serde_json::to_value(snapshot).unwrap_or(Value::Null),
        None => Value::Null,
    };
    let deployment_json =
        serde_json::to_value(&*deployment_snapshot.deployments).unwrap_or(Value::Null);

    redact(&json!({
        "config": config_json,
        "project_data": project_json,
        "deployment_data": deployment_json,
        "deployment_generation": deployment_snapshot.generation,
    }))
}

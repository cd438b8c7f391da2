/*!
Builders de fixtures au format wire de l'API Vercel

Valeurs par défaut "saines" (projet nextjs/20.x, déploiement READY) -
les tests surchargent champ par champ via les variantes `*_with`.
*/

use serde_json::{json, Value};

pub fn user(id: &str, username: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": "test@example.com",
        "name": "Test User",
    })
}

pub fn team(id: &str, slug: &str, name: &str) -> Value {
    json!({
        "id": id,
        "slug": slug,
        "name": name,
    })
}

pub fn project(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "framework": "nextjs",
        "nodeVersion": "20.x",
        "updatedAt": 1700000000000i64,
    })
}

pub fn project_with(id: &str, name: &str, framework: Option<&str>, node_version: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "framework": framework,
        "nodeVersion": node_version,
        "updatedAt": 1700000000000i64,
    })
}

pub fn deployment(uid: &str, state: &str) -> Value {
    let ready = state == "READY";
    json!({
        "uid": uid,
        "state": state,
        "url": format!("{uid}.vercel.app"),
        "created": 1700000000000i64,
        "ready": if ready { json!(1700000060000i64) } else { Value::Null },
        "source": "git",
        "isRollbackCandidate": ready,
        "inspectorUrl": format!("https://vercel.com/inspect/{uid}"),
        "meta": {"githubCommitMessage": "chore: release"},
    })
}

/// Une liste de déploiements aux états donnés, uid `dpl_{i}`, horodatages
/// étagés d'une minute (ordre API: plus récent en tête).
pub fn deployments(states: &[&str]) -> Vec<Value> {
    states
        .iter()
        .enumerate()
        .map(|(i, state)| {
            let mut value = deployment(&format!("dpl_{i}"), state);
            value["created"] = json!(1700000000000i64 + i as i64 * 60000);
            if value["ready"] != Value::Null {
                value["ready"] = json!(1700000060000i64 + i as i64 * 60000);
            }
            value
        })
        .collect()
}

pub fn env_var(key: &str, kind: &str) -> Value {
    json!({
        "key": key,
        "type": kind,
        "target": ["production"],
    })
}

pub fn env_vars(kinds: &[&str]) -> Vec<Value> {
    kinds
        .iter()
        .enumerate()
        .map(|(i, kind)| env_var(&format!("VAR_{i}"), kind))
        .collect()
}

pub fn domain(name: &str, verified: bool) -> Value {
    json!({
        "name": name,
        "verified": verified,
    })
}

pub fn domain_config(configured_by: Option<&str>, misconfigured: bool) -> Value {
    json!({
        "configuredBy": configured_by,
        "misconfigured": misconfigured,
    })
}

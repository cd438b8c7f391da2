//! Vercel Agent - deployment monitoring core
//!
//! Polls the Vercel REST API on two independent cadences and derives a
//! best-practices score per project:
//! - API client with auth, team scoping, pagination and error taxonomy
//! - Slow cycle: projects, domain health, env var metadata
//! - Fast cycle: recent deployments per known project
//! - Pure audit function + generation-keyed memoization
//! - Read-only status API (axum) and redacted diagnostics

pub mod api;
pub mod audit;
pub mod config;
pub mod coordinator;
pub mod diagnostics;
pub mod health;
pub mod http;
pub mod models;
pub mod sensors;
pub mod state;
pub mod wizard;

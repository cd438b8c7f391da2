//! Configuration management with secure token storage
//!
//! Handles:
//! - Team scoping and poll intervals
//! - API token in the OS keyring (never in the config file)
//! - Status API bind address
//! - Cross-platform storage location

use anyhow::Result;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::coordinator::{
    DEFAULT_DEPLOYMENT_SCAN_INTERVAL_SECS, DEFAULT_PROJECT_SCAN_INTERVAL_SECS,
};

pub const KEYRING_SERVICE: &str = "vercel-agent";
const KEYRING_TOKEN_KEY: &str = "api-token";

/// Env override for headless deployments (containers, CI).
pub const TOKEN_ENV_VAR: &str = "VERCEL_TOKEN";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8686";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub api: ApiConfig,
    pub http: HttpConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub team_id: Option<String>,
    pub team_name: Option<String>,
    pub project_scan_interval_secs: u64,
    pub deployment_scan_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub store_token: bool,
    #[serde(skip)] // Never serialize tokens
    pub cached_token: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                team_id: None,
                team_name: None,
                project_scan_interval_secs: DEFAULT_PROJECT_SCAN_INTERVAL_SECS,
                deployment_scan_interval_secs: DEFAULT_DEPLOYMENT_SCAN_INTERVAL_SECS,
            },
            http: HttpConfig {
                bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            },
            auth: AuthConfig {
                store_token: true,
                cached_token: None,
            },
        }
    }
}

impl AgentConfig {
    /// Load config from the OS-specific location.
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path).await?;
            let mut config: AgentConfig = toml::from_str(&content)?;

            // Load the token from the secure keyring if enabled
            if config.auth.store_token {
                config.auth.cached_token = Self::load_token().ok();
            }

            Ok(config)
        } else {
            // First time setup - return default config
            Ok(Self::default())
        }
    }

    /// Save config to the OS-specific location.
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // The config file never contains the token
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content).await?;

        if self.auth.store_token {
            if let Some(token) = &self.auth.cached_token {
                Self::save_token(token)?;
            }
        }

        Ok(())
    }

    /// Get the OS-specific config file path.
    pub fn config_file_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;

        path.push("vercel-agent");
        path.push("config.toml");
        Ok(path)
    }

    /// Token used for API calls: env var wins over the keyring so
    /// containers and CI never need a keyring backend.
    pub fn resolve_token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.is_empty() {
                return Some(token);
            }
        }
        self.auth.cached_token.clone()
    }

    /// Load the API token from the secure OS keyring.
    pub fn load_token() -> Result<String> {
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_KEY)?;
        entry.get_password().map_err(Into::into)
    }

    /// Save the API token to the secure OS keyring.
    pub fn save_token(token: &str) -> Result<()> {
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_KEY)?;
        entry.set_password(token).map_err(Into::into)
    }

    /// Delete the API token from the keyring.
    pub fn delete_token() -> Result<()> {
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_TOKEN_KEY)?;
        entry.delete_credential().map_err(Into::into)
    }

    /// Check if this is first-time setup.
    pub fn is_first_time_setup() -> bool {
        Self::config_file_path()
            .map(|p| !p.exists())
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.api.project_scan_interval_secs, 900);
        assert_eq!(config.api.deployment_scan_interval_secs, 60);
        assert!(config.api.team_id.is_none());
        assert!(config.auth.store_token);
    }

    #[test]
    fn test_config_file_path() {
        let path = AgentConfig::config_file_path().unwrap();
        assert!(path.to_string_lossy().contains("vercel-agent"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_token_never_serialized() {
        let mut config = AgentConfig::default();
        config.auth.cached_token = Some("tok_secret".to_string());
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(!serialized.contains("tok_secret"));
    }
}

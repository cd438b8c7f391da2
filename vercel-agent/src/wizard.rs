//! Interactive CLI setup wizard for first-time configuration
//!
//! Walks the operator through token entry and validation, team scoping,
//! poll intervals and the status API bind address, then saves the config
//! file and stores the token in the OS keyring. Also used to replace a
//! revoked token (`vercel-agent setup`).

use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::api::{ApiError, VercelClient};
use crate::config::{AgentConfig, TOKEN_ENV_VAR};
use crate::models::{Team, User};

pub struct SetupWizard;

impl SetupWizard {
    /// Run the interactive setup wizard.
    pub async fn run(http: reqwest::Client) -> Result<()> {
        println!();
        println!("▲  ======================================");
        println!("   VERCEL AGENT CONFIGURATION WIZARD");
        println!("▲  ======================================");
        println!();

        // Step 1: token entry + validation
        let (token, user, teams) = Self::configure_token(&http).await?;

        // Step 2: team scoping
        let team = Self::configure_team(&user, &teams)?;

        // Step 3: polling and status API
        let mut config = AgentConfig::default();
        config.api.project_scan_interval_secs = Self::prompt_with_default_parse(
            "Project scan interval (seconds)",
            &config.api.project_scan_interval_secs.to_string(),
        )?;
        config.api.deployment_scan_interval_secs = Self::prompt_with_default_parse(
            "Deployment scan interval (seconds)",
            &config.api.deployment_scan_interval_secs.to_string(),
        )?;
        config.http.bind_address =
            Self::prompt_with_default("Status API bind address", &config.http.bind_address)?;

        config.auth.store_token =
            Self::prompt_yes_no("Store API token securely in OS keyring?", true)?;
        if let Some((team_id, team_name)) = team {
            config.api.team_id = Some(team_id);
            config.api.team_name = Some(team_name);
        }
        if config.auth.store_token {
            config.auth.cached_token = Some(token);
        }

        // Summary + confirm
        Self::display_summary(&config, &user);

        if Self::confirm_save()? {
            config.save().await.context("Failed to save configuration")?;

            println!();
            println!("✅ Configuration saved successfully!");
            if !config.auth.store_token {
                println!("⚠️  Token not stored. Export {TOKEN_ENV_VAR} before starting the agent.");
            }
            println!("🚀 The Vercel agent is now ready to start.");
            println!();
        } else {
            println!("❌ Configuration cancelled.");
        }

        Ok(())
    }

    /// Prompt for a token until it validates. Exactly three outcomes are
    /// shown to the operator: invalid credential, unreachable service,
    /// unknown error (the latter surfaces from the caller).
    async fn configure_token(http: &reqwest::Client) -> Result<(String, User, Vec<Team>)> {
        println!("🔑 API TOKEN");
        println!("────────────────────────────────────────");
        println!("Create a token at https://vercel.com/account/tokens");
        println!();

        loop {
            let token = Self::prompt_required("Vercel API token")?;

            println!("🔍 Validating token...");
            let client = VercelClient::new(http.clone(), token.clone(), None);
            match client.get_user().await {
                Ok(user) => {
                    println!("✅ Authenticated as {}", user.username);
                    // Team listing shares the credential; a transient
                    // failure here just means no team scoping is offered.
                    let teams = match client.get_teams().await {
                        Ok(teams) => teams,
                        Err(err) => {
                            println!("⚠️  Could not list teams ({err}), continuing with personal scope.");
                            Vec::new()
                        }
                    };
                    println!();
                    return Ok((token, user, teams));
                }
                Err(ApiError::Authentication(_)) => {
                    println!("❌ Invalid credential. Check the token and try again.");
                }
                Err(err) => {
                    println!("⚠️  Vercel unreachable ({err}). Try again in a moment.");
                }
            }
            println!();
        }
    }

    fn configure_team(user: &User, teams: &[Team]) -> Result<Option<(String, String)>> {
        if teams.is_empty() {
            return Ok(None);
        }

        println!("👥 ACCOUNT SCOPE");
        println!("────────────────────────────────────────");
        println!("  0) Personal ({})", user.username);
        for (i, team) in teams.iter().enumerate() {
            println!("  {}) {} ({})", i + 1, team.name, team.slug);
        }

        loop {
            print!("Choice [0]: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim();

            if input.is_empty() || input == "0" {
                println!();
                return Ok(None);
            }
            if let Ok(index) = input.parse::<usize>() {
                if (1..=teams.len()).contains(&index) {
                    let team = &teams[index - 1];
                    println!();
                    return Ok(Some((team.id.clone(), team.name.clone())));
                }
            }
            println!("❌ Invalid choice. Please select from the available options.");
        }
    }

    fn display_summary(config: &AgentConfig, user: &User) {
        println!("📋 CONFIGURATION SUMMARY");
        println!("────────────────────────────────────────");
        println!("▲  Account:");
        println!("   User: {}", user.username);
        println!(
            "   Scope: {}",
            config.api.team_name.as_deref().unwrap_or("Personal")
        );
        println!();
        println!("⏱  Polling:");
        println!("   Projects/domains: every {}s", config.api.project_scan_interval_secs);
        println!("   Deployments: every {}s", config.api.deployment_scan_interval_secs);
        println!();
        println!("🌐 Status API:");
        println!("   Bind: http://{}", config.http.bind_address);
        println!();
        println!("🔐 Token storage:");
        println!(
            "   Keyring: {}",
            if config.auth.store_token { "✅ Yes" } else { "❌ No (env var)" }
        );
        println!();
    }

    fn confirm_save() -> Result<bool> {
        print!("💾 Save this configuration? [Y/n]: ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        Ok(input.is_empty() || input == "y" || input == "yes")
    }

    // Helper functions for user input
    fn prompt_required(prompt: &str) -> Result<String> {
        loop {
            print!("❓ {}: ", prompt);
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim();

            if !input.is_empty() {
                return Ok(input.to_string());
            }
            println!("❌ A value is required.");
        }
    }

    fn prompt_with_default(prompt: &str, default: &str) -> Result<String> {
        print!("❓ {} [{}]: ", prompt, default);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(input.to_string())
        }
    }

    fn prompt_with_default_parse<T: std::str::FromStr>(prompt: &str, default: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        loop {
            let input = Self::prompt_with_default(prompt, default)?;
            match input.parse::<T>() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    println!("❌ Invalid input: {}. Please try again.", e);
                    continue;
                }
            }
        }
    }

    fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
        let default_str = if default { "Y/n" } else { "y/N" };

        loop {
            print!("❓ {} [{}]: ", prompt, default_str);
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim().to_lowercase();

            if input.is_empty() {
                return Ok(default);
            }

            match input.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {
                    println!("❌ Please enter 'y' or 'n'.");
                    continue;
                }
            }
        }
    }
}

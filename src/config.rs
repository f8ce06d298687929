//! Bot configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which credentials are stored.
pub const KEYRING_SERVICE: &str = "oncall-bot";

/// Slack Socket Mode connectivity.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// never from the TOML file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// App-level token used for Socket Mode (populated at runtime).
    #[serde(skip)]
    pub app_token: String,
    /// Bot user token used for Web API calls (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
    /// Base URL for Web API methods slack-morphism does not wrap.
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
}

/// `PagerDuty` REST settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PagerDutyConfig {
    /// REST API base URL.
    #[serde(default = "default_pagerduty_api_base")]
    pub api_base: String,
    /// Offset from UTC used when deciding weekend and business hours.
    #[serde(default)]
    pub summary_utc_offset_hours: i32,
    /// API token (populated at runtime).
    #[serde(skip)]
    pub token: String,
}

impl Default for PagerDutyConfig {
    fn default() -> Self {
        Self {
            api_base: default_pagerduty_api_base(),
            summary_utc_offset_hours: 0,
            token: String::new(),
        }
    }
}

/// Jira connectivity. The whole section is optional; without it the
/// ticket commands report that Jira is not configured.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct JiraConfig {
    /// Jira base URL, e.g. `https://acme.atlassian.net`.
    pub base_url: String,
    /// Account email used for basic auth against Jira Cloud.
    #[serde(default)]
    pub email: Option<String>,
    /// API token (populated at runtime).
    #[serde(skip)]
    pub token: String,
}

impl JiraConfig {
    /// Whether the instance is Atlassian-hosted.
    #[must_use]
    pub fn is_cloud(&self) -> bool {
        self.base_url.trim_end_matches('/').ends_with(".atlassian.net")
    }
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".into()
}

fn default_pagerduty_api_base() -> String {
    "https://api.pagerduty.com".into()
}

fn default_http_timeout_seconds() -> u64 {
    15
}

/// Top-level configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct BotConfig {
    /// Path of the `SQLite` settings database.
    pub db_path: PathBuf,
    /// Per-request timeout for outbound HTTP collaborators.
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
    /// Slack connectivity settings.
    #[serde(default)]
    pub slack: SlackConfig,
    /// `PagerDuty` settings.
    #[serde(default)]
    pub pagerduty: PagerDutyConfig,
    /// Optional Jira settings.
    #[serde(default)]
    pub jira: Option<JiraConfig>,
}

impl BotConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load secrets from OS keychain with env-var fallback.
    ///
    /// The Jira token is only required when a `[jira]` section exists.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required credential is missing from
    /// both the keychain and the environment.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.app_token = load_credential("slack_app_token", "SLACK_APP_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        self.pagerduty.token = load_credential("pagerduty_token", "PAGERDUTY_TOKEN").await?;
        if let Some(jira) = self.jira.as_mut() {
            jira.token = load_credential("jira_api_token", "JIRA_API_TOKEN").await?;
        }
        Ok(())
    }

    /// Outbound HTTP timeout as a [`Duration`].
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(AppError::Config("db_path must not be empty".into()));
        }

        if self.http_timeout_seconds == 0 {
            return Err(AppError::Config(
                "http_timeout_seconds must be greater than zero".into(),
            ));
        }

        if !(-14..=14).contains(&self.pagerduty.summary_utc_offset_hours) {
            return Err(AppError::Config(
                "pagerduty.summary_utc_offset_hours must be between -14 and 14".into(),
            ));
        }

        if let Some(jira) = &self.jira {
            if !(jira.base_url.starts_with("https://") || jira.base_url.starts_with("http://")) {
                return Err(AppError::Config(
                    "jira.base_url must be an http(s) URL".into(),
                ));
            }
            if jira.is_cloud() && jira.email.as_deref().is_none_or(str::is_empty) {
                return Err(AppError::Config(
                    "jira.email is required for Atlassian cloud instances".into(),
                ));
            }
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::Config(format!(
                "credential {keyring_key} not found in keychain service {KEYRING_SERVICE} or {env_key} env var"
            ))
        })
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::providers::vsts::{VstsConnection, DEFAULT_SERVICE_DOMAIN};

pub const CONFIG_ENV: &str = "VSTS_BRIDGE_CONFIG";
pub const DEFAULT_SENTRY_ROOT: &str = "https://sentry.io/";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub vsts: Option<VstsConfig>,
    pub sentry: Option<SentryConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct VstsConfig {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub personal_access_token: String,
    pub service_domain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SentryConfig {
    #[serde(default = "default_sentry_root")]
    pub root_url: String,
    pub organization: String,
    pub project: String,
}

fn default_sentry_root() -> String {
    DEFAULT_SENTRY_ROOT.to_string()
}

impl VstsConfig {
    pub fn is_configured(&self) -> bool {
        [
            &self.account,
            &self.project,
            &self.username,
            &self.personal_access_token,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }

    pub fn connection(&self) -> VstsConnection {
        VstsConnection::new(
            self.account.trim(),
            self.project.trim(),
            self.username.trim(),
            self.personal_access_token.trim(),
        )
        .with_service_domain(
            self.service_domain
                .as_deref()
                .unwrap_or(DEFAULT_SERVICE_DOMAIN),
        )
    }
}

impl SentryConfig {
    /// e.g. `https://sentry.io/acme/web`
    pub fn project_url(&self) -> String {
        let root = self.root_url.trim_end_matches('/');
        format!("{root}/{}/{}", self.organization, self.project)
    }

    /// Link back to an issue in the error tracker, e.g. `https://sentry.io/acme/web/issues/WEB-1`.
    pub fn issue_link(&self, short_id: &str) -> String {
        format!("{}/issues/{short_id}", self.project_url())
    }
}

fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vsts-bridge")
        .join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig =
        toml::from_str(&contents).with_context(|| "Failed to parse config.toml")?;
    Ok(config)
}

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::PollSettings;

pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Overrides the instance URL returned by the token endpoint.
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default)]
    pub username: String,
    /// Password with the security token appended, if the org requires one.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Pre-issued session token; skips the OAuth flow when set with `instance_url`.
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

/// How an environment obtains its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Stored access token plus instance URL, used as-is.
    StoredToken,
    /// OAuth 2.0 username-password flow against the login URL.
    Password,
    /// Neither a usable token nor complete password credentials.
    Incomplete,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AuthMode::StoredToken => "stored token",
            AuthMode::Password => "password flow",
            AuthMode::Incomplete => "incomplete credentials",
        };
        f.write_str(label)
    }
}

impl EnvironmentConfig {
    pub fn auth_mode(&self) -> AuthMode {
        if self.access_token.is_some() && self.instance_url.is_some() {
            AuthMode::StoredToken
        } else if [
            &self.username,
            &self.password,
            &self.client_id,
            &self.client_secret,
        ]
        .iter()
        .all(|v| !v.is_empty())
        {
            AuthMode::Password
        } else {
            AuthMode::Incomplete
        }
    }

    pub fn is_sandbox(&self) -> bool {
        let url = self.login_url.to_ascii_lowercase();
        url.contains("test.salesforce.com") || url.contains(".sandbox.my.salesforce.com")
    }

    /// One-line description: user, host, org type and auth mode.
    pub fn summary(&self) -> String {
        let user = if self.username.is_empty() {
            "-"
        } else {
            self.username.as_str()
        };
        let host = self.instance_url.as_deref().unwrap_or(&self.login_url);
        let org = if self.is_sandbox() { "sandbox" } else { "production" };
        format!("{} @ {} [{}, {}]", user, host, org, self.auth_mode())
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub current_environment: Option<String>,
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(skip)]
    path: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_poll_interval")]
    pub bulk_poll_interval_secs: u64,
    #[serde(default = "default_poll_timeout")]
    pub bulk_poll_timeout_secs: u64,
}

fn default_batch_size() -> usize {
    10
}

fn default_api_version() -> String {
    "v60.0".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_timeout() -> u64 {
    1200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            api_version: default_api_version(),
            bulk_poll_interval_secs: default_poll_interval(),
            bulk_poll_timeout_secs: default_poll_timeout(),
        }
    }
}

impl Settings {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_secs(self.bulk_poll_interval_secs),
            timeout: Duration::from_secs(self.bulk_poll_timeout_secs),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("sf-migrate")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".sf-migrate")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self {
                path: Some(config_path.to_path_buf()),
                ..Self::default()
            });
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        config.path = Some(config_path.to_path_buf());

        debug!(
            "Loaded config with {} environments",
            config.environments.len()
        );
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = match &self.path {
            Some(path) => path.clone(),
            None => Self::get_config_path()?,
        };
        debug!("Saving config to: {:?}", config_path);

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    pub fn add_environment(&mut self, name: String, env: EnvironmentConfig) -> Result<()> {
        info!("Adding environment: {}", name);
        self.environments.insert(name.clone(), env);

        if self.current_environment.is_none() {
            self.current_environment = Some(name.clone());
            info!("Set {} as current environment", name);
        }

        self.save()
    }

    /// The named environment, or the current one when `name` is `None`.
    pub fn resolve_environment(&self, name: Option<&str>) -> Result<(&str, &EnvironmentConfig)> {
        let name = match name {
            Some(name) => name,
            None => self.current_environment.as_deref().ok_or_else(|| {
                anyhow::anyhow!("No environment selected. Run 'sf-migrate auth setup' first.")
            })?,
        };
        let (key, env) = self
            .environments
            .get_key_value(name)
            .ok_or_else(|| anyhow::anyhow!("Environment '{}' not found", name))?;
        Ok((key.as_str(), env))
    }

    pub fn get_current_environment_name(&self) -> Option<&String> {
        self.current_environment.as_ref()
    }

    pub fn set_current_environment(&mut self, name: String) -> Result<()> {
        if !self.environments.contains_key(&name) {
            anyhow::bail!("Environment '{}' not found", name);
        }

        info!("Setting current environment to: {}", name);
        self.current_environment = Some(name);
        self.save()
    }

    pub fn list_environments(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.environments.keys().collect();
        names.sort();
        names
    }

    /// Drop a stored access token, keeping the login credentials.
    ///
    /// Refused when the token is the environment's only way to authenticate.
    /// Returns `false` when no token was stored.
    pub fn forget_access_token(&mut self, name: &str) -> Result<bool> {
        let env = self
            .environments
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("Environment '{}' not found", name))?;

        if env.access_token.is_none() {
            return Ok(false);
        }

        let mut without_token = env.clone();
        without_token.access_token = None;
        if without_token.auth_mode() == AuthMode::Incomplete {
            anyhow::bail!(
                "Environment '{}' has no password credentials; remove the environment instead",
                name
            );
        }

        info!("Forgetting access token for environment: {}", name);
        *env = without_token;
        self.save()?;
        Ok(true)
    }

    pub fn remove_environment(&mut self, name: &str) -> Result<()> {
        if !self.environments.contains_key(name) {
            anyhow::bail!("Environment '{}' not found", name);
        }

        info!("Removing environment: {}", name);
        self.environments.remove(name);

        if self.current_environment.as_deref() == Some(name) {
            warn!("Removed current environment, clearing current selection");
            self.current_environment = None;
        }

        self.save()
    }
}

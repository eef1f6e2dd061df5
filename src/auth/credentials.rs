use anyhow::Result;
use log::info;
use std::collections::HashMap;
use std::path::Path;

use crate::config::{DEFAULT_LOGIN_URL, EnvironmentConfig};

/// Connection details for one org, before they are stored as an environment.
#[derive(Clone)]
pub struct Credentials {
    pub login_url: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Credentials> {
        info!("Importing from environment variables");

        let vars: HashMap<String, String> = std::env::vars().collect();
        let credentials = Self::from_vars(&vars, "environment variable not set")?;

        println!("✓ Imported credentials from environment variables");
        Ok(credentials)
    }

    pub fn from_env_file(path: &str) -> Result<Credentials> {
        info!("Importing from .env file: {}", path);

        if !Path::new(path).exists() {
            anyhow::bail!("Environment file not found: {}", path);
        }

        let mut vars = HashMap::new();
        let entries = dotenvy::from_path_iter(path)
            .map_err(|e| anyhow::anyhow!("Failed to load .env file '{}': {}", path, e))?;
        for entry in entries {
            let (key, value) =
                entry.map_err(|e| anyhow::anyhow!("Failed to parse .env file '{}': {}", path, e))?;
            vars.insert(key, value);
        }

        let credentials = Self::from_vars(&vars, &format!("not found in .env file: {}", path))?;

        println!("✓ Imported credentials from .env file: {}", path);
        Ok(credentials)
    }

    /// Build from `SF_*` variables. `SF_LOGIN_URL`, `SF_INSTANCE_URL` and
    /// `SF_ACCESS_TOKEN` are optional; a token without an instance URL is ignored.
    fn from_vars(vars: &HashMap<String, String>, missing: &str) -> Result<Credentials> {
        let optional = |key: &str| vars.get(key).filter(|v| !v.is_empty()).cloned();
        let required = |key: &str| optional(key).ok_or_else(|| anyhow::anyhow!("{} {}", key, missing));

        let access_token = optional("SF_ACCESS_TOKEN");
        let instance_url = optional("SF_INSTANCE_URL");

        // A session token makes the OAuth fields unnecessary.
        let token_only = access_token.is_some() && instance_url.is_some();
        let field = |key: &str| {
            if token_only {
                Ok(optional(key).unwrap_or_default())
            } else {
                required(key)
            }
        };

        Ok(Credentials {
            login_url: optional("SF_LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            username: field("SF_USERNAME")?,
            password: field("SF_PASSWORD")?,
            client_id: field("SF_CLIENT_ID")?,
            client_secret: field("SF_CLIENT_SECRET")?,
            instance_url,
            access_token,
        })
    }

    pub fn from_command_line(
        login_url: String,
        username: String,
        password: String,
        client_id: String,
        client_secret: String,
    ) -> Credentials {
        info!("Using command line parameters");
        println!("✓ Using credentials from command line parameters");

        Credentials {
            login_url,
            username,
            password,
            client_id,
            client_secret,
            instance_url: None,
            access_token: None,
        }
    }

    /// A pre-issued session; the OAuth fields stay empty.
    pub fn from_session(login_url: String, instance_url: String, access_token: String) -> Credentials {
        info!("Using session token for {}", instance_url);
        println!("✓ Using session token for {}", instance_url);

        Credentials {
            login_url,
            username: String::new(),
            password: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            instance_url: Some(instance_url.trim_end_matches('/').to_string()),
            access_token: Some(access_token),
        }
    }

    pub fn into_environment(self) -> EnvironmentConfig {
        EnvironmentConfig {
            login_url: self.login_url,
            instance_url: self.instance_url,
            username: self.username,
            password: self.password,
            client_id: self.client_id,
            client_secret: self.client_secret,
            access_token: self.access_token,
        }
    }
}

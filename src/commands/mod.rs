pub mod auth;
pub mod dump;
pub mod idmap;
pub mod load;

use anyhow::{Context, Result};
use log::info;

use crate::api::{SalesforceClient, authenticate};
use crate::config::Config;

/// Authenticate against the named (or current) environment.
pub async fn connect(config: &Config, env: Option<&str>) -> Result<SalesforceClient> {
    let (name, environment) = config.resolve_environment(env)?;
    info!("Using environment: {}", name);

    let session = authenticate(environment)
        .await
        .with_context(|| format!("Failed to authenticate environment '{}'", name))?;
    let client = SalesforceClient::new(session, config.settings.api_version.as_str())?;
    Ok(client)
}

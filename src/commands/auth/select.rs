use anyhow::Result;
use log::{error, info};

use super::display::print_environment;
use crate::api::authenticate;
use crate::config::{AuthMode, Config};
use crate::ui::prompt_environment_selection;

/// Make an environment current, optionally proving it still authenticates.
pub async fn select_command(name: Option<String>, check: bool) -> Result<()> {
    info!("Starting auth select");

    let mut config = Config::load()?;

    if config.environments.is_empty() {
        println!("No environments configured. Run 'sf-migrate auth setup' to create one.");
        return Ok(());
    }

    let selected_env = match name {
        Some(name) => name,
        None => prompt_environment_selection(&config)?,
    };

    config.set_current_environment(selected_env.clone())?;
    println!("✓ Selected environment: {}\n", selected_env);

    let (_, env) = config.resolve_environment(Some(selected_env.as_str()))?;
    print_environment(&selected_env, env);

    if env.auth_mode() == AuthMode::StoredToken {
        println!("Stored session tokens expire; re-run 'sf-migrate auth setup' when loads start failing with INVALID_SESSION_ID.");
    }

    if check {
        println!("\nTesting authentication...");
        match authenticate(env).await {
            Ok(session) => println!("✓ Authentication successful ({})", session.instance_url),
            Err(e) => {
                error!("Authentication test failed for {}: {}", selected_env, e);
                anyhow::bail!("Authentication failed for '{}': {}", selected_env, e);
            }
        }
    }

    Ok(())
}

use anyhow::Result;
use log::{error, info};

use super::display::{print_environment, print_environment_list};
use crate::api::authenticate;
use crate::config::Config;

/// List environments and show one in detail. Unless `offline`, also obtain a
/// session for it.
pub async fn status_command(name: Option<String>, offline: bool) -> Result<()> {
    info!("Executing auth status command");

    let config = Config::load()?;

    println!("sf-migrate Authentication Status");
    println!("================================");

    if config.environments.is_empty() {
        println!("No environments configured.");
        println!("Run 'sf-migrate auth setup' to create one.");
        return Ok(());
    }

    println!("Configured environments:");
    print_environment_list(&config);

    let (name, env) = match config.resolve_environment(name.as_deref()) {
        Ok(found) => found,
        Err(e) if name.is_some() => return Err(e),
        Err(_) => {
            println!("\nNo current environment selected.");
            println!("Run 'sf-migrate auth select' to choose one.");
            return Ok(());
        }
    };

    println!();
    print_environment(name, env);

    if offline {
        return Ok(());
    }

    println!("\nTesting authentication...");
    match authenticate(env).await {
        Ok(session) => {
            info!("Authentication test successful");
            println!("✓ Authentication successful ({})", session.instance_url);
        }
        Err(e) => {
            error!("Authentication test failed: {}", e);
            println!("✗ Authentication failed: {}", e);
        }
    }

    Ok(())
}

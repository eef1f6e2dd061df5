use anyhow::Result;
use log::info;

use super::display::print_environment_list;
use crate::config::Config;
use crate::ui::prompt_remove_confirmation;

/// Remove an environment, or with `token_only` just its stored access token.
pub async fn remove_command(name: String, force: bool, token_only: bool) -> Result<()> {
    info!("Removing {}: {}", if token_only { "access token" } else { "environment" }, name);

    let mut config = Config::load()?;

    let Some(env) = config.environments.get(&name) else {
        println!("Environment '{}' not found.", name);
        println!("Available environments:");
        print_environment_list(&config);
        return Ok(());
    };

    if token_only {
        if config.forget_access_token(&name)? {
            println!("✓ Forgot stored access token for '{}'", name);
            println!(
                "  Sessions will use the password flow against {}",
                config.environments[&name].login_url
            );
        } else {
            println!("Environment '{}' has no stored access token.", name);
        }
        return Ok(());
    }

    if config.get_current_environment_name() == Some(&name) {
        println!("⚠ Warning: '{}' is the current environment", name);
    }

    let confirm = force || prompt_remove_confirmation(&name, env)?;
    if !confirm {
        println!("Removal cancelled.");
        return Ok(());
    }

    config.remove_environment(&name)?;
    println!("✓ Environment '{}' removed successfully", name);

    if let Some(current) = config.get_current_environment_name() {
        println!("Current environment: {}", current);
    } else if !config.environments.is_empty() {
        println!("No current environment selected. Run 'sf-migrate auth select' to choose one.");
    }

    Ok(())
}

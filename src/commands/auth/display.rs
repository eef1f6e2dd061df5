use colored::Colorize;

use crate::config::{AuthMode, Config, EnvironmentConfig};

/// Labelled connection facts for one environment. Secrets are reduced to
/// whether they are present.
pub fn environment_details(env: &EnvironmentConfig) -> Vec<(&'static str, String)> {
    let mut details = vec![("Login URL", env.login_url.clone())];
    details.push((
        "Instance URL",
        env.instance_url
            .clone()
            .unwrap_or_else(|| "(from token response)".to_string()),
    ));
    if !env.username.is_empty() {
        details.push(("Username", env.username.clone()));
    }
    if !env.client_id.is_empty() {
        details.push(("Client ID", env.client_id.clone()));
    }
    details.push((
        "Org",
        if env.is_sandbox() { "sandbox" } else { "production" }.to_string(),
    ));
    details.push((
        "Access token",
        match (&env.access_token, &env.instance_url) {
            (Some(_), Some(_)) => "stored".to_string(),
            (Some(_), None) => "stored, unusable without an instance URL".to_string(),
            (None, _) => "none".to_string(),
        },
    ));
    details.push(("Auth", env.auth_mode().to_string()));
    details
}

pub fn print_environment(name: &str, env: &EnvironmentConfig) {
    println!("Environment: {}", name.bold());
    for (label, value) in environment_details(env) {
        println!("  {}: {}", label, value);
    }
    if env.auth_mode() == AuthMode::Incomplete {
        println!(
            "{} '{}' cannot authenticate. Run 'sf-migrate auth setup --name {}' to complete it.",
            "⚠".yellow(),
            name,
            name
        );
    }
}

pub fn print_environment_list(config: &Config) {
    let current = config.get_current_environment_name();
    for name in config.list_environments() {
        let env = &config.environments[name];
        if current == Some(name) {
            println!("  ● {} (current)  {}", name, env.summary());
        } else {
            println!("  ○ {}  {}", name, env.summary());
        }
    }
}

use anyhow::Result;
use log::{error, info, warn};

use crate::api::authenticate;
use crate::auth::Credentials;
use crate::config::Config;
use crate::ui::{
    normalize_org_url, prompt_credentials, prompt_environment_name,
    prompt_overwrite_confirmation, prompt_save_anyway_confirmation,
};

pub struct SetupOptions {
    pub name: Option<String>,
    pub login_url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
    pub from_env: bool,
    pub from_env_file: Option<String>,
}

pub async fn setup_command(options: SetupOptions) -> Result<()> {
    info!("Starting auth setup");

    let mut config = Config::load()?;

    let (env_name, credentials, interactive) = if options.from_env {
        let env_name = options.name.unwrap_or_else(|| "from-env".to_string());
        (env_name, Credentials::from_env()?, false)
    } else if let Some(ref env_file_path) = options.from_env_file {
        let env_name = options.name.unwrap_or_else(|| "from-env-file".to_string());
        (env_name, Credentials::from_env_file(env_file_path)?, false)
    } else if let (Some(instance_url), Some(access_token)) =
        (&options.instance_url, &options.access_token)
    {
        let env_name = options.name.unwrap_or_else(|| "cli-session".to_string());
        let credentials = Credentials::from_session(
            options
                .login_url
                .map(|url| normalize_org_url(&url))
                .unwrap_or_else(|| crate::config::DEFAULT_LOGIN_URL.to_string()),
            normalize_org_url(instance_url),
            access_token.clone(),
        );
        (env_name, credentials, false)
    } else if let (Some(username), Some(password), Some(client_id), Some(client_secret)) = (
        &options.username,
        &options.password,
        &options.client_id,
        &options.client_secret,
    ) {
        let env_name = options.name.unwrap_or_else(|| "cli-setup".to_string());
        let credentials = Credentials::from_command_line(
            options
                .login_url
                .map(|url| normalize_org_url(&url))
                .unwrap_or_else(|| crate::config::DEFAULT_LOGIN_URL.to_string()),
            username.clone(),
            password.clone(),
            client_id.clone(),
            client_secret.clone(),
        );
        (env_name, credentials, false)
    } else {
        info!("Starting interactive setup");

        let env_name = prompt_environment_name(options.name)?;

        if let Some(existing) = config.environments.get(&env_name) {
            let overwrite = prompt_overwrite_confirmation(&env_name, existing)?;
            if !overwrite {
                println!("Setup cancelled.");
                return Ok(());
            }
        }

        let credentials = prompt_credentials(
            options.login_url,
            options.username,
            options.password,
            options.client_id,
            options.client_secret,
        )?;
        (env_name, credentials, true)
    };

    if !interactive && config.environments.contains_key(&env_name) {
        warn!("Environment '{}' already exists, overwriting", env_name);
    }

    let environment = credentials.into_environment();
    info!("Environment '{}': {}", env_name, environment.summary());

    println!("\nTesting authentication...");
    match authenticate(&environment).await {
        Ok(session) => {
            info!("Authenticated against {}", session.instance_url);
            println!("✓ Authentication test successful ({})", session.instance_url);
            config.add_environment(env_name.clone(), environment)?;
            println!("✓ Environment '{}' saved successfully", env_name);

            if config.current_environment.as_ref() == Some(&env_name) {
                println!("✓ Set as current environment");
            }
        }
        Err(e) => {
            error!("Authentication test failed: {}", e);
            println!("✗ Authentication test failed: {}", e);

            let save_anyway = if !interactive {
                true
            } else {
                prompt_save_anyway_confirmation()?
            };

            if save_anyway {
                config.add_environment(env_name.clone(), environment)?;
                println!("⚠ Environment '{}' saved (authentication failed)", env_name);
            } else {
                println!("Setup cancelled.");
            }
        }
    }

    Ok(())
}

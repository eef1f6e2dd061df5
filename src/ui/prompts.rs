use anyhow::Result;
use dialoguer::{Input, Password, Select};

use crate::auth::credentials::Credentials;
use crate::config::{Config, DEFAULT_LOGIN_URL, EnvironmentConfig};

pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";

/// Where an org's users log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgType {
    Production,
    Sandbox,
    MyDomain,
}

impl OrgType {
    const ALL: [OrgType; 3] = [OrgType::Production, OrgType::Sandbox, OrgType::MyDomain];

    fn label(self) -> &'static str {
        match self {
            OrgType::Production => "Production / Developer Edition (login.salesforce.com)",
            OrgType::Sandbox => "Sandbox (test.salesforce.com)",
            OrgType::MyDomain => "My Domain URL",
        }
    }

    fn of_url(url: &str) -> OrgType {
        match url.trim_end_matches('/') {
            DEFAULT_LOGIN_URL => OrgType::Production,
            SANDBOX_LOGIN_URL => OrgType::Sandbox,
            _ => OrgType::MyDomain,
        }
    }
}

/// Turn user input into a login or instance URL.
///
/// A bare My Domain name such as `acme` or `acme--uat.sandbox` expands to
/// `https://<name>.my.salesforce.com`; a missing scheme becomes `https://`.
pub fn normalize_org_url(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else if trimmed.contains(".salesforce.com") || trimmed.contains(".force.com") {
        format!("https://{}", trimmed)
    } else {
        format!("https://{}.my.salesforce.com", trimmed)
    }
}

/// Selection list entry for an environment.
pub fn environment_item(name: &str, env: &EnvironmentConfig, current: bool) -> String {
    let marker = if current { " (current)" } else { "" };
    format!("{}{}  {}", name, marker, env.summary())
}

pub fn prompt_environment_name(default_name: Option<String>) -> Result<String> {
    if let Some(name) = default_name {
        Ok(name)
    } else {
        let name = Input::<String>::new()
            .with_prompt("Environment name (e.g., 'source', 'target')")
            .interact()?;
        Ok(name)
    }
}

/// Arrow-key Yes/No selection. Returns `true` for "Yes".
pub fn prompt_confirmation(prompt: &str, default_yes: bool) -> Result<bool> {
    let items = vec!["Yes", "No"];
    let default_index = if default_yes { 0 } else { 1 };

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&items)
        .default(default_index)
        .interact()?;

    Ok(selection == 0)
}

pub fn prompt_overwrite_confirmation(env_name: &str, existing: &EnvironmentConfig) -> Result<bool> {
    prompt_confirmation(
        &format!(
            "Environment '{}' already exists ({}). Overwrite?",
            env_name,
            existing.summary()
        ),
        false,
    )
}

pub fn prompt_save_anyway_confirmation() -> Result<bool> {
    prompt_confirmation("Save configuration anyway?", false)
}

pub fn prompt_remove_confirmation(env_name: &str, env: &EnvironmentConfig) -> Result<bool> {
    let token = if env.access_token.is_some() {
        " and its stored access token"
    } else {
        ""
    };
    prompt_confirmation(
        &format!("Remove environment '{}' ({}){}?", env_name, env.summary(), token),
        false,
    )
}

pub fn prompt_login_url(default: Option<String>) -> Result<String> {
    if let Some(url) = default {
        return Ok(normalize_org_url(&url));
    }

    let items: Vec<&str> = OrgType::ALL.iter().map(|t| t.label()).collect();
    let selection = Select::new()
        .with_prompt("Org type")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(match OrgType::ALL[selection] {
        OrgType::Production => DEFAULT_LOGIN_URL.to_string(),
        OrgType::Sandbox => SANDBOX_LOGIN_URL.to_string(),
        OrgType::MyDomain => {
            let domain = Input::<String>::new()
                .with_prompt("My Domain (e.g. 'acme' or 'acme--uat.sandbox')")
                .interact()?;
            normalize_org_url(&domain)
        }
    })
}

/// Interactive credential entry: either the OAuth password flow or an
/// existing session token. Values already given on the command line are
/// not asked for again.
pub fn prompt_credentials(
    login_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<Credentials> {
    let login_url_val = prompt_login_url(login_url)?;

    let use_session = username.is_none()
        && Select::new()
            .with_prompt("Authenticate with")
            .items(&[
                "Username + password (Connected App)",
                "Existing session (instance URL + access token)",
            ])
            .default(0)
            .interact()?
            == 1;

    if use_session {
        let default_instance = match OrgType::of_url(&login_url_val) {
            OrgType::MyDomain => login_url_val.clone(),
            _ => String::new(),
        };
        let instance_url = Input::<String>::new()
            .with_prompt("Instance URL")
            .default(default_instance)
            .interact()?;
        let access_token = Password::new().with_prompt("Access token").interact()?;
        return Ok(Credentials::from_session(
            login_url_val,
            normalize_org_url(&instance_url),
            access_token,
        ));
    }

    let username_val = if let Some(u) = username {
        u
    } else {
        Input::<String>::new().with_prompt("Username").interact()?
    };

    let password_val = if let Some(p) = password {
        p
    } else {
        Password::new()
            .with_prompt("Password (with security token appended if required)")
            .interact()?
    };

    let client_id_val = if let Some(c) = client_id {
        c
    } else {
        Input::<String>::new()
            .with_prompt("Connected App Consumer Key")
            .interact()?
    };

    let client_secret_val = if let Some(s) = client_secret {
        s
    } else {
        Password::new()
            .with_prompt("Connected App Consumer Secret")
            .interact()?
    };

    Ok(Credentials {
        login_url: login_url_val,
        username: username_val,
        password: password_val,
        client_id: client_id_val,
        client_secret: client_secret_val,
        instance_url: None,
        access_token: None,
    })
}

pub fn prompt_environment_selection(config: &Config) -> Result<String> {
    let current = config.get_current_environment_name();
    let names = config.list_environments();
    let items: Vec<String> = names
        .iter()
        .map(|name| environment_item(name, &config.environments[*name], current == Some(*name)))
        .collect();
    let default = names.iter().position(|name| current == Some(*name)).unwrap_or(0);

    let selection = Select::new()
        .with_prompt("Select environment")
        .items(&items)
        .default(default)
        .interact()?;

    Ok(names[selection].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_org_url() {
        assert_eq!(normalize_org_url("acme"), "https://acme.my.salesforce.com");
        assert_eq!(
            normalize_org_url("acme--uat.sandbox"),
            "https://acme--uat.sandbox.my.salesforce.com"
        );
        assert_eq!(
            normalize_org_url(" acme.my.salesforce.com/ "),
            "https://acme.my.salesforce.com"
        );
        assert_eq!(normalize_org_url("https://test.salesforce.com/"), SANDBOX_LOGIN_URL);
    }

    #[test]
    fn test_org_type_of_url() {
        assert_eq!(OrgType::of_url("https://login.salesforce.com/"), OrgType::Production);
        assert_eq!(OrgType::of_url(SANDBOX_LOGIN_URL), OrgType::Sandbox);
        assert_eq!(OrgType::of_url("https://acme.my.salesforce.com"), OrgType::MyDomain);
    }

    #[test]
    fn test_environment_item_marks_current() {
        let env = Credentials::from_session(
            SANDBOX_LOGIN_URL.to_string(),
            "https://acme--uat.sandbox.my.salesforce.com".to_string(),
            "00Dxx!token".to_string(),
        )
        .into_environment();

        assert_eq!(
            environment_item("uat", &env, true),
            "uat (current)  - @ https://acme--uat.sandbox.my.salesforce.com [sandbox, stored token]"
        );
        assert!(!environment_item("uat", &env, false).contains("current"));
    }
}

use log::{debug, info};
use serde::Deserialize;

use crate::config::EnvironmentConfig;
use crate::error::LoadError;

/// An authenticated org session.
#[derive(Clone)]
pub struct Session {
    pub instance_url: String,
    pub access_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    instance_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Obtain a session for an environment.
///
/// A stored access token is used as-is; otherwise the OAuth 2.0
/// username-password flow runs against the environment's login URL.
pub async fn authenticate(env: &EnvironmentConfig) -> Result<Session, LoadError> {
    if let (Some(token), Some(instance_url)) = (&env.access_token, &env.instance_url) {
        debug!("Using stored access token for {}", instance_url);
        return Ok(Session {
            instance_url: instance_url.clone(),
            access_token: token.clone(),
        });
    }

    let token_url = format!(
        "{}/services/oauth2/token",
        env.login_url.trim_end_matches('/')
    );
    info!("Authenticating {} against {}", env.username, env.login_url);

    let client = reqwest::Client::new();
    let response = client
        .post(&token_url)
        .form(&[
            ("grant_type", "password"),
            ("client_id", env.client_id.as_str()),
            ("client_secret", env.client_secret.as_str()),
            ("username", env.username.as_str()),
            ("password", env.password.as_str()),
        ])
        .send()
        .await?;

    debug!("Token request status: {}", response.status());

    if response.status().is_success() {
        let token: TokenResponse = response.json().await?;
        info!("Authenticated, instance {}", token.instance_url);
        Ok(Session {
            instance_url: env.instance_url.clone().unwrap_or(token.instance_url),
            access_token: token.access_token,
        })
    } else {
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<TokenError>(&body) {
            Ok(err) => format!(
                "{}: {}",
                err.error,
                err.error_description.unwrap_or_default()
            ),
            Err(_) => body,
        };
        Err(LoadError::Platform(format!("Authentication failed: {}", message)))
    }
}

//! Provider setting resolution
//!
//! Every setting is resolved with the same precedence:
//!
//! 1. the explicit value from the provider configuration
//! 2. the matching `CLOUDTOWER_*` environment variable
//! 3. an error naming every setting that is still missing
//!
//! A resolved token makes username and password optional.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};

pub const ENV_USER: &str = "CLOUDTOWER_USER";
pub const ENV_PASSWORD: &str = "CLOUDTOWER_PASSWORD";
pub const ENV_SERVER: &str = "CLOUDTOWER_SERVER";
pub const ENV_TOKEN: &str = "CLOUDTOWER_TOKEN";

/// Provider block as written by the user. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub cloudtower_server: Option<String>,
    pub token: Option<String>,
}

impl ProviderSettings {
    /// Fill unset fields from `other`. Fields already set on `self` win.
    pub fn or(self, other: ProviderSettings) -> Self {
        Self {
            username: self.username.or(other.username),
            password: self.password.or(other.password),
            cloudtower_server: self.cloudtower_server.or(other.cloudtower_server),
            token: self.token.or(other.token),
        }
    }
}

/// How the client authenticates against Cloudtower
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-issued token, no login round trip
    Token(String),
    /// Log in with a local account to obtain a token
    Login { username: String, password: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Host (and optional port) of the Cloudtower server
    pub server: String,
    /// URL scheme, `http` unless the configured server says otherwise
    pub scheme: String,
    pub credentials: Credentials,
}

impl ResolvedConfig {
    /// `scheme://server` without a trailing slash
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.server)
    }
}

/// Resolve settings against the process environment
pub fn resolve(settings: &ProviderSettings) -> Result<ResolvedConfig> {
    resolve_with(settings, |key| std::env::var(key).ok())
}

/// Resolve settings against an arbitrary environment lookup
pub fn resolve_with<F>(settings: &ProviderSettings, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let pick = |explicit: &Option<String>, key: &str| -> String {
        match explicit {
            Some(value) => value.clone(),
            None => env(key).unwrap_or_default(),
        }
    };

    let mut missing = Vec::new();

    let token = pick(&settings.token, ENV_TOKEN);
    let credentials = if token.is_empty() {
        let username = pick(&settings.username, ENV_USER);
        if username.is_empty() {
            missing.push("username".to_string());
        }
        let password = pick(&settings.password, ENV_PASSWORD);
        if password.is_empty() {
            missing.push("password".to_string());
        }
        Credentials::Login { username, password }
    } else {
        Credentials::Token(token)
    };

    let server = pick(&settings.cloudtower_server, ENV_SERVER);
    if server.is_empty() {
        missing.push("cloudtower_server".to_string());
    }

    if !missing.is_empty() {
        return Err(ConfigError::MissingFields(missing));
    }

    let (scheme, server) = split_scheme(&server)?;
    Ok(ResolvedConfig {
        server,
        scheme,
        credentials,
    })
}

fn split_scheme(raw: &str) -> Result<(String, String)> {
    let raw = raw.trim();
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
        None => ("http".to_string(), raw),
    };
    let host = rest.trim_end_matches('/');

    if host.is_empty()
        || host.contains(char::is_whitespace)
        || !(scheme == "http" || scheme == "https")
    {
        return Err(ConfigError::InvalidServer(raw.to_string()));
    }
    Ok((scheme, host.to_string()))
}

//! Process configuration: API credential and base URL.
//!
//! Both are resolved once at startup. A missing token is fatal; the server
//! never starts with an empty credential.

use std::fmt;

/// Environment variable holding the Swarmia API token.
pub const TOKEN_ENV: &str = "SWARMIA_API_TOKEN";

/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "SWARMIA_BASE_URL";

/// Swarmia Export API base URL.
pub const DEFAULT_BASE_URL: &str = "https://app.swarmia.com/api/v0";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SWARMIA_API_TOKEN environment variable is required")]
    MissingToken,
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Opaque API token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, rejecting blank values.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(Self(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub credential: Credential,
}

impl Config {
    pub fn new(base_url: &str, credential: Credential) -> Result<Self, ConfigError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            base_url,
            credential,
        })
    }

    /// Resolve from the process environment.
    ///
    /// `base_url_override` (the `--base-url` flag) wins over `SWARMIA_BASE_URL`.
    pub fn from_env(base_url_override: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup(base_url_override, |key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn from_lookup<F>(base_url_override: Option<&str>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = Credential::new(lookup(TOKEN_ENV).unwrap_or_default())?;
        let base_url = match base_url_override {
            Some(url) => url.to_string(),
            None => lookup(BASE_URL_ENV)
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };
        Self::new(&base_url, credential)
    }
}

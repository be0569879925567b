//! Client configuration.

use crate::error::ClientError;
use std::time::Duration;
use url::Url;

/// Default API location, matching the development server.
pub const DEFAULT_API_URL: &str = "http://localhost:3030/api/documents";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Where and how to reach the template API.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// API root; always ends with `/` so endpoint paths join beneath it.
    pub base_url: String,
    /// Sent as `X-CSRFToken` on unsafe methods.
    pub csrf_token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("{}/", DEFAULT_API_URL),
            csrf_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a config for the given API root.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?.to_string(),
            ..Self::default()
        })
    }

    /// Parse the API root.
    pub fn base(&self) -> Result<Url, ClientError> {
        parse_base_url(&self.base_url)
    }

    /// Read `DOCBUILDER_API_URL` and `DOCBUILDER_CSRF_TOKEN` from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let base_url = lookup("DOCBUILDER_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let mut config = Self::new(&base_url)?;
        config.csrf_token = lookup("DOCBUILDER_CSRF_TOKEN").filter(|t| !t.is_empty());
        Ok(config)
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Take the CSRF token from a raw `Cookie` header, if it has one.
    pub fn with_cookie_header(mut self, cookie: &str) -> Self {
        if let Some(token) = csrf_token_from_cookie(cookie) {
            self.csrf_token = Some(token);
        }
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Extract the `csrftoken` value from a `name=value; name=value` cookie string.
pub fn csrf_token_from_cookie(cookie: &str) -> Option<String> {
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CSRF_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ClientError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

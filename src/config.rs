//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const API_URL_VAR: &str = "AUTHFLOW_API_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "AUTHFLOW_REQUEST_TIMEOUT_SECS";
pub const CONNECT_TIMEOUT_VAR: &str = "AUTHFLOW_CONNECT_TIMEOUT_SECS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL '{0}' (expected http:// or https://)")]
    InvalidApiUrl(String),
    #[error("invalid value for {var}: '{value}' is not a whole number of seconds")]
    InvalidNumber { var: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to, without trailing `/`.
    pub api_url: String,
    pub timeouts: Timeouts,
}

impl ClientConfig {
    /// Config for an explicit base URL with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the URL is not http(s).
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self { api_url: normalize_api_url(api_url)?, timeouts: Timeouts::default() })
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `AUTHFLOW_API_URL`: default `http://localhost:8080/api/v1`
    /// - `AUTHFLOW_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTHFLOW_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the URL or a timeout value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = std::env::var(API_URL_VAR).unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let api_url = normalize_api_url(&raw_url)?;
        let timeouts = Timeouts {
            request_secs: env_parse_u64(REQUEST_TIMEOUT_VAR, DEFAULT_REQUEST_TIMEOUT_SECS)?,
            connect_secs: env_parse_u64(CONNECT_TIMEOUT_VAR, DEFAULT_CONNECT_TIMEOUT_SECS)?,
        };
        Ok(Self { api_url, timeouts })
    }

    /// Full URL for an endpoint path such as `/auth/login`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidApiUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn env_parse_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { var: key.to_owned(), value: raw }),
        Err(_) => Ok(default),
    }
}

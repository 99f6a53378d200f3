//! Run configuration
//!
//! Built once from the parsed command line and handed to the runner. There is
//! no config file; every setting comes from arguments.

use crate::cli::Cli;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Username cannot be empty")]
    EmptyUsername,
}

/// Validated settings for one conformance run
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL without trailing slash
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    /// Apply content-level assertions on top of shape checks
    pub strict: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&cli.base_url)?;

        if cli.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }

        Ok(Config {
            base_url,
            username: cli.username.clone(),
            password: cli.password.clone(),
            timeout: Duration::from_secs(cli.timeout_secs),
            strict: cli.strict,
        })
    }
}

/// Parse as an absolute http(s) URL with a host, then drop trailing slashes
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(invalid(format!(
                "unsupported scheme '{}', expected http or https",
                other
            )));
        }
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

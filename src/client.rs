//! Blocking HTTP access to the procurement service
//!
//! Non-2xx statuses are returned as regular responses; only connection, timeout
//! and body-read problems become errors.

use crate::auth::Credential;
use crate::query::ListingQuery;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const LISTING_PATH: &str = "/api/procurement/delivery-requests";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Failed to read response from {url}: {message}")]
    Body { url: String, message: String },
}

/// Status code and raw body of one exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
}

impl ApiClient {
    /// `base_url` must already be normalized (no trailing slash)
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /api/auth/login` with a JSON body
    pub fn post_login(&self, username: &str, password: &str) -> Result<HttpResponse, TransportError> {
        let url = self.url(LOGIN_PATH);
        let body = serde_json::json!({
            "username": username,
            "password": password,
        })
        .to_string();

        debug!(%url, username, "sending login request");

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .send(body.as_str())
            .map_err(|e| TransportError::Request {
                url: url.clone(),
                message: e.to_string(),
            })?;

        read_response(&url, response)
    }

    /// `GET /api/procurement/delivery-requests`, authenticated when a credential is given
    pub fn get_listing(
        &self,
        query: &ListingQuery,
        credential: Option<&Credential>,
    ) -> Result<HttpResponse, TransportError> {
        let url = self.url(LISTING_PATH);
        let mut request = self.agent.get(&url).header("Accept", "application/json");

        for (key, value) in query.params() {
            request = request.query(key, value);
        }
        if let Some(credential) = credential {
            request = request.header("Authorization", credential.bearer_header());
        }

        debug!(%url, %query, authenticated = credential.is_some(), "sending listing request");

        let response = request.call().map_err(|e| TransportError::Request {
            url: url.clone(),
            message: e.to_string(),
        })?;

        read_response(&url, response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn read_response(
    url: &str,
    response: ureq::http::Response<ureq::Body>,
) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response
        .into_body()
        .read_to_string()
        .map_err(|e| TransportError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    debug!(url, status, bytes = body.len(), "received response");

    Ok(HttpResponse { status, body })
}

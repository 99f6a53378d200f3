//! Login against the service and the bearer credential it yields

use crate::api::{self, DecodeError, Envelope, LoginData};
use crate::client::{ApiClient, TransportError};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("login returned HTTP {status}")]
    Http { status: u16 },

    #[error("login rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("login response does not match the contract: {0}")]
    Contract(#[from] DecodeError),
}

/// Opaque bearer token, valid for the whole run
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value for the `Authorization` header
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Obtain a credential. Any failure here is fatal to the run.
pub fn login(client: &ApiClient, username: &str, password: &str) -> Result<Credential, AuthError> {
    let response = client.post_login(username, password)?;

    if response.status != 200 {
        warn!(status = response.status, "login failed with HTTP error");
        return Err(AuthError::Http {
            status: response.status,
        });
    }

    match api::decode::<LoginData>(&response.body)? {
        Envelope::Success { data, .. } => {
            if data.token.trim().is_empty() {
                return Err(AuthError::Contract(DecodeError::Shape(
                    "'token' is empty".to_string(),
                )));
            }
            info!(username, "logged in");
            Ok(Credential::new(data.token))
        }
        Envelope::Failure { message } => Err(AuthError::Rejected { message }),
    }
}

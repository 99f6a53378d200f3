//! Conformance checks against the delivery-request listing endpoint
//!
//! Each check is a plain function from [`CheckContext`] to [`CheckReport`].
//! Checks never panic or return errors: transport and decoding problems are
//! folded into a failed report so the run always continues.

pub mod basic;
pub mod errors;
pub mod filters;

use crate::api::{self, Contract, Envelope};
use crate::auth::Credential;
use crate::client::{ApiClient, TransportError};
use crate::query::ListingQuery;
use thiserror::Error;
use tracing::debug;

/// Everything a check may use
pub struct CheckContext<'a> {
    pub client: &'a ApiClient,
    pub credential: &'a Credential,
    /// Assert response content, not only shape
    pub strict: bool,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("expected HTTP {expected}, got {actual}{}", detail_suffix(.detail))]
    HttpStatusMismatch {
        expected: u16,
        actual: u16,
        detail: Option<String>,
    },

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("service reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),

    #[error("{failed} of {total} sub-checks failed")]
    SubChecksFailed { failed: usize, total: usize },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

impl From<TransportError> for CheckFailure {
    fn from(err: TransportError) -> Self {
        CheckFailure::Transport(err.to_string())
    }
}

impl From<api::DecodeError> for CheckFailure {
    fn from(err: api::DecodeError) -> Self {
        CheckFailure::ContractViolation(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Pass,
    Fail(CheckFailure),
}

/// Result of one check or sub-check
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub name: &'static str,
    pub outcome: CheckOutcome,
    /// Informational lines, e.g. counts and totals
    pub notes: Vec<String>,
    pub sub_checks: Vec<CheckReport>,
}

impl CheckReport {
    pub fn from_result(name: &'static str, result: Result<Vec<String>, CheckFailure>) -> Self {
        let (outcome, notes) = match result {
            Ok(notes) => (CheckOutcome::Pass, notes),
            Err(failure) => (CheckOutcome::Fail(failure), Vec::new()),
        };
        Self {
            name,
            outcome,
            notes,
            sub_checks: Vec::new(),
        }
    }

    /// Passes only when every sub-check passed
    pub fn aggregate(name: &'static str, sub_checks: Vec<CheckReport>) -> Self {
        let failed = sub_checks.iter().filter(|c| !c.passed()).count();
        let outcome = if failed == 0 {
            CheckOutcome::Pass
        } else {
            CheckOutcome::Fail(CheckFailure::SubChecksFailed {
                failed,
                total: sub_checks.len(),
            })
        };
        Self {
            name,
            outcome,
            notes: Vec::new(),
            sub_checks,
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self.outcome, CheckOutcome::Pass)
    }

    pub fn failure(&self) -> Option<&CheckFailure> {
        match &self.outcome {
            CheckOutcome::Pass => None,
            CheckOutcome::Fail(failure) => Some(failure),
        }
    }
}

/// A named top-level check
pub struct Check {
    pub name: &'static str,
    pub run: fn(&CheckContext) -> CheckReport,
}

/// Top-level checks in execution order
pub fn all() -> Vec<Check> {
    vec![
        Check {
            name: basic::NAME,
            run: basic::run,
        },
        Check {
            name: filters::NAME,
            run: filters::run,
        },
        Check {
            name: errors::NAME,
            run: errors::run,
        },
    ]
}

/// Authenticated listing call that must answer 200 with a successful envelope
pub(crate) fn fetch_listing<T: Contract>(
    ctx: &CheckContext,
    query: &ListingQuery,
) -> Result<T, CheckFailure> {
    let response = ctx.client.get_listing(query, Some(ctx.credential))?;

    if response.status != 200 {
        return Err(CheckFailure::HttpStatusMismatch {
            expected: 200,
            actual: response.status,
            detail: api::failure_message(&response.body).or_else(|| snippet(&response.body)),
        });
    }

    match api::decode::<T>(&response.body)? {
        Envelope::Success { data, message } => {
            debug!(%query, ?message, "listing accepted");
            Ok(data)
        }
        Envelope::Failure { message } => {
            debug!(%query, ?message, "listing returned success=false");
            Err(CheckFailure::Rejected(message))
        }
    }
}

/// First line of a non-JSON body, shortened for display
fn snippet(body: &str) -> Option<String> {
    let line = body.lines().map(str::trim).find(|l| !l.is_empty())?;
    let mut short: String = line.chars().take(120).collect();
    if short.len() < line.len() {
        short.push_str("...");
    }
    Some(short)
}

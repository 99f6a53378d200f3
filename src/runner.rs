//! Sequences login and the top-level checks into one run

use crate::auth::{self, AuthError};
use crate::checks::{self, CheckContext, CheckReport};
use crate::client::ApiClient;
use crate::config::Config;
use chrono::{DateTime, Local};
use tracing::{info, warn};

/// Progress notifications emitted while the run advances
pub enum Progress<'a> {
    LoggedIn { username: &'a str },
    CheckFinished(&'a CheckReport),
}

#[derive(Debug)]
pub struct RunReport {
    pub base_url: String,
    pub started_at: DateTime<Local>,
    pub strict: bool,
    pub checks: Vec<CheckReport>,
}

impl RunReport {
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    pub fn total(&self) -> usize {
        self.checks.len()
    }

    pub fn all_passed(&self) -> bool {
        self.passed_count() == self.total()
    }
}

/// Log in, then run every check in order
///
/// Only a login failure aborts the run; check failures are recorded.
pub fn run(
    config: &Config,
    mut on_progress: impl FnMut(Progress<'_>),
) -> Result<RunReport, AuthError> {
    let started_at = Local::now();
    let client = ApiClient::new(&config.base_url, config.timeout);

    let credential = auth::login(&client, &config.username, &config.password)?;
    on_progress(Progress::LoggedIn {
        username: &config.username,
    });

    let ctx = CheckContext {
        client: &client,
        credential: &credential,
        strict: config.strict,
    };

    let mut reports = Vec::new();
    for check in checks::all() {
        info!(check = check.name, "running check");
        let report = (check.run)(&ctx);
        if let Some(failure) = report.failure() {
            warn!(check = check.name, %failure, "check failed");
        }
        on_progress(Progress::CheckFinished(&report));
        reports.push(report);
    }

    Ok(RunReport {
        base_url: client.base_url().to_string(),
        started_at,
        strict: config.strict,
        checks: reports,
    })
}

//! Error responses: authorization and input validation happen before any
//! business logic, regardless of data content.

use super::{CheckContext, CheckFailure, CheckReport};
use crate::api::{self, DecodeError};
use crate::query::{ListingQuery, MAX_PAGE_SIZE};

pub const NAME: &str = "error responses";

pub fn run(ctx: &CheckContext) -> CheckReport {
    let mut sub_checks = vec![
        CheckReport::from_result("missing credential", unauthenticated(ctx)),
        CheckReport::from_result(
            "invalid parameters",
            expect_bad_request(
                ctx,
                &ListingQuery::new(-1, MAX_PAGE_SIZE * 2).with_start_date("invalid-date"),
            ),
        ),
    ];

    if ctx.strict {
        let isolated = [
            ("negative page", ListingQuery::new(-1, 10)),
            ("oversized pageSize", ListingQuery::new(1, MAX_PAGE_SIZE * 2)),
            (
                "malformed startDate",
                ListingQuery::new(1, 10).with_start_date("invalid-date"),
            ),
        ];
        for (name, query) in isolated {
            sub_checks.push(CheckReport::from_result(
                name,
                expect_bad_request(ctx, &query),
            ));
        }
    }

    CheckReport::aggregate(NAME, sub_checks)
}

/// The listing query without an `Authorization` header must yield exactly 401
fn unauthenticated(ctx: &CheckContext) -> Result<Vec<String>, CheckFailure> {
    let response = ctx.client.get_listing(&ListingQuery::new(1, 10), None)?;

    if response.status != 401 {
        return Err(CheckFailure::HttpStatusMismatch {
            expected: 401,
            actual: response.status,
            detail: None,
        });
    }

    let mut notes = vec!["HTTP 401".to_string()];
    if let Some(message) = api::failure_message(&response.body) {
        notes.push(format!("message: {}", message));
    }
    Ok(notes)
}

/// An authenticated out-of-contract query must yield 400 with
/// `success: false` and a non-empty message
fn expect_bad_request(
    ctx: &CheckContext,
    query: &ListingQuery,
) -> Result<Vec<String>, CheckFailure> {
    let response = ctx.client.get_listing(query, Some(ctx.credential))?;

    if response.status != 400 {
        return Err(CheckFailure::HttpStatusMismatch {
            expected: 400,
            actual: response.status,
            detail: Some(query.to_string()),
        });
    }

    match api::decode_failure(&response.body) {
        Ok(Some(message)) => Ok(vec![format!("message: {}", message)]),
        Ok(None) => Err(CheckFailure::ContractViolation(
            "400 response carries no message".to_string(),
        )),
        Err(DecodeError::UnexpectedSuccess) => Err(CheckFailure::ContractViolation(
            "400 response has success=true".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

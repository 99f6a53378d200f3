//! Basic listing: one authenticated first page with default size

use super::{CheckContext, CheckFailure, CheckReport, fetch_listing};
use crate::api::ListingPage;
use crate::output::format_amount;
use crate::query::ListingQuery;

pub const NAME: &str = "basic listing";

pub fn run(ctx: &CheckContext) -> CheckReport {
    let query = ListingQuery::new(1, 10);
    CheckReport::from_result(NAME, basic_listing(ctx, &query))
}

fn basic_listing(ctx: &CheckContext, query: &ListingQuery) -> Result<Vec<String>, CheckFailure> {
    let page: ListingPage = fetch_listing(ctx, query)?;

    if ctx.strict {
        assert_pagination(query, &page)?;
    }

    let mut notes = vec![
        format!("page: {}", page.page),
        format!("pageSize: {}", page.page_size),
        format!("total: {}", page.total),
        format!("totalAmount: {}", format_amount(page.total_amount)),
        format!("jodalTotalAmount: {}", format_amount(page.jodal_total_amount)),
        format!("masTotalAmount: {}", format_amount(page.mas_total_amount)),
        format!("items: {}", page.items.len()),
    ];

    // The record schema is deliberately not pinned; the key set is informational
    if let Some(first) = page.items.first() {
        notes.push(format!("first item fields: {}", first.field_names().join(", ")));
    }

    Ok(notes)
}

/// Page echo and size invariants of a successful listing
pub(crate) fn assert_pagination(
    query: &ListingQuery,
    page: &ListingPage,
) -> Result<(), CheckFailure> {
    let item_count = page.items.len() as u64;

    if i64::try_from(page.page).ok() != Some(query.page) {
        return Err(CheckFailure::ContractViolation(format!(
            "requested page {} but response says page {}",
            query.page, page.page
        )));
    }
    if i64::try_from(page.page_size).ok() != Some(query.page_size) {
        return Err(CheckFailure::ContractViolation(format!(
            "requested pageSize {} but response says pageSize {}",
            query.page_size, page.page_size
        )));
    }
    if item_count > page.page_size {
        return Err(CheckFailure::ContractViolation(format!(
            "{} items returned for pageSize {}",
            item_count, page.page_size
        )));
    }
    if page.total < item_count {
        return Err(CheckFailure::ContractViolation(format!(
            "total {} is smaller than the {} items returned",
            page.total, item_count
        )));
    }

    Ok(())
}

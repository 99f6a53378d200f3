//! Filter/sort matrix: each probe varies one dimension of the query
//!
//! Shallow by default: a probe passes when the service accepts the query and
//! returns a well-shaped page. In strict mode the returned items must also
//! satisfy the filter or sort that was requested, and an ascending sort probe
//! is added so that `sortOrder` is shown to take effect.

use super::{CheckContext, CheckFailure, CheckReport, fetch_listing};
use crate::api::{DeliveryRequest, ListingSlice, SortKey};
use crate::query::{Category, ListingQuery, SortOrder};
use chrono::NaiveDate;

pub const NAME: &str = "filter and sort";

const PAGE_SIZE: i64 = 5;

type Predicate = fn(&ListingQuery, &[DeliveryRequest]) -> Result<(), String>;

struct Probe {
    name: &'static str,
    query: ListingQuery,
    predicate: Predicate,
}

fn probes(strict: bool) -> Vec<Probe> {
    let mut probes = vec![
        Probe {
            name: "date range",
            query: ListingQuery::new(1, PAGE_SIZE).with_date_range("2024-01-01", "2024-12-31"),
            predicate: within_date_range,
        },
        Probe {
            name: "category (조달)",
            query: ListingQuery::new(1, PAGE_SIZE).with_category(Category::Jodal),
            predicate: matches_category,
        },
        Probe {
            name: "product name search",
            query: ListingQuery::new(1, PAGE_SIZE).with_product_search("감시"),
            predicate: product_name_contains,
        },
        Probe {
            name: "institution search",
            query: ListingQuery::new(1, PAGE_SIZE).with_institution_search("경기도"),
            predicate: institution_contains,
        },
        Probe {
            name: "sort by receipt date",
            query: ListingQuery::new(1, PAGE_SIZE).with_sort("dlvrReqRcptDate", SortOrder::Desc),
            predicate: sorted,
        },
    ];
    if strict {
        probes.push(Probe {
            name: "sort by receipt date (asc)",
            query: ListingQuery::new(1, PAGE_SIZE).with_sort("dlvrReqRcptDate", SortOrder::Asc),
            predicate: sorted,
        });
    }
    probes
}

pub fn run(ctx: &CheckContext) -> CheckReport {
    let sub_checks = probes(ctx.strict)
        .iter()
        .map(|probe| CheckReport::from_result(probe.name, run_probe(ctx, probe)))
        .collect();
    CheckReport::aggregate(NAME, sub_checks)
}

fn run_probe(ctx: &CheckContext, probe: &Probe) -> Result<Vec<String>, CheckFailure> {
    let slice: ListingSlice = fetch_listing(ctx, &probe.query)?;

    if ctx.strict {
        (probe.predicate)(&probe.query, &slice.items).map_err(CheckFailure::ContractViolation)?;
    }

    Ok(vec![
        format!("items: {}", slice.items.len()),
        format!("total: {}", slice.total),
    ])
}

fn within_date_range(query: &ListingQuery, items: &[DeliveryRequest]) -> Result<(), String> {
    let start = parse_bound(query.start_date.as_deref())?;
    let end = parse_bound(query.end_date.as_deref())?;

    for (index, item) in items.iter().enumerate() {
        let date = item
            .receipt_date()
            .ok_or_else(|| format!("item {} has no readable dlvrReqRcptDate", index))?;
        if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
            return Err(format!(
                "item {} dated {} is outside the requested range",
                index, date
            ));
        }
    }
    Ok(())
}

fn parse_bound(raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("bad bound '{}': {}", s, e))
    })
    .transpose()
}

fn matches_category(query: &ListingQuery, items: &[DeliveryRequest]) -> Result<(), String> {
    let Some(category) = query.category else {
        return Ok(());
    };
    for (index, item) in items.iter().enumerate() {
        match item.category() {
            Some(value) if category.matches(value) => {}
            Some(value) => {
                return Err(format!(
                    "item {} has exclcProdctYn '{}', expected {}",
                    index, value, category
                ));
            }
            None => return Err(format!("item {} has no exclcProdctYn", index)),
        }
    }
    Ok(())
}

fn product_name_contains(query: &ListingQuery, items: &[DeliveryRequest]) -> Result<(), String> {
    contains_term(
        items,
        query.product_search.as_deref(),
        "prdctClsfcNoNm",
        DeliveryRequest::product_class_name,
    )
}

fn institution_contains(query: &ListingQuery, items: &[DeliveryRequest]) -> Result<(), String> {
    contains_term(
        items,
        query.institution_search.as_deref(),
        "dminsttNm",
        DeliveryRequest::institution_name,
    )
}

fn contains_term(
    items: &[DeliveryRequest],
    term: Option<&str>,
    field: &str,
    read: fn(&DeliveryRequest) -> Option<&str>,
) -> Result<(), String> {
    let Some(term) = term else {
        return Ok(());
    };
    for (index, item) in items.iter().enumerate() {
        match read(item) {
            Some(value) if value.contains(term) => {}
            Some(value) => {
                return Err(format!(
                    "item {} has {} '{}', which does not contain '{}'",
                    index, field, value, term
                ));
            }
            None => return Err(format!("item {} has no {}", index, field)),
        }
    }
    Ok(())
}

fn sorted(query: &ListingQuery, items: &[DeliveryRequest]) -> Result<(), String> {
    let Some(field) = query.sort_by.as_deref() else {
        return Ok(());
    };
    let order = query.sort_order.unwrap_or(SortOrder::Desc);
    let keys: Vec<Option<SortKey>> = items.iter().map(|item| item.sort_key(field)).collect();

    // Records without a value sort last in descending order and first in
    // ascending order, so only that end of the page may hold them.
    let (start, end) = match order {
        SortOrder::Desc => {
            let last = keys.iter().rposition(Option::is_some);
            (0, last.map_or(0, |i| i + 1))
        }
        SortOrder::Asc => {
            let first = keys.iter().position(Option::is_some);
            (first.unwrap_or(keys.len()), keys.len())
        }
    };

    let mut previous: Option<&SortKey> = None;
    for (index, key) in keys.iter().enumerate().take(end).skip(start) {
        let Some(key) = key else {
            return Err(format!("item {} has no {}", index, field));
        };
        if let Some(prev) = previous {
            let out_of_order = match order {
                SortOrder::Asc => prev > key,
                SortOrder::Desc => prev < key,
            };
            if out_of_order {
                return Err(format!(
                    "items {} and {} are not in {} order by {}",
                    index - 1,
                    index,
                    order,
                    field
                ));
            }
        }
        previous = Some(key);
    }
    Ok(())
}

//! Query parameters of the delivery-request listing endpoint
//!
//! `page` and `pageSize` are signed and dates are plain strings so that
//! out-of-contract requests can be expressed with the same type.

use std::fmt;

/// Largest `pageSize` the service documents
pub const MAX_PAGE_SIZE: i64 = 100;

/// `exclcProdctYn` filter values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// 조달, direct procurement
    Jodal,
    /// 마스, multiple award schedule
    Mas,
}

impl Category {
    pub fn as_param(&self) -> &'static str {
        match self {
            Category::Jodal => "조달",
            Category::Mas => "마스",
        }
    }

    /// Category named by a record's `exclcProdctYn` value.
    ///
    /// Older records carry the excellent-product flag (`Y` for 조달, `N` for
    /// 마스) instead of the label.
    pub fn from_value(value: &str) -> Option<Self> {
        match value.trim() {
            "조달" | "Y" | "y" => Some(Category::Jodal),
            "마스" | "N" | "n" => Some(Category::Mas),
            _ => None,
        }
    }

    /// Whether a record's `exclcProdctYn` value belongs to this category
    pub fn matches(&self, value: &str) -> bool {
        Category::from_value(value) == Some(*self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// One listing request
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub page: i64,
    pub page_size: i64,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<Category>,
    pub product_search: Option<String>,
    pub institution_search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl ListingQuery {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page,
            page_size,
            start_date: None,
            end_date: None,
            category: None,
            product_search: None,
            institution_search: None,
            sort_by: None,
            sort_order: None,
        }
    }

    pub fn with_date_range(mut self, start: &str, end: &str) -> Self {
        self.start_date = Some(start.to_string());
        self.end_date = Some(end.to_string());
        self
    }

    pub fn with_start_date(mut self, start: &str) -> Self {
        self.start_date = Some(start.to_string());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_product_search(mut self, term: &str) -> Self {
        self.product_search = Some(term.to_string());
        self
    }

    pub fn with_institution_search(mut self, term: &str) -> Self {
        self.institution_search = Some(term.to_string());
        self
    }

    pub fn with_sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by = Some(field.to_string());
        self.sort_order = Some(order);
        self
    }

    /// Wire parameters in a stable order; unset filters are omitted
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ];

        let optional = [
            ("startDate", self.start_date.clone()),
            ("endDate", self.end_date.clone()),
            ("exclcProdctYn", self.category.map(|c| c.to_string())),
            ("prdctClsfcNoNmSearch", self.product_search.clone()),
            ("dminsttNm", self.institution_search.clone()),
            ("sortBy", self.sort_by.clone()),
            ("sortOrder", self.sort_order.map(|o| o.to_string())),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v))),
        );

        params
    }
}

impl fmt::Display for ListingQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .params()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        write!(f, "{}", rendered.join("&"))
    }
}

//! This module defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum records to return per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The pagination query parameters of a list request.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// The 1-based page number.
    pub page: Option<u64>,
    /// The number of records per page.
    pub per_page: Option<u64>,
}

/// A resolved page request, ready to be turned into a SQL limit and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The 1-based page number.
    pub number: u64,
    /// The number of records per page.
    pub size: u64,
}

impl Page {
    /// Resolve the raw query parameters against the application defaults.
    ///
    /// Out of range values are clamped rather than rejected: page 0 becomes
    /// page 1 and oversized page sizes become the configured maximum.
    pub fn resolve(query: PageQuery, config: &PaginationConfig) -> Self {
        let number = query.page.unwrap_or(config.default_page).max(1);
        let size = query
            .per_page
            .unwrap_or(config.default_page_size)
            .clamp(1, config.max_page_size);

        Self { number, size }
    }

    /// The SQL limit for this page.
    pub fn limit(&self) -> u64 {
        self.size
    }

    /// The SQL offset for this page.
    pub fn offset(&self) -> u64 {
        (self.number - 1) * self.size
    }

    /// How many pages a result set of `total` records spans.
    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.size)
    }
}

/// The envelope wrapped around every paginated list response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    /// The records on this page.
    pub items: Vec<T>,
    /// The 1-based page number.
    pub page: u64,
    /// The number of records per page.
    pub per_page: u64,
    /// The total number of records across all pages.
    pub total: u64,
    /// The total number of pages.
    pub page_count: u64,
}

impl<T> Paginated<T> {
    /// Wrap one page of records with its position in the full result set.
    pub fn new(items: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            items,
            page: page.number,
            per_page: page.size,
            total,
            page_count: page.page_count(total),
        }
    }
}

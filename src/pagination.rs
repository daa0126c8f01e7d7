//! This module defines the common functionality for paging data.

use serde::Serialize;

use crate::{Error, filters::FilterParams};

/// The config that controls how result pages are sized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// The page size to use when the request does not specify one.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The resolved page window for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// The 1-based page number.
    pub page: u64,
    /// How many records the page holds.
    pub page_size: u64,
}

impl PageParams {
    /// The number of records to skip to reach this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// One page of results with navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// The total number of records matching the query.
    pub count: u64,
    /// The next page number, if there is one.
    pub next: Option<u64>,
    /// The previous page number, if there is one.
    pub previous: Option<u64>,
    /// The records on this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Assemble the page envelope for `results` fetched with `params` out
    /// of `count` total matches.
    pub fn new(results: Vec<T>, params: PageParams, count: u64) -> Self {
        Self {
            count,
            next: (params.page * params.page_size < count).then(|| params.page + 1),
            previous: (params.page > 1).then(|| params.page - 1),
            results,
        }
    }
}

/// Resolve the raw `page` and `page_size` parameters against `config`.
///
/// An unusable `page_size` falls back to the default and an oversized one
/// is clamped to the maximum; an unusable `page` is an error, mirroring
/// how the listing treats a page past the end of the results.
///
/// # Errors
/// Returns [Error::InvalidPage] if `page` is present but not a positive
/// integer.
pub fn resolve_page_params(
    params: &FilterParams,
    config: &PaginationConfig,
) -> Result<PageParams, Error> {
    let page = match params.page.as_deref() {
        None | Some("") => 1,
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|page| *page >= 1)
            .ok_or(Error::InvalidPage)?,
    };

    let page_size = params
        .page_size
        .as_deref()
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|size| *size >= 1)
        .map(|size| size.min(config.max_page_size))
        .unwrap_or(config.default_page_size);

    Ok(PageParams { page, page_size })
}

/// Check that `params` points at a page that exists for `count` matches.
///
/// Page 1 always exists, even with no results.
///
/// # Errors
/// Returns [Error::InvalidPage] if the page's offset is past the last
/// record.
pub fn validate_page_in_range(params: PageParams, count: u64) -> Result<(), Error> {
    if params.page > 1 && params.offset() >= count {
        return Err(Error::InvalidPage);
    }

    Ok(())
}

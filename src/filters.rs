//! Validation and compilation of query parameters into ledger predicates.
//!
//! Every read endpoint accepts the same filter parameters; the aggregate
//! endpoint additionally requires a grouping selector. Parameters arrive as
//! raw strings so that malformed values can be reported per field instead
//! of being rejected wholesale by the extractor, and unrecognized
//! parameters are ignored.

use serde::Deserialize;
use time::{Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    aggregation::AggregateBy,
    timezone::{DayBoundary, date_to_utc},
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The raw query parameters accepted by the sales data endpoints.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FilterParams {
    /// Include records from this calendar date (ISO 8601, `YYYY-MM-DD`).
    pub start_date: Option<String>,
    /// Include records up to this calendar date (ISO 8601, `YYYY-MM-DD`).
    pub end_date: Option<String>,
    /// Case-insensitive substring match on the product category.
    pub category: Option<String>,
    /// The grouping dimension for aggregate queries.
    pub aggregate_by: Option<String>,
    /// The page number to fetch.
    pub page: Option<String>,
    /// The number of records per page.
    pub page_size: Option<String>,
}

impl FilterParams {
    /// The recognized parameters that are present, as name/value pairs.
    ///
    /// This is the input to the cache signature: only parameters the
    /// endpoint accepts participate, so junk parameters cannot fragment
    /// the cache.
    pub fn canonical(&self) -> Vec<(&'static str, &str)> {
        [
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("category", &self.category),
            ("aggregate_by", &self.aggregate_by),
            ("page", &self.page),
            ("page_size", &self.page_size),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|value| (name, value)))
        .collect()
    }
}

/// A compiled predicate over sales records.
///
/// Date bounds are absolute UTC instants; `category` matches the live
/// product category case-insensitively as a substring.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesRecordFilter {
    /// Include records at or after this instant.
    pub start: Option<OffsetDateTime>,
    /// Include records at or before this instant.
    pub end: Option<OffsetDateTime>,
    /// Substring to look for in the product category.
    pub category: Option<String>,
}

/// Validate the filter parameters and normalize the date bounds to UTC
/// using the zone named by `timezone`.
///
/// # Errors
/// Returns [Error::Validation] on the offending field if a date does not
/// parse, or on `start_date` if both dates are present and the normalized
/// start is after the normalized end. Returns [Error::InvalidTimezone] if
/// the server's timezone setting is not a canonical zone name.
pub fn compile_filter(params: &FilterParams, timezone: &str) -> Result<SalesRecordFilter, Error> {
    let start = match parse_date(&params.start_date, "start_date")? {
        Some(date) => Some(date_to_utc(date, DayBoundary::Start, timezone)?),
        None => None,
    };
    let end = match parse_date(&params.end_date, "end_date")? {
        Some(date) => Some(date_to_utc(date, DayBoundary::End, timezone)?),
        None => None,
    };

    if let (Some(start), Some(end)) = (&start, &end) {
        if start > end {
            return Err(Error::Validation {
                field: "start_date",
                message: "Must be before or equal to end_date.".to_owned(),
            });
        }
    }

    let category = params
        .category
        .as_deref()
        .filter(|value| !value.is_empty())
        .map(str::to_owned);

    Ok(SalesRecordFilter {
        start,
        end,
        category,
    })
}

/// Parse the grouping selector for aggregate queries.
///
/// # Errors
/// Returns [Error::Validation] on `aggregate_by` when the selector is
/// missing or not one of `month` and `category`.
pub fn compile_aggregate_by(params: &FilterParams) -> Result<AggregateBy, Error> {
    match params.aggregate_by.as_deref() {
        None | Some("") => Err(Error::Validation {
            field: "aggregate_by",
            message: "This field is required.".to_owned(),
        }),
        Some(value) => AggregateBy::parse(value).ok_or_else(|| Error::Validation {
            field: "aggregate_by",
            message: format!("Select a valid choice. {value} is not one of the available choices."),
        }),
    }
}

fn parse_date(value: &Option<String>, field: &'static str) -> Result<Option<Date>, Error> {
    match value.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => Date::parse(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| Error::Validation {
                field,
                message: "Enter a valid date.".to_owned(),
            }),
    }
}

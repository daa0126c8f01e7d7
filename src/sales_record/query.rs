//! Database queries over the sales ledger.

use rusqlite::Connection;
use uuid::Uuid;

use crate::{Error, filters::SalesRecordFilter, pagination::PageParams};

use super::models::{
    SALES_RECORD_COLUMNS, SalesRecord, encode_date_of_sale, map_row_to_sales_record,
};

const FILTER_CLAUSE: &str = "(?1 IS NULL OR s.date_of_sale >= ?1) \
    AND (?2 IS NULL OR s.date_of_sale <= ?2) \
    AND (?3 IS NULL OR (p.category IS NOT NULL AND instr(lower(p.category), lower(?3)) > 0))";

fn filter_bindings(filter: &SalesRecordFilter) -> (Option<String>, Option<String>, Option<&str>) {
    (
        filter.start.map(encode_date_of_sale),
        filter.end.map(encode_date_of_sale),
        filter.category.as_deref(),
    )
}

/// Get the sales records matching `filter`, newest first, optionally
/// restricted to one page.
///
/// The category predicate matches against the live product category, so
/// records whose product has been deleted never match a category filter.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails or a row cannot be mapped.
pub(crate) fn get_sales_records(
    filter: &SalesRecordFilter,
    page: Option<PageParams>,
    connection: &Connection,
) -> Result<Vec<SalesRecord>, Error> {
    // Sort by date, and then ID to keep record order stable after updates.
    let mut query = format!(
        "SELECT {SALES_RECORD_COLUMNS} FROM sales_record s \
         LEFT JOIN product p ON s.product_id = p.id \
         WHERE {FILTER_CLAUSE} \
         ORDER BY s.date_of_sale DESC, s.id ASC"
    );

    if let Some(page) = page {
        query.push_str(&format!(
            " LIMIT {} OFFSET {}",
            page.page_size,
            page.offset()
        ));
    }

    let (start, end, category) = filter_bindings(filter);

    connection
        .prepare(&query)?
        .query_map((start, end, category), map_row_to_sales_record)?
        .map(|record_result| record_result.map_err(Error::from))
        .collect()
}

/// Count the sales records matching `filter`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(crate) fn count_sales_records(
    filter: &SalesRecordFilter,
    connection: &Connection,
) -> Result<u64, Error> {
    let query = format!(
        "SELECT COUNT(*) FROM sales_record s \
         LEFT JOIN product p ON s.product_id = p.id \
         WHERE {FILTER_CLAUSE}"
    );

    let (start, end, category) = filter_bindings(filter);

    let count: i64 = connection
        .prepare(&query)?
        .query_row((start, end, category), |row| row.get(0))?;

    Ok(count as u64)
}

/// Retrieve a single sales record by its public identifier.
///
/// # Errors
/// Returns [Error::NotFound] if `uuid` does not refer to a record, or
/// [Error::SqlError] if there is some other SQL error.
pub(crate) fn get_sales_record_by_uuid(
    uuid: &Uuid,
    connection: &Connection,
) -> Result<SalesRecord, Error> {
    let query = format!(
        "SELECT {SALES_RECORD_COLUMNS} FROM sales_record s \
         LEFT JOIN product p ON s.product_id = p.id \
         WHERE s.uuid = ?1"
    );

    let record = connection
        .prepare(&query)?
        .query_row((uuid.to_string(),), map_row_to_sales_record)?;

    Ok(record)
}

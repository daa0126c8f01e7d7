//! The paginated sales record listing endpoint.

use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::{
    AppState, Error, cache,
    cache::{SALES_RECORD_LIST_NAMESPACE, entry_key, query_signature},
    filters::{FilterParams, compile_filter},
    pagination::{Page, resolve_page_params, validate_page_in_range},
};

use super::{
    query::{count_sales_records, get_sales_records},
    view::{SalesRecordResponse, json_payload_response},
};

/// Handler for listing sales records with optional date range and
/// category filters.
///
/// Successful responses are cached under a signature of the accepted
/// query parameters; a cache hit returns the stored payload without
/// touching the database. Cache failures degrade to direct computation.
///
/// # Errors
/// Returns [Error::Validation] for malformed or inconsistent filters and
/// [Error::InvalidPage] for an unusable page number.
pub async fn get_sales_records_endpoint(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Response, Error> {
    let filter = compile_filter(&params, &state.local_timezone)?;
    let page_params = resolve_page_params(&params, &state.pagination_config)?;

    let cache_key = entry_key(
        SALES_RECORD_LIST_NAMESPACE,
        &query_signature(&params.canonical()),
    );
    if let Some(payload) = cache::fetch(state.cache.as_ref(), &cache_key) {
        return Ok(json_payload_response(payload));
    }

    let (count, records) = {
        let connection = state.db_connection.lock().unwrap();

        let count = count_sales_records(&filter, &connection)?;
        validate_page_in_range(page_params, count)?;
        let records = get_sales_records(&filter, Some(page_params), &connection)?;

        (count, records)
    };

    let results: Vec<SalesRecordResponse> =
        records.iter().map(SalesRecordResponse::from).collect();
    let payload = serde_json::to_string(&Page::new(results, page_params, count))
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    cache::store(state.cache.as_ref(), &cache_key, &payload);

    Ok(json_payload_response(payload))
}

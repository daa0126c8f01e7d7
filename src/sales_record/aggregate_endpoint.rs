//! The sales data aggregation endpoint.

use axum::{
    extract::{Query, State},
    response::Response,
};

use crate::{
    AppState, Error,
    aggregation::aggregate,
    cache,
    cache::{SALES_AGGREGATE_NAMESPACE, entry_key, query_signature},
    filters::{FilterParams, compile_aggregate_by, compile_filter},
};

use super::{
    query::get_sales_records,
    view::{AggregationGroupResponse, json_payload_response},
};

/// Handler for aggregating sales data by month or category.
///
/// Applies the same filters as the listing, then buckets the matching
/// records by the required `aggregate_by` dimension. The response is an
/// ordered array of groups, cached like the listing but in its own
/// namespace.
///
/// # Errors
/// Returns [Error::Validation] when `aggregate_by` is missing or invalid,
/// or for malformed or inconsistent filters.
pub async fn get_sales_aggregate_endpoint(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Response, Error> {
    let aggregate_by = compile_aggregate_by(&params)?;
    let filter = compile_filter(&params, &state.local_timezone)?;

    let cache_key = entry_key(
        SALES_AGGREGATE_NAMESPACE,
        &query_signature(&params.canonical()),
    );
    if let Some(payload) = cache::fetch(state.cache.as_ref(), &cache_key) {
        return Ok(json_payload_response(payload));
    }

    let records = {
        let connection = state.db_connection.lock().unwrap();
        get_sales_records(&filter, None, &connection)?
    };

    let groups: Vec<AggregationGroupResponse> = aggregate(&records, aggregate_by)
        .iter()
        .map(AggregationGroupResponse::from)
        .collect();
    let payload = serde_json::to_string(&groups)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    cache::store(state.cache.as_ref(), &cache_key, &payload);

    Ok(json_payload_response(payload))
}

//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::{
    AppState,
    auth::{auth_guard, obtain_token_pair, refresh_access_token},
    endpoints,
    rate_limit::api_rate_limit_guard,
    sales_record::{
        get_sales_aggregate_endpoint, get_sales_record_endpoint, get_sales_records_endpoint,
    },
};

/// Return a router with all the app's routes.
///
/// The token endpoints are open and throttle themselves; the data
/// endpoints sit behind the auth guard, which inserts the authenticated
/// user ID, and then the general API rate limit guard, which counts the
/// request against that user's quota.
pub fn build_router(state: AppState) -> Router {
    let token_routes = Router::new()
        .route(endpoints::TOKEN_OBTAIN, post(obtain_token_pair))
        .route(endpoints::TOKEN_REFRESH, post(refresh_access_token));

    // Later route layers wrap earlier ones, so the auth guard is added
    // last to run first.
    let data_routes = Router::new()
        .route(endpoints::SALES_DATA, get(get_sales_records_endpoint))
        .route(
            endpoints::SALES_DATA_AGGREGATE,
            get(get_sales_aggregate_endpoint),
        )
        .route(endpoints::SALES_DATA_DETAIL, get(get_sales_record_endpoint))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_rate_limit_guard,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    token_routes.merge(data_routes).with_state(state)
}

//! The API endpoint URIs.

/// The route for listing sales records.
pub const SALES_DATA: &str = "/api/sales-data";
/// The route for fetching a single sales record by its UUID.
pub const SALES_DATA_DETAIL: &str = "/api/sales-data/{record_id}";
/// The route for aggregating sales data by month or category.
pub const SALES_DATA_AGGREGATE: &str = "/api/sales-data/aggregate";
/// The route for obtaining a token pair from credentials.
pub const TOKEN_OBTAIN: &str = "/api/token";
/// The route for exchanging a refresh token for a new access token.
pub const TOKEN_REFRESH: &str = "/api/token/refresh";

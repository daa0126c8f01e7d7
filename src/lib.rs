//! Sales Ledger is a read-only REST API over a ledger of sales transactions.
//!
//! The service exposes filterable listings and time-series/category
//! aggregations of sales records, fronted by a TTL response cache that is
//! invalidated on every ledger mutation, and protected by per-scope rate
//! limits on both the token and data endpoints.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::{StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod aggregation;
mod app_state;
mod auth;
mod cache;
mod db;
mod endpoints;
mod filters;
mod invalidation;
mod logging;
mod pagination;
mod product;
mod rate_limit;
mod routing;
mod sales_record;
mod timezone;
mod user;

#[cfg(test)]
mod test_utils;

pub use aggregation::{AggregateBy, AggregationGroup, GroupKey, UNKNOWN_LABEL, aggregate};
pub use app_state::AppState;
pub use cache::{CacheStore, MokaCacheStore};
pub use db::{DatabaseId, initialize as initialize_db};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use product::{NewProduct, Product, create_product, delete_product, get_product_by_uuid};
pub use rate_limit::{RateLimitConfig, RateLimitQuota, RateLimiter};
pub use routing::build_router;
pub use sales_record::{
    NewSalesRecord, ProductSnapshot, SalesRecord, SalesRecordCorrection, create_sales_record,
    delete_sales_record, update_sales_record,
};
pub use user::{User, UserId, create_user, get_user_by_username};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A query parameter failed validation.
    ///
    /// Rendered as a 400 response keyed by the offending field, so the
    /// client can surface the message next to the right input.
    #[error("invalid value for {field}: {message}")]
    Validation {
        /// The query parameter that failed validation.
        field: &'static str,
        /// A human readable description of what is wrong with the value.
        message: String,
    },

    /// The request carried no usable credential.
    #[error("authentication credentials were not provided")]
    NotAuthenticated,

    /// The bearer token could not be decoded, is expired, or is of the
    /// wrong token type for the attempted operation.
    #[error("the token is not valid")]
    InvalidToken,

    /// The username/password pair did not match a known user.
    #[error("no active account found with the given credentials")]
    WrongCredentials,

    /// Signing a new token failed.
    #[error("could not create a token")]
    TokenCreation,

    /// A rate limit quota was exhausted.
    #[error("request was throttled, retry in {retry_after_seconds}s")]
    RateLimited {
        /// Seconds remaining until the current window resets.
        retry_after_seconds: u64,
    },

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The `page` query parameter is not a valid page number, or points
    /// past the last page of results.
    #[error("invalid page number")]
    InvalidPage,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The cache store could not serve a request.
    ///
    /// Callers on the read path recover from this locally by computing the
    /// response without the cache; it is never surfaced to clients.
    #[error("cache store failure: {0}")]
    Cache(String),

    /// A sales record was given a quantity below one.
    #[error("quantity sold must be at least 1, got {0}")]
    InvalidQuantity(i64),

    /// A sales record was given a negative total amount.
    #[error("total sales amount must not be negative, got {0}")]
    NegativeAmount(String),

    /// A stored decimal value could not be parsed.
    #[error("could not parse stored decimal \"{0}\"")]
    InvalidDecimal(String),

    /// Tried to update a sales record that does not exist.
    #[error("tried to update a sales record that is not in the database")]
    UpdateMissingSalesRecord,

    /// Tried to delete a sales record that does not exist.
    #[error("tried to delete a sales record that is not in the database")]
    DeleteMissingSalesRecord,

    /// An unexpected error occurred with the underlying hashing library.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Validation { field, message } => {
                (StatusCode::BAD_REQUEST, Json(json!({ field: [message] }))).into_response()
            }
            Error::NotAuthenticated => (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": "Authentication credentials were not provided." })),
            )
                .into_response(),
            Error::InvalidToken => (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": "Given token not valid for any token type" })),
            )
                .into_response(),
            Error::WrongCredentials => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "No active account found with the given credentials" })),
            )
                .into_response(),
            Error::RateLimited {
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(RETRY_AFTER, retry_after_seconds.to_string())],
                Json(json!({
                    "detail": format!(
                        "Request was throttled. Expected available in {retry_after_seconds} seconds."
                    )
                })),
            )
                .into_response(),
            Error::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
            }
            Error::InvalidPage => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Invalid page." })),
            )
                .into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error." })),
                )
                    .into_response()
            }
        }
    }
}

//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    Error,
    cache::CacheStore,
    db::initialize,
    pagination::PaginationConfig,
    rate_limit::{RateLimitConfig, RateLimiter},
};

#[derive(Clone)]
struct JwtKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The local timezone as a canonical timezone name, e.g. "Europe/Sofia".
    ///
    /// Caller-supplied calendar dates are interpreted in this zone.
    pub local_timezone: String,

    /// The config that controls how to split data into pages.
    pub pagination_config: PaginationConfig,

    /// The response cache for the sales data endpoints.
    pub cache: Arc<dyn CacheStore>,

    /// The rate limiter shared by the token and data endpoints.
    pub rate_limiter: Arc<RateLimiter>,

    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,

    jwt_keys: JwtKeys,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. `local_timezone` should be a valid, canonical
    /// timezone name, e.g. "Europe/Sofia".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        local_timezone: &str,
        pagination_config: PaginationConfig,
        cache: Arc<dyn CacheStore>,
        rate_limit_config: RateLimitConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            cache,
            rate_limiter: Arc::new(RateLimiter::new(rate_limit_config)),
            db_connection: Arc::new(Mutex::new(db_connection)),
            jwt_keys: JwtKeys {
                encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
                decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            },
        })
    }

    /// The encoding key for JWTs.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.jwt_keys.encoding_key
    }

    /// The decoding key for JWTs.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.jwt_keys.decoding_key
    }
}

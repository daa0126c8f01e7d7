#![allow(missing_docs)]
//! Shared helpers for building app state, seeding data, and stubbing the
//! cache store in tests.

use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{TokenType, token::encode_token},
    cache::{CacheStore, MokaCacheStore},
    db::DatabaseId,
    pagination::PaginationConfig,
    product::{NewProduct, Product, create_product},
    rate_limit::RateLimitConfig,
    routing::build_router,
    sales_record::{NewSalesRecord, SalesRecord, create_sales_record},
    user::UserId,
};

pub(crate) const TEST_JWT_SECRET: &str = "nafstenoas";

/// Low bcrypt cost so that seeding users does not dominate test time.
const TEST_BCRYPT_COST: u32 = 4;

pub(crate) fn test_state() -> AppState {
    test_state_with_timezone("Etc/UTC")
}

pub(crate) fn test_state_with_timezone(timezone: &str) -> AppState {
    test_state_with(
        Arc::new(MokaCacheStore::default()),
        RateLimitConfig::default(),
        timezone,
    )
}

pub(crate) fn test_state_with(
    cache: Arc<dyn CacheStore>,
    rate_limit_config: RateLimitConfig,
    timezone: &str,
) -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(
        connection,
        TEST_JWT_SECRET,
        timezone,
        PaginationConfig::default(),
        cache,
        rate_limit_config,
    )
    .expect("Could not create app state.")
}

pub(crate) fn recording_test_state() -> (AppState, Arc<RecordingCacheStore>) {
    let cache = Arc::new(RecordingCacheStore::default());
    let state = test_state_with(cache.clone(), RateLimitConfig::default(), "Etc/UTC");

    (state, cache)
}

/// Build a test server over the full application router, with a seeded
/// user and a valid access token for it.
pub(crate) fn test_api(state: &AppState) -> (TestServer, String) {
    let user_id = seed_user(state, "apiuser", "apiuserpass");
    let token = encode_token(user_id, TokenType::Access, state.encoding_key())
        .expect("Could not encode access token.");
    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, token)
}

/// Insert a user directly with a cheap hash, bypassing the production
/// bcrypt cost.
pub(crate) fn seed_user(state: &AppState, username: &str, password: &str) -> UserId {
    let password_hash =
        bcrypt::hash(password, TEST_BCRYPT_COST).expect("Could not hash password.");

    let connection = state.db_connection.lock().unwrap();
    connection
        .execute(
            "INSERT INTO user (username, password) VALUES (?1, ?2)",
            (username, password_hash),
        )
        .expect("Could not seed user.");

    UserId::new(connection.last_insert_rowid())
}

pub(crate) fn seed_product(state: &AppState, name: &str, category: &str, price: &str) -> Product {
    let connection = state.db_connection.lock().unwrap();

    create_product(
        NewProduct {
            name: name.to_owned(),
            category: category.to_owned(),
            price: price.parse::<Decimal>().expect("Could not parse price."),
        },
        &connection,
    )
    .expect("Could not seed product.")
}

pub(crate) fn seed_sale(
    state: &AppState,
    product_id: Option<DatabaseId>,
    quantity_sold: i64,
    amount: &str,
    date_of_sale: OffsetDateTime,
) -> SalesRecord {
    create_sales_record(
        state,
        NewSalesRecord {
            product_id,
            quantity_sold,
            total_sales_amount: amount.parse::<Decimal>().expect("Could not parse amount."),
            date_of_sale,
        },
    )
    .expect("Could not seed sales record.")
}

/// A cache store wrapper that records the patterns passed to
/// `evict_pattern` while delegating to a real in-memory cache.
#[derive(Default)]
pub(crate) struct RecordingCacheStore {
    inner: MokaCacheStore,
    evictions: Mutex<Vec<String>>,
}

impl RecordingCacheStore {
    pub(crate) fn evicted_patterns(&self) -> Vec<String> {
        self.evictions.lock().unwrap().clone()
    }
}

impl CacheStore for RecordingCacheStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.inner.get(key)
    }

    fn put(&self, key: &str, payload: String) -> Result<(), Error> {
        self.inner.put(key, payload)
    }

    fn evict_pattern(&self, pattern: &str) -> Result<(), Error> {
        self.evictions.lock().unwrap().push(pattern.to_owned());
        self.inner.evict_pattern(pattern)
    }
}

/// A cache store whose every operation fails, standing in for an
/// unreachable backing store.
pub(crate) struct FailingCacheStore;

impl CacheStore for FailingCacheStore {
    fn get(&self, _key: &str) -> Result<Option<String>, Error> {
        Err(Error::Cache("cache store unavailable".to_owned()))
    }

    fn put(&self, _key: &str, _payload: String) -> Result<(), Error> {
        Err(Error::Cache("cache store unavailable".to_owned()))
    }

    fn evict_pattern(&self, _pattern: &str) -> Result<(), Error> {
        Err(Error::Cache("cache store unavailable".to_owned()))
    }
}

//! Fixed-window rate limiting for the token and data endpoints.
//!
//! Three independent policies share one limiter: token issuance, token
//! refresh, and general authenticated API use. Each (scope, identity)
//! pair gets its own window, anchored at the first request the pair makes
//! in that window. Counters are mutated under the map entry's lock, so
//! concurrent requests from the same identity cannot race an
//! increment.

use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::{AppState, Error, user::UserId};

/// The throttle policy a request is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitScope {
    /// Issuing a fresh token pair from credentials.
    TokenObtain,
    /// Exchanging a refresh token for a new access token.
    TokenRefresh,
    /// Any authenticated data request.
    GeneralApi,
}

/// How many requests a single identity may make per window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitQuota {
    /// The number of requests allowed within one window.
    pub limit: u32,
    /// The length of the window.
    pub window: Duration,
}

impl RateLimitQuota {
    /// Create a quota of `limit` requests per `window`.
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// The quotas for each [RateLimitScope].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Quota for token issuance, keyed by the submitted username.
    pub token_obtain: RateLimitQuota,
    /// Quota for token refresh, keyed by the refresh token's subject.
    pub token_refresh: RateLimitQuota,
    /// Quota for data requests, keyed by the authenticated user.
    pub general_api: RateLimitQuota,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            token_obtain: RateLimitQuota::new(10, Duration::from_secs(60)),
            token_refresh: RateLimitQuota::new(20, Duration::from_secs(60)),
            general_api: RateLimitQuota::new(2000, Duration::from_secs(3600)),
        }
    }
}

impl RateLimitConfig {
    fn quota(&self, scope: RateLimitScope) -> RateLimitQuota {
        match scope {
            RateLimitScope::TokenObtain => self.token_obtain,
            RateLimitScope::TokenRefresh => self.token_refresh,
            RateLimitScope::GeneralApi => self.general_api,
        }
    }
}

struct Bucket {
    window_start: Instant,
    count: u32,
}

/// Tracks request counts per (scope, identity) pair.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<(RateLimitScope, String), Bucket>,
}

impl RateLimiter {
    /// Create a rate limiter enforcing the quotas in `config`.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    /// Count a request from `key` against `scope`'s quota.
    ///
    /// Every call counts, whether or not the guarded operation later
    /// succeeds.
    ///
    /// # Errors
    /// Returns [Error::RateLimited] with the seconds remaining in the
    /// current window once the quota is exhausted.
    pub fn check(&self, scope: RateLimitScope, key: &str) -> Result<(), Error> {
        let quota = self.config.quota(scope);
        let now = Instant::now();

        let mut bucket = self
            .buckets
            .entry((scope, key.to_owned()))
            .or_insert_with(|| Bucket {
                window_start: now,
                count: 0,
            });

        if now.duration_since(bucket.window_start) >= quota.window {
            bucket.window_start = now;
            bucket.count = 0;
        }

        bucket.count += 1;

        if bucket.count > quota.limit {
            let remaining = quota.window - now.duration_since(bucket.window_start);

            return Err(Error::RateLimited {
                retry_after_seconds: (remaining.as_secs_f64().ceil() as u64).max(1),
            });
        }

        Ok(())
    }
}

/// Middleware that counts the request against the general API quota of the
/// authenticated user.
///
/// Must run after the auth guard, which inserts the [UserId] extension.
pub async fn api_rate_limit_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(user_id) = request.extensions().get::<UserId>().copied() else {
        tracing::error!("rate limit guard ran without an authenticated user");
        return Error::NotAuthenticated.into_response();
    };

    if let Err(error) = state
        .rate_limiter
        .check(RateLimitScope::GeneralApi, &user_id.to_string())
    {
        return error.into_response();
    }

    next.run(request).await
}

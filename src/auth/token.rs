//! Access and refresh token issuance.
//!
//! Token issuance is the only unauthenticated surface of the API, so both
//! endpoints throttle before doing anything else: obtaining counts
//! against the submitted username whether or not the credentials turn out
//! to be valid, refreshing against the presented token's subject.

// Code in this module is adapted from https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

use axum::{Json, extract::State};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error,
    rate_limit::RateLimitScope,
    user::{UserId, get_user_by_username},
};

/// How long an access token stays valid.
pub const ACCESS_TOKEN_LIFETIME: Duration = Duration::minutes(15);

/// How long a refresh token stays valid.
pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::days(1);

/// The kind of token a set of claims represents.
///
/// Access tokens authenticate data requests; refresh tokens may only be
/// exchanged for new access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Authenticates data requests.
    Access,
    /// Exchanged for new access tokens.
    Refresh,
}

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// The ID of the user the token was issued to.
    pub sub: String,
    /// Whether this is an access or a refresh token.
    pub token_type: TokenType,
}

impl Claims {
    /// The user the token was issued to.
    ///
    /// # Errors
    /// Returns [Error::InvalidToken] if the subject is not a user ID.
    pub fn user_id(&self) -> Result<UserId, Error> {
        self.sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| Error::InvalidToken)
    }
}

/// The username and password submitted to obtain a token pair.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// The name the user signs in with.
    pub username: String,
    /// The user's password.
    pub password: String,
}

/// A freshly issued refresh and access token pair.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    /// The long-lived refresh token.
    pub refresh: String,
    /// The short-lived access token.
    pub access: String,
}

/// The body of a token refresh request.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token to exchange.
    pub refresh: String,
}

/// A freshly issued access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    /// The short-lived access token.
    pub access: String,
}

/// Handler for obtaining a token pair from user credentials.
///
/// # Errors
/// Returns [Error::RateLimited] once the username exhausts the
/// token-obtain quota, and [Error::WrongCredentials] when the username or
/// password does not match.
pub async fn obtain_token_pair(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenPair>, Error> {
    state
        .rate_limiter
        .check(RateLimitScope::TokenObtain, &credentials.username)?;

    let user = {
        let connection = state.db_connection.lock().unwrap();
        get_user_by_username(&credentials.username, &connection)
    }
    .map_err(|error| match error {
        Error::NotFound => Error::WrongCredentials,
        other => other,
    })?;

    if !user.verify_password(&credentials.password)? {
        return Err(Error::WrongCredentials);
    }

    Ok(Json(TokenPair {
        refresh: encode_token(user.id, TokenType::Refresh, state.encoding_key())?,
        access: encode_token(user.id, TokenType::Access, state.encoding_key())?,
    }))
}

/// Handler for exchanging a refresh token for a new access token.
///
/// # Errors
/// Returns [Error::InvalidToken] if the presented token is not a valid,
/// unexpired refresh token, and [Error::RateLimited] once its subject
/// exhausts the token-refresh quota.
pub async fn refresh_access_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<AccessToken>, Error> {
    let claims = decode_token(&request.refresh, state.decoding_key())?;

    if claims.token_type != TokenType::Refresh {
        return Err(Error::InvalidToken);
    }

    state
        .rate_limiter
        .check(RateLimitScope::TokenRefresh, &claims.sub)?;

    let access = encode_token(claims.user_id()?, TokenType::Access, state.encoding_key())?;

    Ok(Json(AccessToken { access }))
}

pub(crate) fn encode_token(
    user_id: UserId,
    token_type: TokenType,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let lifetime = match token_type {
        TokenType::Access => ACCESS_TOKEN_LIFETIME,
        TokenType::Refresh => REFRESH_TOKEN_LIFETIME,
    };

    let claims = Claims {
        exp: (now + lifetime).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
        sub: user_id.to_string(),
        token_type,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("Error encoding JWT: {error}");
        Error::TokenCreation
    })
}

pub(crate) fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| Error::InvalidToken)
}

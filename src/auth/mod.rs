//! Token issuance and request authentication.

mod middleware;
pub(crate) mod token;

pub use middleware::auth_guard;
pub use token::{
    ACCESS_TOKEN_LIFETIME, AccessToken, Claims, Credentials, REFRESH_TOKEN_LIFETIME, RefreshRequest,
    TokenPair, TokenType, obtain_token_pair, refresh_access_token,
};

//! Authentication middleware for the data endpoints.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Error, user::UserId};

use super::token::{TokenType, decode_token};

/// Middleware function that checks for a valid bearer access token.
///
/// The user ID is placed into the request and then the request executed
/// normally if the token is valid, otherwise a 403 response is returned.
///
/// **Note**: Route handlers and downstream middleware can use
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match authenticate(&request, state.decoding_key()) {
        Ok(user_id) => user_id,
        Err(error) => return error.into_response(),
    };

    request.extensions_mut().insert(user_id);

    next.run(request).await
}

fn authenticate(request: &Request, decoding_key: &DecodingKey) -> Result<UserId, Error> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(Error::NotAuthenticated)?
        .to_str()
        .map_err(|_| Error::NotAuthenticated)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(Error::NotAuthenticated)?;

    let claims = decode_token(token, decoding_key)?;

    if claims.token_type != TokenType::Access {
        return Err(Error::InvalidToken);
    }

    claims.user_id()
}

//! Middleware for logging requests and responses.

use axum::{extract::Request, http::header::CONTENT_TYPE, middleware::Next, response::Response};

/// The length at which logged request and response bodies are truncated.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If the response body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it
/// is truncated and logged at the `debug` level. The `password` field of
/// JSON bodies (the token-obtain request) is redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (headers, body_text) = extract_header_and_body_text_from_request(request).await;

    if headers.method == axum::http::Method::POST
        && headers.headers.get(CONTENT_TYPE) == Some(&"application/json".parse().unwrap())
    {
        let display_text = redact_json_string_field(&body_text, "password");
        let display_text = redact_json_string_field(&display_text, "refresh");
        log_request(&headers, &display_text);
    } else {
        log_request(&headers, &body_text);
    }

    let request = Request::from_parts(headers, body_text.into());
    let response = next.run(request).await;

    let (headers, body_text) = extract_header_and_body_text_from_response(response).await;
    log_response(&headers, &body_text);

    Response::from_parts(headers, body_text.into())
}

/// Replace the value of the JSON string field `field_name` with asterisks.
///
/// Works on the serialized text rather than a parsed document so that
/// malformed bodies still get logged; if the field's shape is not a
/// simple string, the text is returned unchanged.
fn redact_json_string_field(body_text: &str, field_name: &str) -> String {
    let needle = format!("\"{field_name}\"");

    let Some(field_start) = body_text.find(&needle) else {
        return body_text.to_string();
    };
    let after_field = field_start + needle.len();

    let Some(colon_offset) = body_text[after_field..].find(':') else {
        return body_text.to_string();
    };
    let Some(quote_offset) = body_text[after_field + colon_offset..].find('"') else {
        return body_text.to_string();
    };
    let value_start = after_field + colon_offset + quote_offset + 1;

    let Some(value_length) = body_text[value_start..].find('"') else {
        return body_text.to_string();
    };

    format!(
        "{}********{}",
        &body_text[..value_start],
        &body_text[value_start + value_length..]
    )
}

async fn extract_header_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (headers, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_header_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (headers, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (headers, String::from_utf8_lossy(&body_bytes).to_string())
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            &body[..LOG_BODY_LENGTH_LIMIT]
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}

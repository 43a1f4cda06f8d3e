//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::header::{COOKIE, SET_COOKIE},
    middleware::Next,
    response::Response,
};

use crate::auth::cookie::{COOKIE_EXPIRY, COOKIE_USER_ID};

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and logged at the `debug` level. Session cookie values are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_text) = extract_parts_and_body_text_from_request(request).await;

    let display_headers = if parts.headers.contains_key(COOKIE) {
        let headers_text = format!("{parts:#?}");
        let headers_text = redact_cookie(&headers_text, COOKIE_USER_ID);
        redact_cookie(&headers_text, COOKIE_EXPIRY)
    } else {
        format!("{parts:#?}")
    };
    log_request(&display_headers, &body_text);

    let request = Request::from_parts(parts, body_text.into());
    let response = next.run(request).await;

    let (parts, body_text) = extract_parts_and_body_text_from_response(response).await;

    let display_headers = if parts.headers.contains_key(SET_COOKIE) {
        let headers_text = format!("{parts:#?}");
        let headers_text = redact_cookie(&headers_text, COOKIE_USER_ID);
        redact_cookie(&headers_text, COOKIE_EXPIRY)
    } else {
        format!("{parts:#?}")
    };
    log_response(&display_headers, &body_text);

    Response::from_parts(parts, body_text.into())
}

/// Replace the value of the `cookie_name` cookie in `text` with asterisks.
fn redact_cookie(text: &str, cookie_name: &str) -> String {
    let needle = format!("{cookie_name}=");

    let start = match text.find(&needle) {
        Some(position) => position,
        None => return text.to_string(),
    };

    let value_start = start + needle.len();
    let value_end = text[value_start..]
        .find([';', '"'])
        .map(|end| value_start + end)
        .unwrap_or(text.len());

    format!(
        "{}{}********{}",
        &text[..value_start - needle.len()],
        needle,
        &text[value_end..]
    )
}

async fn extract_parts_and_body_text_from_request(
    request: Request,
) -> (axum::http::request::Parts, String) {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

async fn extract_parts_and_body_text_from_response(
    response: Response,
) -> (axum::http::response::Parts, String) {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    (parts, String::from_utf8_lossy(&body_bytes).to_string())
}

const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Cut `text` to at most `limit` bytes without splitting a character.
fn truncate_body(text: &str, limit: usize) -> &str {
    let mut end = limit.min(text.len());

    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(headers: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers}\nbody: {:}...",
            truncate_body(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers}\nbody: {body:?}");
    }
}

fn log_response(headers: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers}\nbody: {:}...",
            truncate_body(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers}\nbody: {body:?}");
    }
}


#[cfg(test)]
mod redact_cookie_tests {
    use super::redact_cookie;

    #[test]
    fn replaces_the_cookie_value() {
        let text = "\"cookie\": \"user_id=abc123; expiry=xyz\"";

        let redacted = redact_cookie(text, "user_id");

        assert_eq!(redacted, "\"cookie\": \"user_id=********; expiry=xyz\"");
    }

    #[test]
    fn handles_a_value_at_the_end_of_the_text() {
        let redacted = redact_cookie("expiry=sometoken", "expiry");

        assert_eq!(redacted, "expiry=********");
    }

    #[test]
    fn leaves_text_without_the_cookie_alone() {
        let text = "\"content-type\": \"application/json\"";

        assert_eq!(redact_cookie(text, "user_id"), text);
    }
}

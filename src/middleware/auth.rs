use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::session::{self, cookie, SessionState};

/// Session middleware for protected routes. Decodes the signed session
/// cookie (or a Bearer token) and hydrates the typed session state into the
/// request in one explicit step; handlers never decode the cookie themselves.
pub async fn session_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&headers)
        .ok_or_else(|| ApiError::not_authenticated("Missing session"))?;

    let claims = session::decode_token(&token)?;
    let state = SessionState::hydrate(claims);
    request.extensions_mut().insert(state);

    Ok(next.run(request).await)
}

/// Session token from the cookie header, with Bearer fallback for
/// non-browser clients.
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(header) = headers.get("cookie").and_then(|v| v.to_str().ok()) {
        if let Some(token) = cookie::token_from_cookie_header(header) {
            return Some(token);
        }
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn prefers_cookie_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("fuse_session=cookie.tok.en"),
        );
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer bearer.tok.en"),
        );
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("cookie.tok.en")
        );
    }

    #[test]
    fn falls_back_to_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer bearer.tok.en"),
        );
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("bearer.tok.en")
        );
    }

    #[test]
    fn no_credentials_yields_none() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());
    }
}

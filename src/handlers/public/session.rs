use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::info;

use crate::identity;
use crate::services::session as session_service;
use crate::session::{self, cookie};

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    /// Identity assertion handed over by the provider's redirect
    pub token: Option<String>,
}

/// GET /auth/session - mint or refresh the session cookie, then redirect to
/// the application root. On failure, redirect to sign-in with an error query
/// parameter instead of surfacing an error page.
pub async fn session_get(
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let assertion = match assertion_from_request(&headers, &query) {
        Some(assertion) => assertion,
        None => return Redirect::to("/sign-in?error=not_authenticated").into_response(),
    };

    let profile = match identity::provider().verify_assertion(&assertion).await {
        Ok(profile) => profile,
        Err(e) => {
            info!("Assertion verification failed: {}", e);
            return Redirect::to("/sign-in?error=invalid_assertion").into_response();
        }
    };

    let outcome = session_service::mint_for_profile(&profile).await;
    let token = match session::mint(&outcome.claims) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Session mint failed: {}", e);
            return Redirect::to("/sign-in?error=session_mint_failed").into_response();
        }
    };

    if outcome.degraded {
        info!("Minted degraded session for {}", profile.auth_ref);
    }

    let headers = cookie::set_cookie_headers(&cookie::session_cookie(&token));
    (headers, Redirect::to("/")).into_response()
}

/// DELETE /auth/session - clear the session cookie (logout). The payload is
/// discarded client-side; nothing is persisted server-side to revoke.
pub async fn session_delete() -> impl IntoResponse {
    let headers = cookie::set_cookie_headers(&cookie::clear_cookie());
    (headers, StatusCode::NO_CONTENT)
}

fn assertion_from_request(headers: &HeaderMap, query: &SessionQuery) -> Option<String> {
    if let Some(token) = query.token.as_deref().filter(|t| !t.is_empty()) {
        return Some(token.to_string());
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
    fn query_token_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));
        let query = SessionQuery {
            token: Some("from-query".to_string()),
        };
        assert_eq!(
            assertion_from_request(&headers, &query).as_deref(),
            Some("from-query")
        );
    }

    #[test]
    fn empty_query_token_falls_back_to_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));
        let query = SessionQuery {
            token: Some(String::new()),
        };
        assert_eq!(
            assertion_from_request(&headers, &query).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn absent_assertion_yields_none() {
        let query = SessionQuery { token: None };
        assert!(assertion_from_request(&HeaderMap::new(), &query).is_none());
    }
}

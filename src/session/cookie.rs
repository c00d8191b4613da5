use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

use crate::config;

/// Build the Set-Cookie header for a freshly minted session token.
///
/// The cookie is deliberately client-readable (no HttpOnly): the client
/// hydrates its state store from the payload segment before first paint.
/// Integrity comes from the signature, not from hiding the value.
pub fn session_cookie(token: &str) -> String {
    let config = config::config();
    let max_age = config.session.ttl_hours * 3600;
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax",
        config.session.cookie_name, token, max_age
    );
    if config.session.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Expire the session cookie immediately (logout).
pub fn clear_cookie() -> String {
    let config = config::config();
    let mut cookie = format!(
        "{}=; Path=/; Max-Age=0; SameSite=Lax",
        config.session.cookie_name
    );
    if config.session.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Headers carrying one Set-Cookie value.
pub fn set_cookie_headers(cookie: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(cookie) {
        headers.insert(SET_COOKIE, value);
    }
    headers
}

/// Extract the session token from a Cookie request header.
pub fn token_from_cookie_header(header: &str) -> Option<String> {
    let name = &config::config().session.cookie_name;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_client_readable_and_lax() {
        let cookie = session_cookie("abc.def.ghi");
        assert!(cookie.starts_with("fuse_session=abc.def.ghi;"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("HttpOnly"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie();
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.starts_with("fuse_session=;"));
    }

    #[test]
    fn extracts_token_among_other_cookies() {
        let header = "theme=dark; fuse_session=tok.en.sig; other=1";
        assert_eq!(
            token_from_cookie_header(header).as_deref(),
            Some("tok.en.sig")
        );
    }

    #[test]
    fn missing_or_empty_cookie_yields_none() {
        assert!(token_from_cookie_header("theme=dark").is_none());
        assert!(token_from_cookie_header("fuse_session=").is_none());
    }
}

mod common;

use anyhow::Result;
use reqwest::{redirect, StatusCode};

fn no_redirect_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .build()
        .expect("client")
}

#[tokio::test]
async fn session_without_assertion_redirects_to_sign_in() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = no_redirect_client();

    let res = client
        .get(format!("{}/auth/session", server.base_url))
        .send()
        .await?;

    assert!(res.status().is_redirection(), "status: {}", res.status());
    let location = res
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, "/sign-in?error=not_authenticated");
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_session_cookie() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .delete(format!("{}/auth/session", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cookie = res
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cookie.starts_with("fuse_session=;"), "cookie: {}", cookie);
    assert!(cookie.contains("Max-Age=0"), "cookie: {}", cookie);
    Ok(())
}

#[tokio::test]
async fn protected_route_without_session_is_unauthenticated() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/account", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "NOT_AUTHENTICATED");
    Ok(())
}

#[tokio::test]
async fn tampered_session_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/account", server.base_url))
        .header("cookie", "fuse_session=aaa.bbb.ccc")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

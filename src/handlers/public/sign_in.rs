use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::identity;
use crate::middleware::ApiResponse;
use crate::services::session as session_service;
use crate::session::{self, cookie};

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

/// POST /auth/sign-in - ask the identity provider to email a verification
/// code. Sign-in and sign-up are the same flow; the user record is created
/// at first session mint.
pub async fn sign_in_post(
    Json(payload): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&payload.email)?;
    identity::provider()
        .send_verification_code(&payload.email)
        .await?;

    Ok(ApiResponse::success(json!({
        "email": payload.email,
        "code_sent": true
    })))
}

/// POST /auth/verify - exchange a verification code for an assertion, then
/// mint the session in the same round trip so the client needs no second
/// request before first paint.
pub async fn verify_post(
    Json(payload): Json<VerifyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_email(&payload.email)?;
    if payload.code.trim().is_empty() {
        return Err(ApiError::validation("Verification code is required", None));
    }

    let provider = identity::provider();
    let assertion = provider.verify_code(&payload.email, &payload.code).await?;
    let profile = provider.verify_assertion(&assertion).await?;

    let outcome = session_service::mint_for_profile(&profile).await;
    let token = session::mint(&outcome.claims)?;
    let headers = cookie::set_cookie_headers(&cookie::session_cookie(&token));

    Ok((
        headers,
        ApiResponse::success(json!({
            "session": outcome.claims,
            "degraded": outcome.degraded
        })),
    ))
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    });
    if valid {
        Ok(())
    } else {
        let mut field_errors = std::collections::HashMap::new();
        field_errors.insert("email".to_string(), "Invalid email format".to_string());
        Err(ApiError::validation("Invalid email", Some(field_errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.example.co").is_ok());
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("user@.com").is_err());
    }
}

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{IdentityError, IdentityPort, IdentityProfile};

/// HTTP implementation of the identity port. No retries: transient provider
/// failures surface immediately to the caller.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[derive(Debug, Deserialize)]
struct AssertionResponse {
    assertion: String,
}

#[async_trait]
impl IdentityPort for HttpIdentityProvider {
    async fn verify_assertion(&self, assertion: &str) -> Result<IdentityProfile, IdentityError> {
        let response = self
            .client
            .post(self.url("/v1/assertions/verify"))
            .timeout(self.timeout)
            .json(&json!({ "assertion": assertion }))
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<IdentityProfile>()
                .await
                .map_err(|e| IdentityError::Provider(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => Err(
                IdentityError::InvalidAssertion("assertion rejected by provider".to_string()),
            ),
            status => Err(IdentityError::Provider(format!(
                "unexpected status {} from assertion verify",
                status
            ))),
        }
    }

    async fn send_verification_code(&self, email: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.url("/v1/codes"))
            .timeout(self.timeout)
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IdentityError::Provider(format!(
                "unexpected status {} from code issuance",
                response.status()
            )))
        }
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<String, IdentityError> {
        let response = self
            .client
            .post(self.url("/v1/codes/verify"))
            .timeout(self.timeout)
            .json(&json!({ "email": email, "code": code }))
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body = response
                    .json::<AssertionResponse>()
                    .await
                    .map_err(|e| IdentityError::Provider(e.to_string()))?;
                Ok(body.assertion)
            }
            StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY => Err(
                IdentityError::CodeRejected("verification code rejected".to_string()),
            ),
            status => Err(IdentityError::Provider(format!(
                "unexpected status {} from code verify",
                status
            ))),
        }
    }

    async fn change_email(&self, auth_ref: &str, new_email: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.url(&format!("/v1/accounts/{}/email", auth_ref)))
            .timeout(self.timeout)
            .json(&json!({ "email": new_email }))
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound(auth_ref.to_string())),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Err(
                IdentityError::CodeRejected("email rejected by provider".to_string()),
            ),
            status => Err(IdentityError::Provider(format!(
                "unexpected status {} from email change",
                status
            ))),
        }
    }

    async fn delete_account(&self, auth_ref: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/accounts/{}", auth_ref)))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound(auth_ref.to_string())),
            status => Err(IdentityError::Provider(format!(
                "unexpected status {} from account deletion",
                status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let provider = HttpIdentityProvider::new("https://idp.example.com/", 5);
        assert_eq!(
            provider.url("/v1/codes"),
            "https://idp.example.com/v1/codes"
        );
    }
}

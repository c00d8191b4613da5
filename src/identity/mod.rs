//! Narrow port to the external identity provider. Authentication itself is
//! never implemented here; every provider interaction in the system goes
//! through [`IdentityPort`].

pub mod provider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

pub use provider::HttpIdentityProvider;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid identity assertion: {0}")]
    InvalidAssertion(String),

    #[error("Verification code rejected: {0}")]
    CodeRejected(String),

    #[error("Identity account not found: {0}")]
    NotFound(String),

    #[error("Identity provider failure: {0}")]
    Provider(String),
}

/// Profile fields the provider asserts about an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProfile {
    /// Stable external reference, unique per account
    pub auth_ref: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait IdentityPort: Send + Sync {
    /// Exchange an identity assertion for the profile it asserts
    async fn verify_assertion(&self, assertion: &str) -> Result<IdentityProfile, IdentityError>;

    /// Issue an email verification code for sign-in/sign-up
    async fn send_verification_code(&self, email: &str) -> Result<(), IdentityError>;

    /// Verify a code and receive a fresh assertion
    async fn verify_code(&self, email: &str, code: &str) -> Result<String, IdentityError>;

    /// Change the email on the provider account
    async fn change_email(&self, auth_ref: &str, new_email: &str) -> Result<(), IdentityError>;

    /// Delete the provider account. Failures are recorded by callers, not
    /// retried.
    async fn delete_account(&self, auth_ref: &str) -> Result<(), IdentityError>;
}

static PROVIDER: OnceLock<Arc<dyn IdentityPort>> = OnceLock::new();

/// Process-wide identity provider, built from config on first use.
pub fn provider() -> Arc<dyn IdentityPort> {
    PROVIDER
        .get_or_init(|| {
            let config = crate::config::config();
            Arc::new(HttpIdentityProvider::new(
                &config.identity.base_url,
                config.identity.request_timeout_secs,
            )) as Arc<dyn IdentityPort>
        })
        .clone()
}

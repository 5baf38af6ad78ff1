//! Identity-provider seam.
//!
//! The provider owns accounts, sessions and emailed passcodes. The wizard only
//! sees the handful of calls below.

use crate::signup::error::ProviderError;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How the provider should deliver the verification code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStrategy {
    #[default]
    EmailCode,
}

impl VerificationStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmailCode => "email_code",
        }
    }
}

/// Handle for an in-progress sign-up, returned by account creation and
/// required to verify the emailed code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignUpAttempt {
    pub id: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignUpStatus {
    Complete,
    MissingRequirements,
    Abandoned,
    #[serde(other)]
    Unknown,
}

/// Result of checking a code against a pending attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub status: SignUpStatus,
    pub created_session_id: Option<String>,
    pub created_user_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default)]
    pub email_address: Option<String>,
}

/// Session ids and tokens are `[A-Za-z0-9_-]+`; anything else never came
/// from the provider and must not reach a URL path or a cookie.
#[must_use]
pub fn is_session_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Whether the client finished loading and can take requests.
    fn is_loaded(&self) -> bool;

    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpAttempt, ProviderError>;

    async fn prepare_email_verification(
        &self,
        attempt: &SignUpAttempt,
        strategy: VerificationStrategy,
    ) -> Result<(), ProviderError>;

    async fn attempt_verification(
        &self,
        attempt: &SignUpAttempt,
        code: &str,
    ) -> Result<VerificationOutcome, ProviderError>;

    async fn set_active_session(&self, session_id: &str) -> Result<(), ProviderError>;

    /// Resolve the visitor behind a session token, `None` when there is no
    /// live session.
    async fn current_user(&self, session_token: &str) -> Result<Option<CurrentUser>, ProviderError>;
}

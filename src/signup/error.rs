//! Error taxonomy for the sign-up flow.
//!
//! Every variant is recoverable: the wizard reports it as a toast and stays on
//! the current step.

use thiserror::Error;

/// Shown when an error carries no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Failures talking to the identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered and refused the request; the message is meant
    /// for the visitor (e.g. "That email address is taken").
    #[error("{0}")]
    Rejected(String),

    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected identity provider response: {0}")]
    Decode(String),
}

/// Failures reaching the registration service.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("registration service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected registration service response: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum SignUpError {
    #[error("Authentication service not loaded")]
    ProviderNotLoaded,

    #[error("{0}")]
    ProviderRequestFailed(#[from] ProviderError),

    #[error("Sign-up has not been started")]
    AttemptMissing,

    #[error("Sign-up verification failed")]
    VerificationIncomplete,

    #[error("User ID not generated")]
    MissingUserId,

    #[error("{0}")]
    RegistrationRequestFailed(#[from] RegistrarError),

    #[error("User registration failed")]
    RegistrationFailed,

    #[error("Session not created")]
    MissingSessionId,
}

impl SignUpError {
    /// Text for the notification description.
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    /// Stable snake_case identifier, used in logs and API responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProviderNotLoaded => "provider_not_loaded",
            Self::ProviderRequestFailed(_) => "provider_request_failed",
            Self::AttemptMissing => "attempt_missing",
            Self::VerificationIncomplete => "verification_incomplete",
            Self::MissingUserId => "missing_user_id",
            Self::RegistrationRequestFailed(_) => "registration_request_failed",
            Self::RegistrationFailed => "registration_failed",
            Self::MissingSessionId => "missing_session_id",
        }
    }
}

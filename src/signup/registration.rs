//! Seam for the service that persists the user record once the email is
//! verified.

use crate::signup::{error::RegistrarError, form::AccountType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Status code the registrar reports on success.
pub const REGISTRATION_OK: u16 = 200;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RegisteredUser {
    pub id: String,
    #[serde(rename = "fullname")]
    pub full_name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

/// HTTP-status-shaped answer from the registrar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistrationResponse {
    pub status: u16,
    pub user: Option<RegisteredUser>,
}

impl RegistrationResponse {
    /// The registered user, only when the call reported success.
    #[must_use]
    pub fn into_registered(self) -> Option<RegisteredUser> {
        if self.status == REGISTRATION_OK {
            self.user
        } else {
            None
        }
    }
}

#[async_trait]
pub trait Registrar: Send + Sync {
    async fn finalize_registration(
        &self,
        full_name: &str,
        user_id: &str,
        account_type: AccountType,
    ) -> Result<RegistrationResponse, RegistrarError>;
}

//! Registrar backed by the registration service's HTTP endpoint.

use super::build_client;
use crate::signup::{AccountType, RegisteredUser, Registrar, RegistrarError, RegistrationResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct RegistrationBody {
    #[serde(default)]
    user: Option<RegisteredUser>,
}

pub struct HttpRegistrar {
    client: Client,
    url: Url,
}

impl HttpRegistrar {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url) -> Result<Self, RegistrarError> {
        Ok(Self {
            client: build_client()?,
            url,
        })
    }
}

#[async_trait]
impl Registrar for HttpRegistrar {
    #[instrument(skip(self, full_name))]
    async fn finalize_registration(
        &self,
        full_name: &str,
        user_id: &str,
        account_type: AccountType,
    ) -> Result<RegistrationResponse, RegistrarError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&json!({
                "fullname": full_name,
                "userId": user_id,
                "type": account_type,
            }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        // The status is the contract; a body we cannot read just means no user.
        let user = match serde_json::from_slice::<RegistrationBody>(&bytes) {
            Ok(body) => body.user,
            Err(e) => {
                warn!(status, "unreadable registration response: {e}");
                None
            }
        };
        debug!(status, has_user = user.is_some(), "registration finalized");

        Ok(RegistrationResponse { status, user })
    }
}

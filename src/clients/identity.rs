//! Identity provider over its bearer-authenticated JSON API.
//!
//! The client starts out "not loaded"; [`HttpIdentityProvider::load`] checks
//! the environment endpoint and flips it once the provider answers. Sign-up
//! calls made before that fail fast without touching the network.

use super::{build_client, endpoint_url};
use crate::signup::{
    provider::is_session_token, CurrentUser, IdentityProvider, ProviderError, SignUpAttempt,
    SignUpStatus, VerificationOutcome, VerificationStrategy,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct SignUpResource {
    id: String,
    status: SignUpStatus,
    #[serde(default)]
    created_user_id: Option<String>,
    #[serde(default)]
    created_session_id: Option<String>,
}

pub struct HttpIdentityProvider {
    client: Client,
    base_url: Url,
    secret_key: SecretString,
    loaded: AtomicBool,
}

impl HttpIdentityProvider {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, secret_key: SecretString) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client()?,
            base_url,
            secret_key,
            loaded: AtomicBool::new(false),
        })
    }

    /// Check the provider and mark the client loaded when it answers.
    ///
    /// # Errors
    ///
    /// Returns the load failure; the client stays unloaded.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), ProviderError> {
        let response = self
            .authorized(self.client.get(self.url("/v1/environment")))
            .send()
            .await?;
        check(response).await?;

        self.loaded.store(true, Ordering::SeqCst);
        info!(base_url = %self.base_url, "identity provider loaded");

        Ok(())
    }

    /// Retry until the provider answers, backing off from `initial` and
    /// doubling up to `max` between attempts. Meant to run in a spawned task
    /// so a provider outage at boot clears on its own.
    pub async fn load_until_ready(&self, initial: Duration, max: Duration) {
        let mut backoff = initial;
        for attempt in 1u32.. {
            match self.load().await {
                Ok(()) => {
                    info!(attempt, "identity provider ready");
                    return;
                }
                Err(err) => {
                    warn!(
                        attempt,
                        retry_in_ms = backoff.as_millis(),
                        "identity provider not loaded: {err}"
                    );
                    sleep(backoff).await;
                    backoff = (backoff * 2).min(max);
                }
            }
        }
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.secret_key.expose_secret())
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response, ProviderError> {
        let response = self
            .authorized(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        check(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, ProviderError> {
        decode(self.post(path, body).await?).await
    }
}

/// Pass successful responses through, turn everything else into a
/// `Rejected` error carrying the provider's own message.
async fn check(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("identity provider error")
            .to_string()
    });
    error!(%status, "identity provider rejected request: {message}");

    Err(ProviderError::Rejected(message))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

/// `{"errors": [{"message": "...", "long_message": "..."}]}`
fn error_message(body: &Value) -> Option<String> {
    let first = body.get("errors")?.get(0)?;
    first
        .get("long_message")
        .and_then(Value::as_str)
        .or_else(|| first.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    #[instrument(skip_all)]
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpAttempt, ProviderError> {
        let body = json!({
            "email_address": email,
            "password": password.expose_secret(),
        });
        let resource: SignUpResource = self.post_json("/v1/sign_ups", &body).await?;
        debug!(attempt_id = %resource.id, status = ?resource.status, "sign-up created");

        Ok(SignUpAttempt {
            id: resource.id,
            email: email.to_string(),
        })
    }

    #[instrument(skip_all, fields(attempt_id = %attempt.id))]
    async fn prepare_email_verification(
        &self,
        attempt: &SignUpAttempt,
        strategy: VerificationStrategy,
    ) -> Result<(), ProviderError> {
        let body = json!({ "strategy": strategy.as_str() });
        self.post(
            &format!("/v1/sign_ups/{}/prepare_verification", attempt.id),
            &body,
        )
        .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(attempt_id = %attempt.id))]
    async fn attempt_verification(
        &self,
        attempt: &SignUpAttempt,
        code: &str,
    ) -> Result<VerificationOutcome, ProviderError> {
        let body = json!({
            "strategy": VerificationStrategy::EmailCode.as_str(),
            "code": code,
        });
        let resource: SignUpResource = self
            .post_json(
                &format!("/v1/sign_ups/{}/attempt_verification", attempt.id),
                &body,
            )
            .await?;

        Ok(VerificationOutcome {
            status: resource.status,
            created_session_id: resource.created_session_id,
            created_user_id: resource.created_user_id,
        })
    }

    #[instrument(skip_all)]
    async fn set_active_session(&self, session_id: &str) -> Result<(), ProviderError> {
        self.post(&format!("/v1/sessions/{session_id}/activate"), &json!({}))
            .await?;
        Ok(())
    }

    #[instrument(skip_all)]
    async fn current_user(
        &self,
        session_token: &str,
    ) -> Result<Option<CurrentUser>, ProviderError> {
        // Tokens go into the path; anything outside the provider's alphabet
        // cannot name a session.
        if !is_session_token(session_token) {
            return Ok(None);
        }

        let response = self
            .authorized(
                self.client
                    .get(self.url(&format!("/v1/sessions/{session_token}/user"))),
            )
            .send()
            .await?;

        // Unknown or expired sessions are "no user", not an error.
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND
        ) {
            return Ok(None);
        }

        let user: CurrentUser = decode(check(response).await?).await?;

        Ok(Some(user))
    }
}

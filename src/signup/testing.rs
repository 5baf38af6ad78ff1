//! In-memory fakes for the provider and registrar seams.

use crate::signup::{
    error::{ProviderError, RegistrarError},
    form::AccountType,
    provider::{
        CurrentUser, IdentityProvider, SignUpAttempt, SignUpStatus, VerificationOutcome,
        VerificationStrategy,
    },
    registration::{RegisteredUser, Registrar, RegistrationResponse},
    wizard::LoadingFlag,
};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) fn registered_user() -> RegisteredUser {
    RegisteredUser {
        id: "rec_1".to_string(),
        full_name: "Ada Lovelace".to_string(),
        account_type: AccountType::Owner,
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct FakeProvider {
    loaded: bool,
    create_error: Option<String>,
    prepare_error: Option<String>,
    activation_error: Option<String>,
    verification: Mutex<VerificationOutcome>,
    current_user: Option<CurrentUser>,
    calls: Mutex<Vec<&'static str>>,
    activated: Mutex<Vec<String>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            loaded: true,
            create_error: None,
            prepare_error: None,
            activation_error: None,
            verification: Mutex::new(VerificationOutcome {
                status: SignUpStatus::Complete,
                created_session_id: Some("sess_1".to_string()),
                created_user_id: Some("user_1".to_string()),
            }),
            current_user: None,
            calls: Mutex::new(Vec::new()),
            activated: Mutex::new(Vec::new()),
        }
    }
}

impl FakeProvider {
    pub(crate) fn not_loaded() -> Self {
        Self {
            loaded: false,
            ..Self::default()
        }
    }

    pub(crate) fn fail_create(mut self, message: &str) -> Self {
        self.create_error = Some(message.to_string());
        self
    }

    pub(crate) fn fail_prepare(mut self, message: &str) -> Self {
        self.prepare_error = Some(message.to_string());
        self
    }

    pub(crate) fn fail_activation(mut self, message: &str) -> Self {
        self.activation_error = Some(message.to_string());
        self
    }

    pub(crate) fn with_verification(self, outcome: VerificationOutcome) -> Self {
        self.set_verification(outcome);
        self
    }

    pub(crate) fn with_current_user(mut self, user: CurrentUser) -> Self {
        self.current_user = Some(user);
        self
    }

    pub(crate) fn set_verification(&self, outcome: VerificationOutcome) {
        *lock(&self.verification) = outcome;
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    pub(crate) fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub(crate) fn activated_sessions(&self) -> Vec<String> {
        lock(&self.activated).clone()
    }

    fn record(&self, call: &'static str) {
        lock(&self.calls).push(call);
    }
}

fn rejected(message: Option<&String>) -> Result<(), ProviderError> {
    match message {
        Some(message) => Err(ProviderError::Rejected(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn create_account(
        &self,
        email: &str,
        _password: &SecretString,
    ) -> Result<SignUpAttempt, ProviderError> {
        self.record("create_account");
        rejected(self.create_error.as_ref())?;
        Ok(SignUpAttempt {
            id: "sua_1".to_string(),
            email: email.to_string(),
        })
    }

    async fn prepare_email_verification(
        &self,
        _attempt: &SignUpAttempt,
        _strategy: VerificationStrategy,
    ) -> Result<(), ProviderError> {
        self.record("prepare_email_verification");
        rejected(self.prepare_error.as_ref())
    }

    async fn attempt_verification(
        &self,
        _attempt: &SignUpAttempt,
        _code: &str,
    ) -> Result<VerificationOutcome, ProviderError> {
        self.record("attempt_verification");
        Ok(lock(&self.verification).clone())
    }

    async fn set_active_session(&self, session_id: &str) -> Result<(), ProviderError> {
        self.record("set_active_session");
        rejected(self.activation_error.as_ref())?;
        lock(&self.activated).push(session_id.to_string());
        Ok(())
    }

    async fn current_user(
        &self,
        _session_token: &str,
    ) -> Result<Option<CurrentUser>, ProviderError> {
        self.record("current_user");
        Ok(self.current_user.clone())
    }
}

pub(crate) struct FakeRegistrar {
    response: RegistrationResponse,
    calls: Mutex<Vec<(String, String, AccountType)>>,
    watched: Mutex<Option<LoadingFlag>>,
    observed: Arc<Mutex<Vec<bool>>>,
}

impl Default for FakeRegistrar {
    fn default() -> Self {
        Self::responding(RegistrationResponse {
            status: 200,
            user: Some(registered_user()),
        })
    }
}

impl FakeRegistrar {
    pub(crate) fn responding(response: RegistrationResponse) -> Self {
        Self {
            response,
            calls: Mutex::new(Vec::new()),
            watched: Mutex::new(None),
            observed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        lock(&self.calls).len()
    }

    pub(crate) fn last_call(&self) -> Option<(String, String, AccountType)> {
        lock(&self.calls).last().cloned()
    }

    /// Sample `flag` every time the registrar is called.
    pub(crate) fn watch(&self, flag: LoadingFlag) {
        *lock(&self.watched) = Some(flag);
    }

    pub(crate) fn observed_loading(&self) -> Arc<Mutex<Vec<bool>>> {
        self.observed.clone()
    }
}

#[async_trait]
impl Registrar for FakeRegistrar {
    async fn finalize_registration(
        &self,
        full_name: &str,
        user_id: &str,
        account_type: AccountType,
    ) -> Result<RegistrationResponse, RegistrarError> {
        lock(&self.calls).push((full_name.to_string(), user_id.to_string(), account_type));
        if let Some(flag) = lock(&self.watched).as_ref() {
            lock(&self.observed).push(flag.is_loading());
        }
        Ok(self.response.clone())
    }
}

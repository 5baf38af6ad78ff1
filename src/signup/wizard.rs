//! Sign-up wizard controller.
//!
//! Flow Overview: create the account and email a code (`generate_otp`), then
//! verify the code, finalize the registration, activate the session and go to
//! the dashboard (`submit`). Each step aborts at the first failure, reports it
//! as a toast and leaves the wizard where it was.

use crate::signup::{
    error::SignUpError,
    form::RegistrationDraft,
    navigate::{Navigator, DASHBOARD_ROUTE},
    notify::{Notifier, Toast},
    provider::{IdentityProvider, SignUpAttempt, SignUpStatus, VerificationStrategy},
    registration::{RegisteredUser, Registrar},
};
use secrecy::SecretString;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

const NOT_LOADED_TITLE: &str = "Error";
const OTP_ERROR_TITLE: &str = "OTP Generation Error";
const REGISTRATION_ERROR_TITLE: &str = "Registration Error";

/// Which screen the flow is on, from the controller's point of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardPhase {
    #[default]
    CollectingCredentials,
    VerifyingOtp,
    Finalizing,
    Complete,
}

/// Visible screen index. Owned by whoever renders the wizard; the controller
/// only ever moves it forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct StepCursor(u8);

impl StepCursor {
    #[must_use]
    pub const fn new(step: u8) -> Self {
        Self(step)
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 = self.0.saturating_add(1);
    }
}

/// Data the controller carries between operations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WizardState {
    phase: WizardPhase,
    attempt: Option<SignUpAttempt>,
}

impl WizardState {
    #[must_use]
    pub const fn phase(&self) -> WizardPhase {
        self.phase
    }

    #[must_use]
    pub const fn attempt(&self) -> Option<&SignUpAttempt> {
        self.attempt.as_ref()
    }
}

/// Advisory in-flight flag for `submit`. Clones share the same flag, so a UI
/// can keep one to disable its submit control.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn begin(&self) -> LoadingGuard {
        self.0.store(true, Ordering::SeqCst);
        LoadingGuard(self.clone())
    }
}

/// Clears the flag when dropped, whichever way `submit` exits.
struct LoadingGuard(LoadingFlag);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        (self.0).0.store(false, Ordering::SeqCst);
    }
}

/// Terminal success value of the wizard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivatedSession {
    pub session_id: String,
    pub user: RegisteredUser,
}

pub struct SignUpWizard {
    provider: Arc<dyn IdentityProvider>,
    registrar: Arc<dyn Registrar>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    state: WizardState,
    loading: LoadingFlag,
}

impl SignUpWizard {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        registrar: Arc<dyn Registrar>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            provider,
            registrar,
            notifier,
            navigator,
            state: WizardState::default(),
            loading: LoadingFlag::default(),
        }
    }

    /// Resume a wizard from previously saved state.
    #[must_use]
    pub fn with_state(mut self, state: WizardState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub const fn state(&self) -> &WizardState {
        &self.state
    }

    #[must_use]
    pub fn into_state(self) -> WizardState {
        self.state
    }

    /// Shared handle on the in-flight flag.
    #[must_use]
    pub fn loading(&self) -> LoadingFlag {
        self.loading.clone()
    }

    /// Create the account and have the provider email a verification code.
    /// On success the attempt handle is kept and `step` moves forward by one.
    ///
    /// # Errors
    ///
    /// Returns the failure after reporting it; `step` is left untouched.
    #[instrument(skip_all)]
    pub async fn generate_otp(
        &mut self,
        email: &str,
        password: &SecretString,
        step: &mut StepCursor,
    ) -> Result<(), SignUpError> {
        match self.request_otp(email, password).await {
            Ok(attempt) => {
                info!(attempt_id = %attempt.id, "verification code sent");
                self.state.attempt = Some(attempt);
                self.state.phase = WizardPhase::VerifyingOtp;
                step.advance();
                Ok(())
            }
            Err(err) => {
                self.report(OTP_ERROR_TITLE, &err);
                Err(err)
            }
        }
    }

    async fn request_otp(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<SignUpAttempt, SignUpError> {
        if !self.provider.is_loaded() {
            return Err(SignUpError::ProviderNotLoaded);
        }

        let attempt = self.provider.create_account(email, password).await?;
        self.provider
            .prepare_email_verification(&attempt, VerificationStrategy::EmailCode)
            .await?;

        Ok(attempt)
    }

    /// Verify the code, finalize the registration, activate the new session
    /// and navigate to the dashboard.
    ///
    /// # Errors
    ///
    /// Returns the first failure after reporting it; the wizard stays on the
    /// verification step.
    #[instrument(skip(self, draft), fields(account_type = %draft.account_type))]
    pub async fn submit(
        &mut self,
        draft: &RegistrationDraft,
    ) -> Result<ActivatedSession, SignUpError> {
        if !self.provider.is_loaded() {
            let err = SignUpError::ProviderNotLoaded;
            self.report(REGISTRATION_ERROR_TITLE, &err);
            return Err(err);
        }

        let _loading = self.loading.begin();
        let previous = self.state.phase;
        self.state.phase = WizardPhase::Finalizing;

        match self.finalize(draft).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "sign-up complete");
                self.state.phase = WizardPhase::Complete;
                self.state.attempt = None;
                Ok(session)
            }
            Err(err) => {
                self.state.phase = previous;
                self.report(REGISTRATION_ERROR_TITLE, &err);
                Err(err)
            }
        }
    }

    async fn finalize(&self, draft: &RegistrationDraft) -> Result<ActivatedSession, SignUpError> {
        let attempt = self
            .state
            .attempt
            .as_ref()
            .ok_or(SignUpError::AttemptMissing)?;

        let outcome = self
            .provider
            .attempt_verification(attempt, &draft.otp)
            .await?;
        if outcome.status != SignUpStatus::Complete {
            return Err(SignUpError::VerificationIncomplete);
        }

        let user_id = outcome
            .created_user_id
            .filter(|id| !id.is_empty())
            .ok_or(SignUpError::MissingUserId)?;

        let user = self
            .registrar
            .finalize_registration(&draft.full_name, &user_id, draft.account_type)
            .await?
            .into_registered()
            .ok_or(SignUpError::RegistrationFailed)?;

        let session_id = outcome
            .created_session_id
            .filter(|id| !id.is_empty())
            .ok_or(SignUpError::MissingSessionId)?;
        self.provider.set_active_session(&session_id).await?;
        self.navigator.push(DASHBOARD_ROUTE);

        Ok(ActivatedSession { session_id, user })
    }

    fn report(&self, title: &str, err: &SignUpError) {
        warn!(kind = err.kind(), "sign-up step failed: {err}");
        let title = if matches!(err, SignUpError::ProviderNotLoaded) {
            NOT_LOADED_TITLE
        } else {
            title
        };
        self.notifier.notify(Toast::new(title, err.user_message()));
    }
}

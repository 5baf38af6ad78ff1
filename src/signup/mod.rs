//! Sign-up wizard core.
//!
//! The wizard is a thin sequential state machine over two external
//! collaborators: the identity provider (account creation, emailed passcodes,
//! sessions) and the registrar that persists the user record. Both are
//! injected as trait objects so the flow can run against fakes in tests and
//! against the HTTP adapters in [`crate::clients`] in production.
//!
//! Operations return an explicit [`SignUpError`] and also report it through
//! the injected [`Notifier`], so callers can render toasts without matching
//! on the error themselves.

pub mod error;
pub mod form;
pub mod navigate;
pub mod notify;
pub mod provider;
pub mod registration;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;

pub use self::error::{ProviderError, RegistrarError, SignUpError, GENERIC_ERROR_MESSAGE};
pub use self::form::{AccountType, Field, FieldErrors, RegistrationDraft};
pub use self::navigate::{NavigationRecorder, Navigator, DASHBOARD_ROUTE, HOME_ROUTE};
pub use self::notify::{Notifier, Toast, ToastQueue};
pub use self::provider::{
    CurrentUser, IdentityProvider, SignUpAttempt, SignUpStatus, VerificationOutcome,
    VerificationStrategy,
};
pub use self::registration::{RegisteredUser, Registrar, RegistrationResponse};
pub use self::wizard::{
    ActivatedSession, LoadingFlag, SignUpWizard, StepCursor, WizardPhase, WizardState,
};

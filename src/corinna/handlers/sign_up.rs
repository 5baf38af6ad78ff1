//! Sign-up wizard endpoints.
//!
//! Flow Overview: `otp` stores the credentials and has the provider email a
//! code; `complete` verifies it and finalizes the account. Both answer with
//! the wizard's step, phase and any toasts raised along the way.

use super::{session_cookie, status_for};
use crate::{
    corinna::{state::WizardSlot, AppState, WizardEntry},
    signup::{
        form::normalize_email, AccountType, FieldErrors, NavigationRecorder, RegistrationDraft,
        StepCursor, Toast, ToastQueue, WizardPhase, GENERIC_ERROR_MESSAGE,
    },
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use ulid::Ulid;
use utoipa::ToSchema;

const IN_PROGRESS: &str = "A sign-up request is already in progress";
const UNKNOWN_WIZARD: &str = "Unknown sign-up wizard";

#[derive(Debug, Deserialize, ToSchema)]
pub struct OtpRequest {
    /// Reuse an existing wizard, e.g. to resend with corrected credentials.
    #[serde(default)]
    pub wizard_id: Option<String>,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    pub email: String,
    pub confirm_email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteRequest {
    pub wizard_id: String,
    pub full_name: String,
    #[serde(default)]
    pub account_type: Option<AccountType>,
    pub otp: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WizardResponse {
    pub wizard_id: String,
    pub step: StepCursor,
    pub phase: WizardPhase,
    pub toasts: Vec<Toast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WizardResponse {
    fn new(wizard_id: Ulid, entry: &WizardEntry, toasts: Vec<Toast>) -> Self {
        Self {
            wizard_id: wizard_id.to_string(),
            step: entry.step,
            phase: entry.state.phase(),
            toasts,
            redirect: None,
            error: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationResponse {
    pub errors: FieldErrors,
}

async fn lookup(state: &AppState, wizard_id: &str) -> Option<(Ulid, WizardSlot)> {
    let id = Ulid::from_string(wizard_id).ok()?;
    let slot = state.wizards().get(id).await?;
    Some((id, slot))
}

fn invalid(errors: FieldErrors) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ValidationResponse { errors }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/auth/sign-up/otp",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "Account created and verification code sent", body = WizardResponse),
        (status = 404, description = "Unknown wizard id", body = String),
        (status = 409, description = "Another request for this wizard is in flight", body = String),
        (status = 422, description = "Form validation failed", body = ValidationResponse),
        (status = 502, description = "Identity provider rejected the request", body = WizardResponse),
        (status = 503, description = "Identity provider not loaded", body = WizardResponse)
    ),
    tag = "sign-up"
)]
pub async fn generate_otp(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<OtpRequest>>,
) -> impl IntoResponse {
    let request: OtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Validate before touching the store so rejected forms leave no wizard behind.
    let credentials = RegistrationDraft {
        email: normalize_email(&request.email),
        confirm_email: normalize_email(&request.confirm_email),
        password: SecretString::from(request.password),
        confirm_password: SecretString::from(request.confirm_password),
        ..RegistrationDraft::default()
    };
    if let Err(errors) = credentials.validate_credentials() {
        return invalid(errors);
    }

    let (wizard_id, slot) = match request.wizard_id.as_deref() {
        Some(id) => match lookup(&state, id).await {
            Some(found) => found,
            None => return (StatusCode::NOT_FOUND, UNKNOWN_WIZARD.to_string()).into_response(),
        },
        None => state.wizards().create().await,
    };

    let Ok(mut guard) = slot.try_lock() else {
        return (StatusCode::CONFLICT, IN_PROGRESS.to_string()).into_response();
    };
    let entry = &mut *guard;
    entry.touch();

    entry.draft.email = credentials.email;
    entry.draft.confirm_email = credentials.confirm_email;
    entry.draft.password = credentials.password;
    entry.draft.confirm_password = credentials.confirm_password;
    if let Some(account_type) = request.account_type {
        entry.draft.account_type = account_type;
    }

    let toasts = Arc::new(ToastQueue::new());
    let mut wizard = state.wizard(
        entry.state.clone(),
        toasts.clone(),
        Arc::new(NavigationRecorder::new()),
    );
    let result = wizard
        .generate_otp(&entry.draft.email, &entry.draft.password, &mut entry.step)
        .await;
    entry.state = wizard.into_state();

    let mut response = WizardResponse::new(wizard_id, entry, toasts.drain());
    match result {
        Ok(()) => {
            info!(%wizard_id, step = entry.step.get(), "verification code requested");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => {
            response.error = Some(err.kind().to_string());
            (status_for(&err), Json(response)).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/sign-up/complete",
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Registration complete, session cookie set", body = WizardResponse),
        (status = 400, description = "Verification code not accepted", body = WizardResponse),
        (status = 404, description = "Unknown wizard id", body = String),
        (status = 409, description = "No pending sign-up, or another request is in flight", body = WizardResponse),
        (status = 422, description = "Form validation failed", body = ValidationResponse),
        (status = 502, description = "Identity provider or registration service failed", body = WizardResponse),
        (status = 503, description = "Identity provider not loaded", body = WizardResponse)
    ),
    tag = "sign-up"
)]
pub async fn complete(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<CompleteRequest>>,
) -> impl IntoResponse {
    let request: CompleteRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let Some((wizard_id, slot)) = lookup(&state, &request.wizard_id).await else {
        return (StatusCode::NOT_FOUND, UNKNOWN_WIZARD.to_string()).into_response();
    };

    let Ok(mut guard) = slot.try_lock() else {
        return (StatusCode::CONFLICT, IN_PROGRESS.to_string()).into_response();
    };
    let entry = &mut *guard;
    entry.touch();

    entry.draft.full_name = request.full_name.trim().to_string();
    entry.draft.otp = request.otp.trim().to_string();
    if let Some(account_type) = request.account_type {
        entry.draft.account_type = account_type;
    }

    if let Err(errors) = entry.draft.validate_profile() {
        return invalid(errors);
    }

    let toasts = Arc::new(ToastQueue::new());
    let navigator = Arc::new(NavigationRecorder::new());
    let mut wizard = state.wizard(entry.state.clone(), toasts.clone(), navigator.clone());
    let result = wizard.submit(&entry.draft).await;
    entry.state = wizard.into_state();

    let mut response = WizardResponse::new(wizard_id, entry, toasts.drain());
    match result {
        Ok(session) => {
            state.wizards().remove(wizard_id).await;
            info!(%wizard_id, "sign-up wizard complete");

            let Some(cookie) = session_cookie(&session.session_id, state.secure_cookies()) else {
                error!(%wizard_id, "provider returned a session id unfit for a cookie");
                response.error = Some("invalid_session_id".to_string());
                response
                    .toasts
                    .push(Toast::new("Registration Error", GENERIC_ERROR_MESSAGE));
                return (StatusCode::BAD_GATEWAY, Json(response)).into_response();
            };

            response.redirect = navigator.last();
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);
            (StatusCode::OK, headers, Json(response)).into_response()
        }
        Err(err) => {
            response.error = Some(err.kind().to_string());
            (status_for(&err), Json(response)).into_response()
        }
    }
}

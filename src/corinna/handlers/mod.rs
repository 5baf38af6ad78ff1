pub mod gate;
pub mod health;
pub mod sign_up;

// common functions for the handlers
use crate::signup::{provider::is_session_token, SignUpError};
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue, StatusCode,
};

pub const SESSION_COOKIE_NAME: &str = "corinna_session";

/// Map a wizard failure to the status the browser sees. The body always
/// carries the toast, so the status is only for clients and logs.
#[must_use]
pub fn status_for(err: &SignUpError) -> StatusCode {
    match err {
        SignUpError::ProviderNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
        SignUpError::VerificationIncomplete => StatusCode::BAD_REQUEST,
        SignUpError::AttemptMissing => StatusCode::CONFLICT,
        SignUpError::ProviderRequestFailed(_)
        | SignUpError::MissingUserId
        | SignUpError::RegistrationRequestFailed(_)
        | SignUpError::RegistrationFailed
        | SignUpError::MissingSessionId => StatusCode::BAD_GATEWAY,
    }
}

/// Session token from `Authorization: Bearer` or the session cookie.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.trim().strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// `HttpOnly` cookie carrying the freshly activated session. `None` when the
/// id is not a plain token.
pub(crate) fn session_cookie(session_id: &str, secure: bool) -> Option<HeaderValue> {
    if !is_session_token(session_id) {
        return None;
    }
    let mut cookie = format!("{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

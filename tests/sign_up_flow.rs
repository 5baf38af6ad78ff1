use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    response::Response,
    Router,
};
use corinna::{
    corinna::{router, AppState},
    gate::page::{CREDENTIALS_STEP, OTP_STEP},
    signup::{
        AccountType, CurrentUser, IdentityProvider, ProviderError, RegisteredUser, Registrar,
        RegistrarError, RegistrationResponse, SignUpAttempt, SignUpStatus, VerificationOutcome,
        VerificationStrategy,
    },
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tower::ServiceExt;
use ulid::Ulid;

const SIGNED_IN_TOKEN: &str = "sess_existing";

struct Provider {
    loaded: bool,
    status: SignUpStatus,
    session_id: String,
    activated: Mutex<Vec<String>>,
}

impl Provider {
    fn new() -> Self {
        Self {
            loaded: true,
            status: SignUpStatus::Complete,
            session_id: "sess_new".to_string(),
            activated: Mutex::new(Vec::new()),
        }
    }

    fn activated(&self) -> Vec<String> {
        self.activated.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl IdentityProvider for Provider {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    async fn create_account(
        &self,
        email: &str,
        _password: &SecretString,
    ) -> Result<SignUpAttempt, ProviderError> {
        if email.ends_with("@taken.dev") {
            return Err(ProviderError::Rejected(
                "That email address is taken. Please try another.".to_string(),
            ));
        }
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
        Ok(())
    }

    async fn attempt_verification(
        &self,
        _attempt: &SignUpAttempt,
        _code: &str,
    ) -> Result<VerificationOutcome, ProviderError> {
        Ok(VerificationOutcome {
            status: self.status.clone(),
            created_session_id: Some(self.session_id.clone()),
            created_user_id: Some("user_1".to_string()),
        })
    }

    async fn set_active_session(&self, session_id: &str) -> Result<(), ProviderError> {
        if let Ok(mut activated) = self.activated.lock() {
            activated.push(session_id.to_string());
        }
        Ok(())
    }

    async fn current_user(&self, session_token: &str) -> Result<Option<CurrentUser>, ProviderError> {
        Ok((session_token == SIGNED_IN_TOKEN).then(|| CurrentUser {
            id: "user_0".to_string(),
            email_address: Some("ada@corinna.dev".to_string()),
        }))
    }
}

struct FixedRegistrar(u16);

#[async_trait]
impl Registrar for FixedRegistrar {
    async fn finalize_registration(
        &self,
        full_name: &str,
        user_id: &str,
        account_type: AccountType,
    ) -> Result<RegistrationResponse, RegistrarError> {
        Ok(RegistrationResponse {
            status: self.0,
            user: (self.0 == 200).then(|| RegisteredUser {
                id: user_id.to_string(),
                full_name: full_name.to_string(),
                account_type,
            }),
        })
    }
}

fn app_with_state(provider: Arc<Provider>, registrar_status: u16) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(
        provider,
        Arc::new(FixedRegistrar(registrar_status)),
        Duration::from_secs(60),
    ));
    (router(state.clone()), state)
}

fn app(provider: Arc<Provider>, registrar_status: u16) -> Router {
    app_with_state(provider, registrar_status).0
}

async fn page_html(app: &Router) -> Result<String> {
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/auth/sign-up").body(Body::empty())?)
        .await?;
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

/// Heading of the screen the page tags with `data-step-index="{step}"`.
fn screen_heading(html: &str, step: u64) -> Option<String> {
    let tag = format!("data-step-index=\"{step}\"");
    let rest = &html[html.find(&tag)?..];
    let rest = &rest[rest.find("<h2>")? + "<h2>".len()..];
    Some(rest[..rest.find("</h2>")?].to_string())
}

async fn post(app: &Router, uri: &str, body: &Value) -> Result<Response> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?;
    Ok(app.clone().oneshot(request).await?)
}

async fn json_body(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn credentials(email: &str) -> Value {
    json!({
        "account_type": "student",
        "email": email,
        "confirm_email": email,
        "password": "correct horse",
        "confirm_password": "correct horse",
    })
}

async fn start_wizard(app: &Router) -> Result<String> {
    let response = post(app, "/auth/sign-up/otp", &credentials("ada@corinna.dev")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    body["wizard_id"]
        .as_str()
        .map(ToString::to_string)
        .context("missing wizard_id")
}

#[tokio::test]
async fn gate_renders_wizard_for_anonymous_visitor() -> Result<()> {
    let app = app(Arc::new(Provider::new()), 200);

    let response = app
        .oneshot(Request::builder().uri("/auth/sign-up").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let html = String::from_utf8(bytes.to_vec())?;
    assert!(html.contains("data-otp-endpoint"));
    Ok(())
}

#[tokio::test]
async fn gate_redirects_signed_in_visitor_home() -> Result<()> {
    let app = app(Arc::new(Provider::new()), 200);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/sign-up")
                .header(COOKIE, format!("corinna_session={SIGNED_IN_TOKEN}"))
                .body(Body::empty())?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/")
    );
    Ok(())
}

#[tokio::test]
async fn otp_request_moves_wizard_to_verification() -> Result<()> {
    let app = app(Arc::new(Provider::new()), 200);

    let response = post(&app, "/auth/sign-up/otp", &credentials(" Ada@Corinna.dev ")).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["step"], OTP_STEP);
    assert_eq!(body["phase"], "verifying_otp");
    assert_eq!(body["toasts"], json!([]));

    // The returned step points the page at its code-entry screen.
    let step = body["step"].as_u64().context("step is not a number")?;
    let html = page_html(&app).await?;
    assert_eq!(screen_heading(&html, step).as_deref(), Some("Enter OTP"));
    Ok(())
}

#[tokio::test]
async fn otp_request_with_invalid_form_is_rejected() -> Result<()> {
    let app = app(Arc::new(Provider::new()), 200);

    let response = post(
        &app,
        "/auth/sign-up/otp",
        &json!({
            "email": "ada@corinna.dev",
            "confirm_email": "bob@corinna.dev",
            "password": "short",
            "confirm_password": "short",
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await?;
    assert!(body["errors"]["confirm_email"].is_string());
    assert!(body["errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn otp_rejection_surfaces_provider_message() -> Result<()> {
    let app = app(Arc::new(Provider::new()), 200);

    let response = post(&app, "/auth/sign-up/otp", &credentials("ada@taken.dev")).await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await?;
    assert_eq!(body["step"], CREDENTIALS_STEP);
    assert_eq!(body["toasts"][0]["title"], "OTP Generation Error");
    assert_eq!(
        body["toasts"][0]["description"],
        "That email address is taken. Please try another."
    );
    Ok(())
}

#[tokio::test]
async fn unknown_wizard_is_not_found() -> Result<()> {
    let app = app(Arc::new(Provider::new()), 200);

    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn complete_sets_session_cookie_and_redirects() -> Result<()> {
    let provider = Arc::new(Provider::new());
    let app = app(provider.clone(), 200);
    let wizard_id = start_wizard(&app).await?;

    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
        .context("missing session cookie")?;
    assert!(cookie.starts_with("corinna_session=sess_new;"));

    let body = json_body(response).await?;
    assert_eq!(body["redirect"], "/dashboard");
    assert_eq!(body["phase"], "complete");
    assert_eq!(provider.activated(), vec!["sess_new".to_string()]);

    // The wizard is gone once the flow completes.
    let again = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn incomplete_verification_keeps_wizard() -> Result<()> {
    let provider = Arc::new(Provider {
        status: SignUpStatus::MissingRequirements,
        ..Provider::new()
    });
    let app = app(provider.clone(), 200);
    let wizard_id = start_wizard(&app).await?;

    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "000000",
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = json_body(response).await?;
    assert_eq!(body["error"], "verification_incomplete");
    assert_eq!(body["toasts"][0]["title"], "Registration Error");
    assert_eq!(body["step"], OTP_STEP);
    assert!(provider.activated().is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_registration_does_not_activate_session() -> Result<()> {
    let provider = Arc::new(Provider::new());
    let app = app(provider.clone(), 500);
    let wizard_id = start_wizard(&app).await?;

    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = json_body(response).await?;
    assert_eq!(body["error"], "registration_failed");
    assert_eq!(body["toasts"][0]["description"], "User registration failed");
    assert!(provider.activated().is_empty());
    Ok(())
}

#[tokio::test]
async fn health_reports_provider_state() -> Result<()> {
    let app = app(
        Arc::new(Provider {
            loaded: false,
            ..Provider::new()
        }),
        200,
    );

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await?;
    assert_eq!(body["identity_provider"], "not loaded");
    Ok(())
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = app(Arc::new(Provider::new()), 200);

    let response = app
        .oneshot(Request::builder().uri("/openapi.json").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert!(body["paths"]["/auth/sign-up/otp"].is_object());
    Ok(())
}

#[tokio::test]
async fn busy_wizard_answers_conflict() -> Result<()> {
    let (app, state) = app_with_state(Arc::new(Provider::new()), 200);
    let wizard_id = start_wizard(&app).await?;

    let slot = state
        .wizards()
        .get(Ulid::from_string(&wizard_id)?)
        .await
        .context("wizard not stored")?;
    let guard = slot.lock().await;

    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&bytes[..], b"A sign-up request is already in progress");

    let mut resend = credentials("ada@corinna.dev");
    resend["wizard_id"] = json!(wizard_id);
    let response = post(&app, "/auth/sign-up/otp", &resend).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Once the in-flight request is done the wizard accepts the submit.
    drop(guard);
    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unloaded_provider_answers_service_unavailable() -> Result<()> {
    let provider = Arc::new(Provider {
        loaded: false,
        ..Provider::new()
    });
    let app = app(provider.clone(), 200);

    let response = post(&app, "/auth/sign-up/otp", &credentials("ada@corinna.dev")).await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await?;
    assert_eq!(body["error"], "provider_not_loaded");
    assert_eq!(body["step"], CREDENTIALS_STEP);
    assert_eq!(body["toasts"][0]["title"], "Error");
    assert_eq!(
        body["toasts"][0]["description"],
        "Authentication service not loaded"
    );

    let wizard_id = body["wizard_id"]
        .as_str()
        .map(ToString::to_string)
        .context("missing wizard_id")?;
    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = json_body(response).await?;
    assert_eq!(body["error"], "provider_not_loaded");
    assert_eq!(body["toasts"][0]["title"], "Error");
    assert!(provider.activated().is_empty());
    Ok(())
}

#[tokio::test]
async fn unsafe_session_id_never_reaches_cookie() -> Result<()> {
    let provider = Arc::new(Provider {
        session_id: "sess_new; Domain=evil.tld".to_string(),
        ..Provider::new()
    });
    let app = app(provider, 200);
    let wizard_id = start_wizard(&app).await?;

    let response = post(
        &app,
        "/auth/sign-up/complete",
        &json!({
            "wizard_id": wizard_id,
            "full_name": "Ada Lovelace",
            "otp": "123456",
        }),
    )
    .await?;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get(SET_COOKIE).is_none());
    let body = json_body(response).await?;
    assert_eq!(body["error"], "invalid_session_id");
    assert!(body.get("redirect").is_none());
    Ok(())
}

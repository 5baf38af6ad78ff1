use super::handlers::{gate, health, sign_up};
use crate::signup::{
    AccountType, CurrentUser, Field, FieldErrors, RegisteredUser, StepCursor, Toast, WizardPhase,
};
use axum::response::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        gate::sign_up_page,
        sign_up::generate_otp,
        sign_up::complete
    ),
    components(schemas(
        health::Health,
        sign_up::OtpRequest,
        sign_up::CompleteRequest,
        sign_up::WizardResponse,
        sign_up::ValidationResponse,
        Toast,
        StepCursor,
        WizardPhase,
        AccountType,
        Field,
        FieldErrors,
        RegisteredUser,
        CurrentUser
    )),
    tags(
        (name = "sign-up", description = "Sign-up gate and wizard"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

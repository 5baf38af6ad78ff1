use super::extract_session_token;
use crate::{
    corinna::AppState,
    gate::{self, GateOutcome},
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect},
};
use std::sync::Arc;
use tracing::error;

#[utoipa::path(
    get,
    path = "/auth/sign-up",
    responses(
        (status = 200, description = "Sign-up wizard page", content_type = "text/html", body = String),
        (status = 303, description = "Visitor already signed in, redirected home"),
        (status = 500, description = "Identity lookup failed", body = String)
    ),
    tag = "sign-up"
)]
pub async fn sign_up_page(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let token = extract_session_token(&headers);

    match gate::render(
        state.provider().as_ref(),
        token.as_deref(),
        gate::page::wizard(),
    )
    .await
    {
        Ok(GateOutcome::Redirect(route)) => Redirect::to(route).into_response(),
        Ok(GateOutcome::Render(html)) => Html(html).into_response(),
        Err(err) => {
            error!("Failed to look up current user: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
                .into_response()
        }
    }
}

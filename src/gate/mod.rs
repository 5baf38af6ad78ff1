//! Gate for the sign-up page.
//!
//! Visitors that already hold a live session never see the wizard; they are
//! sent to the home route. Everyone else gets the wizard wrapped in the
//! marketing layout. The identity lookup is passed in so tests can swap it.

pub mod page;

use crate::signup::{navigate::HOME_ROUTE, IdentityProvider, ProviderError};
use tracing::{debug, instrument};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    Redirect(&'static str),
    Render(String),
}

/// Render the sign-up page, or redirect when the visitor is signed in.
///
/// # Errors
///
/// Propagates a failed identity lookup; there is no fallback page.
#[instrument(skip_all, fields(has_session = session_token.is_some()))]
pub async fn render(
    provider: &dyn IdentityProvider,
    session_token: Option<&str>,
    children: &str,
) -> Result<GateOutcome, ProviderError> {
    if let Some(token) = session_token.filter(|token| !token.is_empty()) {
        if let Some(user) = provider.current_user(token).await? {
            debug!(user_id = %user.id, "visitor already signed in");
            return Ok(GateOutcome::Redirect(HOME_ROUTE));
        }
    }

    Ok(GateOutcome::Render(page::layout(children)))
}

use crate::{
    cli::globals::GlobalArgs,
    clients::{identity::HttpIdentityProvider, registration::HttpRegistrar},
    corinna::{self, AppState},
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

const LOAD_RETRY_INITIAL: Duration = Duration::from_secs(1);
const LOAD_RETRY_MAX: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub registration_url: Url,
    pub wizard_ttl: Duration,
    pub secure_cookies: bool,
    pub globals: GlobalArgs,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the HTTP clients cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let provider = HttpIdentityProvider::new(
        args.globals.identity_url.clone(),
        args.globals.identity_secret_key.clone(),
    )
    .context("Failed to build identity provider client")?;

    let provider = Arc::new(provider);

    // Serve while the provider is down: the wizard reports it as not loaded
    // and /health returns 503 until the background load succeeds.
    match provider.load().await {
        Ok(()) => info!("identity provider loaded"),
        Err(err) => {
            warn!("identity provider not loaded, retrying in background: {err}");
            tokio::spawn({
                let provider = provider.clone();
                async move {
                    provider
                        .load_until_ready(LOAD_RETRY_INITIAL, LOAD_RETRY_MAX)
                        .await;
                }
            });
        }
    }

    let registrar = HttpRegistrar::new(args.registration_url)
        .context("Failed to build registration client")?;

    let state = AppState::new(provider, Arc::new(registrar), args.wizard_ttl)
        .with_secure_cookies(args.secure_cookies);

    corinna::new(args.port, Arc::new(state)).await
}

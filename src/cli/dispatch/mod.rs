use crate::cli::{
    actions::{server::Args, Action},
    globals::GlobalArgs,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or not valid URLs.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let identity_url = matches
        .get_one::<String>("identity-url")
        .context("missing required argument: --identity-url")?;
    let identity_url = Url::parse(identity_url).context("invalid CORINNA_IDENTITY_URL")?;

    let secret_key = matches
        .get_one::<String>("identity-secret-key")
        .cloned()
        .context("missing required argument: --identity-secret-key")?;

    let registration_url = matches
        .get_one::<String>("registration-url")
        .context("missing required argument: --registration-url")?;
    let registration_url =
        Url::parse(registration_url).context("invalid CORINNA_REGISTRATION_URL")?;

    let wizard_ttl = matches.get_one::<u64>("wizard-ttl").copied().unwrap_or(1800);
    let secure_cookies = matches.get_flag("secure-cookies");

    let mut globals = GlobalArgs::new(identity_url);
    globals.set_secret_key(SecretString::from(secret_key));

    Ok(Action::Server(Args {
        port,
        registration_url,
        wizard_ttl: Duration::from_secs(wizard_ttl),
        secure_cookies,
        globals,
    }))
}

//! HTTP adapters for the identity provider and the registration service.

pub mod identity;
pub mod registration;

pub use self::identity::HttpIdentityProvider;
pub use self::registration::HttpRegistrar;

use crate::APP_USER_AGENT;
use reqwest::Client;
use url::Url;

fn build_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(APP_USER_AGENT).build()
}

/// Join `path` onto `base`, keeping any path prefix on the base URL.
fn endpoint_url(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    format!("{base}/{}", path.trim_start_matches('/'))
}

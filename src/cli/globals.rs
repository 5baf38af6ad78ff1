use secrecy::SecretString;
use url::Url;

/// Connection details for the identity provider, shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub identity_url: Url,
    pub identity_secret_key: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(identity_url: Url) -> Self {
        Self {
            identity_url,
            identity_secret_key: SecretString::default(),
        }
    }

    pub fn set_secret_key(&mut self, key: SecretString) {
        self.identity_secret_key = key;
    }
}

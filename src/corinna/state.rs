//! Shared server state and the in-memory wizard store.
//!
//! A wizard lives only as long as the visitor is on the sign-up page: entries
//! are dropped on success and pruned once they sit idle past the TTL.

use crate::{
    gate::page,
    signup::{
        IdentityProvider, Navigator, Notifier, Registrar, RegistrationDraft, SignUpWizard,
        StepCursor, WizardState,
    },
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use ulid::Ulid;

pub struct AppState {
    provider: Arc<dyn IdentityProvider>,
    registrar: Arc<dyn Registrar>,
    wizards: WizardStore,
    secure_cookies: bool,
}

impl AppState {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        registrar: Arc<dyn Registrar>,
        wizard_ttl: Duration,
    ) -> Self {
        Self {
            provider,
            registrar,
            wizards: WizardStore::new(wizard_ttl),
            secure_cookies: false,
        }
    }

    /// Mark session cookies `Secure`; only when served over HTTPS.
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    #[must_use]
    pub const fn wizards(&self) -> &WizardStore {
        &self.wizards
    }

    #[must_use]
    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Controller for one request, resumed from a stored state.
    #[must_use]
    pub fn wizard(
        &self,
        state: WizardState,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> SignUpWizard {
        SignUpWizard::new(
            self.provider.clone(),
            self.registrar.clone(),
            notifier,
            navigator,
        )
        .with_state(state)
    }
}

/// Everything kept for one visitor between requests.
#[derive(Debug)]
pub struct WizardEntry {
    pub draft: RegistrationDraft,
    pub state: WizardState,
    pub step: StepCursor,
    touched: Instant,
}

impl WizardEntry {
    fn new() -> Self {
        Self {
            draft: RegistrationDraft::default(),
            state: WizardState::default(),
            step: StepCursor::new(page::CREDENTIALS_STEP),
            touched: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.touched = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.touched.elapsed()
    }
}

pub type WizardSlot = Arc<Mutex<WizardEntry>>;

#[derive(Clone)]
pub struct WizardStore {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<Ulid, WizardSlot>>>,
}

impl WizardStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start a new wizard, pruning idle ones first.
    pub async fn create(&self) -> (Ulid, WizardSlot) {
        let mut entries = self.entries.write().await;

        let before = entries.len();
        // Entries locked by an in-flight request are never pruned.
        entries.retain(|_, slot| {
            slot.try_lock()
                .map_or(true, |entry| entry.idle_for() < self.ttl)
        });
        let pruned = before - entries.len();
        if pruned > 0 {
            debug!(pruned, "pruned idle sign-up wizards");
        }

        let id = Ulid::new();
        let slot = Arc::new(Mutex::new(WizardEntry::new()));
        entries.insert(id, slot.clone());

        (id, slot)
    }

    pub async fn get(&self, id: Ulid) -> Option<WizardSlot> {
        self.entries.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Ulid) {
        self.entries.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

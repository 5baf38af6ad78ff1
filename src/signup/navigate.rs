//! Client-side navigation targets.

use std::sync::{Mutex, PoisonError};

/// Where visitors that already have a session are sent.
pub const HOME_ROUTE: &str = "/";
/// Where a completed sign-up lands.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

pub trait Navigator: Send + Sync {
    fn push(&self, route: &str);
}

/// Remembers every navigation so the HTTP layer can turn it into a redirect.
#[derive(Debug, Default)]
pub struct NavigationRecorder {
    routes: Mutex<Vec<String>>,
}

impl NavigationRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent navigation, if any.
    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for NavigationRecorder {
    fn push(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

//! # Corinna (sign-up gateway)
//!
//! `corinna` hosts the visitor-facing sign-up flow for the Corinna AI sales
//! assistant. The identity provider owns accounts, sessions and the emailed
//! one-time passcodes; a separate registration service persists the user
//! record. This crate only orchestrates the two.
//!
//! ## Flow
//!
//! 1. `GET /auth/sign-up` runs the gate: visitors that already hold a session
//!    are redirected to `/`, everyone else gets the wizard page.
//! 2. `POST /auth/sign-up/otp` creates the account with the provider and asks
//!    it to email a verification code.
//! 3. `POST /auth/sign-up/complete` verifies the code, finalizes the
//!    registration, activates the session and points the visitor at
//!    `/dashboard`.
//!
//! Every failure is reported as a toast and leaves the wizard on its current
//! step so the visitor can retry.

pub mod cli;
pub mod clients;
pub mod corinna;
pub mod gate;
pub mod signup;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

//! Registration form state and schema checks.
//!
//! Checks can run one field at a time (as the visitor types) or per wizard
//! step before an operation is dispatched. The controller itself never
//! re-validates; it trusts whatever made it past these checks.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};
use utoipa::ToSchema;

pub const MIN_FULL_NAME_LENGTH: usize = 4;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 64;
pub const OTP_LENGTH: usize = 6;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Owner,
    Student,
}

impl AccountType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "student" => Ok(Self::Student),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AccountType,
    FullName,
    Email,
    ConfirmEmail,
    Password,
    ConfirmPassword,
    Otp,
}

impl Field {
    /// Fields filled in on the credentials screen.
    pub const CREDENTIALS: [Self; 4] = [
        Self::Email,
        Self::ConfirmEmail,
        Self::Password,
        Self::ConfirmPassword,
    ];

    /// Fields filled in on the final screen.
    pub const PROFILE: [Self; 2] = [Self::FullName, Self::Otp];
}

/// Per-field error messages, keyed by field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn insert(&mut self, field: Field, message: String) {
        self.0.insert(field, message);
    }
}

/// Everything the visitor types across the wizard screens. Filled in
/// incrementally and dropped once the flow completes.
#[derive(Debug, Default)]
pub struct RegistrationDraft {
    pub account_type: AccountType,
    pub full_name: String,
    pub email: String,
    pub confirm_email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub otp: String,
}

impl RegistrationDraft {
    /// Check a single field, returning the message to show next to it.
    #[must_use]
    pub fn check(&self, field: Field) -> Option<String> {
        match field {
            // Restricted to the enum already.
            Field::AccountType => None,
            Field::FullName => (self.full_name.trim().chars().count() < MIN_FULL_NAME_LENGTH)
                .then(|| {
                    format!(
                        "Your full name must be at least {MIN_FULL_NAME_LENGTH} characters long"
                    )
                }),
            Field::Email => {
                (!valid_email(&normalize_email(&self.email))).then(|| "Incorrect email format".into())
            }
            Field::ConfirmEmail => (normalize_email(&self.email)
                != normalize_email(&self.confirm_email))
            .then(|| "Your emails do not match".into()),
            Field::Password => {
                let length = self.password.expose_secret().chars().count();
                if length < MIN_PASSWORD_LENGTH {
                    Some(format!(
                        "Your password must be at least {MIN_PASSWORD_LENGTH} characters long"
                    ))
                } else if length > MAX_PASSWORD_LENGTH {
                    Some(format!(
                        "Your password can not be longer than {MAX_PASSWORD_LENGTH} characters"
                    ))
                } else {
                    None
                }
            }
            Field::ConfirmPassword => (self.password.expose_secret()
                != self.confirm_password.expose_secret())
            .then(|| "Passwords do not match".into()),
            Field::Otp => (!valid_otp(&self.otp))
                .then(|| format!("You must enter a {OTP_LENGTH} digit code")),
        }
    }

    /// Check a set of fields; `Ok` when all of them pass.
    ///
    /// # Errors
    ///
    /// Returns the messages for every failing field.
    pub fn validate(&self, fields: &[Field]) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        for &field in fields {
            if let Some(message) = self.check(field) {
                errors.insert(field, message);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// # Errors
    ///
    /// Returns the failing credential fields.
    pub fn validate_credentials(&self) -> Result<(), FieldErrors> {
        self.validate(&Field::CREDENTIALS)
    }

    /// # Errors
    ///
    /// Returns the failing profile fields.
    pub fn validate_profile(&self) -> Result<(), FieldErrors> {
        self.validate(&Field::PROFILE)
    }
}

/// Normalize an email before validation and provider calls.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

fn valid_otp(code: &str) -> bool {
    code.len() == OTP_LENGTH && code.bytes().all(|byte| byte.is_ascii_digit())
}

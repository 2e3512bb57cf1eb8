//! Domain service for accounts and bearer tokens.
//!
//! Handles registration, credential checks, token issuance/resolution and
//! profile updates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::User;
use crate::domain::UserId;

/// Errors specific to account operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unable to authenticate with provided credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

/// Registration payload. Every field may be missing on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Profile changes; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Domain service trait for accounts.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates a regular account.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::Validation`] for a missing/malformed email, a short
    /// password or an email that is already registered.
    async fn register(&self, registration: Registration) -> Result<UserProfile, UserError>;

    /// Creates a staff account with superuser rights.
    async fn create_superuser(&self, email: &str, password: &str)
    -> Result<UserProfile, UserError>;

    /// Verifies credentials and returns the matching active user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] for unknown users, wrong
    /// passwords and inactive accounts.
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserError>;

    /// Returns the user's bearer token, creating it on first use.
    async fn issue_token(&self, user: &User) -> Result<String, UserError>;

    /// Resolves a bearer token to its active owner.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidToken`] if the token is unknown or the user inactive.
    async fn resolve_token(&self, token: &str) -> Result<User, UserError>;

    async fn get_profile(&self, user_id: UserId) -> Result<UserProfile, UserError>;

    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, UserError>;
}

/// Trim and lowercase an address after checking it has a local part and a domain.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(UserError::Validation(
            "Users must have an email address".to_string(),
        ));
    }

    let valid = email
        .rsplit_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
        && !email.chars().any(char::is_whitespace);

    if !valid {
        return Err(UserError::Validation(format!(
            "Enter a valid email address: {email}"
        )));
    }

    Ok(email.to_lowercase())
}

pub fn validate_password(password: &str, min_length: usize) -> Result<(), UserError> {
    if password.chars().count() < min_length {
        return Err(UserError::Validation(format!(
            "Password must be at least {min_length} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("omid@GMAIL.COM").unwrap(),
            "omid@gmail.com"
        );
        assert_eq!(normalize_email("X@DOMAIN.com").unwrap(), "x@domain.com");
        assert_eq!(
            normalize_email("  test@example.com ").unwrap(),
            "test@example.com"
        );
    }

    #[test]
    fn test_normalize_email_is_idempotent() {
        let once = normalize_email("Mixed.Case@Example.ORG").unwrap();
        assert_eq!(normalize_email(&once).unwrap(), once);
    }

    #[test]
    fn test_normalize_email_rejects_invalid() {
        assert!(matches!(
            normalize_email(""),
            Err(UserError::Validation(_))
        ));
        assert!(normalize_email("   ").is_err());
        assert!(normalize_email("no-at-sign").is_err());
        assert!(normalize_email("@domain.com").is_err());
        assert!(normalize_email("user@").is_err());
        assert!(normalize_email("us er@domain.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("omid1234", 5).is_ok());
        assert!(validate_password("12345", 5).is_ok());
        assert!(validate_password("pw", 5).is_err());
        assert!(validate_password("", 1).is_err());
    }
}
